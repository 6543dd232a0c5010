use super::types::TileScheme;
use crate::{core::geo::TileCoord, MapError, Result};

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;

    fn scheme(&self) -> TileScheme {
        TileScheme::Xyz
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Subdomain,
    Zoom,
    X,
    Y,
    /// `{-y}` is always the flipped row, whatever the scheme
    FlippedY,
}

/// Tile source driven by a `{s}`/`{z}`/`{x}`/`{y}`/`{-y}` URL template
#[derive(Debug, Clone)]
pub struct UrlTemplateSource {
    template: String,
    segments: Vec<Segment>,
    subdomains: Vec<String>,
    scheme: TileScheme,
}

impl UrlTemplateSource {
    pub fn new(template: &str, subdomains: Vec<String>, scheme: TileScheme) -> Result<Self> {
        let segments = parse_template(template)?;

        if segments.contains(&Segment::Subdomain) && subdomains.is_empty() {
            return Err(MapError::InvalidTemplate(format!(
                "'{}' uses {{s}} but no subdomains were given",
                template
            )));
        }

        let has_row = segments
            .iter()
            .any(|s| matches!(s, Segment::Y | Segment::FlippedY));
        if !segments.contains(&Segment::Zoom) || !segments.contains(&Segment::X) || !has_row {
            return Err(MapError::InvalidTemplate(format!(
                "'{}' must reference {{z}}, {{x}} and a row",
                template
            )));
        }

        Ok(Self {
            template: template.to_string(),
            segments,
            subdomains,
            scheme,
        })
    }

    fn subdomain(&self, coord: &TileCoord) -> &str {
        if self.subdomains.is_empty() {
            return "";
        }
        let idx = ((coord.x as u64 + coord.y as u64) % self.subdomains.len() as u64) as usize;
        &self.subdomains[idx]
    }
}

impl TileSource for UrlTemplateSource {
    fn url(&self, coord: TileCoord) -> String {
        let mut url = String::with_capacity(self.template.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Subdomain => url.push_str(self.subdomain(&coord)),
                Segment::Zoom => url.push_str(&coord.z.to_string()),
                Segment::X => url.push_str(&coord.x.to_string()),
                Segment::Y => url.push_str(&self.scheme.row_for(&coord).to_string()),
                Segment::FlippedY => url.push_str(&coord.flipped_y().to_string()),
            }
        }
        url
    }

    fn scheme(&self) -> TileScheme {
        self.scheme
    }
}

fn parse_template(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        if start > 0 {
            segments.push(Segment::Literal(rest[..start].to_string()));
        }
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| {
            MapError::InvalidTemplate(format!("unclosed placeholder in '{}'", template))
        })?;

        let segment = match &after[..end] {
            "s" => Segment::Subdomain,
            "z" => Segment::Zoom,
            "x" => Segment::X,
            "y" => Segment::Y,
            "-y" => Segment::FlippedY,
            other => {
                return Err(MapError::InvalidTemplate(format!(
                    "unknown placeholder {{{}}} in '{}'",
                    other, template
                )))
            }
        };
        segments.push(segment);
        rest = &after[end + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::OSM_URL_TEMPLATE;

    fn abc() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    }

    #[test]
    fn test_osm_template_rotates_subdomains() {
        let source = UrlTemplateSource::new(OSM_URL_TEMPLATE, abc(), TileScheme::Xyz).unwrap();

        assert_eq!(
            source.url(TileCoord::new(702, 439, 10)),
            "https://b.tile.openstreetmap.org/10/702/439.png"
        );
        assert_eq!(
            source.url(TileCoord::new(0, 0, 0)),
            "https://a.tile.openstreetmap.org/0/0/0.png"
        );
    }

    #[test]
    fn test_tms_template_flips_rows() {
        let source = UrlTemplateSource::new(
            "https://storage.googleapis.com/karachi_tiles/{z}/{x}/{y}.png",
            Vec::new(),
            TileScheme::Tms,
        )
        .unwrap();

        assert_eq!(
            source.url(TileCoord::new(702, 439, 10)),
            "https://storage.googleapis.com/karachi_tiles/10/702/584.png"
        );
        assert_eq!(source.scheme(), TileScheme::Tms);
    }

    #[test]
    fn test_inverted_row_placeholder() {
        let source =
            UrlTemplateSource::new("/tiles/{z}/{x}/{-y}", Vec::new(), TileScheme::Xyz).unwrap();
        assert_eq!(source.url(TileCoord::new(1, 0, 1)), "/tiles/1/1/1");
    }

    #[test]
    fn test_invalid_templates() {
        let cases = [
            "https://example.com/{z}/{x}/{y}/{r}.png",
            "https://example.com/{z}/{x}/{y",
            "https://example.com/{z}/{x}.png",
        ];
        for template in cases {
            assert!(matches!(
                UrlTemplateSource::new(template, abc(), TileScheme::Xyz),
                Err(MapError::InvalidTemplate(_))
            ));
        }

        assert!(UrlTemplateSource::new(OSM_URL_TEMPLATE, Vec::new(), TileScheme::Xyz).is_err());
    }
}
