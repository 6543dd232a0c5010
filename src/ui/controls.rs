use crate::{
    core::{constants::SCALE_MAX_WIDTH, geo::Point, map::Map, viewport::Viewport},
    layers::tile::TileLayer,
};
use serde::{Deserialize, Serialize};

/// Corner of the map container a control is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ControlPosition {
    /// Top-left corner, in container pixels, of a control of `size`
    pub fn place(&self, container: Point, size: Point, margin: f64) -> Point {
        match self {
            ControlPosition::TopLeft => Point::new(margin, margin),
            ControlPosition::TopRight => Point::new(container.x - margin - size.x, margin),
            ControlPosition::BottomLeft => Point::new(margin, container.y - margin - size.y),
            ControlPosition::BottomRight => Point::new(
                container.x - margin - size.x,
                container.y - margin - size.y,
            ),
        }
    }
}

/// A computed scale bar: its label and how wide to draw it
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBar {
    pub label: String,
    pub width: f64,
    pub meters: f64,
}

/// Metric scale bar (Leaflet's `L.control.scale` with `imperial: false`)
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleControl {
    pub position: ControlPosition,
    pub max_width: f64,
}

impl Default for ScaleControl {
    fn default() -> Self {
        Self {
            position: ControlPosition::BottomLeft,
            max_width: SCALE_MAX_WIDTH,
        }
    }
}

impl ScaleControl {
    /// Measures `max_width` pixels across the middle of the view and rounds
    /// down to a 1/2/3/5 step of a power of ten
    pub fn bar(&self, viewport: &Viewport) -> Option<ScaleBar> {
        let y = viewport.size.y / 2.0;
        let left = viewport.pixel_to_lat_lng(&Point::new(0.0, y));
        let right = viewport.pixel_to_lat_lng(&Point::new(self.max_width, y));
        let max_meters = left.distance_to(&right);

        if !max_meters.is_finite() || max_meters <= 0.0 {
            return None;
        }

        let meters = round_number(max_meters);
        let label = if meters < 1000.0 {
            format!("{} m", meters)
        } else {
            format!("{} km", meters / 1000.0)
        };

        Some(ScaleBar {
            label,
            width: (self.max_width * meters / max_meters).round(),
            meters,
        })
    }
}

fn round_number(num: f64) -> f64 {
    let pow10 = 10_f64.powi(num.floor().log10().floor().max(0.0) as i32);
    let d = num / pow10;

    let d = if d >= 10.0 {
        10.0
    } else if d >= 5.0 {
        5.0
    } else if d >= 3.0 {
        3.0
    } else if d >= 2.0 {
        2.0
    } else {
        1.0
    };

    pow10 * d
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoomControl {
    pub position: ControlPosition,
}

impl Default for ZoomControl {
    fn default() -> Self {
        Self {
            position: ControlPosition::TopLeft,
        }
    }
}

impl ZoomControl {
    pub fn can_zoom_in(&self, viewport: &Viewport) -> bool {
        viewport.zoom < viewport.max_zoom
    }

    pub fn can_zoom_out(&self, viewport: &Viewport) -> bool {
        viewport.zoom > viewport.min_zoom
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributionControl {
    pub position: ControlPosition,
}

impl Default for AttributionControl {
    fn default() -> Self {
        Self {
            position: ControlPosition::BottomRight,
        }
    }
}

impl AttributionControl {
    /// Attributions of visible tile layers in draw order, duplicates removed
    pub fn text(&self, map: &Map) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for layer in map.layers() {
            if !layer.is_visible() {
                continue;
            }
            let Some(tile_layer) = layer.as_any().downcast_ref::<TileLayer>() else {
                continue;
            };
            if let Some(attribution) = tile_layer.attribution() {
                if !attribution.is_empty() && !parts.contains(&attribution) {
                    parts.push(attribution);
                }
            }
        }
        parts.join(" | ")
    }
}

/// The controls shown around the map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapControls {
    pub zoom: ZoomControl,
    pub scale: ScaleControl,
    pub attribution: AttributionControl,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::geo::LatLng,
        layers::tile::TileLayerOptions,
    };

    #[test]
    fn test_round_number_steps() {
        assert_eq!(round_number(13_875.0), 10_000.0);
        assert_eq!(round_number(2_400.0), 2_000.0);
        assert_eq!(round_number(37.0), 30.0);
        assert_eq!(round_number(6.2), 5.0);
        assert_eq!(round_number(0.7), 1.0);
    }

    #[test]
    fn test_scale_bar_at_karachi() {
        let viewport = Viewport::new(LatLng::new(24.8282, 67.0001), 10.0, Point::new(1024.0, 768.0));
        let bar = ScaleControl::default().bar(&viewport).unwrap();

        assert_eq!(bar.label, "10 km");
        assert!(bar.width > 65.0 && bar.width < 80.0);
        assert!(bar.width <= 100.0);
    }

    #[test]
    fn test_short_scale_uses_meters() {
        let viewport = Viewport::new(LatLng::new(24.8282, 67.0001), 18.0, Point::new(1024.0, 768.0));
        let bar = ScaleControl::default().bar(&viewport).unwrap();

        assert!(bar.label.ends_with(" m"));
        assert!(bar.meters < 1000.0);
    }

    #[test]
    fn test_control_placement() {
        let container = Point::new(800.0, 600.0);
        let size = Point::new(100.0, 20.0);

        assert_eq!(
            ControlPosition::BottomLeft.place(container, size, 10.0),
            Point::new(10.0, 570.0)
        );
        assert_eq!(
            ControlPosition::TopRight.place(container, size, 10.0),
            Point::new(690.0, 10.0)
        );
    }

    #[test]
    fn test_attribution_joins_visible_layers() {
        let mut map = Map::new(LatLng::new(24.8282, 67.0001), 10.0, Point::new(800.0, 600.0));
        for (id, attribution) in [("base", "© OpenStreetMap contributors"), ("overlay", "© Karachi Tiles")] {
            let options = TileLayerOptions {
                attribution: Some(attribution.to_string()),
                z_index: if id == "base" { 0 } else { 1 },
                ..Default::default()
            };
            let layer = TileLayer::from_template(id.to_string(), "/{z}/{x}/{y}.png", options).unwrap();
            map.add_layer(Box::new(layer)).unwrap();
        }

        let control = AttributionControl::default();
        assert_eq!(
            control.text(&map),
            "© OpenStreetMap contributors | © Karachi Tiles"
        );

        map.get_layer_mut("overlay").unwrap().set_visible(false);
        assert_eq!(control.text(&map), "© OpenStreetMap contributors");
    }
}
