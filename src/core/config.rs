//! Configuration for the overlay map
//!
//! `MapConfig` describes where the custom tile set lives, the area it covers,
//! and how the initial view is set up. The defaults reproduce the Karachi
//! tile set published on Google Cloud Storage; any field can be overridden
//! from a JSON document.

use crate::core::{
    constants::{
        DEFAULT_FIT_PADDING, DEFAULT_MAX_BOUNDS_PAD, OSM_ATTRIBUTION, OSM_MAX_ZOOM,
        OSM_URL_TEMPLATE, TRANSPARENT_PIXEL_DATA_URL,
    },
    geo::{LatLng, LatLngBounds, Point},
};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geographic extent of the tile set, as published in `tilemapresource.xml`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsConfig {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundsConfig {
    pub fn to_lat_lng_bounds(&self) -> LatLngBounds {
        LatLngBounds::from_coords(self.south, self.west, self.north, self.east)
    }
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            north: 24.88196325605469,
            south: 24.775039672851562,
            east: 67.08074951171875,
            west: 66.91925048828125,
        }
    }
}

/// The always-on backdrop layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseLayerConfig {
    pub url_template: String,
    pub subdomains: Vec<String>,
    pub attribution: String,
    pub max_zoom: u8,
}

impl Default for BaseLayerConfig {
    fn default() -> Self {
        Self {
            url_template: OSM_URL_TEMPLATE.to_string(),
            subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            attribution: OSM_ATTRIBUTION.to_string(),
            max_zoom: OSM_MAX_ZOOM,
        }
    }
}

/// Marker placed at the map center with an opened popup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub enabled: bool,
    pub title: String,
    pub description: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "Karachi".to_string(),
            description: "Center of the map area".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Object storage host, without scheme
    pub storage_host: String,
    pub bucket_name: String,
    /// Prefix inside the bucket; empty when tiles sit at the bucket root
    pub tiles_path: String,
    pub bounds: BoundsConfig,
    pub center: [f64; 2],
    pub default_zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub overlay_opacity: f32,
    pub overlay_attribution: String,
    pub error_tile_url: String,
    /// Ratio applied to the data bounds before they become max bounds
    pub max_bounds_pad: f64,
    /// Pixel padding used when fitting the view to the data bounds
    pub fit_padding: f64,
    pub viewport_size: [f64; 2],
    pub base_layer: BaseLayerConfig,
    pub marker: MarkerConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            storage_host: "storage.googleapis.com".to_string(),
            bucket_name: "karachi_tiles".to_string(),
            tiles_path: String::new(),
            bounds: BoundsConfig::default(),
            center: [24.8282, 67.0001],
            default_zoom: 10,
            min_zoom: 1,
            max_zoom: 18,
            overlay_opacity: 0.9,
            overlay_attribution: "© Karachi Tiles | Hosted on Google Cloud Storage".to_string(),
            error_tile_url: TRANSPARENT_PIXEL_DATA_URL.to_string(),
            max_bounds_pad: DEFAULT_MAX_BOUNDS_PAD,
            fit_padding: DEFAULT_FIT_PADDING,
            viewport_size: [1024.0, 768.0],
            base_layer: BaseLayerConfig::default(),
            marker: MarkerConfig::default(),
        }
    }
}

impl MapConfig {
    /// Parses a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn center(&self) -> LatLng {
        LatLng::from(self.center)
    }

    pub fn data_bounds(&self) -> LatLngBounds {
        self.bounds.to_lat_lng_bounds()
    }

    pub fn viewport_size(&self) -> Point {
        Point::new(self.viewport_size[0], self.viewport_size[1])
    }

    /// `https://<host>/<bucket>[/<path>]/{z}/{x}/{y}.png`
    pub fn overlay_url_template(&self) -> String {
        let path = self.tiles_path.trim_matches('/');
        if path.is_empty() {
            format!(
                "https://{}/{}/{{z}}/{{x}}/{{y}}.png",
                self.storage_host, self.bucket_name
            )
        } else {
            format!(
                "https://{}/{}/{}/{{z}}/{{x}}/{{y}}.png",
                self.storage_host, self.bucket_name, path
            )
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_name.trim().is_empty() {
            return Err(MapError::InvalidConfig("bucket_name is empty".to_string()));
        }
        if self.storage_host.trim().is_empty() {
            return Err(MapError::InvalidConfig("storage_host is empty".to_string()));
        }
        if !self.data_bounds().is_valid() {
            return Err(MapError::InvalidConfig(format!(
                "bounds are inverted: {:?}",
                self.bounds
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(MapError::InvalidConfig(format!(
                "min_zoom {} is greater than max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(0.0..=1.0).contains(&self.overlay_opacity) {
            return Err(MapError::InvalidConfig(format!(
                "overlay_opacity {} is outside [0, 1]",
                self.overlay_opacity
            )));
        }
        if !self.center().is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "center {:?} is not a valid coordinate",
                self.center
            )));
        }
        if self.max_bounds_pad < 0.0 || self.fit_padding < 0.0 {
            return Err(MapError::InvalidConfig(
                "padding values must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = MapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.center(), LatLng::new(24.8282, 67.0001));
        assert_eq!(config.default_zoom, 10);
    }

    #[test]
    fn test_overlay_url_template() {
        let mut config = MapConfig::default();
        assert_eq!(
            config.overlay_url_template(),
            "https://storage.googleapis.com/karachi_tiles/{z}/{x}/{y}.png"
        );

        config.tiles_path = "/v2/".to_string();
        assert_eq!(
            config.overlay_url_template(),
            "https://storage.googleapis.com/karachi_tiles/v2/{z}/{x}/{y}.png"
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            MapConfig::from_json_str(r#"{"bucket_name": "lahore_tiles", "overlay_opacity": 0.5}"#)
                .unwrap();

        assert_eq!(config.bucket_name, "lahore_tiles");
        assert_eq!(config.overlay_opacity, 0.5);
        assert_eq!(config.max_zoom, 18);
        assert_eq!(config.base_layer.subdomains.len(), 3);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            MapConfig::from_json_str(r#"{"bucket_name": ""}"#),
            Err(MapError::InvalidConfig(_))
        ));
        assert!(matches!(
            MapConfig::from_json_str(r#"{"min_zoom": 12, "max_zoom": 4}"#),
            Err(MapError::InvalidConfig(_))
        ));
        assert!(matches!(
            MapConfig::from_json_str(r#"{"overlay_opacity": 1.5}"#),
            Err(MapError::InvalidConfig(_))
        ));
        assert!(matches!(
            MapConfig::from_json_str(
                r#"{"bounds": {"north": 1.0, "south": 2.0, "east": 1.0, "west": 0.0}}"#
            ),
            Err(MapError::InvalidConfig(_))
        ));
        assert!(matches!(
            MapConfig::from_json_str("not json"),
            Err(MapError::Serialization(_))
        ));
    }
}
