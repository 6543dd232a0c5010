//! # overlaymap
//!
//! An interactive map view that stacks a TMS raster overlay, served from a
//! cloud storage bucket, on top of an OpenStreetMap base layer.
//!
//! The library is headless: a [`controller::MapViewController`] owns the
//! map, its layers and the status readouts, and writes to any
//! [`ui::DisplaySink`]. Tiles are fetched by [`layers::tile::TileLoader`]
//! on a tokio runtime. The `egui` feature adds a status panel and tile
//! painting for native viewers.

pub mod controller;
pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::Bounds,
    config::MapConfig,
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::Map,
    viewport::Viewport,
};

pub use controller::{LoadingCounter, MapViewController};

pub use layers::{base::LayerTrait, marker::Marker, tile::TileLayer};

pub use input::{EventKind, MapEvent, TileEvent};

pub use ui::{DisplaySink, ElementId, TextDisplay};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid URL template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Fetch error: {0}")]
    Fetch(String),
}

/// Error type alias for convenience
pub type Error = MapError;
