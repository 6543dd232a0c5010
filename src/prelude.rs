//! Prelude module for common overlaymap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use overlaymap::prelude::*;`

pub use crate::core::{
    bounds::Bounds,
    config::{BaseLayerConfig, BoundsConfig, MapConfig, MarkerConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{Map as CoreMap, MapOptions},
    viewport::{Viewport, ViewportState},
};

pub use crate::layers::{
    base::LayerTrait, manager::LayerManager, marker::{Marker, Popup}, tile::TileLayer,
};

pub use crate::layers::tile::{
    Placeholder, RequestKind, TileLayerOptions, TileRequest, TileResponse, TileScheme, TileSource,
    TileState, UrlTemplateSource,
};

#[cfg(feature = "tokio-runtime")]
pub use crate::layers::tile::{HttpFetcher, TileFetcher, TileLoader, TileLoaderConfig};

pub use crate::input::{EventKind, EventManager, MapEvent, TileEvent};

pub use crate::ui::{ControlPosition, DisplaySink, ElementId, ScaleControl, TextDisplay};

#[cfg(feature = "egui")]
pub use crate::ui::panel::{StatusPanel, TilePainter, ViewAction};

pub use crate::controller::{LoadingCounter, MapViewController};

pub use crate::{MapError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
