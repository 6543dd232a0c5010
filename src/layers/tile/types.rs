//! Core data types for tile layer functionality

use crate::{
    core::{constants::TILE_SIZE, geo::{LatLngBounds, TileCoord}},
    prelude::Arc,
    MapError, Result,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Vertical numbering convention used by a tile server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileScheme {
    /// Row 0 at the north edge (OSM, Google, most slippy maps)
    #[default]
    Xyz,
    /// Row 0 at the south edge (gdal2tiles, TileMapService)
    Tms,
}

impl TileScheme {
    /// Row index to put in the URL for `coord`
    pub fn row_for(&self, coord: &TileCoord) -> u32 {
        match self {
            TileScheme::Xyz => coord.y,
            TileScheme::Tms => coord.flipped_y(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayerOptions {
    pub tile_size: u32,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub attribution: Option<String>,
    pub opacity: f32,
    pub z_index: i32,
    pub subdomains: Vec<String>,
    /// Shown in place of tiles that fail to load
    pub error_tile_url: Option<String>,
    pub scheme: TileScheme,
    /// Tiles entirely outside these bounds are never requested
    pub bounds: Option<LatLngBounds>,
}

impl Default for TileLayerOptions {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            min_zoom: 0,
            max_zoom: 18,
            attribution: None,
            opacity: 1.0,
            z_index: 1,
            subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            error_tile_url: None,
            scheme: TileScheme::Xyz,
            bounds: None,
        }
    }
}

/// Lifecycle of a single tile
#[derive(Debug, Clone, PartialEq)]
pub enum TileState {
    Loading,
    Loaded(Arc<Vec<u8>>),
    Errored { error: String },
}

impl TileState {
    pub fn is_loading(&self) -> bool {
        matches!(self, TileState::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, TileState::Loaded(_))
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, TileState::Errored { .. })
    }
}

/// What an errored tile displays
#[derive(Debug, Clone, PartialEq)]
pub enum Placeholder {
    /// Image bytes decoded from a `data:` URL
    Inline(Arc<Vec<u8>>),
    /// Image fetched by the layer's loader after the first tile error
    Remote(String),
}

impl Placeholder {
    /// Builds a placeholder from an error tile URL. `data:` URLs are decoded
    /// up front; anything else is kept as a reference.
    pub fn from_url(url: &str) -> Result<Self> {
        let Some(rest) = url.strip_prefix("data:") else {
            return Ok(Placeholder::Remote(url.to_string()));
        };

        let (meta, payload) = rest.split_once(',').ok_or_else(|| {
            MapError::InvalidConfig("data URL has no payload separator".to_string())
        })?;

        let bytes = if meta.ends_with(";base64") {
            STANDARD
                .decode(payload.trim())
                .map_err(|e| MapError::InvalidConfig(format!("bad base64 in data URL: {}", e)))?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(Placeholder::Inline(Arc::new(bytes)))
    }

    pub fn inline_data(&self) -> Option<&Arc<Vec<u8>>> {
        match self {
            Placeholder::Inline(data) => Some(data),
            Placeholder::Remote(_) => None,
        }
    }
}

/// What a fetch is for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RequestKind {
    #[default]
    Tile,
    /// The remote image shown in place of failed tiles
    ErrorTile,
}

/// A tile the layer wants fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub layer_id: String,
    /// For `ErrorTile` requests, the failed tile that triggered the fetch
    pub coord: TileCoord,
    pub url: String,
    pub kind: RequestKind,
}

impl TileRequest {
    pub fn tile(layer_id: impl Into<String>, coord: TileCoord, url: impl Into<String>) -> Self {
        Self {
            layer_id: layer_id.into(),
            coord,
            url: url.into(),
            kind: RequestKind::Tile,
        }
    }

    pub fn error_tile(layer_id: impl Into<String>, coord: TileCoord, url: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::ErrorTile,
            ..Self::tile(layer_id, coord, url)
        }
    }
}

/// Outcome of fetching a `TileRequest`
#[derive(Debug, Clone, PartialEq)]
pub struct TileResponse {
    pub layer_id: String,
    pub coord: TileCoord,
    pub url: String,
    pub kind: RequestKind,
    pub result: std::result::Result<Vec<u8>, String>,
}

impl TileResponse {
    pub fn success(request: &TileRequest, data: Vec<u8>) -> Self {
        Self {
            layer_id: request.layer_id.clone(),
            coord: request.coord,
            url: request.url.clone(),
            kind: request.kind,
            result: Ok(data),
        }
    }

    pub fn failure(request: &TileRequest, error: impl Into<String>) -> Self {
        Self {
            layer_id: request.layer_id.clone(),
            coord: request.coord,
            url: request.url.clone(),
            kind: request.kind,
            result: Err(error.into()),
        }
    }
}
