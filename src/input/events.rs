use crate::core::geo::{LatLng, Point, TileCoord};
use serde::{Deserialize, Serialize};

/// Events raised by a tile layer while it fetches its tiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TileEvent {
    /// The layer went from idle to having tiles in flight
    Loading,
    /// Every requested tile has either loaded or failed
    Load,
    /// A single tile request was issued
    TileLoadStart { coord: TileCoord },
    /// A single tile arrived
    TileLoad { coord: TileCoord },
    /// A single tile failed; the layer shows its placeholder instead
    TileError {
        coord: TileCoord,
        url: String,
        error: String,
    },
}

/// Map event types that can be emitted by the map
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Map view has changed (center, zoom, or size)
    ViewChanged { center: LatLng, zoom: f64 },
    /// Mouse/touch click on the map
    Click { lat_lng: LatLng, pixel: Point },
    /// Zoom started
    ZoomStart { zoom: f64 },
    /// Zoom ended
    ZoomEnd { zoom: f64 },
    /// Pan started
    MoveStart { center: LatLng },
    /// Pan ended
    MoveEnd { center: LatLng },
    /// Layer was added to the map
    LayerAdd { layer_id: String },
    /// Layer was removed from the map
    LayerRemove { layer_id: String },
    /// Relayed from a tile layer
    Tile { layer_id: String, event: TileEvent },
}

/// Discriminant used to register listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ViewChanged,
    Click,
    ZoomStart,
    ZoomEnd,
    MoveStart,
    MoveEnd,
    LayerAdd,
    LayerRemove,
    Loading,
    Load,
    TileLoadStart,
    TileLoad,
    TileError,
}

impl EventKind {
    /// Leaflet-style event name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ViewChanged => "viewchanged",
            EventKind::Click => "click",
            EventKind::ZoomStart => "zoomstart",
            EventKind::ZoomEnd => "zoomend",
            EventKind::MoveStart => "movestart",
            EventKind::MoveEnd => "moveend",
            EventKind::LayerAdd => "layeradd",
            EventKind::LayerRemove => "layerremove",
            EventKind::Loading => "loading",
            EventKind::Load => "load",
            EventKind::TileLoadStart => "tileloadstart",
            EventKind::TileLoad => "tileload",
            EventKind::TileError => "tileerror",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TileEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TileEvent::Loading => EventKind::Loading,
            TileEvent::Load => EventKind::Load,
            TileEvent::TileLoadStart { .. } => EventKind::TileLoadStart,
            TileEvent::TileLoad { .. } => EventKind::TileLoad,
            TileEvent::TileError { .. } => EventKind::TileError,
        }
    }
}

impl MapEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MapEvent::ViewChanged { .. } => EventKind::ViewChanged,
            MapEvent::Click { .. } => EventKind::Click,
            MapEvent::ZoomStart { .. } => EventKind::ZoomStart,
            MapEvent::ZoomEnd { .. } => EventKind::ZoomEnd,
            MapEvent::MoveStart { .. } => EventKind::MoveStart,
            MapEvent::MoveEnd { .. } => EventKind::MoveEnd,
            MapEvent::LayerAdd { .. } => EventKind::LayerAdd,
            MapEvent::LayerRemove { .. } => EventKind::LayerRemove,
            MapEvent::Tile { event, .. } => event.kind(),
        }
    }

    /// Whether the event marks the end of a pan or zoom
    pub fn is_view_settled(&self) -> bool {
        matches!(
            self,
            MapEvent::ViewChanged { .. } | MapEvent::MoveEnd { .. } | MapEvent::ZoomEnd { .. }
        )
    }
}
