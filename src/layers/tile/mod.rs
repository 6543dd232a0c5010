//! Raster tile layers: which tiles a view needs, where to fetch them, and
//! what to show while they load or after they fail.

#[cfg(feature = "tokio-runtime")]
pub mod loader;
pub mod layer;
pub mod source;
pub mod types;

pub use layer::TileLayer;
#[cfg(feature = "tokio-runtime")]
pub use loader::{HttpFetcher, TileFetcher, TileLoader, TileLoaderConfig};
pub use source::{TileSource, UrlTemplateSource};
pub use types::{
    Placeholder, RequestKind, TileLayerOptions, TileRequest, TileResponse, TileScheme, TileState,
};
