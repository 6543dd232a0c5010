pub mod events;
pub mod handler;

// Re-export the essential types
pub use events::{EventKind, MapEvent, TileEvent};
pub use handler::{EventCallback, EventManager};
