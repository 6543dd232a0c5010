pub mod controls;
pub mod display;
#[cfg(feature = "egui")]
pub mod panel;

pub use controls::{
    AttributionControl, ControlPosition, MapControls, ScaleBar, ScaleControl, ZoomControl,
};
pub use display::{DisplaySink, ElementId, ElementState, TextDisplay};
#[cfg(feature = "egui")]
pub use panel::{StatusPanel, TilePainter, ViewAction};
