use crate::core::geo::LatLngBounds;
use std::any::Any;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Tile,
    Marker,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Tile => write!(f, "tile"),
            LayerType::Marker => write!(f, "marker"),
        }
    }
}

/// Anything that can be attached to a map
pub trait LayerTrait: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn layer_type(&self) -> LayerType;

    fn z_index(&self) -> i32;
    fn set_z_index(&mut self, z_index: i32);

    fn opacity(&self) -> f32;
    /// Implementations clamp to [0, 1]
    fn set_opacity(&mut self, opacity: f32);

    fn is_visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);

    /// Geographic extent of the layer's data, if limited
    fn bounds(&self) -> Option<LatLngBounds> {
        None
    }

    /// Layer-specific options as JSON, for inspection and debugging
    fn options(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
    pub layer_type: LayerType,
    pub z_index: i32,
    pub opacity: f32,
    pub visible: bool,
}

impl LayerProperties {
    pub fn new(id: String, name: String, layer_type: LayerType) -> Self {
        Self {
            id,
            name,
            layer_type,
            z_index: 0,
            opacity: 1.0,
            visible: true,
        }
    }
}

/// Opacity values outside [0, 1] are clamped; NaN becomes fully transparent
pub fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        0.0
    } else {
        opacity.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_properties() {
        let props = LayerProperties::new(
            "overlay".to_string(),
            "Overlay".to_string(),
            LayerType::Tile,
        );

        assert_eq!(props.id, "overlay");
        assert_eq!(props.name, "Overlay");
        assert_eq!(props.layer_type, LayerType::Tile);
        assert_eq!(props.z_index, 0);
        assert_eq!(props.opacity, 1.0);
        assert!(props.visible);
    }

    #[test]
    fn test_clamp_opacity() {
        assert_eq!(clamp_opacity(0.4), 0.4);
        assert_eq!(clamp_opacity(-1.0), 0.0);
        assert_eq!(clamp_opacity(3.0), 1.0);
        assert_eq!(clamp_opacity(f32::NAN), 0.0);
    }

    #[test]
    fn test_layer_type_display() {
        assert_eq!(LayerType::Tile.to_string(), "tile");
        assert_eq!(LayerType::Marker.to_string(), "marker");
    }
}
