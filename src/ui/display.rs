use crate::prelude::HashMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A status element next to the map that the controller writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementId {
    Map,
    Coordinates,
    Loading,
    OpacitySlider,
    OpacityValue,
    CurrentZoom,
    CurrentCenter,
    TilesLoaded,
    Scale,
    Popup,
}

impl ElementId {
    pub const ALL: [ElementId; 10] = [
        ElementId::Map,
        ElementId::Coordinates,
        ElementId::Loading,
        ElementId::OpacitySlider,
        ElementId::OpacityValue,
        ElementId::CurrentZoom,
        ElementId::CurrentCenter,
        ElementId::TilesLoaded,
        ElementId::Scale,
        ElementId::Popup,
    ];

    /// The element's id in the viewer page markup
    pub fn dom_id(&self) -> &'static str {
        match self {
            ElementId::Map => "map",
            ElementId::Coordinates => "coordinates",
            ElementId::Loading => "loading",
            ElementId::OpacitySlider => "opacity-slider",
            ElementId::OpacityValue => "opacity-value",
            ElementId::CurrentZoom => "current-zoom",
            ElementId::CurrentCenter => "current-center",
            ElementId::TilesLoaded => "tiles-loaded",
            ElementId::Scale => "scale",
            ElementId::Popup => "popup",
        }
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dom_id())
    }
}

impl FromStr for ElementId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementId::ALL
            .iter()
            .copied()
            .find(|id| id.dom_id() == s)
            .ok_or_else(|| format!("unknown element id '{}'", s))
    }
}

/// Where status output goes. Writes to elements the sink does not have are
/// silently dropped.
pub trait DisplaySink {
    fn set_text(&mut self, id: ElementId, text: &str);
    fn set_visible(&mut self, id: ElementId, visible: bool);
    fn set_value(&mut self, id: ElementId, value: f64);
    fn has_element(&self, id: ElementId) -> bool;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementState {
    pub text: String,
    pub visible: bool,
    pub value: Option<f64>,
}

/// In-memory display, used headless and as the model behind the egui panel
#[derive(Debug, Clone)]
pub struct TextDisplay {
    elements: HashMap<ElementId, ElementState>,
}

impl TextDisplay {
    /// A display with every element; all visible except the loading indicator
    pub fn new() -> Self {
        Self::with_elements(&ElementId::ALL)
    }

    pub fn with_elements(ids: &[ElementId]) -> Self {
        let elements = ids
            .iter()
            .map(|&id| {
                let state = ElementState {
                    visible: id != ElementId::Loading,
                    ..Default::default()
                };
                (id, state)
            })
            .collect();
        Self { elements }
    }

    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.elements.get(&id).map(|e| e.text.as_str())
    }

    pub fn is_visible(&self, id: ElementId) -> Option<bool> {
        self.elements.get(&id).map(|e| e.visible)
    }

    pub fn value(&self, id: ElementId) -> Option<f64> {
        self.elements.get(&id).and_then(|e| e.value)
    }
}

impl Default for TextDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for TextDisplay {
    fn set_text(&mut self, id: ElementId, text: &str) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.text = text.to_string();
        }
    }

    fn set_visible(&mut self, id: ElementId, visible: bool) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.visible = visible;
        }
    }

    fn set_value(&mut self, id: ElementId, value: f64) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.value = Some(value);
        }
    }

    fn has_element(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }
}
