use crate::{
    core::geo::{LatLng, LatLngBounds},
    layers::base::{LayerProperties, LayerTrait, LayerType},
};

/// Text bound to a marker, shown when the popup is open
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub body: String,
}

impl Popup {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Title and body on separate lines
    pub fn text(&self) -> String {
        if self.body.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n{}", self.title, self.body)
        }
    }
}

pub struct Marker {
    properties: LayerProperties,
    position: LatLng,
    popup: Option<Popup>,
    popup_open: bool,
}

impl Marker {
    pub fn new(id: String, position: LatLng) -> Self {
        let mut properties = LayerProperties::new(id, "Marker".to_string(), LayerType::Marker);
        // Markers sit above tile layers.
        properties.z_index = 100;
        Self {
            properties,
            position,
            popup: None,
            popup_open: false,
        }
    }

    pub fn with_popup(mut self, popup: Popup) -> Self {
        self.popup = Some(popup);
        self
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn set_position(&mut self, position: LatLng) {
        self.position = position;
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    /// Opens the popup; returns false when the marker has none
    pub fn open_popup(&mut self) -> bool {
        self.popup_open = self.popup.is_some();
        self.popup_open
    }

    pub fn is_popup_open(&self) -> bool {
        self.popup_open
    }
}

impl LayerTrait for Marker {
    crate::impl_layer_trait!(properties);

    fn bounds(&self) -> Option<LatLngBounds> {
        Some(LatLngBounds::new(self.position, self.position))
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "position": {
                "lat": self.position.lat,
                "lng": self.position.lng
            },
            "popup": self.popup.as_ref().map(|p| p.text()),
            "popup_open": self.popup_open,
        })
    }
}
