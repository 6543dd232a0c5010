use crate::{
    core::{
        constants::DEFAULT_ZOOM_DELTA,
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    input::{EventKind, EventManager, MapEvent},
    layers::{
        base::{LayerTrait, LayerType},
        manager::LayerManager,
        tile::{TileLayer, TileRequest, TileResponse},
    },
    MapError, Result,
};

#[derive(Debug, Clone)]
pub struct MapOptions {
    pub max_bounds: Option<LatLngBounds>,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    /// Zoom step used by `zoom_in`/`zoom_out`
    pub zoom_delta: f64,
    pub zoom_control: bool,
    pub attribution_control: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            max_bounds: None,
            min_zoom: None,
            max_zoom: None,
            zoom_delta: DEFAULT_ZOOM_DELTA,
            zoom_control: true,
            attribution_control: true,
        }
    }
}

/// Viewport, layers and event queue of one map instance.
///
/// Every mutating operation queues the matching `MapEvent`s; nothing is
/// dispatched until `process_events` is called.
pub struct Map {
    pub viewport: Viewport,
    layer_manager: LayerManager,
    event_manager: EventManager,
    options: MapOptions,
}

impl Map {
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        let viewport = Viewport::new(center, zoom, size);
        Self::with_options(viewport, MapOptions::default())
    }

    pub fn with_options(viewport: Viewport, options: MapOptions) -> Self {
        let mut map = Self {
            viewport,
            layer_manager: LayerManager::new(),
            event_manager: EventManager::new(),
            options,
        };

        if let (Some(min), Some(max)) = (map.options.min_zoom, map.options.max_zoom) {
            map.viewport.set_zoom_limits(min, max);
        }
        if map.options.max_bounds.is_some() {
            map.viewport.set_max_bounds(map.options.max_bounds);
        }

        map
    }

    pub fn set_view(&mut self, center: LatLng, zoom: f64) -> Result<()> {
        if !center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "cannot center on {}",
                center.format(6)
            )));
        }

        let old_center = self.viewport.center;
        let old_zoom = self.viewport.zoom;

        self.viewport.set_view(center, zoom);

        if self.viewport.center != old_center || self.viewport.zoom != old_zoom {
            self.event_manager.emit(MapEvent::ViewChanged {
                center: self.viewport.center,
                zoom: self.viewport.zoom,
            });
        }

        Ok(())
    }

    /// Pans by a pixel offset (positive x east, positive y south) and
    /// returns the offset actually applied after max-bounds limiting.
    pub fn pan_by(&mut self, offset: Point) -> Point {
        if offset.x == 0.0 && offset.y == 0.0 {
            self.event_manager.emit(MapEvent::MoveEnd {
                center: self.viewport.center,
            });
            return offset;
        }

        self.event_manager.emit(MapEvent::MoveStart {
            center: self.viewport.center,
        });
        let applied = self.viewport.pan(offset);
        self.event_manager.emit(MapEvent::MoveEnd {
            center: self.viewport.center,
        });

        applied
    }

    /// Zooms to `zoom`, keeping `focus_point` (container pixels) fixed if given
    pub fn zoom_to(&mut self, zoom: f64, focus_point: Option<Point>) {
        let old_zoom = self.viewport.zoom;

        self.viewport.zoom_to(zoom, focus_point);

        if self.viewport.zoom != old_zoom {
            self.event_manager.emit(MapEvent::ZoomStart { zoom: old_zoom });
            self.event_manager.emit(MapEvent::ZoomEnd {
                zoom: self.viewport.zoom,
            });
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom_to(self.viewport.zoom + self.options.zoom_delta, None);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_to(self.viewport.zoom - self.options.zoom_delta, None);
    }

    pub fn set_max_bounds(&mut self, bounds: Option<LatLngBounds>) {
        self.options.max_bounds = bounds;
        self.viewport.set_max_bounds(bounds);
    }

    pub fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: Option<f64>) -> Result<()> {
        if !bounds.is_valid() {
            return Err(MapError::InvalidCoordinates(
                "cannot fit inverted or out of range bounds".to_string(),
            ));
        }

        let old_center = self.viewport.center;
        let old_zoom = self.viewport.zoom;

        self.viewport.fit_bounds(bounds, padding);

        if self.viewport.center != old_center || self.viewport.zoom != old_zoom {
            self.event_manager.emit(MapEvent::ViewChanged {
                center: self.viewport.center,
                zoom: self.viewport.zoom,
            });
        }

        Ok(())
    }

    /// Changes the container size; the center stays put
    pub fn resize(&mut self, size: Point) {
        if self.viewport.size == size {
            return;
        }
        self.viewport.set_size(size);
        self.event_manager.emit(MapEvent::MoveEnd {
            center: self.viewport.center,
        });
    }

    /// Converts a click at container pixel `pixel` into a `Click` event
    pub fn click(&mut self, pixel: Point) -> LatLng {
        let lat_lng = self.viewport.pixel_to_lat_lng(&pixel);
        self.event_manager.emit(MapEvent::Click { lat_lng, pixel });
        lat_lng
    }

    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        let layer_id = layer.id().to_string();
        self.layer_manager.add_layer(layer)?;
        self.event_manager.emit(MapEvent::LayerAdd { layer_id });
        Ok(())
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        let removed = self.layer_manager.remove_layer(layer_id);
        if removed.is_some() {
            self.event_manager.emit(MapEvent::LayerRemove {
                layer_id: layer_id.to_string(),
            });
        }
        removed
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layer_manager.get_layer(layer_id)
    }

    pub fn get_layer_mut(&mut self, layer_id: &str) -> Option<&mut dyn LayerTrait> {
        self.layer_manager.get_layer_mut(layer_id)
    }

    pub fn layer_as<T: 'static>(&self, layer_id: &str) -> Option<&T> {
        self.layer_manager.layer_as::<T>(layer_id)
    }

    pub fn layer_as_mut<T: 'static>(&mut self, layer_id: &str) -> Option<&mut T> {
        self.layer_manager.layer_as_mut::<T>(layer_id)
    }

    pub fn list_layers(&self) -> Vec<String> {
        self.layer_manager.list_layers()
    }

    /// Layers in draw order
    pub fn layers(&self) -> Vec<&dyn LayerTrait> {
        self.layer_manager.layers()
    }

    fn tile_layer_ids(&self) -> Vec<String> {
        self.layer_manager
            .layers()
            .into_iter()
            .filter(|layer| layer.layer_type() == LayerType::Tile)
            .map(|layer| layer.id().to_string())
            .collect()
    }

    /// Updates every tile layer for the current view and returns what they
    /// want fetched. Tile events produced on the way are queued.
    pub fn update_tile_layers(&mut self) -> Vec<TileRequest> {
        let mut requests = Vec::new();

        for layer_id in self.tile_layer_ids() {
            let Some(layer) = self.layer_manager.layer_as_mut::<TileLayer>(&layer_id) else {
                continue;
            };
            requests.extend(layer.update(&self.viewport));
            self.relay_tile_events(&layer_id);
        }

        requests
    }

    /// Hands a fetch result to the layer that asked for it
    pub fn deliver_tile(&mut self, response: TileResponse) {
        let layer_id = response.layer_id.clone();
        match self.layer_manager.layer_as_mut::<TileLayer>(&layer_id) {
            Some(layer) => layer.complete(response),
            None => {
                log::debug!("dropping tile {} for removed layer '{}'", response.coord, layer_id);
                return;
            }
        }
        self.relay_tile_events(&layer_id);
    }

    fn relay_tile_events(&mut self, layer_id: &str) {
        let events = match self.layer_manager.layer_as_mut::<TileLayer>(layer_id) {
            Some(layer) => layer.drain_events(),
            None => return,
        };
        for event in events {
            self.event_manager.emit(MapEvent::Tile {
                layer_id: layer_id.to_string(),
                event,
            });
        }
    }

    pub fn on<F>(&mut self, kind: EventKind, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.event_manager.on(kind, callback);
    }

    pub fn emit(&mut self, event: MapEvent) {
        self.event_manager.emit(event);
    }

    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.event_manager.process_events()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }
}
