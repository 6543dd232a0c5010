//! The map view controller: one owned object holding the map, its two tile
//! layers and the status readouts next to it.

use crate::{
    core::{
        constants::{COORDINATE_PRECISION, OPACITY_PRECISION},
        config::MapConfig,
        geo::{LatLng, LatLngBounds, Point},
        map::{Map, MapOptions},
        viewport::Viewport,
    },
    input::{MapEvent, TileEvent},
    layers::{
        base::{clamp_opacity, LayerTrait},
        marker::{Marker, Popup},
        tile::{TileLayer, TileLayerOptions, TileRequest, TileResponse, TileScheme},
    },
    ui::{
        controls::ScaleControl,
        display::{DisplaySink, ElementId, TextDisplay},
    },
    Result,
};

#[cfg(feature = "tokio-runtime")]
use crate::layers::tile::TileLoader;

pub const BASE_LAYER_ID: &str = "base";
pub const OVERLAY_LAYER_ID: &str = "overlay";
pub const MARKER_ID: &str = "center-marker";

/// Number of overlay load cycles in progress. Never negative; the loading
/// indicator is shown while it is above zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingCounter {
    count: u32,
}

impl LoadingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> u32 {
        self.count += 1;
        self.count
    }

    /// Decrements, stopping at zero
    pub fn end(&mut self) -> u32 {
        self.count = self.count.saturating_sub(1);
        self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_active(&self) -> bool {
        self.count > 0
    }
}

pub struct MapViewController<D: DisplaySink = TextDisplay> {
    map: Map,
    config: MapConfig,
    data_bounds: LatLngBounds,
    display: D,
    loading: LoadingCounter,
    tiles_loaded: u64,
    scale: ScaleControl,
}

impl<D: DisplaySink> MapViewController<D> {
    /// Builds the map: viewport, base layer, then the TMS overlay, max bounds
    /// around the data, fit to the data, and the center marker.
    pub fn initialize(config: MapConfig, display: D) -> Result<Self> {
        config.validate()?;

        let data_bounds = config.data_bounds();
        let viewport = Viewport::new(
            config.center(),
            config.default_zoom as f64,
            config.viewport_size(),
        );
        let options = MapOptions {
            min_zoom: Some(config.min_zoom as f64),
            max_zoom: Some(config.max_zoom as f64),
            ..Default::default()
        };
        let mut map = Map::with_options(viewport, options);

        let base_options = TileLayerOptions {
            max_zoom: config.base_layer.max_zoom,
            attribution: Some(config.base_layer.attribution.clone()),
            subdomains: config.base_layer.subdomains.clone(),
            z_index: 0,
            ..Default::default()
        };
        let base = TileLayer::from_template(
            BASE_LAYER_ID.to_string(),
            &config.base_layer.url_template,
            base_options,
        )?
        .with_name("OpenStreetMap");
        map.add_layer(Box::new(base))?;

        let overlay_template = config.overlay_url_template();
        let overlay_options = TileLayerOptions {
            max_zoom: config.max_zoom,
            attribution: Some(config.overlay_attribution.clone()),
            opacity: config.overlay_opacity,
            z_index: 1,
            subdomains: Vec::new(),
            error_tile_url: Some(config.error_tile_url.clone()),
            scheme: TileScheme::Tms,
            bounds: Some(data_bounds),
            ..Default::default()
        };
        let overlay =
            TileLayer::from_template(OVERLAY_LAYER_ID.to_string(), &overlay_template, overlay_options)?
                .with_name(config.bucket_name.clone());
        map.add_layer(Box::new(overlay))?;

        map.set_max_bounds(Some(data_bounds.pad(config.max_bounds_pad)));
        map.fit_bounds(&data_bounds, Some(config.fit_padding))?;

        let mut popup_text = None;
        if config.marker.enabled {
            let popup = Popup::new(config.marker.title.clone(), config.marker.description.clone());
            popup_text = Some(popup.text());
            let mut marker = Marker::new(MARKER_ID.to_string(), config.center()).with_popup(popup);
            marker.open_popup();
            map.add_layer(Box::new(marker))?;
        }

        log::info!("overlay map initialized");
        log::info!("tile URL template: {}", overlay_template);
        log::info!(
            "map bounds: north {}, south {}, east {}, west {}",
            data_bounds.north(),
            data_bounds.south(),
            data_bounds.east(),
            data_bounds.west()
        );
        log::info!("TMS coordinate system enabled");

        let mut controller = Self {
            map,
            config,
            data_bounds,
            display,
            loading: LoadingCounter::new(),
            tiles_loaded: 0,
            scale: ScaleControl::default(),
        };

        controller.display.set_visible(ElementId::Loading, false);
        controller
            .display
            .set_text(ElementId::TilesLoaded, &controller.tiles_loaded.to_string());
        if let Some(text) = popup_text {
            controller.display.set_text(ElementId::Popup, &text);
        }
        let opacity = controller.config.overlay_opacity;
        controller.show_opacity(opacity);
        controller.on_viewport_change();
        controller.process_events();

        Ok(controller)
    }

    /// Drains the map's event queue and routes each event to its handler
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events = self.map.process_events();

        for event in &events {
            match event {
                MapEvent::Click { lat_lng, .. } => self.on_click(*lat_lng),
                MapEvent::Tile { layer_id, event } if layer_id == OVERLAY_LAYER_ID => match event {
                    TileEvent::Loading => self.on_tile_load_begin(),
                    TileEvent::Load => self.on_tile_load_end(),
                    TileEvent::TileLoad { .. } => self.on_tile_loaded(),
                    TileEvent::TileError { .. } => self.on_tile_error(event),
                    TileEvent::TileLoadStart { .. } => {}
                },
                other if other.is_view_settled() => self.on_viewport_change(),
                _ => {}
            }
        }

        events
    }

    /// Refreshes the readouts from the current center and zoom
    pub fn on_viewport_change(&mut self) {
        let center = self.map.viewport.center;
        let zoom = self.map.viewport.zoom_level();

        self.write_coordinates(center, zoom);
        self.display
            .set_text(ElementId::CurrentZoom, &zoom.to_string());
        self.display
            .set_text(ElementId::CurrentCenter, &center.format(COORDINATE_PRECISION));

        if let Some(bar) = self.scale.bar(&self.map.viewport) {
            self.display.set_text(ElementId::Scale, &bar.label);
        }
    }

    pub fn on_click(&mut self, lat_lng: LatLng) {
        let zoom = self.map.viewport.zoom_level();
        self.write_coordinates(lat_lng, zoom);
    }

    fn write_coordinates(&mut self, lat_lng: LatLng, zoom: u8) {
        let text = format!(
            "Lat: {:.*}, Lng: {:.*}\nZoom: {}",
            COORDINATE_PRECISION, lat_lng.lat, COORDINATE_PRECISION, lat_lng.lng, zoom
        );
        self.display.set_text(ElementId::Coordinates, &text);
    }

    pub fn on_tile_load_begin(&mut self) {
        self.loading.begin();
        self.display
            .set_visible(ElementId::Loading, self.loading.is_active());
    }

    pub fn on_tile_load_end(&mut self) {
        self.loading.end();
        self.display
            .set_visible(ElementId::Loading, self.loading.is_active());
    }

    pub fn on_tile_loaded(&mut self) {
        self.tiles_loaded += 1;
        self.display
            .set_text(ElementId::TilesLoaded, &self.tiles_loaded.to_string());
    }

    /// Logs the failure. The layer already shows its placeholder for the tile.
    pub fn on_tile_error(&mut self, event: &TileEvent) {
        if let TileEvent::TileError { coord, url, error } = event {
            log::warn!("tile loading error at {} ({}): {}", coord, url, error);
        }
    }

    /// Clamps to [0, 1] (NaN becomes 0), applies it to the overlay and
    /// returns the value applied
    pub fn set_overlay_opacity(&mut self, value: f32) -> f32 {
        let opacity = clamp_opacity(value);
        if let Some(layer) = self.map.layer_as_mut::<TileLayer>(OVERLAY_LAYER_ID) {
            layer.set_opacity(opacity);
        }
        self.show_opacity(opacity);
        opacity
    }

    fn show_opacity(&mut self, opacity: f32) {
        self.display.set_text(
            ElementId::OpacityValue,
            &format!("{:.*}", OPACITY_PRECISION, opacity),
        );
        self.display
            .set_value(ElementId::OpacitySlider, opacity as f64);
    }

    /// Pans by a pixel offset and returns the offset applied after limiting
    pub fn pan_by(&mut self, offset: Point) -> Point {
        let applied = self.map.pan_by(offset);
        self.process_events();
        applied
    }

    pub fn zoom_in(&mut self) {
        self.map.zoom_in();
        self.process_events();
    }

    pub fn zoom_out(&mut self) {
        self.map.zoom_out();
        self.process_events();
    }

    pub fn zoom_to(&mut self, zoom: f64, focus: Option<Point>) {
        self.map.zoom_to(zoom, focus);
        self.process_events();
    }

    /// A click at container pixel `pixel`; returns the clicked coordinate
    pub fn click_at(&mut self, pixel: Point) -> LatLng {
        let lat_lng = self.map.click(pixel);
        self.process_events();
        lat_lng
    }

    pub fn resize(&mut self, size: Point) {
        self.map.resize(size);
        self.process_events();
    }

    /// Tile requests the layers need for the current view
    pub fn update_tiles(&mut self) -> Vec<TileRequest> {
        let requests = self.map.update_tile_layers();
        self.process_events();
        requests
    }

    /// Feeds finished fetches back into their layers
    pub fn deliver(&mut self, responses: Vec<TileResponse>) {
        if responses.is_empty() {
            return;
        }
        for response in responses {
            self.map.deliver_tile(response);
        }
        self.process_events();
    }

    /// One frame of tile work: request what the view needs, collect what
    /// has arrived. Returns the number of results delivered.
    #[cfg(feature = "tokio-runtime")]
    pub fn tick(&mut self, loader: &TileLoader) -> usize {
        let requests = self.update_tiles();
        if !requests.is_empty() {
            loader.submit(requests);
        }

        let results = loader.try_recv_results();
        let delivered = results.len();
        self.deliver(results);
        delivered
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn overlay(&self) -> Option<&TileLayer> {
        self.map.layer_as::<TileLayer>(OVERLAY_LAYER_ID)
    }

    pub fn base_layer(&self) -> Option<&TileLayer> {
        self.map.layer_as::<TileLayer>(BASE_LAYER_ID)
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Extent of the overlay tile set, before padding
    pub fn data_bounds(&self) -> LatLngBounds {
        self.data_bounds
    }

    pub fn loading_counter(&self) -> LoadingCounter {
        self.loading
    }

    pub fn tiles_loaded(&self) -> u64 {
        self.tiles_loaded
    }

    pub fn display(&self) -> &D {
        &self.display
    }
}
