//! Core TileLayer implementation

use super::{
    source::{TileSource, UrlTemplateSource},
    types::{
        Placeholder, RequestKind, TileLayerOptions, TileRequest, TileResponse, TileScheme,
        TileState,
    },
};
use crate::{
    core::{
        bounds::Bounds,
        geo::{LatLngBounds, Point, TileCoord},
        viewport::Viewport,
    },
    input::events::TileEvent,
    layers::base::{clamp_opacity, LayerProperties, LayerTrait, LayerType},
    prelude::{Arc, HashMap},
    MapError, Result,
};

/// Tiles kept on each side of the visible range before they are dropped
const KEEP_BUFFER_TILES: f64 = 1.0;

/// A layer of square raster tiles.
///
/// The layer decides which tiles the view needs and tracks their state; it
/// never does I/O itself. `update` hands back the requests to fetch and
/// `complete` feeds the outcome back in.
pub struct TileLayer {
    properties: LayerProperties,
    options: TileLayerOptions,
    source: Box<dyn TileSource>,
    placeholder: Option<Placeholder>,
    placeholder_requested: bool,
    tiles: HashMap<TileCoord, TileState>,
    tile_zoom: Option<u8>,
    loading: bool,
    events: Vec<TileEvent>,
}

impl TileLayer {
    pub fn new(id: String, source: Box<dyn TileSource>, options: TileLayerOptions) -> Result<Self> {
        if options.min_zoom > options.max_zoom {
            return Err(MapError::InvalidConfig(format!(
                "tile layer '{}': min_zoom {} exceeds max_zoom {}",
                id, options.min_zoom, options.max_zoom
            )));
        }
        if options.tile_size == 0 {
            return Err(MapError::InvalidConfig(format!(
                "tile layer '{}': tile_size must be positive",
                id
            )));
        }
        if let Some(bounds) = &options.bounds {
            if !bounds.is_valid() {
                return Err(MapError::InvalidCoordinates(format!(
                    "tile layer '{}': invalid bounds",
                    id
                )));
            }
        }

        let placeholder = options
            .error_tile_url
            .as_deref()
            .map(Placeholder::from_url)
            .transpose()?;

        let mut properties = LayerProperties::new(id, "Tile Layer".to_string(), LayerType::Tile);
        properties.opacity = clamp_opacity(options.opacity);
        properties.z_index = options.z_index;

        Ok(Self {
            properties,
            options,
            source,
            placeholder,
            placeholder_requested: false,
            tiles: HashMap::default(),
            tile_zoom: None,
            loading: false,
            events: Vec::new(),
        })
    }

    /// Builds a layer whose URLs come from a `{s}/{z}/{x}/{y}` template
    pub fn from_template(id: String, template: &str, options: TileLayerOptions) -> Result<Self> {
        let source = UrlTemplateSource::new(template, options.subdomains.clone(), options.scheme)?;
        Self::new(id, Box::new(source), options)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.properties.name = name.into();
        self
    }

    pub fn scheme(&self) -> TileScheme {
        self.options.scheme
    }

    pub fn attribution(&self) -> Option<&str> {
        self.options.attribution.as_deref()
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        self.placeholder.as_ref()
    }

    pub fn url_for(&self, coord: TileCoord) -> String {
        self.source.url(coord)
    }

    /// Zoom level tiles are currently being kept for
    pub fn tile_zoom(&self) -> Option<u8> {
        self.tile_zoom
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn tile_state(&self, coord: &TileCoord) -> Option<&TileState> {
        self.tiles.get(coord)
    }

    pub fn pending_count(&self) -> usize {
        self.tiles.values().filter(|t| t.is_loading()).count()
    }

    pub fn loaded_count(&self) -> usize {
        self.tiles.values().filter(|t| t.is_loaded()).count()
    }

    pub fn errored_count(&self) -> usize {
        self.tiles.values().filter(|t| t.is_errored()).count()
    }

    /// Tiles the viewport needs at its current zoom, nearest to the center first.
    /// Empty when the zoom is outside the layer's range.
    pub fn visible_tiles(&self, viewport: &Viewport) -> Vec<TileCoord> {
        let zoom = viewport.zoom_level();
        if zoom < self.options.min_zoom || zoom > self.options.max_zoom {
            return Vec::new();
        }

        let tile_size = self.options.tile_size as f64;
        let view = self.view_pixel_bounds(viewport, zoom);
        let center = view.center();
        let (min, max) = (view.min, view.max);

        let per_axis = TileCoord::tiles_per_axis(zoom) as i64;
        let min_x = (min.x / tile_size).floor() as i64;
        let max_x = (max.x / tile_size).ceil() as i64 - 1;
        let min_y = ((min.y / tile_size).floor() as i64).max(0);
        let max_y = ((max.y / tile_size).ceil() as i64 - 1).min(per_axis - 1);

        let tile_center = Point::new(center.x / tile_size, center.y / tile_size);
        let mut tiles: Vec<(f64, TileCoord)> = Vec::new();

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                // Columns wrap around the antimeridian.
                let wrapped_x = x.rem_euclid(per_axis) as u32;
                let coord = TileCoord::new(wrapped_x, y as u32, zoom);
                if !self.is_within_bounds(&coord) {
                    continue;
                }
                if tiles.iter().any(|(_, c)| *c == coord) {
                    continue;
                }
                let distance = Point::new(x as f64 + 0.5, y as f64 + 0.5).distance_to(&tile_center);
                tiles.push((distance, coord));
            }
        }

        tiles.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        tiles.into_iter().map(|(_, coord)| coord).collect()
    }

    /// World pixel bounds of the viewport at tile zoom `zoom`
    fn view_pixel_bounds(&self, viewport: &Viewport, zoom: u8) -> Bounds {
        let center = viewport.project(&viewport.center, Some(zoom as f64));
        Bounds::from_center(center, viewport.size)
    }

    fn is_within_bounds(&self, coord: &TileCoord) -> bool {
        match &self.options.bounds {
            Some(bounds) => bounds.intersects(&coord.bounds()),
            None => true,
        }
    }

    /// Brings the tile set in line with the viewport and returns the tiles
    /// that need fetching. Tiles already loading, loaded or errored are not
    /// requested again.
    pub fn update(&mut self, viewport: &Viewport) -> Vec<TileRequest> {
        if !self.properties.visible {
            return Vec::new();
        }

        let zoom = viewport.zoom_level();
        if zoom < self.options.min_zoom || zoom > self.options.max_zoom {
            log::debug!(
                "tile layer '{}' idle at zoom {} (range {}-{})",
                self.properties.id,
                zoom,
                self.options.min_zoom,
                self.options.max_zoom
            );
            return Vec::new();
        }

        self.prune(viewport, zoom);
        self.tile_zoom = Some(zoom);

        let missing: Vec<TileCoord> = self
            .visible_tiles(viewport)
            .into_iter()
            .filter(|coord| !self.tiles.contains_key(coord))
            .collect();

        if !missing.is_empty() && !self.loading {
            self.loading = true;
            self.events.push(TileEvent::Loading);
        }

        let mut requests = Vec::with_capacity(missing.len());
        for coord in missing {
            self.tiles.insert(coord, TileState::Loading);
            self.events.push(TileEvent::TileLoadStart { coord });
            requests.push(TileRequest::tile(
                self.properties.id.clone(),
                coord,
                self.source.url(coord),
            ));
        }
        requests.extend(self.placeholder_request());

        // Pruning can drop the last pending tile.
        self.finish_if_idle();

        if !requests.is_empty() {
            log::debug!(
                "tile layer '{}' requesting {} tiles at zoom {}",
                self.properties.id,
                requests.len(),
                zoom
            );
        }
        requests
    }

    /// Drops tiles from other zooms and tiles more than `KEEP_BUFFER_TILES`
    /// outside the view. Dropped tiles still loading become stale.
    fn prune(&mut self, viewport: &Viewport, zoom: u8) {
        let tile_size = self.options.tile_size as f64;
        let keep = self
            .view_pixel_bounds(viewport, zoom)
            .expanded(KEEP_BUFFER_TILES * tile_size);
        let world = TileCoord::tiles_per_axis(zoom) as f64 * tile_size;

        let before = self.tiles.len();
        self.tiles.retain(|coord, _| {
            if coord.z != zoom {
                return false;
            }
            let x = (coord.x as f64 + 0.5) * tile_size;
            let y = (coord.y as f64 + 0.5) * tile_size;
            // Wrapped copies one world to either side.
            [-world, 0.0, world]
                .iter()
                .any(|shift| keep.contains(&Point::new(x + shift, y)))
        });

        let dropped = before - self.tiles.len();
        if dropped > 0 {
            log::debug!(
                "tile layer '{}' pruned {} tiles outside the view",
                self.properties.id,
                dropped
            );
        }
    }

    /// One fetch of a remote error tile, once some tile has failed
    fn placeholder_request(&mut self) -> Option<TileRequest> {
        if self.placeholder_requested {
            return None;
        }
        let Some(Placeholder::Remote(url)) = &self.placeholder else {
            return None;
        };
        let (coord, _) = self.tiles.iter().find(|(_, state)| state.is_errored())?;

        let request = TileRequest::error_tile(self.properties.id.clone(), *coord, url.clone());
        self.placeholder_requested = true;
        Some(request)
    }

    fn complete_placeholder(&mut self, response: TileResponse) {
        match response.result {
            Ok(data) => {
                log::debug!(
                    "tile layer '{}' loaded error tile from {}",
                    self.properties.id,
                    response.url
                );
                self.placeholder = Some(Placeholder::Inline(Arc::new(data)));
            }
            Err(error) => log::warn!(
                "tile layer '{}' could not load error tile {}: {}",
                self.properties.id,
                response.url,
                error
            ),
        }
    }

    fn finish_if_idle(&mut self) {
        if self.loading && self.pending_count() == 0 {
            self.loading = false;
            self.events.push(TileEvent::Load);
        }
    }

    /// Records the outcome of a fetch. Responses for tiles the layer no
    /// longer tracks are ignored.
    pub fn complete(&mut self, response: TileResponse) {
        if response.kind == RequestKind::ErrorTile {
            self.complete_placeholder(response);
            return;
        }

        match self.tiles.get(&response.coord) {
            Some(TileState::Loading) => {}
            _ => {
                log::debug!(
                    "tile layer '{}' ignoring stale response for {}",
                    self.properties.id,
                    response.coord
                );
                return;
            }
        }

        let coord = response.coord;
        match response.result {
            Ok(data) => {
                self.tiles.insert(coord, TileState::Loaded(Arc::new(data)));
                self.events.push(TileEvent::TileLoad { coord });
            }
            Err(error) => {
                log::debug!(
                    "tile layer '{}' failed to load {} from {}: {}",
                    self.properties.id,
                    coord,
                    response.url,
                    error
                );
                self.tiles.insert(
                    coord,
                    TileState::Errored {
                        error: error.clone(),
                    },
                );
                self.events.push(TileEvent::TileError {
                    coord,
                    url: response.url,
                    error,
                });
            }
        }

        self.finish_if_idle();
    }

    /// Takes the events produced since the last call, oldest first
    pub fn drain_events(&mut self) -> Vec<TileEvent> {
        std::mem::take(&mut self.events)
    }

    /// Image bytes to draw for `coord`: the tile itself once loaded, the
    /// placeholder once errored (after it arrives, when remote), nothing
    /// while loading.
    pub fn display_data(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        match self.tiles.get(coord)? {
            TileState::Loaded(data) => Some(data.clone()),
            TileState::Errored { .. } => self
                .placeholder
                .as_ref()
                .and_then(|p| p.inline_data())
                .cloned(),
            TileState::Loading => None,
        }
    }
}

impl LayerTrait for TileLayer {
    crate::impl_layer_trait!(properties);

    fn bounds(&self) -> Option<LatLngBounds> {
        self.options.bounds
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "tile_size": self.options.tile_size,
            "min_zoom": self.options.min_zoom,
            "max_zoom": self.options.max_zoom,
            "attribution": self.options.attribution,
            "scheme": self.options.scheme,
            "subdomains": self.options.subdomains,
            "opacity": self.properties.opacity,
        })
    }
}
