//! Core constants derived from Leaflet defaults and common web-map conventions.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Snap zoom levels to these quanta (1 → integer zooms).
pub const DEFAULT_ZOOM_SNAP: f64 = 1.0;

/// Programmatic +/- zoom step when calling `zoom_in/zoom_out`.
pub const DEFAULT_ZOOM_DELTA: f64 = 1.0;

/// Web Mercator sphere radius in meters (EPSG:3857).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit of the Web Mercator square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Ratio by which the data bounds are grown before being used as max bounds.
pub const DEFAULT_MAX_BOUNDS_PAD: f64 = 0.1;

/// Default pixel padding used by `fit_bounds`.
pub const DEFAULT_FIT_PADDING: f64 = 0.0;

/// Decimal places shown in coordinate readouts.
pub const COORDINATE_PRECISION: usize = 6;

/// Decimal places shown in the opacity readout.
pub const OPACITY_PRECISION: usize = 1;

/// Transparent 1x1 PNG used in place of tiles that failed to load.
pub const TRANSPARENT_PIXEL_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Basemap used unconditionally as the backdrop.
pub const OSM_URL_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_ATTRIBUTION: &str = "© OpenStreetMap contributors";
pub const OSM_MAX_ZOOM: u8 = 19;

/// Maximum width of the scale bar in pixels.
pub const SCALE_MAX_WIDTH: f64 = 100.0;
