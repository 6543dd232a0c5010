use crate::core::{
    bounds::Bounds,
    constants::{DEFAULT_ZOOM_SNAP, EARTH_RADIUS, MAX_LATITUDE, TILE_SIZE},
    geo::{LatLng, LatLngBounds, Point},
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Snapshot of what the map currently shows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub center: LatLng,
    pub zoom: u8,
    pub bounds: LatLngBounds,
}

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level, always a multiple of the zoom snap
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
    /// Area the visible region must stay inside
    max_bounds: Option<LatLngBounds>,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom: snap_zoom(zoom).clamp(0.0, 18.0),
            size,
            min_zoom: 0.0,
            max_zoom: 18.0,
            max_bounds: None,
        }
    }

    /// Sets the maximum bounds and pulls the current center inside them
    pub fn set_max_bounds(&mut self, bounds: Option<LatLngBounds>) {
        self.max_bounds = bounds;
        self.center = self.limit_center(self.center, self.zoom);
    }

    /// Get the maximum bounds for the map if set
    pub fn max_bounds(&self) -> Option<&LatLngBounds> {
        self.max_bounds.as_ref()
    }

    /// Sets the center of the viewport with bounds checking
    pub fn set_center(&mut self, center: LatLng) {
        self.center = self.limit_center(center, self.zoom);
    }

    /// Sets the zoom level, snapping and clamping to the valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = self.clamp_zoom(zoom);
        self.center = self.limit_center(self.center, self.zoom);
    }

    /// Sets center and zoom together
    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.zoom = self.clamp_zoom(zoom);
        self.center = self.limit_center(center, self.zoom);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
        self.center = self.limit_center(self.center, self.zoom);
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.clamp_zoom(self.zoom);
    }

    /// Zoom rounded to the integer level tiles are requested at
    pub fn zoom_level(&self) -> u8 {
        self.zoom.round().clamp(0.0, u8::MAX as f64) as u8
    }

    /// Gets the scale factor for the current zoom level
    pub fn scale(&self) -> f64 {
        2_f64.powf(self.zoom)
    }

    /// Projects a LatLng to world pixel coordinates (EPSG:3857)
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let z = zoom.unwrap_or(self.zoom);
        let world_size = TILE_SIZE as f64 * 2_f64.powf(z);
        let lat_rad = lat_lng.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

        let x = (lat_lng.lng + 180.0) / 360.0 * world_size;
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * world_size;

        Point::new(x, y)
    }

    /// Unprojects world pixel coordinates back to LatLng
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let z = zoom.unwrap_or(self.zoom);
        let world_size = TILE_SIZE as f64 * 2_f64.powf(z);

        let lng = pixel.x / world_size * 360.0 - 180.0;
        let n = PI * (1.0 - 2.0 * pixel.y / world_size);
        let lat = n.sinh().atan().to_degrees();

        LatLng::new(lat, lng)
    }

    /// World pixel of the container's top-left corner
    pub fn pixel_origin(&self) -> Point {
        self.project(&self.center, None)
            .subtract(&self.size.multiply(0.5))
    }

    /// Converts a geographical coordinate to container pixel coordinates
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        self.project(lat_lng, None).subtract(&self.pixel_origin())
    }

    /// Converts container pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        self.unproject(&pixel.add(&self.pixel_origin()), None)
    }

    /// Shifts the view by `offset` pixels (positive x moves the view east,
    /// positive y south) and returns the offset actually applied after
    /// bounds limiting.
    pub fn pan(&mut self, offset: Point) -> Point {
        let before = self.project(&self.center, None);
        let target = self.unproject(&before.add(&offset), None);
        self.center = self.limit_center(target, self.zoom);

        self.project(&self.center, None).subtract(&before)
    }

    /// Zooms the viewport to a specific level, keeping `focus_point`
    /// (container pixels) over the same geographic location when given
    pub fn zoom_to(&mut self, zoom: f64, focus_point: Option<Point>) {
        let new_zoom = self.clamp_zoom(zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let new_center = match focus_point {
            Some(focus) => {
                let scale = 2_f64.powf(new_zoom - self.zoom);
                let view_half = self.size.multiply(0.5);
                let center_offset = focus.subtract(&view_half).multiply(1.0 - 1.0 / scale);
                self.pixel_to_lat_lng(&view_half.add(&center_offset))
            }
            None => self.center,
        };

        self.zoom = new_zoom;
        self.center = self.limit_center(new_center, new_zoom);
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&self.size);

        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }

    /// Zoom at which `bounds` fits in the viewport minus `padding` pixels
    /// on each side, floored to the zoom snap and clamped to the limits
    pub fn bounds_zoom(&self, bounds: &LatLngBounds, padding: f64) -> f64 {
        let available = Point::new(
            (self.size.x - 2.0 * padding).max(0.0),
            (self.size.y - 2.0 * padding).max(0.0),
        );
        let nw = self.project(&bounds.north_west(), None);
        let se = self.project(&bounds.south_east(), None);
        let bounds_size = se.subtract(&nw);

        let scale = (available.x / bounds_size.x).min(available.y / bounds_size.y);
        if !scale.is_finite() || scale <= 0.0 {
            return self.clamp_zoom(self.min_zoom);
        }

        let zoom = self.zoom + scale.log2();
        // Tolerate float noise before flooring.
        let zoom = (zoom * 100.0).round() / 100.0;
        let zoom = (zoom / DEFAULT_ZOOM_SNAP).floor() * DEFAULT_ZOOM_SNAP;

        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Fits the viewport to contain the given bounds
    pub fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: Option<f64>) {
        let padding = padding.unwrap_or(0.0);
        let zoom = self.bounds_zoom(bounds, padding);

        let sw = self.project(&bounds.south_west, Some(zoom));
        let ne = self.project(&bounds.north_east, Some(zoom));
        let center = self.unproject(&sw.add(&ne).multiply(0.5), Some(zoom));

        self.set_view(center, zoom);
    }

    /// Ground resolution in meters per pixel at the center latitude
    pub fn resolution(&self) -> f64 {
        let circumference = 2.0 * PI * EARTH_RADIUS;
        circumference * self.center.lat.to_radians().cos() / (TILE_SIZE as f64 * self.scale())
    }

    /// Current center, integer zoom and visible bounds
    pub fn state(&self) -> ViewportState {
        ViewportState {
            center: self.center,
            zoom: self.zoom_level(),
            bounds: self.bounds(),
        }
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.zoom;
        }
        snap_zoom(zoom).clamp(self.min_zoom, self.max_zoom)
    }

    /// Moves `center` so that the visible area at `zoom` stays inside the
    /// max bounds. On an axis where the visible area is larger than the
    /// bounds, the view is centered on the bounds instead.
    fn limit_center(&self, center: LatLng, zoom: f64) -> LatLng {
        let center = LatLng::new(
            LatLng::clamp_lat(center.lat),
            center.lng.clamp(-180.0, 180.0),
        );

        let Some(max_bounds) = self.max_bounds else {
            return center;
        };

        let center_point = self.project(&center, Some(zoom));
        let view = Bounds::from_center(center_point, self.size);
        let limit = Bounds::new(
            self.project(&max_bounds.north_west(), Some(zoom)),
            self.project(&max_bounds.south_east(), Some(zoom)),
        );

        let min_offset = limit.min.subtract(&view.min);
        let max_offset = limit.max.subtract(&view.max);
        let offset = Point::new(
            rebound(min_offset.x, -max_offset.x),
            rebound(min_offset.y, -max_offset.y),
        );

        if offset.x == 0.0 && offset.y == 0.0 {
            return center;
        }

        self.unproject(&center_point.add(&offset), Some(zoom))
    }
}

/// Shift needed to bring an interval back inside its limit, given how far
/// it overhangs on the low side (`left`) and the high side (`right`)
fn rebound(left: f64, right: f64) -> f64 {
    if left + right > 0.0 {
        (left - right) / 2.0
    } else {
        left.max(0.0) - right.max(0.0)
    }
}

fn snap_zoom(zoom: f64) -> f64 {
    (zoom / DEFAULT_ZOOM_SNAP).round() * DEFAULT_ZOOM_SNAP
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn karachi_bounds() -> LatLngBounds {
        LatLngBounds::from_coords(
            24.775039672851562,
            66.91925048828125,
            24.88196325605469,
            67.08074951171875,
        )
    }

    #[test]
    fn test_viewport_creation() {
        let viewport = Viewport::new(LatLng::new(24.8282, 67.0001), 10.0, Point::new(800.0, 600.0));

        assert_eq!(viewport.zoom, 10.0);
        assert_eq!(viewport.center.lat, 24.8282);
        assert_eq!(viewport.size.x, 800.0);
    }

    #[test]
    fn test_project_round_trip() {
        let viewport = Viewport::default();
        let lat_lng = LatLng::new(24.8282, 67.0001);
        let projected = viewport.project(&lat_lng, Some(10.0));
        let back = viewport.unproject(&projected, Some(10.0));

        assert!((back.lat - lat_lng.lat).abs() < EPS);
        assert!((back.lng - lat_lng.lng).abs() < EPS);
        // Same tile column as TileCoord::from_lat_lng
        assert_eq!((projected.x / 256.0).floor() as u32, 702);
    }

    #[test]
    fn test_center_pixel_maps_to_center() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));
        let center = viewport.pixel_to_lat_lng(&Point::new(256.0, 256.0));

        assert!(center.lat.abs() < EPS);
        assert!(center.lng.abs() < EPS);
    }

    #[test]
    fn test_zoom_limits_and_snap() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(2.0, 15.0);

        viewport.set_zoom(1.0);
        assert_eq!(viewport.zoom, 2.0);

        viewport.set_zoom(20.0);
        assert_eq!(viewport.zoom, 15.0);

        viewport.set_zoom(7.4);
        assert_eq!(viewport.zoom, 7.0);
        assert_eq!(viewport.zoom_level(), 7);
    }

    #[test]
    fn test_pan_moves_center() {
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));

        let applied = viewport.pan(Point::new(10.0, 10.0));

        assert!(viewport.center.lng > 0.0);
        assert!(viewport.center.lat < 0.0);
        assert!((applied.x - 10.0).abs() < 1e-6);
        assert!((applied.y - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_around_focus_keeps_point_fixed() {
        let mut viewport = Viewport::new(LatLng::new(24.8282, 67.0001), 10.0, Point::new(800.0, 600.0));
        let focus = Point::new(600.0, 150.0);
        let under_focus = viewport.pixel_to_lat_lng(&focus);

        viewport.zoom_to(12.0, Some(focus));

        let after = viewport.pixel_to_lat_lng(&focus);
        assert_eq!(viewport.zoom, 12.0);
        assert!((after.lat - under_focus.lat).abs() < 1e-6);
        assert!((after.lng - under_focus.lng).abs() < 1e-6);
    }

    #[test]
    fn test_fit_bounds_contains_bounds() {
        let bounds = karachi_bounds();
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 3.0, Point::new(1024.0, 768.0));
        viewport.set_zoom_limits(1.0, 18.0);

        viewport.fit_bounds(&bounds, None);

        assert_eq!(viewport.zoom, 13.0);
        assert!(viewport.bounds().contains_bounds(&bounds));

        // One level deeper would no longer fit.
        let mut deeper = viewport.clone();
        deeper.set_zoom(14.0);
        assert!(!deeper.bounds().contains_bounds(&bounds));
    }

    #[test]
    fn test_max_bounds_limits_pan() {
        let limit = karachi_bounds().pad(0.1);
        let mut viewport = Viewport::new(limit.center(), 13.0, Point::new(400.0, 300.0));
        viewport.set_max_bounds(Some(limit));

        viewport.pan(Point::new(50_000.0, -50_000.0));

        let visible = viewport.bounds();
        let tolerance = 1e-9;
        assert!(visible.east() <= limit.east() + tolerance);
        assert!(visible.north() <= limit.north() + tolerance);
        assert!(visible.west() >= limit.west() - tolerance);
        assert!(visible.south() >= limit.south() - tolerance);
    }

    #[test]
    fn test_max_bounds_centers_when_view_is_larger() {
        let limit = karachi_bounds().pad(0.1);
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 4.0, Point::new(800.0, 600.0));
        viewport.set_max_bounds(Some(limit));

        let center_px = viewport.project(&viewport.center, None);
        let sw = viewport.project(&limit.south_west, None);
        let ne = viewport.project(&limit.north_east, None);

        assert!((center_px.x - (sw.x + ne.x) / 2.0).abs() < 1e-6);
        assert!((center_px.y - (sw.y + ne.y) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_state_reports_integer_zoom() {
        let viewport = Viewport::new(LatLng::new(24.8282, 67.0001), 10.0, Point::new(800.0, 600.0));
        let state = viewport.state();

        assert_eq!(state.zoom, 10);
        assert_eq!(state.center, viewport.center);
        assert!(state.bounds.contains(&viewport.center));
    }
}
