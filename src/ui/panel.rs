//! egui rendering of the map and its status elements

use crate::{
    core::{
        constants::TILE_SIZE,
        geo::{Point, TileCoord},
        map::Map,
    },
    layers::{base::LayerTrait, marker::Marker, tile::TileLayer},
    prelude::{HashMap, HashSet},
    ui::{
        controls::MapControls,
        display::{DisplaySink, ElementId, TextDisplay},
    },
};
use egui::{
    Align2, Color32, ColorImage, FontId, Pos2, Rect, Rounding, Sense, Stroke, TextureHandle,
    TextureOptions, Ui, Vec2,
};

/// Scroll distance (points) that counts as one zoom step
const SCROLL_STEP: f32 = 50.0;
const CONTROL_MARGIN: f32 = 10.0;
const BUTTON_SIZE: f32 = 30.0;

/// What the user did to the map this frame, in container pixels
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    PanBy(Point),
    ZoomTo { zoom: f64, focus: Option<Point> },
    ZoomIn,
    ZoomOut,
    Click(Point),
    Resize(Point),
}

/// Paints tile layers, markers and controls, and turns input into actions
pub struct TilePainter {
    textures: HashMap<(String, TileCoord), TextureHandle>,
    controls: MapControls,
    scroll_accum: f32,
}

impl Default for TilePainter {
    fn default() -> Self {
        Self::new(MapControls::default())
    }
}

impl TilePainter {
    pub fn new(controls: MapControls) -> Self {
        Self {
            textures: HashMap::default(),
            controls,
            scroll_accum: 0.0,
        }
    }

    pub fn show(&mut self, ui: &mut Ui, map: &Map) -> Vec<ViewAction> {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let mut actions = Vec::new();

        let size = Point::new(rect.width() as f64, rect.height() as f64);
        if size != map.viewport.size {
            actions.push(ViewAction::Resize(size));
        }

        painter.rect_filled(rect, Rounding::ZERO, Color32::from_gray(221));

        let mut used = HashSet::default();
        for layer in map.layers() {
            if !layer.is_visible() {
                continue;
            }
            if let Some(tile_layer) = layer.as_any().downcast_ref::<TileLayer>() {
                self.paint_tiles(ui, &painter, rect, map, tile_layer, &mut used);
            } else if let Some(marker) = layer.as_any().downcast_ref::<Marker>() {
                paint_marker(&painter, rect, map, marker);
            }
        }
        // Textures for tiles no longer on screen are released.
        self.textures.retain(|key, _| used.contains(key));

        if response.dragged() {
            let delta = response.drag_delta();
            if delta.length_sq() > 0.0 {
                actions.push(ViewAction::PanBy(Point::new(-delta.x as f64, -delta.y as f64)));
            }
        }

        if response.hovered() {
            self.scroll_accum += ui.input(|i| i.raw_scroll_delta.y);
            if self.scroll_accum.abs() >= SCROLL_STEP {
                let step = self.scroll_accum.signum() as f64;
                self.scroll_accum = 0.0;
                let focus = response
                    .hover_pos()
                    .map(|p| Point::new((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64));
                actions.push(ViewAction::ZoomTo {
                    zoom: map.viewport.zoom + step,
                    focus,
                });
            }
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                actions.push(ViewAction::Click(Point::new(
                    (pos.x - rect.min.x) as f64,
                    (pos.y - rect.min.y) as f64,
                )));
            }
        }

        actions.extend(self.paint_zoom_control(ui, rect, map));
        self.paint_scale(&painter, rect, map);
        self.paint_attribution(&painter, rect, map);

        actions
    }

    fn paint_tiles(
        &mut self,
        ui: &Ui,
        painter: &egui::Painter,
        rect: Rect,
        map: &Map,
        layer: &TileLayer,
        used: &mut HashSet<(String, TileCoord)>,
    ) {
        let viewport = &map.viewport;
        let origin = viewport.pixel_origin();
        let tile_size = TILE_SIZE as f32;
        let tint = Color32::from_white_alpha((layer.opacity() * 255.0).round() as u8);

        for coord in layer.visible_tiles(viewport) {
            let Some(data) = layer.display_data(&coord) else {
                continue;
            };

            let key = (layer.id().to_string(), coord);
            if !self.textures.contains_key(&key) {
                let Some(image) = decode_tile(&data) else {
                    log::debug!("could not decode tile {} of '{}'", coord, layer.id());
                    continue;
                };
                let name = format!("{}/{}", layer.id(), coord);
                let texture = ui.ctx().load_texture(name, image, TextureOptions::LINEAR);
                self.textures.insert(key.clone(), texture);
            }

            let Some(texture) = self.textures.get(&key) else {
                continue;
            };
            let min = Pos2::new(
                rect.min.x + (coord.x as f64 * TILE_SIZE as f64 - origin.x) as f32,
                rect.min.y + (coord.y as f64 * TILE_SIZE as f64 - origin.y) as f32,
            );
            painter.image(
                texture.id(),
                Rect::from_min_size(min, Vec2::splat(tile_size)),
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                tint,
            );
            used.insert(key);
        }
    }

    fn paint_zoom_control(&self, ui: &mut Ui, rect: Rect, map: &Map) -> Vec<ViewAction> {
        let zoom = &self.controls.zoom;
        let container = Point::new(rect.width() as f64, rect.height() as f64);
        let block = Point::new(BUTTON_SIZE as f64, (BUTTON_SIZE * 2.0 + 2.0) as f64);
        let top_left = zoom.position.place(container, block, CONTROL_MARGIN as f64);
        let base = rect.min + Vec2::new(top_left.x as f32, top_left.y as f32);

        let buttons = [
            ("+", base, zoom.can_zoom_in(&map.viewport), ViewAction::ZoomIn),
            (
                "\u{2212}",
                base + Vec2::new(0.0, BUTTON_SIZE + 2.0),
                zoom.can_zoom_out(&map.viewport),
                ViewAction::ZoomOut,
            ),
        ];

        let mut actions = Vec::new();
        for (label, min, enabled, action) in buttons {
            let button_rect = Rect::from_min_size(min, Vec2::splat(BUTTON_SIZE));
            let response = ui.allocate_rect(button_rect, Sense::click());

            let fill = if response.hovered() && enabled {
                Color32::from_gray(244)
            } else {
                Color32::WHITE
            };
            let text_color = if enabled {
                Color32::BLACK
            } else {
                Color32::from_gray(187)
            };

            ui.painter().rect_filled(button_rect, Rounding::same(4.0), fill);
            ui.painter()
                .rect_stroke(button_rect, Rounding::same(4.0), Stroke::new(1.0, Color32::from_gray(170)));
            ui.painter().text(
                button_rect.center(),
                Align2::CENTER_CENTER,
                label,
                FontId::proportional(18.0),
                text_color,
            );

            if response.clicked() && enabled {
                actions.push(action);
            }
        }
        actions
    }

    fn paint_scale(&self, painter: &egui::Painter, rect: Rect, map: &Map) {
        let scale = &self.controls.scale;
        let Some(bar) = scale.bar(&map.viewport) else {
            return;
        };

        let height = 18.0;
        let container = Point::new(rect.width() as f64, rect.height() as f64);
        let top_left = scale
            .position
            .place(container, Point::new(bar.width, height), CONTROL_MARGIN as f64);
        let bar_rect = Rect::from_min_size(
            rect.min + Vec2::new(top_left.x as f32, top_left.y as f32),
            Vec2::new(bar.width as f32, height as f32),
        );

        painter.rect_filled(bar_rect, Rounding::ZERO, Color32::from_white_alpha(128));
        painter.line_segment(
            [bar_rect.left_bottom(), bar_rect.right_bottom()],
            Stroke::new(2.0, Color32::from_gray(119)),
        );
        painter.text(
            bar_rect.left_center() + Vec2::new(4.0, 0.0),
            Align2::LEFT_CENTER,
            &bar.label,
            FontId::proportional(11.0),
            Color32::from_gray(51),
        );
    }

    fn paint_attribution(&self, painter: &egui::Painter, rect: Rect, map: &Map) {
        let text = self.controls.attribution.text(map);
        if text.is_empty() {
            return;
        }

        let galley = painter.layout_no_wrap(text, FontId::proportional(11.0), Color32::from_gray(51));
        let size = galley.size() + Vec2::splat(6.0);
        let container = Point::new(rect.width() as f64, rect.height() as f64);
        let top_left = self.controls.attribution.position.place(
            container,
            Point::new(size.x as f64, size.y as f64),
            0.0,
        );
        let box_rect = Rect::from_min_size(rect.min + Vec2::new(top_left.x as f32, top_left.y as f32), size);

        painter.rect_filled(box_rect, Rounding::ZERO, Color32::from_white_alpha(180));
        painter.galley(box_rect.min + Vec2::splat(3.0), galley, Color32::from_gray(51));
    }
}

fn decode_tile(bytes: &[u8]) -> Option<ColorImage> {
    let image = image::load_from_memory(bytes).ok()?;
    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Some(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

fn paint_marker(painter: &egui::Painter, rect: Rect, map: &Map, marker: &Marker) {
    let pixel = map.viewport.lat_lng_to_pixel(&marker.position());
    let pos = rect.min + Vec2::new(pixel.x as f32, pixel.y as f32);
    if !rect.contains(pos) {
        return;
    }

    painter.circle(
        pos,
        7.0,
        Color32::from_rgb(42, 129, 203),
        Stroke::new(2.0, Color32::WHITE),
    );

    if let Some(popup) = marker.popup().filter(|_| marker.is_popup_open()) {
        let galley = painter.layout_no_wrap(popup.text(), FontId::proportional(13.0), Color32::BLACK);
        let bubble = Rect::from_center_size(
            pos - Vec2::new(0.0, 20.0 + galley.size().y / 2.0),
            galley.size() + Vec2::splat(16.0),
        );
        painter.rect(bubble, Rounding::same(6.0), Color32::WHITE, Stroke::new(1.0, Color32::from_gray(180)));
        painter.galley(bubble.min + Vec2::splat(8.0), galley, Color32::BLACK);
    }
}

/// Side panel mirroring a `TextDisplay`
#[derive(Debug, Default)]
pub struct StatusPanel;

impl StatusPanel {
    pub fn new() -> Self {
        Self
    }

    /// Draws the readouts and the opacity slider. Returns the new opacity
    /// when the user moved the slider.
    pub fn show(&mut self, ui: &mut Ui, display: &TextDisplay) -> Option<f32> {
        let mut changed = None;

        ui.heading("Karachi Tiles");
        ui.separator();

        if let Some(text) = display.text(ElementId::Coordinates) {
            ui.monospace(text);
        }

        if display.is_visible(ElementId::Loading) == Some(true) {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading tiles...");
            });
        }

        ui.separator();

        if display.has_element(ElementId::OpacitySlider) {
            let mut opacity = display.value(ElementId::OpacitySlider).unwrap_or(1.0) as f32;
            ui.horizontal(|ui| {
                ui.label("Overlay opacity:");
                let response = ui.add(egui::Slider::new(&mut opacity, 0.0..=1.0).step_by(0.1).show_value(false));
                if response.changed() {
                    changed = Some(opacity);
                }
                if let Some(value) = display.text(ElementId::OpacityValue) {
                    ui.label(value);
                }
            });
        }

        ui.separator();

        for (label, id) in [
            ("Zoom", ElementId::CurrentZoom),
            ("Center", ElementId::CurrentCenter),
            ("Tiles loaded", ElementId::TilesLoaded),
        ] {
            if let Some(text) = display.text(id) {
                ui.horizontal(|ui| {
                    ui.label(format!("{}:", label));
                    ui.monospace(text);
                });
            }
        }

        if let Some(text) = display.text(ElementId::Popup).filter(|t| !t.is_empty()) {
            ui.separator();
            ui.label(text);
        }

        changed
    }
}
