use overlaymap::{
    core::config::MapConfig,
    layers::tile::{HttpFetcher, TileLoader, TileLoaderConfig},
    ui::{StatusPanel, TilePainter, ViewAction},
    MapViewController, TextDisplay,
};
use std::sync::Arc;

/// Desktop viewer: OSM basemap with the Karachi overlay on top
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading map config from {}", path);
            MapConfig::from_file(path)?
        }
        None => MapConfig::default(),
    };

    let size = config.viewport_size();
    let controller = MapViewController::initialize(config, TextDisplay::new())?;
    let loader = TileLoader::new(Arc::new(HttpFetcher::default()), TileLoaderConfig::default())?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([size.x as f32 + 280.0, size.y as f32])
            .with_title("Karachi Tiles"),
        ..Default::default()
    };

    eframe::run_native(
        "overlaymap-app",
        options,
        Box::new(move |_cc| {
            Box::new(OverlayApp {
                controller,
                loader,
                painter: TilePainter::default(),
                status: StatusPanel::new(),
            })
        }),
    )?;

    Ok(())
}

struct OverlayApp {
    controller: MapViewController,
    loader: TileLoader,
    painter: TilePainter,
    status: StatusPanel,
}

impl OverlayApp {
    fn apply(&mut self, action: ViewAction) {
        match action {
            ViewAction::PanBy(offset) => {
                self.controller.pan_by(offset);
            }
            ViewAction::ZoomTo { zoom, focus } => self.controller.zoom_to(zoom, focus),
            ViewAction::ZoomIn => self.controller.zoom_in(),
            ViewAction::ZoomOut => self.controller.zoom_out(),
            ViewAction::Click(pixel) => {
                self.controller.click_at(pixel);
            }
            ViewAction::Resize(size) => self.controller.resize(size),
        }
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("status_panel")
            .resizable(false)
            .exact_width(260.0)
            .show(ctx, |ui| {
                if let Some(opacity) = self.status.show(ui, self.controller.display()) {
                    self.controller.set_overlay_opacity(opacity);
                }
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let actions = self.painter.show(ui, self.controller.map());
                for action in actions {
                    self.apply(action);
                }
            });

        self.controller.tick(&self.loader);

        if self.controller.loading_counter().is_active() || self.loader.pending() > 0 {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        }
    }
}
