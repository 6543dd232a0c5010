//! Drives the controller headlessly through the async loader, the way the
//! viewer does once per frame.

use async_trait::async_trait;
use overlaymap::{
    core::{config::MapConfig, geo::Point},
    layers::tile::{TileFetcher, TileLoader, TileLoaderConfig, TileState},
    DisplaySink, ElementId, MapError, MapViewController, Result, TextDisplay,
};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

/// Serves fixed bytes for every URL, failing the ones matching `fail_on`
struct ScriptedFetcher {
    fail_on: Option<&'static str>,
    requested: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(fail_on: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            fail_on,
            requested: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TileFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());
        tokio::time::sleep(Duration::from_millis(5)).await;

        match self.fail_on {
            Some(pattern) if url.contains(pattern) => {
                Err(MapError::Fetch(format!("HTTP 404 Not Found for {}", url)))
            }
            _ => Ok(vec![0x89, b'P', b'N', b'G']),
        }
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Ticks until nothing is in flight and the overlay has settled
async fn run_until_idle(controller: &mut MapViewController, loader: &TileLoader) {
    for _ in 0..500 {
        controller.tick(loader);
        if loader.pending() == 0 && !controller.loading_counter().is_active() {
            // One more tick picks up anything that raced the check.
            controller.tick(loader);
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("tile loading did not settle");
}

#[tokio::test]
async fn test_initial_load_shows_and_hides_loading() {
    init_logging();

    let fetcher = ScriptedFetcher::new(None);
    let loader = TileLoader::new(fetcher.clone(), TileLoaderConfig::default()).unwrap();
    let mut controller = MapViewController::initialize(MapConfig::default(), TextDisplay::new()).unwrap();

    assert_eq!(controller.display().is_visible(ElementId::Loading), Some(false));

    controller.tick(&loader);
    assert!(controller.loading_counter().is_active());
    assert_eq!(controller.display().is_visible(ElementId::Loading), Some(true));

    run_until_idle(&mut controller, &loader).await;

    assert_eq!(controller.loading_counter().count(), 0);
    assert_eq!(controller.display().is_visible(ElementId::Loading), Some(false));

    let overlay = controller.overlay().unwrap();
    assert!(overlay.loaded_count() > 0);
    assert_eq!(overlay.pending_count(), 0);
    assert_eq!(
        controller.display().text(ElementId::TilesLoaded),
        Some(controller.tiles_loaded().to_string().as_str())
    );
    assert_eq!(controller.tiles_loaded(), overlay.loaded_count() as u64);

    let requested = fetcher.requested.lock().unwrap();
    assert!(requested.iter().any(|url| url.contains("tile.openstreetmap.org")));
    assert!(requested
        .iter()
        .any(|url| url.starts_with("https://storage.googleapis.com/karachi_tiles/13/")));
}

#[tokio::test]
async fn test_tiles_are_not_fetched_twice() {
    let fetcher = ScriptedFetcher::new(None);
    let loader = TileLoader::new(fetcher.clone(), TileLoaderConfig::default()).unwrap();
    let mut controller = MapViewController::initialize(MapConfig::default(), TextDisplay::new()).unwrap();

    run_until_idle(&mut controller, &loader).await;
    let calls = fetcher.calls.load(Ordering::SeqCst);

    for _ in 0..5 {
        controller.tick(&loader);
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    controller.tick(&loader);

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), calls);
}

#[tokio::test]
async fn test_overlay_errors_fall_back_to_placeholder() {
    init_logging();

    let fetcher = ScriptedFetcher::new(Some("karachi_tiles"));
    let loader = TileLoader::new(fetcher.clone(), TileLoaderConfig::default()).unwrap();
    let mut controller = MapViewController::initialize(MapConfig::default(), TextDisplay::new()).unwrap();
    let coordinates_before = controller
        .display()
        .text(ElementId::Coordinates)
        .map(str::to_string);

    run_until_idle(&mut controller, &loader).await;

    // The loading indicator still clears when every overlay tile failed.
    assert_eq!(controller.display().is_visible(ElementId::Loading), Some(false));
    assert_eq!(controller.tiles_loaded(), 0);
    assert_eq!(controller.display().text(ElementId::TilesLoaded), Some("0"));
    assert_eq!(
        controller.display().text(ElementId::Coordinates).map(str::to_string),
        coordinates_before
    );

    let overlay = controller.overlay().unwrap();
    assert!(overlay.errored_count() > 0);

    let viewport = &controller.map().viewport;
    let coord = overlay.visible_tiles(viewport)[0];
    assert!(matches!(overlay.tile_state(&coord), Some(TileState::Errored { .. })));
    let placeholder = overlay.display_data(&coord).unwrap();
    assert!(placeholder.starts_with(&[0x89, b'P', b'N', b'G']));

    // Failed tiles are not retried.
    let calls = fetcher.calls.load(Ordering::SeqCst);
    controller.tick(&loader);
    tokio::time::sleep(Duration::from_millis(20)).await;
    controller.tick(&loader);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), calls);

    let base = controller.base_layer().unwrap();
    assert_eq!(base.errored_count(), 0);
}

#[tokio::test]
async fn test_pan_stays_inside_max_bounds() {
    let fetcher = ScriptedFetcher::new(None);
    let loader = TileLoader::new(fetcher, TileLoaderConfig::default()).unwrap();
    let mut controller = MapViewController::initialize(MapConfig::default(), TextDisplay::new()).unwrap();
    run_until_idle(&mut controller, &loader).await;

    let max_bounds = *controller.map().viewport.max_bounds().unwrap();
    let applied = controller.pan_by(Point::new(50_000.0, -50_000.0));

    assert!(applied.x < 50_000.0);
    assert!(max_bounds.contains(&controller.map().viewport.center));

    let center = controller.map().viewport.center;
    let expected = format!(
        "Lat: {:.6}, Lng: {:.6}\nZoom: {}",
        center.lat,
        center.lng,
        controller.map().viewport.zoom_level()
    );
    assert_eq!(controller.display().text(ElementId::Coordinates), Some(expected.as_str()));
}

#[tokio::test]
async fn test_zoom_starts_new_load_cycle() {
    let fetcher = ScriptedFetcher::new(None);
    let loader = TileLoader::new(fetcher.clone(), TileLoaderConfig::default()).unwrap();
    let mut controller = MapViewController::initialize(MapConfig::default(), TextDisplay::new()).unwrap();
    run_until_idle(&mut controller, &loader).await;
    let loaded_before = controller.tiles_loaded();

    controller.zoom_in();
    assert_eq!(controller.display().text(ElementId::CurrentZoom), Some("14"));
    assert!(controller
        .display()
        .text(ElementId::Coordinates)
        .unwrap()
        .ends_with("Zoom: 14"));

    controller.tick(&loader);
    assert_eq!(controller.display().is_visible(ElementId::Loading), Some(true));

    run_until_idle(&mut controller, &loader).await;
    assert_eq!(controller.display().is_visible(ElementId::Loading), Some(false));
    assert!(controller.tiles_loaded() > loaded_before);
    assert_eq!(controller.overlay().unwrap().tile_zoom(), Some(14));
    assert!(fetcher
        .requested
        .lock()
        .unwrap()
        .iter()
        .any(|url| url.contains("/karachi_tiles/14/")));
}

#[tokio::test]
async fn test_display_without_optional_elements() {
    let display = TextDisplay::with_elements(&[
        ElementId::Map,
        ElementId::Coordinates,
        ElementId::OpacitySlider,
    ]);
    let fetcher = ScriptedFetcher::new(None);
    let loader = TileLoader::new(fetcher, TileLoaderConfig::default()).unwrap();
    let mut controller = MapViewController::initialize(MapConfig::default(), display).unwrap();

    run_until_idle(&mut controller, &loader).await;
    assert_eq!(controller.set_overlay_opacity(0.3), 0.3);

    let display = controller.display();
    assert!(!display.has_element(ElementId::Loading));
    assert_eq!(display.text(ElementId::TilesLoaded), None);
    assert_eq!(display.text(ElementId::OpacityValue), None);
    assert!((display.value(ElementId::OpacitySlider).unwrap() - 0.3).abs() < 1e-6);
    assert!(display.text(ElementId::Coordinates).unwrap().starts_with("Lat: "));
    assert!(controller.tiles_loaded() > 0);
}

#[tokio::test]
async fn test_config_from_json_overrides_bucket() {
    let config = MapConfig::from_json_str(
        r#"{ "bucket_name": "lahore_tiles", "tiles_path": "v2", "overlay_opacity": 0.5 }"#,
    )
    .unwrap();

    let fetcher = ScriptedFetcher::new(None);
    let loader = TileLoader::new(fetcher.clone(), TileLoaderConfig::default()).unwrap();
    let mut controller = MapViewController::initialize(config, TextDisplay::new()).unwrap();
    assert_eq!(controller.display().text(ElementId::OpacityValue), Some("0.5"));

    run_until_idle(&mut controller, &loader).await;
    assert!(fetcher
        .requested
        .lock()
        .unwrap()
        .iter()
        .any(|url| url.starts_with("https://storage.googleapis.com/lahore_tiles/v2/13/")));
}

#[tokio::test]
async fn test_panning_at_street_level_keeps_tile_set_small() {
    let fetcher = ScriptedFetcher::new(None);
    let loader = TileLoader::new(fetcher, TileLoaderConfig::default()).unwrap();
    let mut controller = MapViewController::initialize(MapConfig::default(), TextDisplay::new()).unwrap();
    controller.zoom_to(18.0, None);
    run_until_idle(&mut controller, &loader).await;

    let mut max_visible = 0;
    for step in 0..60 {
        let dx = if (step / 15) % 2 == 0 { 900.0 } else { -900.0 };
        let offset = if step % 15 == 14 {
            Point::new(0.0, 700.0)
        } else {
            Point::new(dx, 0.0)
        };
        controller.pan_by(offset);
        run_until_idle(&mut controller, &loader).await;

        let overlay = controller.overlay().unwrap();
        max_visible = max_visible.max(overlay.visible_tiles(&controller.map().viewport).len());
        let held = overlay.loaded_count() + overlay.errored_count() + overlay.pending_count();
        assert!(held <= max_visible * 4, "held {} tiles, visible at most {}", held, max_visible);
    }

    assert!(controller.tiles_loaded() as usize > max_visible);
}

#[tokio::test]
async fn test_remote_error_tile_replaces_failed_overlay_tiles() {
    let config = MapConfig::from_json_str(
        r#"{ "error_tile_url": "https://example.com/blank.png" }"#,
    )
    .unwrap();
    let fetcher = ScriptedFetcher::new(Some("karachi_tiles"));
    let loader = TileLoader::new(fetcher.clone(), TileLoaderConfig::default()).unwrap();
    let mut controller = MapViewController::initialize(config, TextDisplay::new()).unwrap();

    run_until_idle(&mut controller, &loader).await;
    // The error tile is requested on the tick after the first failure.
    for _ in 0..20 {
        controller.tick(&loader);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let requested = fetcher.requested.lock().unwrap().clone();
    assert_eq!(
        requested
            .iter()
            .filter(|url| url.as_str() == "https://example.com/blank.png")
            .count(),
        1
    );

    let overlay = controller.overlay().unwrap();
    let coord = overlay.visible_tiles(&controller.map().viewport)[0];
    assert!(matches!(overlay.tile_state(&coord), Some(TileState::Errored { .. })));
    assert_eq!(
        overlay.display_data(&coord).unwrap().as_slice(),
        &[0x89, b'P', b'N', b'G']
    );
    assert_eq!(controller.display().text(ElementId::TilesLoaded), Some("0"));
}
