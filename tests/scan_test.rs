//! Whole-pass behaviour of the SECM scan through the public API.
//!
//! A pass over the default 400x200 domain is 200 columns by 20 rows, so 4000
//! ticks bring the probe back to the origin.

use std::time::Duration;

use eframe::egui::{Color32, Pos2, Rect};
use rand::SeedableRng;
use rand::rngs::StdRng;

use secm_viz::illustration::{SecmScan, SecmViews};
use secm_viz::signal::Response;
use secm_viz::surface::Surface;
use secm_viz::{RasterCompositor, RasterImage, ScanEvent, SecmConfig, SignalSample};

const TICKS_PER_PASS: u64 = 200 * 20;
const FRAME: Duration = Duration::from_millis(16);

/// Counts draw calls.
#[derive(Default)]
struct CountingSurface {
    clears: usize,
    circles: usize,
    rects: usize,
}

impl Surface for CountingSurface {
    fn clear(&mut self, _color: Color32) {
        self.clears += 1;
    }

    fn fill_circle(&mut self, _center: Pos2, _radius: f32, _color: Color32) {
        self.circles += 1;
    }

    fn fill_rect(&mut self, _rect: Rect, _color: Color32) {
        self.rects += 1;
    }

    fn stroke_path(&mut self, _points: &[Pos2], _width: f32, _color: Color32) {}
}

/// Runs one full pass and returns every tick's event and signal.
fn run_pass(scan: &mut SecmScan, seed: u64) -> Vec<(ScanEvent, f32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut now = Duration::ZERO;
    (0..TICKS_PER_PASS)
        .map(|_| {
            now += FRAME;
            let report = scan.tick(now, &mut rng, None);
            (report.event, report.signal)
        })
        .collect()
}

#[test]
fn one_pass_wraps_every_row_and_returns_home() {
    let mut scan = SecmScan::new(SecmConfig::default());
    let events = run_pass(&mut scan, 1);

    let wraps = events.iter().filter(|(e, _)| *e == ScanEvent::RowWrapped).count();
    let passes = events.iter().filter(|(e, _)| *e == ScanEvent::PassCompleted).count();
    assert_eq!(wraps, 19);
    assert_eq!(passes, 1);
    assert_eq!(events.last().map(|(e, _)| *e), Some(ScanEvent::PassCompleted));
    assert_eq!(scan.scanner().passes(), 1);
    assert_eq!(scan.electrode().x, 0.0);
    assert_eq!(scan.electrode().y, 0.0);
}

#[test]
fn signal_stays_in_range_for_both_responses() {
    for (seed, response) in [(2, Response::Accumulate), (3, Response::Latch)] {
        let mut config = SecmConfig::default();
        config.signal.response = response;
        let max = config.signal.max;
        let mut scan = SecmScan::new(config);
        for (_, signal) in run_pass(&mut scan, seed) {
            assert!((0.0..=max).contains(&signal), "{response:?} produced {signal}");
        }
    }
}

#[test]
fn the_centre_rows_light_up_the_image() {
    let mut scan = SecmScan::new(SecmConfig::default());
    let mut rng = StdRng::seed_from_u64(4);
    let mut now = Duration::ZERO;
    let mut peak = 0.0f32;
    // stop short of the wrap so the image is not cleared
    for _ in 0..TICKS_PER_PASS - 1 {
        now += FRAME;
        peak = peak.max(scan.tick(now, &mut rng, None).signal);
    }
    assert!(peak > 0.0);
    assert!(!scan.image().is_blank());
    assert!(!scan.samples().pass().is_empty());
}

#[test]
fn each_tick_redraws_both_views_once() {
    let mut scan = SecmScan::new(SecmConfig::default());
    let mut rng = StdRng::seed_from_u64(5);
    let mut catalyst = CountingSurface::default();
    let mut side = CountingSurface::default();
    let mut now = Duration::ZERO;
    for _ in 0..100 {
        now += FRAME;
        let mut views = SecmViews {
            catalyst: &mut catalyst,
            side: &mut side,
        };
        scan.tick(now, &mut rng, Some(&mut views));
    }
    assert_eq!(catalyst.clears, 100);
    assert_eq!(side.clears, 100);
    // the catalyst disk is drawn every frame, plus any diffusing products
    assert!(catalyst.circles >= 100);
    assert!(side.rects >= 300);
}

#[test]
fn later_samples_win_the_same_pixel() {
    let config = SecmConfig::default();
    let compositor = RasterCompositor::new(&config.scan, &config.raster);
    let mut image = RasterImage::new(config.raster.width, config.raster.height);
    let bright = SignalSample {
        x: 100.0,
        y: 50.0,
        signal: 200.0,
    };
    let dim = SignalSample { signal: 1.0, ..bright };
    compositor.paint(&[bright, dim], &mut image);

    let (px, py) = compositor.pixel_of(&dim, &image);
    assert_eq!(image.get(px, py), Some(compositor.color(1.0)));
}

#[test]
fn presets_round_trip_through_json() {
    let mut config = SecmConfig::default();
    config.scan.step = 4.0;
    config.signal.response = Response::Latch;
    config.emitter.spawn_chance = 0.25;

    let path = std::env::temp_dir().join(format!("secm_preset_{}.json", std::process::id()));
    let path = path.to_string_lossy().into_owned();
    config.save(&path).expect("save preset");
    let loaded = SecmConfig::load(&path).expect("load preset");
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.scan.step, 4.0);
    assert_eq!(loaded.signal.response, Response::Latch);
    assert_eq!(loaded.emitter.spawn_chance, 0.25);
}

#[test]
fn invalid_presets_are_rejected_on_load() {
    let path = std::env::temp_dir().join(format!("secm_bad_preset_{}.json", std::process::id()));
    let path = path.to_string_lossy().into_owned();
    std::fs::write(&path, r#"{ "scan": { "step": 0.0 } }"#).expect("write preset");
    let result = SecmConfig::load(&path);
    std::fs::remove_file(&path).ok();
    assert!(result.is_err());
}
