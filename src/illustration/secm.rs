//! The combined SECM scan: a probe rasters over a catalyst disk, detects the
//! products rising off it, and builds a signal image row by row.
//!
//! Four views share one tick:
//! - catalyst (top-down): the disk, products diffusing off its rim, the probe
//! - side: the catalyst strip under the probe, rising products, the electrode
//! - the signal trace of the current row
//! - the persistent signal image

use std::time::Duration;

use eframe::egui::{Color32, Pos2, Rect, Vec2};
use rand::Rng;

use crate::config::{DynamicsConfig, SecmConfig};
use crate::particle::{BatchEmitter, Forces, Launch, ParticleSystem, RingEmitter, Tint};
use crate::raster::{RasterCompositor, RasterImage};
use crate::scanner::{ElectrodeBar, ElectrodeScanner, ElectrodeState, HitTest, ScanEvent};
use crate::signal::{SampleLog, SignalAccumulator, SignalSample};
use crate::surface::Surface;

const BACKGROUND: Color32 = Color32::from_rgb(17, 24, 39);
const CATALYST: Color32 = Color32::from_rgba_premultiplied(128, 128, 128, 128);
const GOLD: Color32 = Color32::from_rgb(255, 215, 0);
const SIGNAL_GREEN: Color32 = Color32::from_rgb(50, 205, 50);

/// Width of the catalyst seen edge-on by a probe at `electrode_y`: the disk's
/// diameter on the centre line, falling off as a Gaussian with sigma r/2.
pub fn catalyst_width(electrode_y: f32, center_y: f32, radius: f32) -> f32 {
    if !(radius > 0.0) {
        return 0.0;
    }
    let distance = (electrode_y - center_y).abs();
    let max_width = radius * 2.0;
    let sigma = radius / 2.0;
    max_width * (-(distance * distance) / (2.0 * sigma * sigma)).exp()
}

/// Drawing targets for the two particle views.
pub struct SecmViews<'a> {
    pub catalyst: &'a mut dyn Surface,
    pub side: &'a mut dyn Surface,
}

/// What happened during one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub electrode: ElectrodeState,
    pub event: ScanEvent,
    pub hits: usize,
    pub signal: f32,
    pub sample: Option<SignalSample>,
}

pub struct SecmScan {
    config: SecmConfig,
    hit_test: HitTest,
    scanner: ElectrodeScanner,
    diffusion: ParticleSystem,
    ring: RingEmitter,
    products: ParticleSystem,
    batch: BatchEmitter,
    signal: SignalAccumulator,
    samples: SampleLog,
    compositor: RasterCompositor,
    image: RasterImage,
}

impl SecmScan {
    pub fn new(config: SecmConfig) -> Self {
        let domain = Rect::from_min_size(Pos2::ZERO, Vec2::new(config.scan.width, config.scan.height));
        let center = domain.center();
        let e = config.emitter;

        Self {
            hit_test: config.electrode.hit_test,
            scanner: ElectrodeScanner::new(config.scan),
            diffusion: ParticleSystem::new(config.dynamics),
            ring: RingEmitter {
                center,
                radius: e.catalyst_radius,
                chance: e.spawn_chance,
                launch: Launch::Radial {
                    max_speed: e.spawn_speed,
                },
            },
            products: ParticleSystem::new(DynamicsConfig::ballistic(1.0))
                .with_bounds(domain)
                .with_tint(Tint::solid(65, 105, 225)),
            batch: BatchEmitter::new(
                Duration::from_millis(e.batch_interval_ms),
                e.width_per_particle,
            ),
            signal: SignalAccumulator::new(config.signal),
            samples: SampleLog::default(),
            compositor: RasterCompositor::new(&config.scan, &config.raster),
            image: RasterImage::new(config.raster.width, config.raster.height),
            config,
        }
    }

    /// Logical size of every view.
    pub fn canvas(&self) -> Vec2 {
        Vec2::new(self.config.scan.width, self.config.scan.height)
    }

    pub fn electrode(&self) -> ElectrodeState {
        self.scanner.state()
    }

    pub fn signal(&self) -> &SignalAccumulator {
        &self.signal
    }

    pub fn samples(&self) -> &SampleLog {
        &self.samples
    }

    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    pub fn diffusing(&self) -> &ParticleSystem {
        &self.diffusion
    }

    pub fn products(&self) -> &ParticleSystem {
        &self.products
    }

    pub fn scanner(&self) -> &ElectrodeScanner {
        &self.scanner
    }

    /// Current row as `[x, signal]` points for a line plot.
    pub fn row_trace(&self) -> Vec<[f64; 2]> {
        self.samples
            .row()
            .iter()
            .map(|s| [s.x as f64, s.signal as f64])
            .collect()
    }

    /// The electrode bar of the side view, at the probe's current x.
    pub fn side_bar(&self) -> ElectrodeBar {
        let e = &self.config.electrode;
        ElectrodeBar {
            center_x: self.scanner.state().x,
            top: self.config.scan.height - e.face_offset,
            width: e.bar_width,
            height: e.bar_height,
        }
    }

    /// The catalyst strip under the probe in the side view.
    pub fn catalyst_strip(&self) -> Rect {
        let e = &self.config.emitter;
        let center = self.ring.center;
        let width = catalyst_width(self.scanner.state().y, center.y, e.catalyst_radius);
        Rect::from_min_max(
            Pos2::new(center.x - width / 2.0, self.config.scan.height - e.strip_height),
            Pos2::new(center.x + width / 2.0, self.config.scan.height),
        )
    }

    /// Runs one frame: scan, particles, collisions, decay, sampling, paint.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        now: Duration,
        rng: &mut R,
        mut views: Option<&mut SecmViews<'_>>,
    ) -> TickReport {
        // 1) Probe
        let (electrode, event) = self.scanner.advance();
        match event {
            ScanEvent::Moved => {}
            ScanEvent::RowWrapped => self.samples.clear_row(),
            ScanEvent::PassCompleted => {
                self.samples.clear_pass();
                self.image.clear();
            }
        }

        // 2) Top-down diffusion around the catalyst
        self.ring.tick(&mut self.diffusion, rng);
        self.diffusion.step(1.0, &Forces::around(self.ring.center), rng);
        if let Some(views) = views.as_deref_mut() {
            self.draw_catalyst_view(views.catalyst, electrode);
        }
        self.diffusion.prune();

        // 3) Side view: emission from the strip, rise, collisions
        let strip = self.catalyst_strip();
        self.batch.tick(now, strip, &mut self.products, rng);
        self.products.step(1.0, &Forces::around(strip.center()), rng);
        let bar = self.side_bar();
        let hit_test = self.hit_test;
        let hits = self.products.collide(|p| hit_test.hits(&bar, p));
        if let Some(views) = views.as_deref_mut() {
            self.draw_side_view(views.side, &bar, strip);
        }
        self.products.prune();

        // 4) Detector response
        let signal = self.signal.update(self.signal.weight_of(hits));
        if let Some(views) = views.as_deref_mut() {
            self.draw_signal_meter(views.side);
        }

        // 5) Sampling and image
        let sample = self.signal.sample(electrode);
        if let Some(sample) = sample {
            self.samples.push(sample);
            self.compositor.paint(&[sample], &mut self.image);
        }

        TickReport {
            electrode,
            event,
            hits,
            signal,
            sample,
        }
    }

    /// Draws the current state without advancing it.
    pub fn render(&self, views: &mut SecmViews<'_>) {
        let bar = self.side_bar();
        let strip = self.catalyst_strip();
        self.draw_catalyst_view(views.catalyst, self.scanner.state());
        self.draw_side_view(views.side, &bar, strip);
        self.draw_signal_meter(views.side);
    }

    pub fn reset(&mut self) {
        self.scanner.reset();
        self.diffusion.clear();
        self.products.clear();
        self.batch.reset();
        self.signal.reset();
        self.samples.clear_pass();
        self.image.clear();
    }

    fn draw_catalyst_view(&self, surface: &mut dyn Surface, electrode: ElectrodeState) {
        surface.clear(BACKGROUND);
        surface.fill_circle(self.ring.center, self.ring.radius, CATALYST);
        self.diffusion.render(surface);

        let e = &self.config.electrode;
        let probe = Rect::from_min_size(
            Pos2::new(electrode.x - e.bar_width / 2.0, electrode.y),
            Vec2::new(e.bar_width, e.bar_height),
        );
        surface.fill_rect(probe, GOLD);
    }

    fn draw_side_view(&self, surface: &mut dyn Surface, bar: &ElectrodeBar, strip: Rect) {
        surface.clear(BACKGROUND);
        surface.fill_rect(bar.rect(), GOLD);
        surface.fill_rect(strip, CATALYST);
        self.products.render(surface);
    }

    fn draw_signal_meter(&self, surface: &mut dyn Surface) {
        let canvas = self.canvas();
        let height = self.signal.level() * 150.0;
        let meter = Rect::from_min_max(
            Pos2::new(canvas.x - 40.0, canvas.y - height),
            Pos2::new(canvas.x - 20.0, canvas.y),
        );
        surface.fill_rect(meter, SIGNAL_GREEN);
    }
}
