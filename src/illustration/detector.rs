//! A fixed electrode near the top of the canvas catching products that
//! rise from below. Higher concentration, more arrivals, a busier meter.

use eframe::egui::{Color32, Pos2, Rect, Vec2};
use rand::Rng;

use crate::config::{DynamicsConfig, SignalConfig};
use crate::particle::{Forces, LineEmitter, ParticleSystem, Tint};
use crate::scanner::ElectrodeBar;
use crate::signal::{Response, SignalAccumulator};
use crate::surface::Surface;

pub const CANVAS: Vec2 = Vec2::new(400.0, 200.0);
pub const MAX_CONCENTRATION: u32 = 100;

const BACKGROUND: Color32 = Color32::from_rgb(17, 24, 39);
const GOLD: Color32 = Color32::from_rgb(255, 215, 0);
const SIGNAL_GREEN: Color32 = Color32::from_rgb(50, 205, 50);

pub struct DetectorDemo {
    concentration: u32,
    electrode: ElectrodeBar,
    particles: ParticleSystem,
    signal: SignalAccumulator,
}

impl Default for DetectorDemo {
    fn default() -> Self {
        Self::new(50)
    }
}

impl DetectorDemo {
    pub fn new(concentration: u32) -> Self {
        // Products start 10 units below the visible canvas, so the live
        // region extends past its bottom edge.
        let bounds = Rect::from_min_size(Pos2::ZERO, CANVAS + Vec2::new(0.0, 20.0));
        Self {
            concentration: concentration.min(MAX_CONCENTRATION),
            electrode: ElectrodeBar {
                center_x: CANVAS.x / 2.0,
                top: 20.0,
                width: 60.0,
                height: 10.0,
            },
            particles: ParticleSystem::new(DynamicsConfig::ballistic(1.0))
                .with_bounds(bounds)
                .with_tint(Tint::solid(65, 105, 225)),
            signal: SignalAccumulator::new(SignalConfig {
                max: 200.0,
                decrement: 2.0,
                collision_weight: 2.0,
                response: Response::Latch,
            }),
        }
    }

    pub fn concentration(&self) -> u32 {
        self.concentration
    }

    /// Changing the concentration restarts the illustration.
    pub fn set_concentration(&mut self, concentration: u32) {
        let concentration = concentration.min(MAX_CONCENTRATION);
        if concentration != self.concentration {
            self.concentration = concentration;
            self.particles.clear();
            self.signal.reset();
        }
    }

    /// Per-tick chance of a new product.
    pub fn spawn_chance(&self) -> f64 {
        self.concentration as f64 / 1000.0 * 3.0
    }

    pub fn signal(&self) -> &SignalAccumulator {
        &self.signal
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// One frame. Returns the number of products caught.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R, surface: Option<&mut dyn Surface>) -> usize {
        let emitter = LineEmitter {
            width: CANVAS.x,
            y: CANVAS.y + 10.0,
            rise: 3.0,
            chance: self.spawn_chance(),
        };
        emitter.tick(&mut self.particles, rng);
        self.particles.step(1.0, &Forces::around(self.electrode.rect().center()), rng);

        let bar = self.electrode;
        let hits = self.particles.collide(|p| bar.top_face_hit(p));
        self.signal.update(self.signal.weight_of(hits));

        if let Some(surface) = surface {
            surface.clear(BACKGROUND);
            surface.fill_rect(self.electrode.rect(), GOLD);
            self.particles.render(surface);
            let height = self.signal.level() * 150.0;
            surface.fill_rect(
                Rect::from_min_max(
                    Pos2::new(CANVAS.x - 40.0, CANVAS.y - height),
                    Pos2::new(CANVAS.x - 20.0, CANVAS.y),
                ),
                SIGNAL_GREEN,
            );
        }
        self.particles.prune();
        hits
    }
}
