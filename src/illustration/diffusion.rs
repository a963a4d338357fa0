//! Products diffusing away from a catalyst-covered disk and fading out.

use eframe::egui::{Color32, Vec2};
use rand::Rng;

use crate::config::DynamicsConfig;
use crate::particle::{Forces, Launch, ParticleSystem, RingEmitter};
use crate::surface::Surface;

pub const CANVAS: Vec2 = Vec2::new(300.0, 300.0);

const BACKGROUND: Color32 = Color32::from_rgb(21, 94, 117);
const CATALYST: Color32 = Color32::from_rgba_premultiplied(128, 128, 128, 128);

pub struct DiffusionDemo {
    emitter: RingEmitter,
    particles: ParticleSystem,
}

impl Default for DiffusionDemo {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffusionDemo {
    pub fn new() -> Self {
        Self {
            emitter: RingEmitter {
                center: (CANVAS / 2.0).to_pos2(),
                radius: 30.0,
                chance: 0.3,
                launch: Launch::Scatter { spread: 1.0 },
            },
            particles: ParticleSystem::new(DynamicsConfig::ballistic(0.99)),
        }
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R, surface: Option<&mut dyn Surface>) {
        self.emitter.tick(&mut self.particles, rng);
        self.particles.step(1.0, &Forces::around(self.emitter.center), rng);
        if let Some(surface) = surface {
            surface.clear(BACKGROUND);
            surface.fill_circle(self.emitter.center, self.emitter.radius, CATALYST);
            self.particles.render(surface);
        }
        self.particles.prune();
    }
}
