//! Frame-stepped particle system used by every 2D illustration.
//!
//! Particles live in a structure-of-arrays store. The random velocity jitter
//! runs sequentially against the caller's RNG; everything after it is
//! deterministic per particle and runs on the rayon pool.

use std::f32::consts::PI;
use std::time::Duration;

use eframe::egui::{Color32, Pos2, Rect, Vec2};
use rand::Rng;
use rayon::prelude::*;

use crate::config::DynamicsConfig;
use crate::surface::Surface;

pub const DEFAULT_RADIUS: f32 = 3.0;

/// A single particle, copied out of the store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos: Pos2,
    pub vel: Vec2,
    pub radius: f32,
    pub alpha: f32,
    /// Alpha factor applied per tick while close to the reference centre.
    pub decay: f32,
    pub collided: bool,
}

// ===================================================================================
// Particle Storage
// ===================================================================================

/// Stores the particle data in a **Structure of Arrays** (SoA) layout, which
/// keeps the per-tick passes simple to run in parallel.
#[derive(Default)]
pub struct ParticleStorage {
    x: Vec<f32>,
    y: Vec<f32>,
    vx: Vec<f32>,
    vy: Vec<f32>,
    radius: Vec<f32>,
    alpha: Vec<f32>,
    decay: Vec<f32>,
    collided: Vec<bool>,
}

impl ParticleStorage {
    /// Constructs an empty `ParticleStorage` with room for `n` particles.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            vx: Vec::with_capacity(n),
            vy: Vec::with_capacity(n),
            radius: Vec::with_capacity(n),
            alpha: Vec::with_capacity(n),
            decay: Vec::with_capacity(n),
            collided: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn push(&mut self, p: Particle) {
        self.x.push(p.pos.x);
        self.y.push(p.pos.y);
        self.vx.push(p.vel.x);
        self.vy.push(p.vel.y);
        self.radius.push(p.radius);
        self.alpha.push(p.alpha);
        self.decay.push(p.decay);
        self.collided.push(p.collided);
    }

    pub fn get(&self, i: usize) -> Particle {
        Particle {
            pos: Pos2::new(self.x[i], self.y[i]),
            vel: Vec2::new(self.vx[i], self.vy[i]),
            radius: self.radius[i],
            alpha: self.alpha[i],
            decay: self.decay[i],
            collided: self.collided[i],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Particle> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.vx.clear();
        self.vy.clear();
        self.radius.clear();
        self.alpha.clear();
        self.decay.clear();
        self.collided.clear();
    }

    /// Keeps particle `i` iff `keep[i]`, preserving order.
    fn retain_mask(&mut self, keep: &[bool]) {
        fn compact<T: Copy>(v: &mut Vec<T>, keep: &[bool]) {
            let mut write = 0;
            for read in 0..v.len() {
                if keep[read] {
                    v[write] = v[read];
                    write += 1;
                }
            }
            v.truncate(write);
        }
        compact(&mut self.x, keep);
        compact(&mut self.y, keep);
        compact(&mut self.vx, keep);
        compact(&mut self.vy, keep);
        compact(&mut self.radius, keep);
        compact(&mut self.alpha, keep);
        compact(&mut self.decay, keep);
        compact(&mut self.collided, keep);
    }
}

// ===================================================================================
// Particle System
// ===================================================================================

/// Forces that act on the whole population for one tick.
#[derive(Clone, Copy, Debug)]
pub struct Forces {
    /// Reference centre used for attraction and distance-dependent fading.
    pub center: Pos2,
    /// Uniform acceleration, added to every velocity.
    pub acceleration: Vec2,
}

impl Forces {
    pub fn around(center: Pos2) -> Self {
        Self {
            center,
            acceleration: Vec2::ZERO,
        }
    }
}

/// How live particles are painted.
#[derive(Clone, Copy, Debug)]
pub struct Tint {
    pub color: Color32,
    /// Multiply the colour's alpha by the particle's alpha.
    pub fade: bool,
}

impl Tint {
    pub fn fading(r: u8, g: u8, b: u8) -> Self {
        Self {
            color: Color32::from_rgb(r, g, b),
            fade: true,
        }
    }

    pub fn solid(r: u8, g: u8, b: u8) -> Self {
        Self {
            color: Color32::from_rgb(r, g, b),
            fade: false,
        }
    }

    fn for_alpha(&self, alpha: f32) -> Color32 {
        if !self.fade {
            return self.color;
        }
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        let [r, g, b, _] = self.color.to_array();
        Color32::from_rgba_unmultiplied(r, g, b, a)
    }
}

pub struct ParticleSystem {
    particles: ParticleStorage,
    dynamics: DynamicsConfig,
    /// Particles whose circle lies entirely outside this rectangle expire.
    bounds: Option<Rect>,
    tint: Tint,
}

impl ParticleSystem {
    pub fn new(dynamics: DynamicsConfig) -> Self {
        Self {
            particles: ParticleStorage::with_capacity(256),
            dynamics,
            bounds: None,
            tint: Tint::fading(100, 200, 255),
        }
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_tint(mut self, tint: Tint) -> Self {
        self.tint = tint;
        self
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, i: usize) -> Particle {
        self.particles.get(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = Particle> + '_ {
        self.particles.iter()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn spawn(&mut self, origin: Pos2, velocity: Vec2) -> Particle {
        self.spawn_sized(origin, velocity, DEFAULT_RADIUS)
    }

    pub fn spawn_sized(&mut self, origin: Pos2, velocity: Vec2, radius: f32) -> Particle {
        let p = Particle {
            pos: origin,
            vel: velocity,
            radius,
            alpha: 1.0,
            decay: self.dynamics.near_decay,
            collided: false,
        };
        self.particles.push(p);
        p
    }

    /// Advances every particle by `dt` ticks.
    pub fn step<R: Rng + ?Sized>(&mut self, dt: f32, forces: &Forces, rng: &mut R) {
        let d = self.dynamics;
        let storage = &mut self.particles;

        // 1) Diffusion jitter and external acceleration (sequential, draws from rng)
        let push = forces.acceleration * dt;
        if d.diffusion > 0.0 {
            for (vx, vy) in storage.vx.iter_mut().zip(storage.vy.iter_mut()) {
                *vx += (rng.random::<f32>() - 0.5) * d.diffusion * dt + push.x;
                *vy += (rng.random::<f32>() - 0.5) * d.diffusion * dt + push.y;
            }
        } else if push != Vec2::ZERO {
            storage.vx.iter_mut().for_each(|vx| *vx += push.x);
            storage.vy.iter_mut().for_each(|vy| *vy += push.y);
        }

        // 2) Integrate, fade, clamp, attract, drag (parallel)
        let center = forces.center;
        let drag = d.drag.powf(dt);
        let far_decay = d.far_decay.powf(dt);
        storage
            .x
            .par_iter_mut()
            .zip(storage.y.par_iter_mut())
            .zip(storage.vx.par_iter_mut().zip(storage.vy.par_iter_mut()))
            .zip(storage.alpha.par_iter_mut().zip(storage.decay.par_iter()))
            .for_each(|(((x, y), (vx, vy)), (alpha, decay))| {
                *x += *vx * dt;
                *y += *vy * dt;

                let dx = center.x - *x;
                let dy = center.y - *y;
                let dist = dx.hypot(dy);

                *alpha *= if dist > d.far_radius {
                    far_decay
                } else {
                    decay.powf(dt)
                };

                if let Some(max_speed) = d.max_speed {
                    let speed = vx.hypot(*vy);
                    if speed > max_speed {
                        *vx = *vx / speed * max_speed;
                        *vy = *vy / speed * max_speed;
                    }
                }

                if d.attraction > 0.0 && dist > d.attraction_radius {
                    *vx += dx * d.attraction * dt;
                    *vy += dy * d.attraction * dt;
                }

                *vx *= drag;
                *vy *= drag;
            });
    }

    /// Flags every live particle for which `hit` returns true and returns how
    /// many were newly flagged. Flagged particles are neither drawn nor kept.
    pub fn collide(&mut self, mut hit: impl FnMut(&Particle) -> bool) -> usize {
        let mut count = 0;
        for i in 0..self.particles.len() {
            if self.particles.collided[i] {
                continue;
            }
            if hit(&self.particles.get(i)) {
                self.particles.collided[i] = true;
                count += 1;
            }
        }
        count
    }

    /// Draws every particle that has not collided, using its current state.
    pub fn render(&self, surface: &mut dyn Surface) {
        for p in self.particles.iter().filter(|p| !p.collided) {
            surface.fill_circle(p.pos, p.radius, self.tint.for_alpha(p.alpha));
        }
    }

    /// Drops faded, escaped and collided particles. Returns how many went.
    pub fn prune(&mut self) -> usize {
        let before = self.particles.len();
        let expiry = self.dynamics.expiry_alpha;
        let bounds = self.bounds;
        let keep: Vec<bool> = self
            .particles
            .iter()
            .map(|p| !p.collided && p.alpha >= expiry && bounds.is_none_or(|b| is_inside(&p, b)))
            .collect();
        self.particles.retain_mask(&keep);
        before - self.particles.len()
    }
}

fn is_inside(p: &Particle, b: Rect) -> bool {
    p.pos.x + p.radius > b.min.x
        && p.pos.x - p.radius < b.max.x
        && p.pos.y + p.radius > b.min.y
        && p.pos.y - p.radius < b.max.y
}

fn radius_between<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

// ===================================================================================
// Emitters
// ===================================================================================

/// How a ring emitter picks initial velocities.
#[derive(Clone, Copy, Debug)]
pub enum Launch {
    /// Outwards along the spawn angle, speed uniform in `[0, max_speed)`.
    Radial { max_speed: f32 },
    /// Each component uniform in `[-spread, spread)`.
    Scatter { spread: f32 },
}

/// Spawns, with probability `chance` per tick, one particle on a circle.
#[derive(Clone, Copy, Debug)]
pub struct RingEmitter {
    pub center: Pos2,
    pub radius: f32,
    pub chance: f64,
    pub launch: Launch,
}

impl RingEmitter {
    pub fn tick<R: Rng + ?Sized>(&self, system: &mut ParticleSystem, rng: &mut R) -> Option<Particle> {
        if !rng.random_bool(self.chance.clamp(0.0, 1.0)) {
            return None;
        }
        let angle = rng.random::<f32>() * PI * 2.0;
        let dir = Vec2::angled(angle);
        let origin = self.center + dir * self.radius;
        let velocity = match self.launch {
            Launch::Radial { max_speed } => dir * (rng.random::<f32>() * max_speed),
            Launch::Scatter { spread } => Vec2::new(
                (rng.random::<f32>() - 0.5) * 2.0 * spread,
                (rng.random::<f32>() - 0.5) * 2.0 * spread,
            ),
        };
        let radius = radius_between(rng, 1.0, 3.0);
        Some(system.spawn_sized(origin, velocity, radius))
    }
}

/// Spawns, with probability `chance` per tick, one particle at a random x
/// along `[0, width)` at height `y`, rising at `rise` with a small drift.
#[derive(Clone, Copy, Debug)]
pub struct LineEmitter {
    pub width: f32,
    pub y: f32,
    pub rise: f32,
    pub chance: f64,
}

impl LineEmitter {
    pub fn tick<R: Rng + ?Sized>(&self, system: &mut ParticleSystem, rng: &mut R) -> Option<Particle> {
        if self.chance <= 0.0 || !rng.random_bool(self.chance.min(1.0)) {
            return None;
        }
        let origin = Pos2::new(rng.random::<f32>() * self.width, self.y);
        let velocity = Vec2::new((rng.random::<f32>() - 0.5) * 2.0, -self.rise);
        Some(system.spawn(origin, velocity))
    }
}

/// Releases a batch of particles from a strip at fixed real-time intervals.
/// The batch grows with the strip's width.
#[derive(Clone, Debug)]
pub struct BatchEmitter {
    pub interval: Duration,
    /// Strip width that earns one particle per batch.
    pub width_per_particle: f32,
    /// Strips narrower than this stay quiet.
    pub min_width: f32,
    last: Option<Duration>,
}

impl BatchEmitter {
    pub fn new(interval: Duration, width_per_particle: f32) -> Self {
        Self {
            interval,
            width_per_particle,
            min_width: 1.0,
            last: None,
        }
    }

    /// Particles a strip of `width` releases per batch; at least one.
    pub fn batch_size(&self, width: f32) -> usize {
        let divisor = if self.width_per_particle > 0.0 {
            self.width_per_particle
        } else {
            1.0
        };
        ((width / divisor).floor() as usize).max(1)
    }

    /// Fires if more than `interval` has passed since the last batch.
    /// Returns the number of particles released.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        now: Duration,
        strip: Rect,
        system: &mut ParticleSystem,
        rng: &mut R,
    ) -> usize {
        let due = self
            .last
            .is_none_or(|last| now.saturating_sub(last) > self.interval);
        if !due || strip.width() <= self.min_width {
            return 0;
        }
        self.last = Some(now);

        let n = self.batch_size(strip.width());
        for _ in 0..n {
            let origin = Pos2::new(
                strip.min.x + rng.random::<f32>() * strip.width(),
                strip.min.y + rng.random::<f32>() * strip.height(),
            );
            let velocity = Vec2::new(
                (rng.random::<f32>() - 0.5) * 2.0,
                -rng.random::<f32>() * 4.0 - 2.0,
            );
            let radius = radius_between(rng, 1.0, 3.0);
            system.spawn_sized(origin, velocity, radius);
        }
        n
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::config::DEFAULT_EXPIRY_ALPHA as DEFAULT_EXPIRY;
    use crate::surface::RecordingSurface;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn fading_only() -> DynamicsConfig {
        DynamicsConfig::ballistic(0.9)
    }

    #[test]
    fn step_integrates_velocity() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sys = ParticleSystem::new(DynamicsConfig::ballistic(1.0));
        sys.spawn(Pos2::new(10.0, 10.0), Vec2::new(2.0, -1.0));
        sys.step(1.0, &Forces::around(Pos2::ZERO), &mut rng);
        sys.step(1.0, &Forces::around(Pos2::ZERO), &mut rng);
        assert_eq!(sys.get(0).pos, Pos2::new(14.0, 8.0));
    }

    #[test]
    fn alpha_never_increases_and_prunes_below_threshold() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut sys = ParticleSystem::new(fading_only());
        sys.spawn(Pos2::new(0.0, 0.0), Vec2::ZERO);

        let mut last = 1.0;
        let mut ticks = 0;
        while !sys.is_empty() {
            sys.step(1.0, &Forces::around(Pos2::ZERO), &mut rng);
            let alpha = sys.get(0).alpha;
            assert!(alpha <= last);
            last = alpha;
            let removed = sys.prune();
            if alpha < DEFAULT_EXPIRY {
                assert_eq!(removed, 1);
            } else {
                assert_eq!(removed, 0);
            }
            ticks += 1;
            assert!(ticks < 1000);
        }
        // 0.9^43 ~= 0.0108, 0.9^44 ~= 0.0097
        assert_eq!(ticks, 44);
    }

    #[test]
    fn far_particles_fade_faster() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut d = DynamicsConfig::default();
        d.diffusion = 0.0;
        let mut sys = ParticleSystem::new(d);
        sys.spawn(Pos2::new(10.0, 0.0), Vec2::ZERO);
        sys.spawn(Pos2::new(1000.0, 0.0), Vec2::ZERO);
        sys.step(1.0, &Forces::around(Pos2::ZERO), &mut rng);
        assert!((sys.get(0).alpha - d.near_decay).abs() < 1e-6);
        assert!((sys.get(1).alpha - d.far_decay).abs() < 1e-6);
    }

    #[test]
    fn speed_is_clamped_then_dragged() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut d = DynamicsConfig::default();
        d.diffusion = 0.0;
        d.attraction = 0.0;
        let mut sys = ParticleSystem::new(d);
        sys.spawn(Pos2::ZERO, Vec2::new(30.0, 40.0));
        sys.step(1.0, &Forces::around(Pos2::ZERO), &mut rng);
        let speed = sys.get(0).vel.length();
        assert!((speed - 2.0 * d.drag).abs() < 1e-4);
    }

    #[test]
    fn attraction_only_beyond_radius() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut d = DynamicsConfig::default();
        d.diffusion = 0.0;
        d.drag = 1.0;
        let mut sys = ParticleSystem::new(d);
        sys.spawn(Pos2::new(50.0, 0.0), Vec2::ZERO);
        sys.spawn(Pos2::new(300.0, 0.0), Vec2::ZERO);
        sys.step(1.0, &Forces::around(Pos2::ZERO), &mut rng);
        assert_eq!(sys.get(0).vel, Vec2::ZERO);
        assert!(sys.get(1).vel.x < 0.0);
    }

    #[test]
    fn escaped_particles_are_pruned() {
        let mut rng = StdRng::seed_from_u64(6);
        let bounds = Rect::from_min_max(Pos2::ZERO, Pos2::new(100.0, 100.0));
        let mut sys = ParticleSystem::new(DynamicsConfig::ballistic(1.0)).with_bounds(bounds);
        sys.spawn_sized(Pos2::new(50.0, 2.0), Vec2::new(0.0, -3.0), 1.0);
        sys.spawn_sized(Pos2::new(50.0, 50.0), Vec2::ZERO, 1.0);
        sys.step(1.0, &Forces::around(Pos2::ZERO), &mut rng);
        assert_eq!(sys.prune(), 1);
        assert_eq!(sys.get(0).pos, Pos2::new(50.0, 50.0));
    }

    #[test]
    fn collided_particles_are_not_drawn_and_are_pruned() {
        let mut sys = ParticleSystem::new(DynamicsConfig::ballistic(1.0));
        sys.spawn(Pos2::new(0.0, 0.0), Vec2::ZERO);
        sys.spawn(Pos2::new(5.0, 0.0), Vec2::ZERO);
        assert_eq!(sys.collide(|p| p.pos.x > 1.0), 1);
        assert_eq!(sys.collide(|p| p.pos.x > 1.0), 0);

        let mut surface = RecordingSurface::default();
        sys.render(&mut surface);
        assert_eq!(surface.circles.len(), 1);
        assert_eq!(sys.prune(), 1);
        assert_eq!(sys.len(), 1);
    }

    #[test]
    fn render_draws_before_prune() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sys = ParticleSystem::new(DynamicsConfig::ballistic(0.005));
        sys.spawn(Pos2::ZERO, Vec2::ZERO);
        sys.step(1.0, &Forces::around(Pos2::ZERO), &mut rng);

        let mut surface = RecordingSurface::default();
        sys.render(&mut surface);
        assert_eq!(surface.circles.len(), 1);
        assert_eq!(surface.circles[0].2.a(), 1);
        assert_eq!(sys.prune(), 1);
    }

    #[test]
    fn ring_emitter_spawns_on_the_ring() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut sys = ParticleSystem::new(DynamicsConfig::default());
        let ring = RingEmitter {
            center: Pos2::new(200.0, 100.0),
            radius: 50.0,
            chance: 1.0,
            launch: Launch::Radial { max_speed: 2.5 },
        };
        for _ in 0..20 {
            let p = ring.tick(&mut sys, &mut rng).unwrap();
            assert!(((p.pos - ring.center).length() - 50.0).abs() < 1e-3);
            assert!(p.vel.length() <= 2.5 + 1e-4);
            assert!((1.0..3.0).contains(&p.radius));
        }
        assert_eq!(sys.len(), 20);

        let never = RingEmitter { chance: 0.0, ..ring };
        assert!(never.tick(&mut sys, &mut rng).is_none());
    }

    #[test]
    fn batch_emitter_respects_interval_and_width() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut sys = ParticleSystem::new(DynamicsConfig::ballistic(1.0));
        let mut batch = BatchEmitter::new(Duration::from_millis(50), 10.0);
        let strip = Rect::from_min_size(Pos2::new(150.0, 195.0), Vec2::new(100.0, 5.0));
        let clock = ManualClock::new();

        assert_eq!(batch.tick(clock.now(), strip, &mut sys, &mut rng), 10);
        clock.advance(Duration::from_millis(50));
        assert_eq!(batch.tick(clock.now(), strip, &mut sys, &mut rng), 0);
        clock.advance(Duration::from_millis(1));
        assert_eq!(batch.tick(clock.now(), strip, &mut sys, &mut rng), 10);
        assert_eq!(sys.len(), 20);
        for p in sys.iter() {
            assert!(strip.contains(p.pos));
            assert!(p.vel.y <= -2.0 && p.vel.y > -6.0);
        }

        let narrow = Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(0.5, 5.0));
        clock.set(Duration::from_secs(1));
        assert_eq!(batch.tick(clock.now(), narrow, &mut sys, &mut rng), 0);
    }

    #[test]
    fn batch_size_is_at_least_one() {
        let batch = BatchEmitter::new(Duration::from_millis(50), 10.0);
        assert_eq!(batch.batch_size(3.0), 1);
        assert_eq!(batch.batch_size(99.0), 9);
        let degenerate = BatchEmitter::new(Duration::from_millis(50), 0.0);
        assert_eq!(degenerate.batch_size(7.5), 7);
    }
}
