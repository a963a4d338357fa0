//! Detector response: collisions in, a decaying scalar and position-tagged
//! samples out.

use serde::{Deserialize, Serialize};

use crate::config::SignalConfig;
use crate::scanner::ElectrodeState;

/// How the decay state reacts to a tick with collisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// Add the collision weight, up to `max`; otherwise fall by `decrement`.
    Accumulate,
    /// Jump straight to `max` on any collision, then fall by `decrement`
    /// every tick, the collision tick included.
    Latch,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalSample {
    pub x: f32,
    pub y: f32,
    pub signal: f32,
}

#[derive(Clone, Debug)]
pub struct SignalAccumulator {
    config: SignalConfig,
    decay: f32,
}

impl SignalAccumulator {
    pub fn new(config: SignalConfig) -> Self {
        Self { config, decay: 0.0 }
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    pub fn max(&self) -> f32 {
        self.config.max
    }

    /// Decay state as a fraction of `max`.
    pub fn level(&self) -> f32 {
        self.decay / self.config.max
    }

    /// Collision weight earned by `hits` particles this tick.
    pub fn weight_of(&self, hits: usize) -> f32 {
        hits as f32 * self.config.collision_weight
    }

    /// Feeds one tick's weighted collision count; returns the new decay state.
    pub fn update(&mut self, collision_weight: f32) -> f32 {
        let c = &self.config;
        self.decay = match c.response {
            Response::Accumulate => {
                if collision_weight > 0.0 {
                    (self.decay + collision_weight).min(c.max)
                } else {
                    (self.decay - c.decrement).max(0.0)
                }
            }
            Response::Latch => {
                let start = if collision_weight > 0.0 { c.max } else { self.decay };
                (start - c.decrement).max(0.0)
            }
        };
        self.decay = self.decay.clamp(0.0, c.max);
        self.decay
    }

    /// A sample at the probe position, while there is any signal at all.
    pub fn sample(&self, electrode: ElectrodeState) -> Option<SignalSample> {
        (self.decay > 0.0).then_some(SignalSample {
            x: electrode.x,
            y: electrode.y,
            signal: self.decay,
        })
    }

    pub fn reset(&mut self) {
        self.decay = 0.0;
    }
}

/// Samples of the current row and of the whole pass.
#[derive(Clone, Debug, Default)]
pub struct SampleLog {
    row: Vec<SignalSample>,
    pass: Vec<SignalSample>,
}

impl SampleLog {
    pub fn push(&mut self, sample: SignalSample) {
        self.row.push(sample);
        self.pass.push(sample);
    }

    pub fn row(&self) -> &[SignalSample] {
        &self.row
    }

    pub fn pass(&self) -> &[SignalSample] {
        &self.pass
    }

    pub fn clear_row(&mut self) {
        self.row.clear();
    }

    pub fn clear_pass(&mut self) {
        self.row.clear();
        self.pass.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulate() -> SignalAccumulator {
        SignalAccumulator::new(SignalConfig::default())
    }

    #[test]
    fn rises_by_weight_and_clamps_at_max() {
        let mut acc = accumulate();
        assert_eq!(acc.update(acc.weight_of(2)), 30.0);
        for _ in 0..20 {
            acc.update(45.0);
            assert!(acc.decay() <= 200.0);
        }
        assert_eq!(acc.decay(), 200.0);
    }

    #[test]
    fn falls_linearly_to_zero() {
        let mut acc = accumulate();
        acc.update(195.0);
        let ticks = (195.0f32 / 10.0).ceil() as usize;
        for i in 0..ticks {
            assert!(acc.decay() > 0.0, "reached zero early at tick {i}");
            acc.update(0.0);
        }
        assert_eq!(acc.decay(), 0.0);
        acc.update(0.0);
        assert_eq!(acc.decay(), 0.0);
    }

    #[test]
    fn samples_only_while_positive() {
        let mut acc = accumulate();
        let at = ElectrodeState { x: 12.0, y: 30.0 };
        assert_eq!(acc.sample(at), None);
        acc.update(15.0);
        assert_eq!(
            acc.sample(at),
            Some(SignalSample {
                x: 12.0,
                y: 30.0,
                signal: 15.0
            })
        );
    }

    #[test]
    fn latch_jumps_to_max_then_drains() {
        let mut acc = SignalAccumulator::new(SignalConfig {
            max: 200.0,
            decrement: 2.0,
            collision_weight: 2.0,
            response: Response::Latch,
        });
        assert_eq!(acc.update(2.0), 198.0);
        assert_eq!(acc.update(0.0), 196.0);
        assert_eq!(acc.update(4.0), 198.0);
        for _ in 0..200 {
            acc.update(0.0);
        }
        assert_eq!(acc.decay(), 0.0);
    }

    #[test]
    fn row_clear_keeps_pass() {
        let mut log = SampleLog::default();
        log.push(SignalSample {
            x: 1.0,
            y: 0.0,
            signal: 5.0,
        });
        log.clear_row();
        assert!(log.row().is_empty());
        assert_eq!(log.pass().len(), 1);
        log.clear_pass();
        assert!(log.pass().is_empty());
    }
}
