//! Catalysed vs uncatalysed reaction progress, side by side.

use std::time::Duration;

use crate::schedule::{TimerId, Timers};

pub const PROGRESS_BOUND: f32 = 100.0;
pub const TICK_PERIOD: Duration = Duration::from_millis(200);
pub const UNCATALYSED_RATE: f32 = 1.0;
pub const CATALYSED_RATE: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaceState {
    Idle,
    Running,
    Finished,
}

/// Two progress values driven by independent interval timers at different
/// rates. Finishes once both saturate.
#[derive(Debug)]
pub struct ReactionRace {
    state: RaceState,
    uncatalysed: f32,
    catalysed: f32,
    timers: Timers,
    running: Option<(TimerId, TimerId)>,
}

impl Default for ReactionRace {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactionRace {
    pub fn new() -> Self {
        Self {
            state: RaceState::Idle,
            uncatalysed: 0.0,
            catalysed: 0.0,
            timers: Timers::new(),
            running: None,
        }
    }

    pub fn state(&self) -> RaceState {
        self.state
    }

    pub fn uncatalysed(&self) -> f32 {
        self.uncatalysed
    }

    pub fn catalysed(&self) -> f32 {
        self.catalysed
    }

    /// Interval timers currently registered.
    pub fn live_timers(&self) -> usize {
        self.timers.len()
    }

    /// Resets both bars and (re)starts the timers. Any timers from a
    /// previous run are cancelled first.
    pub fn start(&mut self, now: Duration) {
        self.stop_timers();
        self.uncatalysed = 0.0;
        self.catalysed = 0.0;
        let slow = self.timers.set_interval(TICK_PERIOD, now);
        let fast = self.timers.set_interval(TICK_PERIOD, now);
        self.running = Some((slow, fast));
        self.state = RaceState::Running;
    }

    /// Applies every timer firing up to `now`.
    pub fn advance(&mut self, now: Duration) {
        let Some((slow, fast)) = self.running else {
            return;
        };
        for id in self.timers.due(now) {
            if id == slow {
                self.uncatalysed = (self.uncatalysed + UNCATALYSED_RATE).min(PROGRESS_BOUND);
            } else if id == fast {
                self.catalysed = (self.catalysed + CATALYSED_RATE).min(PROGRESS_BOUND);
            }
            if self.uncatalysed >= PROGRESS_BOUND && self.catalysed >= PROGRESS_BOUND {
                self.stop_timers();
                self.state = RaceState::Finished;
                log::debug!("reaction race finished");
                return;
            }
        }
    }

    fn stop_timers(&mut self) {
        if let Some((slow, fast)) = self.running.take() {
            self.timers.clear_interval(slow);
            self.timers.clear_interval(fast);
        }
    }
}
