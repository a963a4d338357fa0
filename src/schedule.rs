//! Frame-loop and interval-timer bookkeeping.
//!
//! The host owns one `TickSchedule` and keeps repainting while any
//! `FrameLoop` is alive. Dropping a loop is the only way to stop it, so a
//! torn-down illustration can never be ticked again.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickHandle(u64);

#[derive(Default)]
struct Registry {
    next: u64,
    live: BTreeSet<u64>,
}

/// Shared registry of running frame loops.
#[derive(Clone, Default)]
pub struct TickSchedule {
    inner: Rc<RefCell<Registry>>,
}

impl TickSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a loop. It stays scheduled until the returned guard drops.
    pub fn request_tick(&self) -> FrameLoop {
        let mut reg = self.inner.borrow_mut();
        let id = reg.next;
        reg.next += 1;
        reg.live.insert(id);
        FrameLoop {
            handle: TickHandle(id),
            schedule: self.clone(),
        }
    }

    /// Returns true if the handle was still scheduled.
    pub fn cancel_tick(&self, handle: TickHandle) -> bool {
        self.inner.borrow_mut().live.remove(&handle.0)
    }

    pub fn is_scheduled(&self, handle: TickHandle) -> bool {
        self.inner.borrow().live.contains(&handle.0)
    }

    /// True while at least one loop wants another frame.
    pub fn is_active(&self) -> bool {
        !self.inner.borrow().live.is_empty()
    }

    pub fn live_loops(&self) -> usize {
        self.inner.borrow().live.len()
    }
}

/// A scheduled frame loop, cancelled when dropped.
pub struct FrameLoop {
    handle: TickHandle,
    schedule: TickSchedule,
}

impl FrameLoop {
    pub fn handle(&self) -> TickHandle {
        self.handle
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.schedule.cancel_tick(self.handle);
    }
}

// ===================================================================================
// Interval timers
// ===================================================================================

/// Interval timer id. Ids are never reused, so a stale id cannot cancel a
/// newer timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Clone, Copy, Debug)]
struct Interval {
    period: Duration,
    next_due: Duration,
}

/// Periodic timers driven by an external clock reading.
#[derive(Debug, Default)]
pub struct Timers {
    next: u64,
    intervals: BTreeMap<TimerId, Interval>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// First fires at `now + period`.
    pub fn set_interval(&mut self, period: Duration, now: Duration) -> TimerId {
        let id = TimerId(self.next);
        self.next += 1;
        let period = period.max(Duration::from_millis(1));
        self.intervals.insert(
            id,
            Interval {
                period,
                next_due: now + period,
            },
        );
        id
    }

    /// Returns true if the timer was live.
    pub fn clear_interval(&mut self, id: TimerId) -> bool {
        self.intervals.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Every firing up to and including `now`, in time order. A timer that
    /// fell behind fires once per missed period.
    pub fn due(&mut self, now: Duration) -> Vec<TimerId> {
        let mut fired: Vec<(Duration, TimerId)> = Vec::new();
        for (&id, interval) in self.intervals.iter_mut() {
            while interval.next_due <= now {
                fired.push((interval.next_due, id));
                interval.next_due += interval.period;
            }
        }
        fired.sort();
        fired.into_iter().map(|(_, id)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_the_loop_unschedules_it() {
        let schedule = TickSchedule::new();
        let a = schedule.request_tick();
        let b = schedule.request_tick();
        assert_eq!(schedule.live_loops(), 2);
        let handle = a.handle();
        drop(a);
        assert!(!schedule.is_scheduled(handle));
        assert!(schedule.is_active());
        drop(b);
        assert!(!schedule.is_active());
    }

    #[test]
    fn explicit_cancel_then_drop_is_harmless() {
        let schedule = TickSchedule::new();
        let frame = schedule.request_tick();
        assert!(schedule.cancel_tick(frame.handle()));
        assert!(!schedule.cancel_tick(frame.handle()));
        drop(frame);
        assert_eq!(schedule.live_loops(), 0);
    }

    #[test]
    fn intervals_fire_once_per_period() {
        let mut timers = Timers::new();
        let id = timers.set_interval(Duration::from_millis(200), Duration::ZERO);
        assert!(timers.due(Duration::from_millis(199)).is_empty());
        assert_eq!(timers.due(Duration::from_millis(200)), vec![id]);
        assert_eq!(timers.due(Duration::from_millis(650)), vec![id, id]);
    }

    #[test]
    fn cleared_interval_never_fires() {
        let mut timers = Timers::new();
        let a = timers.set_interval(Duration::from_millis(10), Duration::ZERO);
        let b = timers.set_interval(Duration::from_millis(10), Duration::ZERO);
        assert!(timers.clear_interval(a));
        assert!(!timers.clear_interval(a));
        assert_eq!(timers.due(Duration::from_millis(10)), vec![b]);
        assert_eq!(timers.len(), 1);
    }
}
