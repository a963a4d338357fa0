//! Slowly drifting contour lines behind every page.
//!
//! Purely decorative. A `Backdrop` keeps a frame loop alive for as long as
//! it exists; dropping it is the teardown.

use std::f32::consts::PI;
use std::time::Duration;

use eframe::egui::{Color32, Pos2, Vec2};

use crate::error::BackdropError;
use crate::schedule::{FrameLoop, TickSchedule};
use crate::surface::Surface;

pub const LINE_COLOR: Color32 = Color32::from_rgb(0x52, 0x66, 0x81);
pub const BACKGROUND: Color32 = Color32::from_rgb(0x09, 0x11, 0x49);

/// Window resizes are applied once they have been quiet this long.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

const SEGMENTS: usize = 48;

pub struct Backdrop {
    viewport: Vec2,
    contours: usize,
    phase: f32,
    pending_resize: Option<(Vec2, Duration)>,
    _frame: FrameLoop,
}

impl Backdrop {
    pub fn init(schedule: &TickSchedule, viewport: Vec2, contours: usize) -> Result<Self, BackdropError> {
        if !(viewport.x.is_finite() && viewport.y.is_finite()) || viewport.x < 1.0 || viewport.y < 1.0 {
            return Err(BackdropError::DegenerateViewport {
                width: viewport.x,
                height: viewport.y,
            });
        }
        if contours == 0 {
            return Err(BackdropError::NoContours(contours));
        }
        log::info!("backdrop started ({}x{}, {contours} contours)", viewport.x, viewport.y);
        Ok(Self {
            viewport,
            contours,
            phase: 0.0,
            pending_resize: None,
            _frame: schedule.request_tick(),
        })
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Records a resize; it takes effect after `RESIZE_DEBOUNCE` of quiet.
    pub fn resize(&mut self, viewport: Vec2, now: Duration) {
        if viewport != self.viewport {
            self.pending_resize = Some((viewport, now));
        }
    }

    pub fn update(&mut self, dt: f32, now: Duration) {
        self.phase = (self.phase + dt * 0.2) % (PI * 2.0);
        if let Some((viewport, at)) = self.pending_resize {
            if now.saturating_sub(at) >= RESIZE_DEBOUNCE {
                self.viewport = viewport;
                self.pending_resize = None;
            }
        }
    }

    /// Wavy horizontal contour `i`, in viewport coordinates.
    pub fn contour(&self, i: usize) -> Vec<Pos2> {
        let spacing = self.viewport.y / (self.contours + 1) as f32;
        let base = spacing * (i + 1) as f32;
        let amplitude = spacing * 0.4;
        (0..=SEGMENTS)
            .map(|s| {
                let x = self.viewport.x * s as f32 / SEGMENTS as f32;
                let k = x / self.viewport.x * PI * 3.0;
                let y = base + amplitude * (k + self.phase + i as f32 * 0.7).sin();
                Pos2::new(x, y)
            })
            .collect()
    }

    pub fn paint(&self, surface: &mut dyn Surface) {
        surface.clear(BACKGROUND);
        for i in 0..self.contours {
            surface.stroke_path(&self.contour(i), 1.0, LINE_COLOR);
        }
    }
}

impl Drop for Backdrop {
    fn drop(&mut self) {
        log::info!("backdrop destroyed");
    }
}

/// A backdrop that may have failed to start; paints a flat fill if so.
pub struct Background {
    effect: Option<Backdrop>,
}

impl Background {
    pub fn new(schedule: &TickSchedule, viewport: Vec2, contours: usize) -> Self {
        let effect = match Backdrop::init(schedule, viewport, contours) {
            Ok(effect) => Some(effect),
            Err(e) => {
                log::error!("Failed to initialize backdrop effect: {e}");
                None
            }
        };
        Self { effect }
    }

    pub fn is_animated(&self) -> bool {
        self.effect.is_some()
    }

    pub fn effect_mut(&mut self) -> Option<&mut Backdrop> {
        self.effect.as_mut()
    }

    pub fn paint(&self, surface: &mut dyn Surface) {
        match &self.effect {
            Some(effect) => effect.paint(surface),
            None => surface.clear(BACKGROUND),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    #[test]
    fn degenerate_viewport_fails() {
        let schedule = TickSchedule::new();
        let err = Backdrop::init(&schedule, Vec2::new(0.0, 600.0), 8).err();
        assert_eq!(
            err,
            Some(BackdropError::DegenerateViewport {
                width: 0.0,
                height: 600.0
            })
        );
        assert!(!schedule.is_active());
    }

    #[test]
    fn failed_init_degrades_to_static_fill() {
        let schedule = TickSchedule::new();
        let background = Background::new(&schedule, Vec2::new(800.0, 600.0), 0);
        assert!(!background.is_animated());
        let mut surface = RecordingSurface::default();
        background.paint(&mut surface);
        assert_eq!(surface.clears, 1);
        assert!(surface.paths.is_empty());
    }

    #[test]
    fn teardown_releases_the_frame_loop() {
        let schedule = TickSchedule::new();
        let background = Background::new(&schedule, Vec2::new(800.0, 600.0), 6);
        assert!(background.is_animated());
        assert!(schedule.is_active());

        let mut surface = RecordingSurface::default();
        background.paint(&mut surface);
        assert_eq!(surface.paths.len(), 6);

        drop(background);
        assert!(!schedule.is_active());
    }

    #[test]
    fn resize_is_debounced() {
        let schedule = TickSchedule::new();
        let mut effect = Backdrop::init(&schedule, Vec2::new(800.0, 600.0), 4).unwrap();
        effect.resize(Vec2::new(1024.0, 768.0), Duration::from_millis(1000));
        effect.update(0.016, Duration::from_millis(1100));
        assert_eq!(effect.viewport(), Vec2::new(800.0, 600.0));
        effect.update(0.016, Duration::from_millis(1150));
        assert_eq!(effect.viewport(), Vec2::new(1024.0, 768.0));
    }

    #[test]
    fn contours_stay_inside_the_viewport() {
        let schedule = TickSchedule::new();
        let effect = Backdrop::init(&schedule, Vec2::new(800.0, 600.0), 5).unwrap();
        for i in 0..5 {
            for p in effect.contour(i) {
                assert!(p.y > 0.0 && p.y < 600.0);
                assert!(p.x >= 0.0 && p.x <= 800.0);
            }
        }
    }
}
