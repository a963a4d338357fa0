//! Raster motion of the probe and the electrode geometry it carries.

use eframe::egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::particle::Particle;

/// Probe position inside the scan domain.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElectrodeState {
    pub x: f32,
    pub y: f32,
}

/// What one `advance` did besides moving the probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanEvent {
    Moved,
    /// x wrapped to 0 and y moved down one row.
    RowWrapped,
    /// y wrapped as well: the image is complete and a new pass starts.
    PassCompleted,
}

/// Sweeps the probe left to right, row by row, over `[0, width) x [0, height)`.
///
/// Positions are derived from integer column/row counters, so long runs do
/// not accumulate floating-point drift.
#[derive(Clone, Debug)]
pub struct ElectrodeScanner {
    config: ScanConfig,
    column: u32,
    row: u32,
    passes: u64,
}

impl ElectrodeScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            column: 0,
            row: 0,
            passes: 0,
        }
    }

    pub fn state(&self) -> ElectrodeState {
        ElectrodeState {
            x: self.column as f32 * self.config.step,
            y: self.row as f32 * self.config.row_step,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Completed passes since construction or the last reset.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn advance(&mut self) -> (ElectrodeState, ScanEvent) {
        self.column += 1;
        let mut event = ScanEvent::Moved;

        if self.column as f32 * self.config.step >= self.config.width {
            log::debug!("scan row {} done", self.row);
            self.column = 0;
            self.row += 1;
            event = ScanEvent::RowWrapped;

            if self.row as f32 * self.config.row_step >= self.config.height {
                self.row = 0;
                self.passes += 1;
                event = ScanEvent::PassCompleted;
                log::debug!("scan pass {} completed", self.passes);
            }
        }
        (self.state(), event)
    }

    pub fn reset(&mut self) {
        self.column = 0;
        self.row = 0;
        self.passes = 0;
    }
}

// ===================================================================================
// Electrode geometry
// ===================================================================================

/// The detecting bar: `width` wide, centred on `center_x`, spanning
/// `top..top + height` vertically.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElectrodeBar {
    pub center_x: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ElectrodeBar {
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(
            Pos2::new(self.center_x - self.width / 2.0, self.top),
            Vec2::new(self.width, self.height),
        )
    }

    /// Anything at or above the bar's lower face, inside its horizontal
    /// extent, counts as a hit. Used when particles only arrive from below.
    pub fn top_face_hit(&self, p: &Particle) -> bool {
        let half = self.width / 2.0;
        p.pos.y <= self.top + self.height
            && p.pos.x >= self.center_x - half
            && p.pos.x <= self.center_x + half
    }

    /// The particle's bounding box overlaps the bar.
    pub fn aabb_hit(&self, p: &Particle) -> bool {
        let bar = self.rect();
        p.pos.x + p.radius >= bar.min.x
            && p.pos.x - p.radius <= bar.max.x
            && p.pos.y + p.radius >= bar.min.y
            && p.pos.y - p.radius <= bar.max.y
    }
}

/// Which hit test an illustration uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitTest {
    #[default]
    TopFace,
    BoundingBox,
}

impl HitTest {
    pub fn hits(self, bar: &ElectrodeBar, p: &Particle) -> bool {
        match self {
            HitTest::TopFace => bar.top_face_hit(p),
            HitTest::BoundingBox => bar.aabb_hit(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle_at(x: f32, y: f32, radius: f32) -> Particle {
        Particle {
            pos: Pos2::new(x, y),
            vel: Vec2::ZERO,
            radius,
            alpha: 1.0,
            decay: 1.0,
            collided: false,
        }
    }

    #[test]
    fn x_stays_in_domain() {
        let mut scanner = ElectrodeScanner::new(ScanConfig::default());
        for _ in 0..10_000 {
            let (state, _) = scanner.advance();
            assert!(state.x >= 0.0 && state.x < 400.0);
            assert!(state.y >= 0.0 && state.y < 200.0);
        }
    }

    #[test]
    fn row_wraps_after_width_over_step_advances() {
        let mut scanner = ElectrodeScanner::new(ScanConfig::default());
        for i in 1..200 {
            let (state, event) = scanner.advance();
            assert_eq!(event, ScanEvent::Moved);
            assert_eq!(state, ElectrodeState { x: i as f32 * 2.0, y: 0.0 });
        }
        let (state, event) = scanner.advance();
        assert_eq!(event, ScanEvent::RowWrapped);
        assert_eq!(state, ElectrodeState { x: 0.0, y: 10.0 });
    }

    #[test]
    fn pass_completes_after_all_rows() {
        let mut scanner = ElectrodeScanner::new(ScanConfig::default());
        let mut rows = 0;
        let mut last = ScanEvent::Moved;
        for _ in 0..(200 * 20) {
            let (_, event) = scanner.advance();
            if event == ScanEvent::RowWrapped {
                rows += 1;
            }
            last = event;
        }
        assert_eq!(rows, 19);
        assert_eq!(last, ScanEvent::PassCompleted);
        assert_eq!(scanner.state(), ElectrodeState::default());
        assert_eq!(scanner.passes(), 1);
    }

    #[test]
    fn odd_step_still_wraps_before_width() {
        let config = ScanConfig {
            width: 10.0,
            height: 10.0,
            step: 3.0,
            row_step: 4.0,
        };
        let mut scanner = ElectrodeScanner::new(config);
        let xs: Vec<f32> = (0..4).map(|_| scanner.advance().0.x).collect();
        assert_eq!(xs, vec![3.0, 6.0, 9.0, 0.0]);
        assert_eq!(scanner.state().y, 4.0);
    }

    #[test]
    fn top_face_catches_anything_above_the_face() {
        let bar = ElectrodeBar {
            center_x: 200.0,
            top: 20.0,
            width: 60.0,
            height: 10.0,
        };
        assert!(bar.top_face_hit(&particle_at(200.0, 30.0, 3.0)));
        assert!(bar.top_face_hit(&particle_at(170.0, 0.0, 3.0)));
        assert!(!bar.top_face_hit(&particle_at(200.0, 31.0, 3.0)));
        assert!(!bar.top_face_hit(&particle_at(231.0, 25.0, 3.0)));
    }

    #[test]
    fn bounding_box_needs_overlap() {
        let bar = ElectrodeBar {
            center_x: 200.0,
            top: 20.0,
            width: 60.0,
            height: 10.0,
        };
        assert!(bar.aabb_hit(&particle_at(232.0, 25.0, 3.0)));
        assert!(!bar.aabb_hit(&particle_at(200.0, 10.0, 3.0)));
        assert!(HitTest::TopFace.hits(&bar, &particle_at(200.0, 10.0, 3.0)));
        assert!(!HitTest::BoundingBox.hits(&bar, &particle_at(200.0, 40.0, 3.0)));
    }
}
