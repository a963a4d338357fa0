//! Drawing target for the illustrations.
//!
//! Simulations draw in their own logical canvas coordinates (e.g. 400x200);
//! `EguiSurface` maps those onto whatever screen rectangle the page gives it.

use eframe::egui::{self, Color32, Painter, Pos2, Rect, Stroke, Vec2};

pub trait Surface {
    /// Fills the whole logical canvas with `color`.
    fn clear(&mut self, color: Color32);
    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color32);
    fn fill_rect(&mut self, rect: Rect, color: Color32);
    fn stroke_path(&mut self, points: &[Pos2], width: f32, color: Color32);
}

/// A `Surface` over an egui painter.
pub struct EguiSurface<'a> {
    painter: &'a Painter,
    screen: Rect,
    scale: Vec2,
}

impl<'a> EguiSurface<'a> {
    /// `logical` is the canvas size the simulation draws in.
    pub fn new(painter: &'a Painter, screen: Rect, logical: Vec2) -> Self {
        let scale = Vec2::new(
            screen.width() / logical.x.max(f32::EPSILON),
            screen.height() / logical.y.max(f32::EPSILON),
        );
        Self {
            painter,
            screen,
            scale,
        }
    }

    fn to_screen(&self, p: Pos2) -> Pos2 {
        self.screen.min + Vec2::new(p.x * self.scale.x, p.y * self.scale.y)
    }
}

impl Surface for EguiSurface<'_> {
    fn clear(&mut self, color: Color32) {
        self.painter.rect_filled(self.screen, 4.0, color);
    }

    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color32) {
        let r = radius * self.scale.x.min(self.scale.y);
        self.painter.circle_filled(self.to_screen(center), r, color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color32) {
        let rect = Rect::from_min_max(self.to_screen(rect.min), self.to_screen(rect.max));
        self.painter.rect_filled(rect, 0.0, color);
    }

    fn stroke_path(&mut self, points: &[Pos2], width: f32, color: Color32) {
        if points.len() < 2 {
            return;
        }
        let points = points.iter().map(|&p| self.to_screen(p)).collect();
        self.painter
            .add(egui::Shape::line(points, Stroke::new(width, color)));
    }
}

/// Records draw calls instead of painting them.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSurface {
    pub clears: usize,
    pub circles: Vec<(Pos2, f32, Color32)>,
    pub rects: Vec<(Rect, Color32)>,
    pub paths: Vec<Vec<Pos2>>,
}

#[cfg(test)]
impl Surface for RecordingSurface {
    fn clear(&mut self, _color: Color32) {
        self.clears += 1;
    }

    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color32) {
        self.circles.push((center, radius, color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color32) {
        self.rects.push((rect, color));
    }

    fn stroke_path(&mut self, points: &[Pos2], _width: f32, _color: Color32) {
        self.paths.push(points.to_vec());
    }
}
