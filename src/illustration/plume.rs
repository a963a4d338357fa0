//! 3D view: products rising off a catalyst disk towards a gold tip
//! electrode, seen through an orbit camera.

use std::f32::consts::PI;

use eframe::egui::{self, Color32, Pos2};
use glam::{Vec2, Vec3};
use rand::Rng;

use crate::camera::OrbitCamera;
use crate::surface::Surface;

pub const CANVAS: egui::Vec2 = egui::Vec2::new(600.0, 300.0);

const CATALYST_RADIUS: f32 = 5.0;
const SPREAD: f32 = 8.0;
const INITIAL_PRODUCTS: usize = 30;
const SPAWN_CHANCE: f64 = 0.1;
const CEILING: f32 = 10.0;
const PRODUCT_RADIUS: f32 = 0.1;

const TIP_HEIGHT: f32 = 2.0;
const TIP_LENGTH: f32 = 1.5;
const TIP_RADIUS: f32 = 0.3;

const BACKGROUND: Color32 = Color32::from_rgb(26, 26, 26);
const CATALYST: Color32 = Color32::from_rgb(200, 200, 200);
const PRODUCT: Color32 = Color32::from_rgb(66, 135, 245);
const GOLD: Color32 = Color32::from_rgb(255, 215, 0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Product {
    pub pos: Vec3,
    pub vel: Vec3,
}

pub struct ElectrodePlume {
    products: Vec<Product>,
    camera: OrbitCamera,
}

impl ElectrodePlume {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let products = (0..INITIAL_PRODUCTS).map(|_| Self::new_product(rng)).collect();
        Self {
            products,
            camera: OrbitCamera::looking_at(Vec3::new(6.0, 4.0, 6.0), Vec3::ZERO, 75.0),
        }
    }

    fn new_product<R: Rng + ?Sized>(rng: &mut R) -> Product {
        Product {
            pos: Vec3::new(
                (rng.random::<f32>() - 0.5) * SPREAD,
                0.0,
                (rng.random::<f32>() - 0.5) * SPREAD,
            ),
            vel: Vec3::new(0.0, rng.random::<f32>() * 0.02 + 0.01, 0.0),
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if rng.random_bool(SPAWN_CHANCE) {
            self.products.push(Self::new_product(rng));
        }
        for p in &mut self.products {
            p.pos += p.vel;
        }
        self.products.retain(|p| p.pos.y < CEILING);
        self.camera.update();
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        let size = Vec2::new(CANVAS.x, CANVAS.y);
        let cam = &self.camera;
        let project = |p: Vec3| cam.project(p, size);
        let to_pos = |v: Vec2| Pos2::new(v.x, v.y);

        surface.clear(BACKGROUND);

        // Catalyst disk outline in the XZ plane
        let rim: Vec<Pos2> = (0..=64)
            .filter_map(|i| {
                let a = i as f32 / 64.0 * PI * 2.0;
                project(Vec3::new(a.cos() * CATALYST_RADIUS, 0.0, a.sin() * CATALYST_RADIUS))
            })
            .map(|p| to_pos(p.screen))
            .collect();
        surface.stroke_path(&rim, 1.5, CATALYST);

        // Far products first so near ones overlap them
        let mut visible: Vec<_> = self
            .products
            .iter()
            .filter_map(|p| project(p.pos))
            .collect();
        visible.sort_by(|a, b| a.scale.total_cmp(&b.scale));
        for p in visible {
            surface.fill_circle(to_pos(p.screen), (PRODUCT_RADIUS * p.scale).max(1.0), PRODUCT);
        }

        // Inverted cone: base ring above, tip pointing at the catalyst
        let base_y = TIP_HEIGHT + TIP_LENGTH / 2.0;
        let tip = project(Vec3::new(0.0, TIP_HEIGHT - TIP_LENGTH / 2.0, 0.0));
        let base: Vec<Pos2> = (0..=32)
            .filter_map(|i| {
                let a = i as f32 / 32.0 * PI * 2.0;
                project(Vec3::new(a.cos() * TIP_RADIUS, base_y, a.sin() * TIP_RADIUS))
            })
            .map(|p| to_pos(p.screen))
            .collect();
        surface.stroke_path(&base, 1.5, GOLD);
        if let Some(tip) = tip {
            for edge in base.iter().take(32).step_by(4) {
                surface.stroke_path(&[*edge, to_pos(tip.screen)], 1.5, GOLD);
            }
        }

        self.render_gizmo(surface);
    }

    /// Axis triad in the top-right corner, following the camera's orientation.
    fn render_gizmo(&self, surface: &mut dyn Surface) {
        let size = Vec2::new(150.0, 150.0);
        let offset = Vec2::new(CANVAS.x - size.x - 10.0, 10.0);
        let gizmo = self.camera.gizmo(4.0);
        let Some(origin) = gizmo.project(Vec3::ZERO, size) else {
            return;
        };
        let axes = [
            (Vec3::X, Color32::from_rgb(255, 0, 0)),
            (Vec3::Y, Color32::from_rgb(0, 255, 0)),
            (Vec3::Z, Color32::from_rgb(0, 0, 255)),
        ];
        for (axis, color) in axes {
            if let Some(end) = gizmo.project(axis, size) {
                let a = origin.screen + offset;
                let b = end.screen + offset;
                surface.stroke_path(&[Pos2::new(a.x, a.y), Pos2::new(b.x, b.y)], 2.0, color);
            }
        }
    }
}
