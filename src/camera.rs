//! Orbit camera for the 3D electrode scene.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Perspective camera orbiting a target, with damped rotation.
///
/// Drags add to an angular velocity; every `update` applies a `damping`
/// fraction of it and keeps the rest for later frames, so the view glides
/// to a stop.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Rotation about +Y, measured from +Z towards +X.
    pub yaw: f32,
    /// Elevation above the XZ plane.
    pub pitch: f32,
    pub fov_y: f32,
    pub damping: f32,
    pub rotate_speed: f32,
    pending_yaw: f32,
    pending_pitch: f32,
}

/// A world point mapped into a viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub screen: Vec2,
    /// Viewport pixels per world unit at this depth.
    pub scale: f32,
}

const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

impl OrbitCamera {
    pub fn looking_at(position: Vec3, target: Vec3, fov_y_degrees: f32) -> Self {
        let offset = position - target;
        let distance = offset.length().max(1e-3);
        Self {
            target,
            distance,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            fov_y: fov_y_degrees.to_radians(),
            damping: 0.05,
            rotate_speed: 0.01,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vec3::new(sy * cp, sp, cy * cp) * self.distance
    }

    /// Queues rotation from a pointer drag of `delta` pixels.
    pub fn drag(&mut self, delta: Vec2) {
        self.pending_yaw -= delta.x * self.rotate_speed;
        self.pending_pitch += delta.y * self.rotate_speed;
    }

    /// Advances the damped rotation by one frame.
    pub fn update(&mut self) {
        self.yaw += self.pending_yaw * self.damping;
        self.pitch = (self.pitch + self.pending_pitch * self.damping).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.pending_yaw *= 1.0 - self.damping;
        self.pending_pitch *= 1.0 - self.damping;
    }

    pub fn is_settled(&self) -> bool {
        self.pending_yaw.abs() < 1e-5 && self.pending_pitch.abs() < 1e-5
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.position(), self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(self.fov_y, aspect.max(1e-6), 0.1, 1000.0);
        proj * view
    }

    /// Same orientation, pulled in to `distance` around the origin; used for
    /// the corner axis gizmo.
    pub fn gizmo(&self, distance: f32) -> OrbitCamera {
        OrbitCamera {
            target: Vec3::ZERO,
            distance,
            fov_y: 50f32.to_radians(),
            ..self.clone()
        }
    }

    /// Maps `point` into a `size` viewport (origin top-left), or `None` when
    /// it is behind the camera.
    pub fn project(&self, point: Vec3, size: Vec2) -> Option<Projected> {
        let clip = self.view_projection(size.x / size.y) * Vec4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= 1e-4 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let screen = Vec2::new((ndc.x + 1.0) * 0.5 * size.x, (1.0 - ndc.y) * 0.5 * size.y);
        let scale = size.y / (2.0 * (self.fov_y * 0.5).tan() * clip.w);
        Some(Projected { screen, scale })
    }
}
