//! Orbit camera with a perspective projection onto an egui rect.

use super::{cross, dot, length, normalize, scale, sub, add, Point3};
use egui::{Pos2, Rect, Vec2};

const UP: Point3 = [0.0, 1.0, 0.0];
// straight up/down makes the view basis degenerate
const PITCH_LIMIT: f32 = 1.55;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: Point3,
    /// Radians around +Y, 0 looks from +Z
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov_deg: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitCamera {
    /// Camera at `eye` looking at `target`
    pub fn looking_at(eye: Point3, target: Point3, fov_deg: f32) -> Self {
        let offset = sub(eye, target);
        let distance = length(offset).max(1e-3);
        Self {
            target,
            yaw: offset[0].atan2(offset[2]),
            pitch: (offset[1] / distance).clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT),
            distance,
            fov_deg,
            min_distance: distance * 0.1,
            max_distance: distance * 4.0,
        }
    }

    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    pub fn eye(&self) -> Point3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        add(self.target, scale([cp * sy, sp, cp * cy], self.distance))
    }

    /// Unit vector from the eye toward the target
    pub fn forward(&self) -> Point3 {
        normalize(sub(self.target, self.eye()))
    }

    /// Left-drag orbit
    pub fn orbit(&mut self, drag: Vec2) {
        self.yaw -= drag.x * 0.01;
        self.pitch = (self.pitch + drag.y * 0.01).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Scroll zoom; positive `scroll` moves closer
    pub fn zoom(&mut self, scroll: f32) {
        let factor = (-scroll * 0.002).exp();
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Screen position and view depth, `None` behind the near plane
    pub fn project(&self, p: Point3, rect: Rect) -> Option<(Pos2, f32)> {
        let eye = self.eye();
        let forward = normalize(sub(self.target, eye));
        let right = normalize(cross(forward, UP));
        let up = cross(right, forward);

        let rel = sub(p, eye);
        let depth = dot(rel, forward);
        if depth < self.distance * 0.01 {
            return None;
        }
        let focal = rect.height() * 0.5 / (self.fov_deg.to_radians() * 0.5).tan();
        let x = dot(rel, right) / depth * focal;
        let y = dot(rel, up) / depth * focal;
        Some((rect.center() + Vec2::new(x, -y), depth))
    }
}

/// Fixed viewpoints of the geometry viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPreset {
    Iso,
    Top,
    Side,
    Front,
}

impl ViewPreset {
    pub const ALL: [ViewPreset; 4] = [ViewPreset::Iso, ViewPreset::Top, ViewPreset::Side, ViewPreset::Front];

    pub fn label(&self) -> &'static str {
        match self {
            ViewPreset::Iso => "ISO",
            ViewPreset::Top => "TOP",
            ViewPreset::Side => "SIDE",
            ViewPreset::Front => "FRONT",
        }
    }

    pub fn eye(&self) -> Point3 {
        const DIST: f32 = 600.0;
        match self {
            ViewPreset::Iso => [400.0, 300.0, 400.0],
            ViewPreset::Top => [0.0, DIST, 0.0],
            ViewPreset::Side => [0.0, 0.0, DIST],
            ViewPreset::Front => [DIST, 0.0, 0.0],
        }
    }

    pub fn camera(&self) -> OrbitCamera {
        OrbitCamera::looking_at(self.eye(), [0.0; 3], 45.0).with_distance_limits(100.0, 1500.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_target_projects_to_center() {
        let cam = OrbitCamera::looking_at([-8.0, 3.0, 8.0], [0.0, 0.5, 0.0], 40.0);
        let (pos, depth) = cam.project([0.0, 0.5, 0.0], rect()).unwrap();
        assert!((pos - rect().center()).length() < 1e-3);
        assert!((depth - cam.distance).abs() < 1e-3);
    }

    #[test]
    fn test_eye_round_trips() {
        let cam = OrbitCamera::looking_at([400.0, 300.0, 400.0], [0.0; 3], 45.0);
        let eye = cam.eye();
        for (a, b) in eye.iter().zip([400.0, 300.0, 400.0]) {
            assert!((a - b).abs() < 0.01, "{eye:?}");
        }
    }

    #[test]
    fn test_behind_camera_is_culled() {
        let cam = ViewPreset::Side.camera();
        assert!(cam.project([0.0, 0.0, 1200.0], rect()).is_none());
    }

    #[test]
    fn test_up_is_up_on_screen() {
        let cam = ViewPreset::Front.camera();
        let (high, _) = cam.project([0.0, 100.0, 0.0], rect()).unwrap();
        assert!(high.y < rect().center().y);
    }

    #[test]
    fn test_top_view_pitch_is_clamped() {
        let cam = ViewPreset::Top.camera();
        assert!(cam.pitch <= PITCH_LIMIT);
        assert!(cam.project([10.0, 0.0, 10.0], rect()).is_some());
    }

    #[test]
    fn test_zoom_respects_limits() {
        let mut cam = ViewPreset::Iso.camera();
        cam.zoom(1e6);
        assert_eq!(cam.distance, 100.0);
        cam.zoom(-1e6);
        assert_eq!(cam.distance, 1500.0);
    }
}
