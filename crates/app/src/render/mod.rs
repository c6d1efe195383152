//! Software 3D for the geometry and CFD views.
//!
//! Everything is projected on the CPU and painted as egui meshes, back to
//! front. Good enough for a few thousand triangles per frame.

pub mod camera;
pub mod car_model;
pub mod chart;
pub mod colormap;
pub mod flow_field;

pub use camera::OrbitCamera;

use egui::{Color32, Pos2, Rect};

pub type Point3 = [f32; 3];

#[inline]
pub fn add(a: Point3, b: Point3) -> Point3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub(a: Point3, b: Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn scale(v: Point3, k: f32) -> Point3 {
    [v[0] * k, v[1] * k, v[2] * k]
}

#[inline]
pub fn dot(a: Point3, b: Point3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: Point3, b: Point3) -> Point3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn length(v: Point3) -> f32 {
    dot(v, v).sqrt()
}

#[inline]
pub fn normalize(v: Point3) -> Point3 {
    let len = length(v);
    if len <= f32::EPSILON {
        [0.0, 0.0, 0.0]
    } else {
        scale(v, 1.0 / len)
    }
}

/// Unit normal of a counter-clockwise triangle
pub fn face_normal(tri: &[Point3; 3]) -> Point3 {
    normalize(cross(sub(tri[1], tri[0]), sub(tri[2], tri[0])))
}

/// A colored triangle ready to paint
#[derive(Debug, Clone, Copy)]
pub struct Face {
    pub verts: [Point3; 3],
    pub color: Color32,
}

/// Project and paint faces back to front. `wire` draws edges instead of fills.
pub fn paint_faces(
    painter: &egui::Painter,
    camera: &OrbitCamera,
    rect: Rect,
    faces: &[Face],
    wire: Option<egui::Stroke>,
) {
    let mut projected: Vec<([Pos2; 3], f32, Color32)> = faces
        .iter()
        .filter_map(|face| {
            let a = camera.project(face.verts[0], rect)?;
            let b = camera.project(face.verts[1], rect)?;
            let c = camera.project(face.verts[2], rect)?;
            Some(([a.0, b.0, c.0], (a.1 + b.1 + c.1) / 3.0, face.color))
        })
        .collect();
    projected.sort_by(|x, y| y.1.total_cmp(&x.1));

    if let Some(stroke) = wire {
        for (pts, _, _) in &projected {
            painter.add(egui::Shape::closed_line(pts.to_vec(), stroke));
        }
        return;
    }

    let mut mesh = egui::Mesh::default();
    for (pts, _, color) in projected {
        let base = mesh.vertices.len() as u32;
        for p in pts {
            mesh.colored_vertex(p, color);
        }
        mesh.add_triangle(base, base + 1, base + 2);
        // egui meshes index with u32 but keep batches modest
        if mesh.vertices.len() > 60_000 {
            painter.add(egui::Shape::mesh(std::mem::take(&mut mesh)));
        }
    }
    if !mesh.is_empty() {
        painter.add(egui::Shape::mesh(mesh));
    }
}

/// Scale an rgb color by a light factor, clamped
pub fn lit(rgb: Point3, factor: f32) -> Color32 {
    let c = |v: f32| ((v * factor).clamp(0.0, 1.0) * 255.0) as u8;
    Color32::from_rgb(c(rgb[0]), c(rgb[1]), c(rgb[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_normal_ccw() {
        let tri = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert_eq!(face_normal(&tri), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_normalize_zero_stays_zero() {
        assert_eq!(normalize([0.0; 3]), [0.0; 3]);
        assert!((length(normalize([3.0, 4.0, 0.0])) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_lit_clamps() {
        assert_eq!(lit([1.0, 0.5, 0.0], 4.0), Color32::from_rgb(255, 255, 0));
    }
}
