//! Procedural vehicle geometry: the block model shown in the geometry
//! viewer and the sculpted body used by the CFD post view.

use super::{add, cross, length, sub, Point3};
use shared::design::{Dimensions, VehicleType};

pub type Tri = [Point3; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    Body,
    Glass,
    Tire,
}

#[derive(Debug, Clone)]
pub struct Part {
    pub material: Material,
    pub triangles: Vec<Tri>,
}

impl Part {
    fn new(material: Material, triangles: Vec<Tri>) -> Self {
        Self { material, triangles }
    }
}

/// (vertices, faces) with three vertices per face, like an unindexed STL
pub fn stats(parts: &[Part]) -> (usize, usize) {
    let faces: usize = parts.iter().map(|p| p.triangles.len()).sum();
    (faces * 3, faces)
}

fn push_quad(out: &mut Vec<Tri>, a: Point3, b: Point3, c: Point3, d: Point3) {
    for tri in [[a, b, c], [a, c, d]] {
        if length(cross(sub(tri[1], tri[0]), sub(tri[2], tri[0]))) > 1e-9 {
            out.push(tri);
        }
    }
}

/// Axis-aligned box split into `segments` cells per axis, outward winding
pub fn subdivided_box(center: Point3, size: Point3, segments: [usize; 3]) -> Vec<Tri> {
    let half = [size[0] * 0.5, size[1] * 0.5, size[2] * 0.5];
    let mut out = Vec::new();
    for axis in 0..3 {
        let u = (axis + 1) % 3;
        let v = (axis + 2) % 3;
        for sign in [1.0f32, -1.0] {
            let at = |i: usize, j: usize| {
                let mut p = [0.0; 3];
                p[axis] = sign * half[axis];
                p[u] = -half[u] + size[u] * i as f32 / segments[u] as f32;
                p[v] = -half[v] + size[v] * j as f32 / segments[v] as f32;
                add(p, center)
            };
            for i in 0..segments[u] {
                for j in 0..segments[v] {
                    let (a, b, c, d) = (at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1));
                    if sign > 0.0 {
                        push_quad(&mut out, a, b, c, d);
                    } else {
                        push_quad(&mut out, a, d, c, b);
                    }
                }
            }
        }
    }
    out
}

/// Closed cylinder whose axis runs along `axis` (0 = x, 1 = y, 2 = z)
pub fn cylinder(center: Point3, radius: f32, width: f32, axis: usize, segments: usize) -> Vec<Tri> {
    let u = (axis + 1) % 3;
    let v = (axis + 2) % 3;
    let rim = |k: usize, side: f32| {
        let phi = std::f32::consts::TAU * k as f32 / segments as f32;
        let mut p = [0.0; 3];
        p[u] = radius * phi.cos();
        p[v] = radius * phi.sin();
        p[axis] = side * width * 0.5;
        add(p, center)
    };
    let mut cap = [0.0; 3];
    cap[axis] = width * 0.5;
    let top = add(center, cap);
    let bottom = sub(center, cap);

    let mut out = Vec::with_capacity(segments * 4);
    for k in 0..segments {
        push_quad(&mut out, rim(k, -1.0), rim(k + 1, -1.0), rim(k + 1, 1.0), rim(k, 1.0));
        out.push([top, rim(k, 1.0), rim(k + 1, 1.0)]);
        out.push([bottom, rim(k + 1, -1.0), rim(k, -1.0)]);
    }
    out
}

/// UV sphere scaled by `radii`
pub fn ellipsoid(center: Point3, radii: Point3, rings: usize, sectors: usize) -> Vec<Tri> {
    let at = |i: usize, j: usize| {
        let theta = std::f32::consts::PI * i as f32 / rings as f32;
        let phi = std::f32::consts::TAU * j as f32 / sectors as f32;
        add(
            center,
            [
                radii[0] * theta.sin() * phi.sin(),
                radii[1] * theta.cos(),
                radii[2] * theta.sin() * phi.cos(),
            ],
        )
    };
    let mut out = Vec::with_capacity(rings * sectors * 2);
    for i in 0..rings {
        for j in 0..sectors {
            push_quad(&mut out, at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1));
        }
    }
    out
}

/// Block model sized from the design's dimensions (mm, shown at 1:10).
/// Length runs along x, width along z, wheels sit on y = 0.
pub fn block_car(dims: &Dimensions, vehicle: VehicleType) -> Vec<Part> {
    let l = dims.length / 10.0;
    let w = dims.width / 10.0;
    let h = dims.height / 10.0;

    let chassis = subdivided_box([0.0, h * 0.4, 0.0], [l, h * 0.4, w], [1, 1, 1]);
    let cabin_len = if vehicle == VehicleType::Sports { l * 0.4 } else { l * 0.6 };
    let cabin = subdivided_box([-l * 0.1, h * 0.8, 0.0], [cabin_len, h * 0.4, w * 0.85], [1, 1, 1]);

    let wheel_r = h * 0.35;
    let wheels = [(0.35, 0.5), (0.35, -0.5), (-0.35, 0.5), (-0.35, -0.5)]
        .iter()
        .flat_map(|&(fx, fz)| cylinder([l * fx, wheel_r, w * fz], wheel_r, w * 0.3, 2, 32))
        .collect();

    vec![
        Part::new(Material::Body, chassis),
        Part::new(Material::Glass, cabin),
        Part::new(Material::Tire, wheels),
    ]
}

/// Shape a point of the 1.8 x 0.8 x 4.2 body block: sloped hood and narrow
/// nose toward +z, raised diffuser at the tail, lifted wheel arches, pinched
/// upper half.
pub fn sculpt(p: Point3) -> Point3 {
    let [mut x, mut y, z] = p;

    if z > 0.5 {
        let f = (z - 0.5) / 1.6;
        y -= f * f * 0.6;
        x *= 1.0 - f * 0.3;
    }
    if z < -1.0 {
        y += (z + 1.0) * 0.1;
    }
    let wheel_area = (z - 1.2).abs() < 0.5 || (z + 1.2).abs() < 0.5;
    if wheel_area && y < 0.0 && x.abs() > 0.8 {
        y += 0.2;
    }
    if y > 0.0 {
        x *= 0.85;
    }
    [x, y, z]
}

/// Sculpted sports body used in the flow view; nose points to +z
pub fn aero_body() -> Vec<Part> {
    let body = subdivided_box([0.0; 3], [1.8, 0.8, 4.2], [20, 10, 40])
        .into_iter()
        .map(|tri| tri.map(|p| add(sculpt(p), [0.0, 0.6, 0.0])))
        .collect();
    let cabin = ellipsoid([0.0, 1.1, -0.2], [0.7, 0.4, 1.2], 16, 24);

    let wheels = [
        [0.8, 0.35, 1.2],
        [-0.8, 0.35, 1.2],
        [0.85, 0.38, -1.2],
        [-0.85, 0.38, -1.2],
    ]
    .iter()
    .flat_map(|&c| cylinder(c, 0.35, 0.3, 0, 24))
    .collect();

    vec![
        Part::new(Material::Body, body),
        Part::new(Material::Body, cabin),
        Part::new(Material::Tire, wheels),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{dot, face_normal};

    fn bounds(tris: &[Tri]) -> (Point3, Point3) {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for p in tris.iter().flatten() {
            for a in 0..3 {
                min[a] = min[a].min(p[a]);
                max[a] = max[a].max(p[a]);
            }
        }
        (min, max)
    }

    fn centroid(tri: &Tri) -> Point3 {
        let s = add(add(tri[0], tri[1]), tri[2]);
        [s[0] / 3.0, s[1] / 3.0, s[2] / 3.0]
    }

    #[test]
    fn test_box_faces_point_outward() {
        let tris = subdivided_box([0.0; 3], [2.0, 1.0, 4.0], [2, 3, 4]);
        // 2 * (2*3 + 3*4 + 4*2) quads, two triangles each
        assert_eq!(tris.len(), 2 * 2 * 26);
        for tri in &tris {
            assert!(dot(face_normal(tri), centroid(tri)) > 0.0);
        }
    }

    #[test]
    fn test_cylinder_and_ellipsoid_wind_outward() {
        for tri in cylinder([0.0; 3], 1.0, 0.5, 0, 12) {
            assert!(dot(face_normal(&tri), centroid(&tri)) > 0.0);
        }
        for tri in ellipsoid([0.0; 3], [0.7, 0.4, 1.2], 8, 12) {
            assert!(dot(face_normal(&tri), centroid(&tri)) > 0.0);
        }
    }

    #[test]
    fn test_sculpt_rules() {
        // untouched mid-body lower corner
        assert_eq!(sculpt([0.9, -0.4, 0.0]), [0.9, -0.4, 0.0]);
        // nose tip: hood drops 0.6 and narrows by 30%
        let nose = sculpt([0.9, 0.4, 2.1]);
        assert!((nose[1] - -0.2).abs() < 1e-5);
        assert!((nose[0] - 0.63).abs() < 1e-5);
        // tail diffuser
        let tail = sculpt([0.0, -0.4, -2.1]);
        assert!((tail[1] - -0.51).abs() < 1e-5);
        // rear wheel arch lifted on top of the diffuser rise
        assert!((sculpt([0.9, -0.4, -1.2])[1] - -0.22).abs() < 1e-5);
        // roof pinched
        assert!((sculpt([0.9, 0.4, 0.0])[0] - 0.765).abs() < 1e-5);
    }

    #[test]
    fn test_aero_body_bounds() {
        let parts = aero_body();
        let (min, max) = bounds(&parts[0].triangles);
        // the hood slope drags the nose underside below the floor
        assert!(min[1] >= -0.4 - 1e-5 && max[1] <= 1.0 + 1e-5, "{min:?} {max:?}");
        assert!((min[2] - -2.1).abs() < 1e-5 && (max[2] - 2.1).abs() < 1e-5);
        assert!(max[0] <= 0.9 + 1e-5);
        assert_eq!(parts[0].triangles.len(), 2 * 2 * (20 * 10 + 10 * 40 + 40 * 20));
    }

    #[test]
    fn test_block_car_cabin_by_type() {
        let dims = Dimensions::default();
        let cabin_len = |v| {
            let parts = block_car(&dims, v);
            let (min, max) = bounds(&parts[1].triangles);
            max[0] - min[0]
        };
        assert!((cabin_len(VehicleType::Sports) - 180.0).abs() < 1e-3);
        assert!((cabin_len(VehicleType::Suv) - 270.0).abs() < 1e-3);

        let parts = block_car(&dims, VehicleType::Sports);
        let (min, _) = bounds(&parts[2].triangles);
        assert!(min[1].abs() < 1e-3, "wheels rest on the ground");
        assert_eq!(stats(&parts).0, stats(&parts).1 * 3);
    }
}
