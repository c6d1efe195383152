//! Surface and streak coloring for the CFD post view.

use super::{dot, normalize, scale, sub, Point3};
use egui::Color32;

/// Free stream arrives from +Z
pub const WIND_DIR: Point3 = [0.0, 0.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceMode {
    /// Pressure coefficient proxy
    Pressure,
    /// Wall velocity proxy
    Velocity,
    /// Metallic paint with a faint pressure tint
    #[default]
    Combined,
}

impl SurfaceMode {
    pub const ALL: [SurfaceMode; 3] = [SurfaceMode::Pressure, SurfaceMode::Velocity, SurfaceMode::Combined];

    pub fn label(&self) -> &'static str {
        match self {
            SurfaceMode::Pressure => "Pressure Coeff (Cp)",
            SurfaceMode::Velocity => "Wall Velocity",
            SurfaceMode::Combined => "Metallic + Pressure",
        }
    }

    /// Legend end labels and title
    pub fn legend(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            SurfaceMode::Pressure => ("-2000 Pa (Cp -1.5)", "Surface Pressure", "+1500 Pa (Cp 1.0)"),
            _ => ("0 m/s", "Flow Velocity", "60 m/s"),
        }
    }
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Polynomial fit of the Turbo colormap, `t` clamped to 0..=1
pub fn turbo(t: f32) -> Point3 {
    const RED: [f32; 6] = [
        0.13572138, 4.61539260, -42.66032258, 132.13108234, -152.94239396, 59.28637943,
    ];
    const GREEN: [f32; 6] = [
        0.09140261, 2.19418839, 4.84296658, -14.18503333, 4.27729857, 2.82956604,
    ];
    const BLUE: [f32; 6] = [
        0.10667330, 12.64194608, -60.58204836, 110.36276771, -89.90310912, 27.34824973,
    ];

    let t = t.clamp(0.0, 1.0);
    let mut powers = [1.0; 6];
    for i in 1..6 {
        powers[i] = powers[i - 1] * t;
    }
    let poly = |k: [f32; 6]| {
        k.iter()
            .zip(powers)
            .map(|(a, b)| a * b)
            .sum::<f32>()
            .clamp(0.0, 1.0)
    };
    [poly(RED), poly(GREEN), poly(BLUE)]
}

pub fn to_color(rgb: Point3) -> Color32 {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgb(c(rgb[0]), c(rgb[1]), c(rgb[2]))
}

fn mix(a: Point3, b: Point3, t: f32) -> Point3 {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn reflect(incident: Point3, normal: Point3) -> Point3 {
    sub(incident, scale(normal, 2.0 * dot(normal, incident)))
}

/// Blinn-Phong style shading of one face of the body
pub fn shade_surface(normal: Point3, view_dir: Point3, mode: SurfaceMode) -> Color32 {
    let light_dir = normalize([5.0, 10.0, 5.0]);
    let cp = dot(normal, WIND_DIR);
    let velocity = smoothstep(0.0, 1.0, 1.0 - dot(normal, WIND_DIR).abs());

    let diffuse = dot(normal, light_dir).max(0.0);
    let specular = dot(reflect(scale(light_dir, -1.0), normal), view_dir)
        .max(0.0)
        .powf(32.0);

    let out = match mode {
        SurfaceMode::Pressure | SurfaceMode::Velocity => {
            let viz = if mode == SurfaceMode::Pressure {
                turbo(smoothstep(-0.5, 1.0, cp))
            } else {
                turbo(velocity)
            };
            let k = diffuse + 0.5;
            let s = specular * 0.2;
            [viz[0] * k + s, viz[1] * k + s, viz[2] * k + s]
        }
        SurfaceMode::Combined => {
            let base = mix([0.2; 3], turbo(smoothstep(-0.5, 1.0, cp)), 0.4);
            let fresnel = (1.0 - dot(normal, view_dir).max(0.0)).powi(3) * 0.5;
            let k = diffuse + 0.2;
            let s = specular * 0.5;
            [
                base[0] * k + s + 0.2 * fresnel,
                base[1] * k + s + 0.5 * fresnel,
                base[2] * k + s + 1.0 * fresnel,
            ]
        }
    };
    to_color(out)
}

/// Normal-as-color, for the geometry analysis mode
pub fn normal_color(normal: Point3) -> Color32 {
    to_color([
        normal[0] * 0.5 + 0.5,
        normal[1] * 0.5 + 0.5,
        normal[2] * 0.5 + 0.5,
    ])
}

/// HSL with h, s, l in 0..=1
pub fn hsl(h: f32, s: f32, l: f32) -> Point3 {
    if s <= 0.0 {
        return [l; 3];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |mut t: f32| {
        t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

/// Blue for slow streaks through green to red for fast ones
pub fn streak_color(speed: f32) -> Color32 {
    let t = ((speed - 0.3) * 3.0).clamp(0.0, 1.0);
    let hue = if t < 0.5 {
        0.6 - t * 0.4
    } else {
        0.2 - (t - 0.5) * 0.2
    };
    to_color(hsl(hue, 1.0, 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turbo_endpoints() {
        let lo = turbo(0.0);
        assert!((lo[0] - 0.1357).abs() < 1e-3 && (lo[2] - 0.1067).abs() < 1e-3);
        // past the end is clamped
        assert_eq!(turbo(1.0), turbo(3.0));
        assert_eq!(turbo(-1.0), turbo(0.0));
    }

    #[test]
    fn test_smoothstep() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert_eq!(smoothstep(-0.5, 1.0, 2.0), 1.0);
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(to_color(hsl(0.0, 1.0, 0.5)), Color32::from_rgb(255, 0, 0));
        assert_eq!(to_color(hsl(1.0 / 3.0, 1.0, 0.5)), Color32::from_rgb(0, 255, 0));
        assert_eq!(to_color(hsl(0.5, 0.0, 0.5)), Color32::from_rgb(128, 128, 128));
    }

    #[test]
    fn test_streak_color_runs_cold_to_hot() {
        let slow = streak_color(0.3);
        let fast = streak_color(0.7);
        assert!(slow.b() > slow.r());
        assert!(fast.r() > fast.b());
    }

    #[test]
    fn test_stagnation_is_hotter_than_roof() {
        let view = normalize([0.0, 0.3, 1.0]);
        let nose = shade_surface(WIND_DIR, view, SurfaceMode::Pressure);
        let roof = shade_surface([0.0, 1.0, 0.0], view, SurfaceMode::Pressure);
        assert!(nose.r() > roof.r());
        // the roof sees the fastest wall flow
        let roof_v = shade_surface([0.0, 1.0, 0.0], view, SurfaceMode::Velocity);
        let nose_v = shade_surface(WIND_DIR, view, SurfaceMode::Velocity);
        assert!(roof_v.r() > nose_v.r());
    }
}
