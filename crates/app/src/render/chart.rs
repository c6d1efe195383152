//! Residual history plot on a log scale.

use egui::{pos2, Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke};
use shared::design::ConvergencePoint;

pub const RESIDUAL_COLOR: Color32 = Color32::from_rgb(0x06, 0xb6, 0xd4);
pub const CONTINUITY_COLOR: Color32 = Color32::from_rgb(0xf5, 0x9e, 0x0b);
pub const TURBULENCE_COLOR: Color32 = Color32::from_rgb(0x22, 0xc5, 0x5e);
const GRID_COLOR: Color32 = Color32::from_rgb(0x1e, 0x29, 0x3b);
const AXIS_TEXT: Color32 = Color32::from_rgb(0x47, 0x55, 0x69);

/// Whole decades covering every positive value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    pub min_exp: i32,
    pub max_exp: i32,
}

impl LogScale {
    pub fn fit(values: impl IntoIterator<Item = f64>) -> Self {
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for v in values.into_iter().filter(|v| *v > 0.0 && v.is_finite()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if !lo.is_finite() {
            return Self { min_exp: -5, max_exp: 0 };
        }
        let min_exp = lo.log10().floor() as i32;
        let max_exp = (hi.log10().ceil() as i32).max(min_exp + 1);
        Self { min_exp, max_exp }
    }

    /// 0 at the bottom decade, 1 at the top; non-positive values pin to 0
    pub fn fraction(&self, value: f64) -> f32 {
        if value <= 0.0 {
            return 0.0;
        }
        let span = (self.max_exp - self.min_exp) as f64;
        ((value.log10() - self.min_exp as f64) / span).clamp(0.0, 1.0) as f32
    }

    pub fn decades(&self) -> impl Iterator<Item = i32> {
        self.min_exp..=self.max_exp
    }
}

fn polyline(points: &[ConvergencePoint], rect: Rect, scale: &LogScale, pick: impl Fn(&ConvergencePoint) -> f64) -> Vec<Pos2> {
    let first = points.first().map_or(0, |p| p.iteration) as f32;
    let last = points.last().map_or(1, |p| p.iteration) as f32;
    let span = (last - first).max(1.0);
    points
        .iter()
        .map(|p| {
            let x = rect.left() + (p.iteration as f32 - first) / span * rect.width();
            let y = rect.bottom() - scale.fraction(pick(p)) * rect.height();
            pos2(x, y)
        })
        .collect()
}

/// Momentum residual, pressure continuity and a dashed turbulence trace
pub fn paint_residuals(painter: &Painter, rect: Rect, points: &[ConvergencePoint]) {
    let plot = Rect::from_min_max(rect.min + egui::vec2(48.0, 8.0), rect.max - egui::vec2(16.0, 22.0));
    let scale = LogScale::fit(points.iter().flat_map(|p| [p.residual, p.continuity]));

    for exp in scale.decades() {
        let y = plot.bottom() - scale.fraction(10f64.powi(exp)) * plot.height();
        painter.extend(Shape::dashed_line(
            &[pos2(plot.left(), y), pos2(plot.right(), y)],
            Stroke::new(1.0, GRID_COLOR),
            3.0,
            3.0,
        ));
        painter.text(
            pos2(plot.left() - 6.0, y),
            Align2::RIGHT_CENTER,
            format!("1e{exp}"),
            FontId::monospace(10.0),
            AXIS_TEXT,
        );
    }

    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        let ends = [
            (first.iteration, plot.left(), Align2::LEFT_TOP),
            (last.iteration, plot.right(), Align2::RIGHT_TOP),
        ];
        for (iteration, x, align) in ends {
            painter.text(
                pos2(x, plot.bottom() + 4.0),
                align,
                iteration.to_string(),
                FontId::monospace(10.0),
                AXIS_TEXT,
            );
        }
    }

    if points.len() < 2 {
        return;
    }
    let residual = polyline(points, plot, &scale, |p| p.residual);
    let continuity = polyline(points, plot, &scale, |p| p.continuity);
    painter.add(Shape::line(residual, Stroke::new(2.0, RESIDUAL_COLOR)));
    painter.add(Shape::line(continuity.clone(), Stroke::new(2.0, CONTINUITY_COLOR)));
    painter.extend(Shape::dashed_line(&continuity, Stroke::new(1.0, TURBULENCE_COLOR), 5.0, 5.0));
}
