//! Meshing agent: blockMesh/snappyHexMesh knobs, run log and quality plots

use super::{
    card, caption, empty_state, primary_button, section_title, UiIntent, AMBER, BRAND_BLUE,
    BRAND_CYAN, BRAND_DANGER, BRAND_SUCCESS, SLATE_300, SLATE_400, SLATE_500, SLATE_600,
    SLATE_800, SLATE_900, SLATE_950,
};
use egui::{vec2, Color32, Frame, Rect, RichText, Sense, Stroke};
use shared::design::{MeshData, MeshQuality};
use shared::{DesignRecord, LogEntry, LogLevel};

const NON_ORTHO_BARS: [f32; 10] = [5.0, 12.0, 25.0, 40.0, 60.0, 30.0, 15.0, 5.0, 2.0, 1.0];
const SKEW_BARS: [f32; 10] = [50.0, 80.0, 40.0, 20.0, 10.0, 5.0, 2.0, 1.0, 0.0, 0.0];

pub struct MeshConfig {
    /// blockMesh background cell size, metres
    pub base_cell: f32,
    /// Domain growth around the body, percent
    pub domain_expansion: u32,
    pub refinement: u32,
    pub layers: u32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            base_cell: 0.5,
            domain_expansion: 50,
            refinement: 3,
            layers: 5,
        }
    }
}

impl MeshConfig {
    /// Chat message asking the orchestrator to run the mesher
    pub fn request_message(&self) -> String {
        format!(
            "Run mesh generation: base cell {} m, domain +{}%, surface refinement level {}, {} boundary layers",
            self.base_cell, self.domain_expansion, self.refinement, self.layers
        )
    }
}

pub fn level_color(level: LogLevel) -> Color32 {
    match level {
        LogLevel::Info => Color32::from_rgb(0x60, 0xa5, 0xfa),
        LogLevel::Warn => Color32::from_rgb(0xfb, 0xbf, 0x24),
        LogLevel::Error => Color32::from_rgb(0xf8, 0x71, 0x71),
        LogLevel::Success => Color32::from_rgb(0x4a, 0xde, 0x80),
        LogLevel::Debug => SLATE_400,
    }
}

/// Clock part of a log timestamp
fn clock(timestamp: &str) -> &str {
    timestamp.split(' ').next().unwrap_or(timestamp)
}

pub fn show(
    ui: &mut egui::Ui,
    config: &mut MeshConfig,
    design: Option<&DesignRecord>,
    logs: &[LogEntry],
    pending: bool,
    out: &mut Vec<UiIntent>,
) {
    let Some(design) = design else {
        empty_state(ui, "未选择几何体");
        return;
    };

    egui::SidePanel::left("mesh_config")
        .exact_width(320.0)
        .resizable(false)
        .frame(Frame::none().fill(SLATE_900).inner_margin(16.0))
        .show_inside(ui, |ui| controls(ui, config, pending, out));

    egui::CentralPanel::default()
        .frame(Frame::none().fill(SLATE_950).inner_margin(24.0))
        .show_inside(ui, |ui| {
            match &design.mesh {
                Some(mesh) => status_bar(ui, mesh),
                None => {
                    card().show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.label(RichText::new("尚未生成网格").color(SLATE_500));
                    });
                }
            }
            ui.add_space(16.0);
            let skewness = design.mesh.as_ref().map(|m| m.skewness);
            ui.columns(2, |cols| {
                log_console(&mut cols[0], logs);
                quality_metrics(&mut cols[1], skewness);
            });
        });
}

fn dictionary(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    Frame::none()
        .fill(SLATE_950)
        .stroke(Stroke::new(1.0, SLATE_800))
        .rounding(4.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(title).size(11.0).monospace().strong().color(BRAND_BLUE));
            ui.separator();
            add_contents(ui);
        });
}

fn controls(ui: &mut egui::Ui, config: &mut MeshConfig, pending: bool, out: &mut Vec<UiIntent>) {
    ui.label(RichText::new("网格配置 (Mesh Config)").size(15.0).strong().color(Color32::WHITE));
    ui.add_space(16.0);

    dictionary(ui, "BLOCKMESH 字典", |ui| {
        ui.label(RichText::new("基础单元尺寸 (m)").size(12.0).color(SLATE_400));
        ui.add(
            egui::DragValue::new(&mut config.base_cell)
                .speed(0.1)
                .clamp_range(0.01..=10.0),
        );
        ui.label(RichText::new("计算域扩展比例 (%)").size(12.0).color(SLATE_400));
        ui.add(egui::Slider::new(&mut config.domain_expansion, 0..=100));
    });
    ui.add_space(12.0);

    dictionary(ui, "SNAPPYHEXMESH 字典", |ui| {
        ui.label(RichText::new("表面细化等级").size(12.0).color(SLATE_400));
        ui.add(egui::Slider::new(&mut config.refinement, 1..=5));
        ui.label(RichText::new("边界层层数").size(12.0).color(SLATE_400));
        ui.add(egui::Slider::new(&mut config.layers, 0..=10));
    });
    ui.add_space(16.0);

    let button = primary_button("▶ 生成网格", BRAND_SUCCESS).min_size(vec2(ui.available_width(), 36.0));
    if ui.add_enabled(!pending, button).clicked() {
        out.push(UiIntent::Submit(config.request_message()));
    }
}

fn status_bar(ui: &mut egui::Ui, mesh: &MeshData) {
    card().show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            let stat = |ui: &mut egui::Ui, label: &str, value: String, color: Color32| {
                ui.vertical(|ui| {
                    caption(ui, label);
                    ui.label(RichText::new(value).size(18.0).monospace().strong().color(color));
                });
                ui.add_space(24.0);
            };
            stat(ui, "总网格数", mesh.cells_millions(), Color32::WHITE);
            stat(ui, "最大偏斜度", mesh.skewness.to_string(), BRAND_SUCCESS);
            match mesh.quality {
                MeshQuality::Pass => stat(ui, "质量检查", "通过 ✓".into(), BRAND_SUCCESS),
                MeshQuality::Fail => stat(ui, "质量检查", "未通过 ✗".into(), BRAND_DANGER),
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    RichText::new(format!("生成时间: {}", mesh.generated_at))
                        .size(11.0)
                        .color(SLATE_500),
                );
            });
        });
    });
}

fn log_console(ui: &mut egui::Ui, logs: &[LogEntry]) {
    Frame::none()
        .fill(SLATE_950)
        .stroke(Stroke::new(1.0, SLATE_800))
        .rounding(8.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            Frame::none()
                .fill(SLATE_900)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("▭ output.log").size(11.0).monospace().color(SLATE_400));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            for color in [Color32::from_rgb(0x22, 0xc5, 0x5e), AMBER, BRAND_DANGER] {
                                let (dot, _) = ui.allocate_exact_size(vec2(8.0, 8.0), Sense::hover());
                                ui.painter().circle_filled(dot.center(), 4.0, color);
                            }
                        });
                    });
                });
            egui::ScrollArea::vertical()
                .id_source("mesh_log")
                .max_height(360.0)
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    ui.add_space(8.0);
                    for entry in logs {
                        ui.horizontal_wrapped(|ui| {
                            ui.add_space(8.0);
                            ui.label(
                                RichText::new(format!("[{}]", clock(&entry.timestamp)))
                                    .size(11.0)
                                    .monospace()
                                    .color(SLATE_600),
                            );
                            ui.label(
                                RichText::new(format!("{:<7}", entry.level.as_str()))
                                    .size(11.0)
                                    .monospace()
                                    .strong()
                                    .color(level_color(entry.level)),
                            );
                            ui.label(RichText::new(&entry.message).size(11.0).monospace().color(SLATE_300));
                        });
                    }
                });
        });
}

fn histogram(ui: &mut egui::Ui, bars: &[f32], color: Color32, axis: (&str, &str)) {
    let (rect, response) = ui.allocate_exact_size(vec2(ui.available_width(), 96.0), Sense::hover());
    let painter = ui.painter_at(rect);
    let gap = 4.0;
    let width = (rect.width() - gap * (bars.len() as f32 - 1.0)) / bars.len() as f32;
    let hover = response.hover_pos();
    for (i, h) in bars.iter().enumerate() {
        let left = rect.left() + i as f32 * (width + gap);
        let bar = Rect::from_min_max(
            egui::pos2(left, rect.bottom() - rect.height() * h / 100.0),
            egui::pos2(left + width, rect.bottom()),
        );
        let lit = hover.is_some_and(|p| p.x >= bar.left() && p.x <= bar.right());
        let alpha = if lit { 0.6 } else { 0.3 };
        painter.rect_filled(bar, egui::Rounding { nw: 2.0, ne: 2.0, sw: 0.0, se: 0.0 }, color.gamma_multiply(alpha));
    }
    ui.horizontal(|ui| {
        ui.label(RichText::new(axis.0).size(10.0).color(SLATE_600));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(axis.1).size(10.0).color(SLATE_600));
        });
    });
}

fn quality_metrics(ui: &mut egui::Ui, skewness: Option<f32>) {
    card().show(ui, |ui| {
        ui.set_width(ui.available_width());
        section_title(ui, "⟳ 网格质量指标 (QUALITY METRICS)");
        ui.add_space(12.0);

        let header = |ui: &mut egui::Ui, title: &str, stat: String| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(title).size(12.0).color(SLATE_400));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(RichText::new(stat).size(12.0).color(BRAND_SUCCESS));
                });
            });
        };
        header(ui, "非正交性分布 (Non-Orthogonality)", "Avg: 12.4".into());
        histogram(ui, &NON_ORTHO_BARS, BRAND_BLUE, ("0", "70"));
        ui.add_space(16.0);

        let max = skewness.map_or_else(|| "-".to_string(), |s| s.to_string());
        header(ui, "偏斜度分布 (Skewness)", format!("Max: {max}"));
        histogram(ui, &SKEW_BARS, BRAND_CYAN, ("0", "4"));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::command::fallback_commands;

    #[test]
    fn test_defaults_and_message() {
        let config = MeshConfig::default();
        assert_eq!((config.base_cell, config.refinement, config.layers), (0.5, 3, 5));
        let message = config.request_message();
        assert!(message.contains("base cell 0.5 m"));
        assert!(message.contains("5 boundary layers"));
        assert_eq!(fallback_commands(&message)[0].name, "MESHING");
    }

    #[test]
    fn test_clock_strips_date_suffix() {
        assert_eq!(clock("10:42:01"), "10:42:01");
        assert_eq!(clock("10:42:01 PM"), "10:42:01");
    }

    #[test]
    fn test_level_colors_distinct() {
        let levels = [LogLevel::Info, LogLevel::Warn, LogLevel::Error, LogLevel::Success];
        for (i, a) in levels.iter().enumerate() {
            for b in &levels[i + 1..] {
                assert_ne!(level_color(*a), level_color(*b));
            }
        }
    }
}
