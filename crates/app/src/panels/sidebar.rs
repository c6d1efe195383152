//! Left navigation rail

use super::{UiIntent, BRAND_ACCENT, BRAND_BLUE, BRAND_CYAN, SLATE_400, SLATE_500, SLATE_800, SLATE_900};
use egui::{Align, Color32, Layout, RichText, Sense, Stroke};
use pipeline::Action;
use shared::ViewMode;

const ENTRY_HEIGHT: f32 = 36.0;

pub fn show(ui: &mut egui::Ui, current: ViewMode, pending: bool, out: &mut Vec<UiIntent>) {
    ui.add_space(16.0);
    ui.horizontal(|ui| {
        ui.add_space(12.0);
        ui.label(RichText::new("AeroGen").size(20.0).strong().color(Color32::WHITE));
        ui.label(RichText::new("v2.4 CN").size(10.0).monospace().color(BRAND_CYAN));
    });
    ui.add_space(20.0);
    ui.horizontal(|ui| {
        ui.add_space(12.0);
        ui.label(RichText::new("工作区").size(11.0).color(SLATE_500));
    });
    ui.add_space(4.0);

    let time = ui.input(|i| i.time);
    for mode in ViewMode::ALL {
        let active = mode == current;
        let (rect, response) =
            ui.allocate_exact_size(egui::vec2(ui.available_width(), ENTRY_HEIGHT), Sense::click());
        let painter = ui.painter();
        let rect = rect.shrink2(egui::vec2(8.0, 2.0));
        if active {
            painter.rect_filled(rect, 6.0, BRAND_BLUE.gamma_multiply(0.15));
            painter.rect_stroke(rect, 6.0, Stroke::new(1.0, BRAND_BLUE.gamma_multiply(0.3)));
        } else if response.hovered() {
            painter.rect_filled(rect, 6.0, SLATE_800);
        }
        painter.text(
            rect.left_center() + egui::vec2(12.0, 0.0),
            egui::Align2::LEFT_CENTER,
            mode.label(),
            egui::FontId::proportional(14.0),
            if active { BRAND_BLUE } else { SLATE_400 },
        );
        if active && pending {
            let alpha = (0.5 + 0.5 * (time * 4.0).sin()) as f32;
            painter.circle_filled(
                rect.right_center() - egui::vec2(12.0, 0.0),
                3.0,
                BRAND_ACCENT.gamma_multiply(alpha),
            );
        }
        if response.clicked() && !active {
            out.push(UiIntent::Dispatch(Action::Navigate(mode)));
        }
    }

    ui.with_layout(Layout::bottom_up(Align::Min), |ui| {
        ui.add_space(12.0);
        egui::Frame::none()
            .fill(SLATE_900)
            .stroke(Stroke::new(1.0, SLATE_800))
            .rounding(8.0)
            .inner_margin(10.0)
            .outer_margin(egui::Margin::symmetric(8.0, 0.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let (avatar, _) = ui.allocate_exact_size(egui::vec2(32.0, 32.0), Sense::hover());
                    ui.painter().circle_filled(avatar.center(), 16.0, BRAND_ACCENT);
                    ui.painter().text(
                        avatar.center(),
                        egui::Align2::CENTER_CENTER,
                        "AD",
                        egui::FontId::proportional(12.0),
                        Color32::WHITE,
                    );
                    ui.vertical(|ui| {
                        ui.label(RichText::new("管理员").size(13.0).color(Color32::WHITE));
                        ui.label(RichText::new("工程主管").size(11.0).color(SLATE_500));
                    });
                });
            });
        ui.add_space(8.0);
        for label in ["帮助文档", "系统设置"] {
            ui.horizontal(|ui| {
                ui.add_space(16.0);
                ui.label(RichText::new(label).size(13.0).color(SLATE_400));
            });
        }
    });
}
