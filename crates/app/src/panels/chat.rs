//! Orchestrator chat column

use super::{UiIntent, BRAND_BLUE, BRAND_SUCCESS, SLATE_200, SLATE_400, SLATE_500, SLATE_700, SLATE_800, SLATE_900, SLATE_950};
use egui::{Align, Color32, Frame, Key, Layout, RichText, Rounding, Sense, Stroke};
use shared::ChatTurn;

pub fn show(
    ui: &mut egui::Ui,
    turns: &[ChatTurn],
    pending: bool,
    input: &mut String,
    out: &mut Vec<UiIntent>,
) {
    egui::TopBottomPanel::top("chat_header")
        .frame(Frame::none().fill(SLATE_950).inner_margin(14.0))
        .show_inside(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("调度器对话 (Orchestrator)")
                        .strong()
                        .color(Color32::WHITE),
                );
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    super::badge(ui, "在线", BRAND_SUCCESS);
                });
            });
        });

    egui::TopBottomPanel::bottom("chat_input")
        .frame(Frame::none().fill(SLATE_950).inner_margin(14.0))
        .show_inside(ui, |ui| input_row(ui, pending, input, out));

    egui::CentralPanel::default()
        .frame(Frame::none().fill(SLATE_900).inner_margin(14.0))
        .show_inside(ui, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for turn in turns {
                        bubble(ui, turn);
                        ui.add_space(12.0);
                    }
                    if pending {
                        thinking_dots(ui);
                    }
                });
        });
}

fn bubble(ui: &mut egui::Ui, turn: &ChatTurn) {
    let user = turn.is_user();
    let layout = if user {
        Layout::top_down(Align::Max)
    } else {
        Layout::top_down(Align::Min)
    };
    let max_width = ui.available_width() * 0.9;
    ui.with_layout(layout, |ui| {
        ui.horizontal(|ui| {
            let color = if user { SLATE_500 } else { BRAND_BLUE };
            ui.label(RichText::new(turn.author.badge()).size(11.0).monospace().color(color));
            ui.label(RichText::new(turn.formatted_time()).size(10.0).color(SLATE_500));
        });
        let (fill, stroke, rounding) = if user {
            (BRAND_BLUE, Stroke::NONE, Rounding { nw: 14.0, ne: 2.0, sw: 14.0, se: 14.0 })
        } else {
            (SLATE_800, Stroke::new(1.0, SLATE_700), Rounding { nw: 2.0, ne: 14.0, sw: 14.0, se: 14.0 })
        };
        Frame::none()
            .fill(fill)
            .stroke(stroke)
            .rounding(rounding)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_max_width(max_width);
                ui.label(RichText::new(&turn.text).size(13.0).color(if user {
                    Color32::WHITE
                } else {
                    SLATE_200
                }));
            });
    });
}

/// Three bouncing dots, staggered like a typing indicator
fn thinking_dots(ui: &mut egui::Ui) {
    let time = ui.input(|i| i.time);
    Frame::none()
        .fill(SLATE_800)
        .stroke(Stroke::new(1.0, SLATE_700))
        .rounding(Rounding { nw: 2.0, ne: 14.0, sw: 14.0, se: 14.0 })
        .inner_margin(12.0)
        .show(ui, |ui| {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(44.0, 12.0), Sense::hover());
            for i in 0..3 {
                let phase = time * 6.0 - i as f64 * 0.9;
                let lift = (phase.sin().max(0.0) * 4.0) as f32;
                let center = egui::pos2(rect.left() + 6.0 + i as f32 * 16.0, rect.center().y - lift);
                ui.painter().circle_filled(center, 4.0, SLATE_400);
            }
        });
    ui.ctx().request_repaint();
}

fn input_row(ui: &mut egui::Ui, pending: bool, input: &mut String, out: &mut Vec<UiIntent>) {
    ui.horizontal(|ui| {
        let send_width = 56.0;
        let response = ui.add_enabled(
            !pending,
            egui::TextEdit::singleline(input)
                .hint_text("输入指令...")
                .desired_width(ui.available_width() - send_width)
                .margin(egui::vec2(10.0, 8.0)),
        );
        let entered = response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
        let can_send = !pending && !input.trim().is_empty();
        let clicked = ui
            .add_enabled(can_send, super::primary_button("发送", BRAND_BLUE))
            .clicked();
        if (entered && can_send) || clicked {
            out.push(UiIntent::SendInput);
            response.request_focus();
        }
    });
}
