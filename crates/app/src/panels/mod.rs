//! Workbench panels
//!
//! Panels draw from borrowed workspace data and report what the user did as
//! [`UiIntent`]s; `AppState::apply` carries them out after the frame's
//! borrows end.

pub mod cad;
pub mod cfd;
pub mod chat;
pub mod dashboard;
pub mod meshing;
pub mod sidebar;
pub mod styling;

use egui::{Color32, Frame, RichText, Stroke};
use pipeline::Action;

pub const SLATE_950: Color32 = Color32::from_rgb(0x02, 0x06, 0x17);
pub const SLATE_900: Color32 = Color32::from_rgb(0x0f, 0x17, 0x2a);
pub const SLATE_800: Color32 = Color32::from_rgb(0x1e, 0x29, 0x3b);
pub const SLATE_700: Color32 = Color32::from_rgb(0x33, 0x41, 0x55);
pub const SLATE_600: Color32 = Color32::from_rgb(0x47, 0x55, 0x69);
pub const SLATE_500: Color32 = Color32::from_rgb(0x64, 0x74, 0x8b);
pub const SLATE_400: Color32 = Color32::from_rgb(0x94, 0xa3, 0xb8);
pub const SLATE_300: Color32 = Color32::from_rgb(0xcb, 0xd5, 0xe1);
pub const SLATE_200: Color32 = Color32::from_rgb(0xe2, 0xe8, 0xf0);

pub const BRAND_BLUE: Color32 = Color32::from_rgb(0x3b, 0x82, 0xf6);
pub const BRAND_CYAN: Color32 = Color32::from_rgb(0x06, 0xb6, 0xd4);
pub const BRAND_ACCENT: Color32 = Color32::from_rgb(0x8b, 0x5c, 0xf6);
pub const BRAND_SUCCESS: Color32 = Color32::from_rgb(0x10, 0xb9, 0x81);
pub const BRAND_DANGER: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);
pub const PURPLE: Color32 = Color32::from_rgb(0xa8, 0x55, 0xf7);
pub const PINK: Color32 = Color32::from_rgb(0xec, 0x48, 0x99);
pub const AMBER: Color32 = Color32::from_rgb(0xf5, 0x9e, 0x0b);

/// Something a panel asked for during this frame
#[derive(Debug, Clone, PartialEq)]
pub enum UiIntent {
    Dispatch(Action),
    /// Send the chat input box
    SendInput,
    /// Send a message on the user's behalf
    Submit(String),
    Notice(String),
    /// Streamline toggle or density moved
    DisplayChanged,
}

/// Per-panel UI state that is not part of the workspace
#[derive(Default)]
pub struct PanelState {
    pub dashboard: dashboard::DashboardState,
    pub styling: styling::StylingForm,
    pub cad: cad::CadViewer,
    pub meshing: meshing::MeshConfig,
    pub cfd: cfd::CfdView,
}

/// Bordered slate card used by every panel
pub fn card() -> Frame {
    Frame::none()
        .fill(SLATE_900)
        .stroke(Stroke::new(1.0, SLATE_800))
        .rounding(8.0)
        .inner_margin(16.0)
}

pub fn section_title(ui: &mut egui::Ui, text: &str) {
    ui.label(RichText::new(text).size(13.0).strong().color(SLATE_200));
}

/// Small uppercase caption above a control
pub fn caption(ui: &mut egui::Ui, text: &str) {
    ui.label(RichText::new(text).size(11.0).monospace().color(SLATE_500));
}

/// Pill with a tinted background
pub fn badge(ui: &mut egui::Ui, text: &str, color: Color32) {
    Frame::none()
        .fill(color.gamma_multiply(0.15))
        .stroke(Stroke::new(1.0, color.gamma_multiply(0.4)))
        .rounding(10.0)
        .inner_margin(egui::Margin::symmetric(8.0, 2.0))
        .show(ui, |ui| {
            ui.label(RichText::new(text).size(10.0).strong().color(color));
        });
}

/// Centered hint shown when a panel has nothing selected
pub fn empty_state(ui: &mut egui::Ui, text: &str) {
    ui.centered_and_justified(|ui| {
        ui.label(RichText::new(text).size(16.0).color(SLATE_500));
    });
}

pub fn primary_button(text: &str, color: Color32) -> egui::Button<'static> {
    egui::Button::new(RichText::new(text).strong().color(Color32::WHITE))
        .fill(color)
        .rounding(6.0)
}
