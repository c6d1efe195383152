use eframe::egui;
use parking_lot::Mutex;
use pipeline::{DesignCatalog, Orchestrator, PanelView, Workspace};
use providers::GeminiConnector;
use shared::settings::AppSettings;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

mod fonts;
mod panels;
mod render;
mod state;

use panels::{cad, cfd, chat, dashboard, meshing, sidebar, styling};
use state::AppState;

fn config_path() -> Option<PathBuf> {
    let proj = directories::ProjectDirs::from("com", "AeroGen", "AeroGen")?;
    Some(proj.config_dir().join("settings.json"))
}

fn load_settings_or_default(path: Option<&Path>) -> AppSettings {
    let Some(path) = path.filter(|p| p.exists()) else {
        return AppSettings::default();
    };
    match AppSettings::load_from(path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("{e}; using defaults");
            AppSettings::default()
        }
    }
}

fn load_catalog(settings: &AppSettings) -> DesignCatalog {
    let Some(path) = settings.catalog_path.as_deref() else {
        return DesignCatalog::builtin();
    };
    match DesignCatalog::from_json_file(Path::new(path)) {
        Ok(catalog) => {
            tracing::info!(path, designs = catalog.designs().len(), "catalog loaded");
            catalog
        }
        Err(e) => {
            tracing::warn!("{e}; falling back to the built-in catalog");
            DesignCatalog::builtin()
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings_path = config_path();
    let settings = load_settings_or_default(settings_path.as_deref());
    let workspace = Workspace::new(load_catalog(&settings));
    let orchestrator = Arc::new(Orchestrator::new(
        Box::new(GeminiConnector::new(settings.model.gemini_auth.clone())),
        pipeline::orchestrator_config(&settings.model),
    ));
    let state = AppState::new(workspace, orchestrator, settings, settings_path);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        vsync: true, // Limit to monitor refresh rate
        ..Default::default()
    };
    eframe::run_native(
        "AeroGen",
        options,
        Box::new(move |cc| {
            if let Some(font) = fonts::install_cjk_fallback(&cc.egui_ctx) {
                tracing::info!(font, "CJK fallback font installed");
            }
            let mut visuals = egui::Visuals::dark();
            visuals.panel_fill = panels::SLATE_950;
            visuals.window_fill = panels::SLATE_900;
            visuals.extreme_bg_color = panels::SLATE_950;
            cc.egui_ctx.set_visuals(visuals);
            Box::new(AeroGenApp {
                state: Arc::new(Mutex::new(state)),
            })
        }),
    )
}

struct AeroGenApp {
    state: Arc<Mutex<AppState>>,
}

impl eframe::App for AeroGenApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut s = self.state.lock();

        // Poll for AI response (non-blocking)
        s.poll_ai_response();
        s.tick(Instant::now());

        let mut intents = Vec::new();
        {
            let AppState {
                workspace,
                panels: panel_state,
                settings,
                input_text,
                ..
            } = &mut *s;
            let pending = workspace.is_pending();

            egui::SidePanel::left("sidebar")
                .exact_width(240.0)
                .resizable(false)
                .frame(egui::Frame::none().fill(panels::SLATE_900))
                .show(ctx, |ui| sidebar::show(ui, workspace.view(), pending, &mut intents));

            egui::SidePanel::right("chat")
                .default_width(380.0)
                .width_range(320.0..=520.0)
                .frame(egui::Frame::none().fill(panels::SLATE_900))
                .show(ctx, |ui| {
                    chat::show(ui, workspace.conversation(), pending, input_text, &mut intents)
                });

            egui::CentralPanel::default()
                .frame(egui::Frame::none().fill(panels::SLATE_950))
                .show(ctx, |ui| match workspace.panel() {
                    PanelView::Overview { projects, board, stage } => {
                        dashboard::show(ui, &mut panel_state.dashboard, projects, board, stage, &mut intents)
                    }
                    PanelView::Styling { designs, selected, generating } => {
                        styling::show(ui, &mut panel_state.styling, designs, selected, generating, &mut intents)
                    }
                    PanelView::Geometry { design } => cad::show(ui, &mut panel_state.cad, design, &mut intents),
                    PanelView::Meshing { design, logs } => {
                        meshing::show(ui, &mut panel_state.meshing, design, logs, pending, &mut intents)
                    }
                    PanelView::Simulation { design } => cfd::show(
                        ui,
                        &mut panel_state.cfd,
                        design,
                        &mut settings.display,
                        pending,
                        &mut intents,
                    ),
                });
        }

        if let Some(text) = s.notice.clone() {
            let mut open = true;
            let mut dismissed = false;
            egui::Window::new("提示")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.set_max_width(360.0);
                    ui.label(text);
                    ui.add_space(8.0);
                    if ui.button("确定").clicked() {
                        dismissed = true;
                    }
                });
            if !open || dismissed {
                s.notice = None;
            }
        }

        for intent in intents {
            s.apply(intent);
        }

        if s.wants_repaint() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.state.lock().save_settings();
    }
}
