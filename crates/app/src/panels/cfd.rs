//! Simulation agent: solver setup, residual history and the flow viewer

use super::{
    caption, empty_state, primary_button, section_title, UiIntent, BRAND_ACCENT, BRAND_BLUE,
    BRAND_CYAN, BRAND_SUCCESS, SLATE_300, SLATE_400, SLATE_500, SLATE_700, SLATE_800, SLATE_900,
    SLATE_950,
};
use crate::render::car_model::{aero_body, Material, Part};
use crate::render::chart::{self, CONTINUITY_COLOR, RESIDUAL_COLOR, TURBULENCE_COLOR};
use crate::render::colormap::{shade_surface, streak_color, turbo, to_color, SurfaceMode};
use crate::render::flow_field::{FlowField, PARTICLE_COUNT, TIME_STEP};
use crate::render::{add, dot, face_normal, normalize, paint_faces, scale, sub, Face, OrbitCamera};
use egui::{pos2, vec2, Align2, Color32, FontId, Frame, Rect, RichText, Sense, Stroke};
use shared::settings::DisplaySettings;
use shared::DesignRecord;

const TIRE_COLOR: Color32 = Color32::from_rgb(0x11, 0x11, 0x11);
const VIEWER_BG: Color32 = Color32::from_rgb(0x05, 0x05, 0x05);
// streak geometry is a unit cylinder; keep the drawn length in scene units
const STREAK_SCALE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CfdTab {
    Setup,
    Monitor,
    #[default]
    Post,
}

impl CfdTab {
    pub const ALL: [CfdTab; 3] = [CfdTab::Setup, CfdTab::Monitor, CfdTab::Post];

    pub fn label(&self) -> &'static str {
        match self {
            CfdTab::Setup => "求解设置",
            CfdTab::Monitor => "残差监控",
            CfdTab::Post => "结果可视",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Turbulence {
    #[default]
    KOmegaSst,
    SpalartAllmaras,
    RealizableKEpsilon,
    Les,
}

impl Turbulence {
    pub const ALL: [Turbulence; 4] = [
        Turbulence::KOmegaSst,
        Turbulence::SpalartAllmaras,
        Turbulence::RealizableKEpsilon,
        Turbulence::Les,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Turbulence::KOmegaSst => "k-Omega SST (Menter)",
            Turbulence::SpalartAllmaras => "Spalart-Allmaras",
            Turbulence::RealizableKEpsilon => "Realizable k-Epsilon",
            Turbulence::Les => "Large Eddy Simulation (LES)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeScheme {
    #[default]
    Steady,
    Transient,
}

impl TimeScheme {
    pub const ALL: [TimeScheme; 2] = [TimeScheme::Steady, TimeScheme::Transient];

    pub fn label(&self) -> &'static str {
        match self {
            TimeScheme::Steady => "Steady State (simpleFoam)",
            TimeScheme::Transient => "Transient (pisoFoam)",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverSetup {
    pub turbulence: Turbulence,
    pub time: TimeScheme,
    /// m/s
    pub inlet_velocity: f32,
    pub moving_ground: bool,
}

impl Default for SolverSetup {
    fn default() -> Self {
        Self {
            turbulence: Turbulence::default(),
            time: TimeScheme::default(),
            inlet_velocity: 40.0,
            moving_ground: true,
        }
    }
}

impl SolverSetup {
    pub fn inlet_kmh(&self) -> f32 {
        self.inlet_velocity * 3.6
    }

    /// Chat message asking the orchestrator to start the solver
    pub fn request_message(&self) -> String {
        format!(
            "Initialize simulation: {}, {}, inlet {} m/s, moving ground {}",
            self.turbulence.label(),
            self.time.label(),
            self.inlet_velocity,
            if self.moving_ground { "on" } else { "off" }
        )
    }
}

pub struct CfdView {
    pub tab: CfdTab,
    pub surface: SurfaceMode,
    pub camera: OrbitCamera,
    pub setup: SolverSetup,
    setup_for: Option<String>,
    flow: Option<FlowField>,
    body: Vec<Part>,
}

impl Default for CfdView {
    fn default() -> Self {
        Self {
            tab: CfdTab::default(),
            surface: SurfaceMode::default(),
            camera: OrbitCamera::looking_at([-8.0, 3.0, 8.0], [0.0, 0.5, 0.0], 40.0)
                .with_distance_limits(3.0, 30.0),
            setup: SolverSetup::default(),
            setup_for: None,
            flow: None,
            body: Vec::new(),
        }
    }
}

impl CfdView {
    /// Reset the solver form when another design is opened
    pub fn sync(&mut self, design: &DesignRecord) {
        if self.setup_for.as_deref() == Some(design.id.as_str()) {
            return;
        }
        self.setup = SolverSetup::default();
        if let Some(cfd) = &design.cfd {
            self.setup.inlet_velocity = cfd.inlet_velocity;
        }
        self.setup_for = Some(design.id.clone());
    }

    fn flow(&mut self) -> &mut FlowField {
        self.flow.get_or_insert_with(|| FlowField::new(PARTICLE_COUNT))
    }

    /// Shaded body faces for the current camera, back faces culled
    fn faces(&mut self) -> Vec<Face> {
        if self.body.is_empty() {
            self.body = aero_body();
        }
        let eye = self.camera.eye();
        let mut faces = Vec::new();
        for part in &self.body {
            for tri in &part.triangles {
                let normal = face_normal(tri);
                let view_dir = normalize(sub(eye, tri[0]));
                if dot(normal, view_dir) <= 0.0 {
                    continue;
                }
                let color = match part.material {
                    Material::Tire => TIRE_COLOR,
                    _ => shade_surface(normal, view_dir, self.surface),
                };
                faces.push(Face { verts: *tri, color });
            }
        }
        faces
    }
}

pub fn show(
    ui: &mut egui::Ui,
    view: &mut CfdView,
    design: Option<&DesignRecord>,
    display: &mut DisplaySettings,
    pending: bool,
    out: &mut Vec<UiIntent>,
) {
    let Some((design, cfd)) = design.and_then(|d| d.cfd.as_ref().map(|c| (d, c))) else {
        empty_state(ui, "暂无仿真数据");
        return;
    };
    view.sync(design);

    egui::TopBottomPanel::top("cfd_tabs")
        .frame(Frame::none().fill(SLATE_900).inner_margin(egui::Margin::symmetric(16.0, 10.0)))
        .show_inside(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("仿真智能体 (Simulation Agent)").size(16.0).strong().color(Color32::WHITE));
                ui.add_space(16.0);
                for tab in CfdTab::ALL {
                    let active = view.tab == tab;
                    let text = RichText::new(tab.label()).size(12.0).color(if active { Color32::WHITE } else { SLATE_400 });
                    let button = egui::Button::new(text).fill(if active { SLATE_700 } else { Color32::TRANSPARENT });
                    if ui.add(button).clicked() {
                        view.tab = tab;
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    coefficient(ui, "Lift Coeff (Cl)", cfd.lift_coefficient, BRAND_ACCENT);
                    ui.add_space(16.0);
                    coefficient(ui, "Drag Coeff (Cd)", cfd.drag_coefficient, BRAND_SUCCESS);
                });
            });
        });

    match view.tab {
        CfdTab::Setup => {
            egui::CentralPanel::default()
                .frame(Frame::none().fill(SLATE_950).inner_margin(24.0))
                .show_inside(ui, |ui| setup(ui, &mut view.setup, pending, out));
        }
        CfdTab::Monitor => {
            egui::CentralPanel::default()
                .frame(Frame::none().fill(SLATE_950).inner_margin(24.0))
                .show_inside(ui, |ui| monitor(ui, design));
        }
        CfdTab::Post => {
            egui::SidePanel::right("cfd_visual_controls")
                .exact_width(288.0)
                .resizable(false)
                .frame(Frame::none().fill(SLATE_900).inner_margin(16.0))
                .show_inside(ui, |ui| visual_controls(ui, view, display, out));
            egui::CentralPanel::default()
                .frame(Frame::none().fill(VIEWER_BG))
                .show_inside(ui, |ui| viewer(ui, view, display, out));
        }
    }
}

fn coefficient(ui: &mut egui::Ui, label: &str, value: f32, color: Color32) {
    ui.vertical(|ui| {
        ui.label(RichText::new(label).size(10.0).color(SLATE_500));
        ui.label(RichText::new(format!("{value:.3}")).size(16.0).monospace().strong().color(color));
    });
}

fn setup(ui: &mut egui::Ui, setup: &mut SolverSetup, pending: bool, out: &mut Vec<UiIntent>) {
    ui.set_max_width(640.0);
    super::card().show(ui, |ui| {
        ui.set_width(ui.available_width());
        section_title(ui, "物理模型配置");
        caption(ui, "TURBULENCE MODEL");
        egui::ComboBox::from_id_source("cfd_turbulence")
            .width(ui.available_width())
            .selected_text(setup.turbulence.label())
            .show_ui(ui, |ui| {
                for model in Turbulence::ALL {
                    ui.selectable_value(&mut setup.turbulence, model, model.label());
                }
            });
        ui.add_space(8.0);
        caption(ui, "TIME DISCRETIZATION");
        egui::ComboBox::from_id_source("cfd_time")
            .width(ui.available_width())
            .selected_text(setup.time.label())
            .show_ui(ui, |ui| {
                for scheme in TimeScheme::ALL {
                    ui.selectable_value(&mut setup.time, scheme, scheme.label());
                }
            });
    });
    ui.add_space(16.0);

    super::card().show(ui, |ui| {
        ui.set_width(ui.available_width());
        section_title(ui, "边界条件");
        caption(ui, "INLET VELOCITY (m/s)");
        ui.horizontal(|ui| {
            ui.add(
                egui::DragValue::new(&mut setup.inlet_velocity)
                    .clamp_range(0.0..=120.0)
                    .speed(0.5),
            );
            ui.label(RichText::new(format!("~ {:.0} km/h", setup.inlet_kmh())).monospace().color(SLATE_400));
        });
        ui.add_space(8.0);
        ui.checkbox(&mut setup.moving_ground, RichText::new("Moving Ground Plane").color(SLATE_300));
    });
    ui.add_space(24.0);

    let button = primary_button("▶ INITIALIZE SOLVER", BRAND_BLUE).min_size(vec2(ui.available_width(), 40.0));
    if ui.add_enabled(!pending, button).clicked() {
        out.push(UiIntent::Submit(setup.request_message()));
    }
}

fn monitor(ui: &mut egui::Ui, design: &DesignRecord) {
    ui.horizontal(|ui| {
        section_title(ui, "收敛历史 (Residuals)");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new("Log Scale • 500 Iterations").size(11.0).monospace().color(SLATE_500));
        });
    });
    ui.horizontal(|ui| {
        for (label, color) in [
            ("Momentum (Ux, Uy, Uz)", RESIDUAL_COLOR),
            ("Pressure (p)", CONTINUITY_COLOR),
            ("Turbulence (k, omega)", TURBULENCE_COLOR),
        ] {
            let (dot_rect, _) = ui.allocate_exact_size(vec2(10.0, 10.0), Sense::hover());
            ui.painter().circle_filled(dot_rect.center(), 4.0, color);
            ui.label(RichText::new(label).size(11.0).color(SLATE_300));
            ui.add_space(12.0);
        }
    });
    ui.add_space(8.0);

    let rect = ui.available_rect_before_wrap();
    ui.allocate_rect(rect, Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect(rect, 8.0, SLATE_900, Stroke::new(1.0, SLATE_800));
    let points = design.cfd.as_ref().map(|c| c.convergence.as_slice()).unwrap_or_default();
    chart::paint_residuals(&painter, rect, points);
}

fn viewer(ui: &mut egui::Ui, view: &mut CfdView, display: &mut DisplaySettings, out: &mut Vec<UiIntent>) {
    let rect = ui.available_rect_before_wrap();
    let response = ui.allocate_rect(rect, Sense::drag());
    if response.dragged() {
        view.camera.orbit(response.drag_delta());
    }
    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            view.camera.zoom(scroll);
        }
    }

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, VIEWER_BG);
    let faces = view.faces();
    paint_faces(&painter, &view.camera, rect, &faces, None);

    if display.show_streamlines {
        let density = display.streamline_density;
        let camera = view.camera;
        let flow = view.flow();
        let active = flow.visible(density).len();
        flow.step(active, TIME_STEP);
        for particle in flow.visible(density) {
            let tail = add(particle.pos, scale(normalize(particle.vel), particle.streak_len() * STREAK_SCALE));
            let (Some((a, _)), Some((b, _))) = (camera.project(particle.pos, rect), camera.project(tail, rect)) else {
                continue;
            };
            painter.line_segment([a, b], Stroke::new(1.0, streak_color(particle.speed()).gamma_multiply(0.6)));
        }
    }

    // header overlay
    let time = ui.input(|i| i.time);
    let pulse_color = if view.surface == SurfaceMode::Pressure { BRAND_ACCENT } else { BRAND_BLUE };
    let pulse = 0.5 + 0.5 * (time * 3.0).sin() as f32;
    let title_at = rect.left_top() + vec2(20.0, 20.0);
    painter.circle_filled(title_at + vec2(4.0, 8.0), 4.0, pulse_color.gamma_multiply(0.4 + 0.6 * pulse));
    painter.text(
        title_at + vec2(16.0, 0.0),
        Align2::LEFT_TOP,
        "Real-time CFD Viewer",
        FontId::proportional(15.0),
        Color32::WHITE,
    );
    painter.text(
        title_at + vec2(16.0, 20.0),
        Align2::LEFT_TOP,
        view.surface.label(),
        FontId::monospace(11.0),
        SLATE_400,
    );

    let toggle = Rect::from_min_size(pos2(rect.right() - 150.0, rect.top() + 20.0), vec2(130.0, 28.0));
    ui.allocate_ui_at_rect(toggle, |ui| {
        let (label, color) = if display.show_streamlines {
            ("〰 流线: 开", BRAND_CYAN)
        } else {
            ("〰 流线: 关", SLATE_500)
        };
        let button = egui::Button::new(RichText::new(label).size(12.0).color(color))
            .fill(Color32::from_black_alpha(160))
            .stroke(Stroke::new(1.0, SLATE_700));
        if ui.add(button).clicked() {
            display.show_streamlines = !display.show_streamlines;
            out.push(UiIntent::DisplayChanged);
        }
    });

    paint_legend(&painter, rect, view.surface);
    ui.ctx().request_repaint();
}

fn paint_legend(painter: &egui::Painter, rect: Rect, mode: SurfaceMode) {
    let bar = Rect::from_center_size(pos2(rect.center().x, rect.bottom() - 40.0), vec2(320.0, 10.0));
    let mut mesh = egui::Mesh::default();
    let steps = 32;
    for i in 0..steps {
        let t0 = i as f32 / steps as f32;
        let t1 = (i + 1) as f32 / steps as f32;
        let x0 = bar.left() + t0 * bar.width();
        let x1 = bar.left() + t1 * bar.width();
        mesh.add_colored_rect(
            Rect::from_min_max(pos2(x0, bar.top()), pos2(x1, bar.bottom())),
            to_color(turbo((t0 + t1) * 0.5)),
        );
    }
    painter.add(egui::Shape::mesh(mesh));
    painter.rect_stroke(bar, 2.0, Stroke::new(1.0, SLATE_700));

    let (low, title, high) = mode.legend();
    let font = FontId::monospace(10.0);
    painter.text(bar.left_top() - vec2(0.0, 4.0), Align2::LEFT_BOTTOM, low, font.clone(), SLATE_400);
    painter.text(bar.center_top() - vec2(0.0, 4.0), Align2::CENTER_BOTTOM, title, font.clone(), Color32::WHITE);
    painter.text(bar.right_top() - vec2(0.0, 4.0), Align2::RIGHT_BOTTOM, high, font, SLATE_400);
}

fn visual_controls(ui: &mut egui::Ui, view: &mut CfdView, display: &mut DisplaySettings, out: &mut Vec<UiIntent>) {
    section_title(ui, "Visualization Control");
    ui.add_space(8.0);

    caption(ui, "SURFACE MAP");
    for mode in SurfaceMode::ALL {
        let active = view.surface == mode;
        let text = RichText::new(mode.label()).size(12.0).color(if active { Color32::WHITE } else { SLATE_400 });
        let button = egui::Button::new(text)
            .fill(if active { BRAND_BLUE.gamma_multiply(0.3) } else { SLATE_800 })
            .stroke(Stroke::new(1.0, if active { BRAND_BLUE } else { SLATE_700 }))
            .min_size(vec2(ui.available_width(), 28.0));
        if ui.add(button).clicked() {
            view.surface = mode;
        }
    }
    ui.add_space(16.0);

    ui.horizontal(|ui| {
        caption(ui, "STREAMLINES");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.checkbox(&mut display.show_streamlines, "").changed() {
                out.push(UiIntent::DisplayChanged);
            }
        });
    });
    ui.add_enabled_ui(display.show_streamlines, |ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Density").size(11.0).color(SLATE_500));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    RichText::new(format!("{:.0}%", display.streamline_density * 100.0))
                        .monospace()
                        .color(BRAND_CYAN),
                );
            });
        });
        let slider = egui::Slider::new(&mut display.streamline_density, 0.0..=1.0)
            .step_by(0.05)
            .show_value(false);
        if ui.add(slider).changed() {
            out.push(UiIntent::DisplayChanged);
        }
        ui.horizontal(|ui| {
            ui.label(RichText::new("Sparse").size(10.0).color(SLATE_500));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(RichText::new("Dense").size(10.0).color(SLATE_500));
            });
        });
    });
    ui.add_space(16.0);

    super::card().show(ui, |ui| {
        ui.set_width(ui.available_width());
        for (label, value) in [
            ("Avg Velocity", "28.4 m/s"),
            ("Max Pressure", "1420 Pa"),
            ("Wake Length", "1.2 m"),
        ] {
            ui.horizontal(|ui| {
                ui.label(RichText::new(label).size(11.0).color(SLATE_400));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(RichText::new(value).monospace().color(Color32::WHITE));
                });
            });
        }
    });

    ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
        let button = egui::Button::new(RichText::new("Export High-Res Report").color(Color32::WHITE))
            .fill(SLATE_800)
            .stroke(Stroke::new(1.0, SLATE_700))
            .min_size(vec2(ui.available_width(), 32.0));
        if ui.add(button).clicked() {
            out.push(UiIntent::Notice(format!("已导出高分辨率报告 (模拟): {}", view.surface.label())));
        }
    });
}
