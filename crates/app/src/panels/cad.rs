//! Geometry viewer: procedural block model or an imported STL

use super::{
    caption, empty_state, primary_button, UiIntent, BRAND_ACCENT, BRAND_BLUE, SLATE_200,
    SLATE_300, SLATE_400, SLATE_500, SLATE_700, SLATE_800, SLATE_900, SLATE_950,
};
use crate::render::camera::ViewPreset;
use crate::render::car_model::{self, Material, Part};
use crate::render::colormap::{normal_color, to_color};
use crate::render::{dot, face_normal, normalize, paint_faces, scale, sub, Face, OrbitCamera, Point3};
use egui::{pos2, vec2, Align2, Color32, FontId, Frame, Rect, RichText, Sense, Stroke};
use pipeline::{edge_report, Action, StlError, StlMesh};
use shared::{DesignRecord, ViewMode};
use std::path::Path;
use std::time::{Duration, Instant};

const GRABCAD_DELAY: Duration = Duration::from_millis(1500);
const GRABCAD_MODEL: &str = "Generic_Sports_Car_v2.stl";
const WIRE_COLOR: Color32 = Color32::from_rgb(0x06, 0xb6, 0xd4);
const KEY_LIGHT: Point3 = [500.0, 1000.0, 750.0];
const RIM_LIGHT: Point3 = [-500.0, 200.0, -500.0];
const RIM_TINT: Point3 = [0.23, 0.51, 0.96];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    Wireframe,
    #[default]
    Shaded,
    /// Surface normals as color
    Analysis,
}

impl RenderMode {
    pub const ALL: [RenderMode; 3] = [RenderMode::Wireframe, RenderMode::Shaded, RenderMode::Analysis];

    pub fn label(&self) -> &'static str {
        match self {
            RenderMode::Wireframe => "线框",
            RenderMode::Shaded => "实体",
            RenderMode::Analysis => "分析",
        }
    }
}

enum Model {
    Procedural(Vec<Part>),
    Imported { name: String, mesh: StlMesh },
}

impl Model {
    fn triangles(&self) -> Box<dyn Iterator<Item = ([Point3; 3], Point3)> + '_> {
        match self {
            Model::Procedural(parts) => Box::new(
                parts
                    .iter()
                    .flat_map(|p| p.triangles.iter().map(move |t| (*t, base_color(p.material)))),
            ),
            Model::Imported { mesh, .. } => {
                Box::new(mesh.triangles.iter().map(|t| (*t, [0.38, 0.65, 0.98])))
            }
        }
    }

    /// (vertices, faces), three vertices per face
    fn stats(&self) -> (usize, usize) {
        match self {
            Model::Procedural(parts) => car_model::stats(parts),
            Model::Imported { mesh, .. } => (mesh.vertex_count(), mesh.face_count()),
        }
    }
}

fn base_color(material: Material) -> Point3 {
    match material {
        Material::Body => [0.23, 0.51, 0.96],
        Material::Glass => [0.12, 0.16, 0.23],
        Material::Tire => [0.07, 0.07, 0.07],
    }
}

pub struct CadViewer {
    pub camera: OrbitCamera,
    pub mode: RenderMode,
    /// Drag orbits only while the rotate tool is on
    pub rotate_tool: bool,
    pub interpolation: f32,
    model: Option<Model>,
    built_for: Option<String>,
    grabcad_until: Option<Instant>,
}

impl Default for CadViewer {
    fn default() -> Self {
        Self {
            camera: ViewPreset::Iso.camera(),
            mode: RenderMode::default(),
            rotate_tool: true,
            interpolation: 0.5,
            model: None,
            built_for: None,
            grabcad_until: None,
        }
    }
}

impl CadViewer {
    /// Rebuild the block model when the selected design changes
    pub fn sync(&mut self, design: &DesignRecord) {
        if self.built_for.as_deref() == Some(design.id.as_str()) {
            return;
        }
        self.model = Some(Model::Procedural(car_model::block_car(
            &design.dimensions(),
            design.vehicle_type,
        )));
        self.built_for = Some(design.id.clone());
        tracing::debug!(design = %design.id, "built block model");
    }

    pub fn stats(&self) -> (usize, usize) {
        self.model.as_ref().map_or((0, 0), Model::stats)
    }

    pub fn imported_name(&self) -> Option<&str> {
        match &self.model {
            Some(Model::Imported { name, .. }) => Some(name),
            _ => None,
        }
    }

    pub fn set_view(&mut self, preset: ViewPreset) {
        self.camera = preset.camera();
    }

    /// Replace the model with an STL file and frame it
    pub fn import_stl(&mut self, path: &Path) -> Result<(), StlError> {
        let mesh = StlMesh::from_file(path)?.normalized();
        self.show_imported(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "model.stl".into()),
            mesh,
        );
        Ok(())
    }

    fn show_imported(&mut self, name: String, mesh: StlMesh) {
        let max_dim = mesh.max_extent().max(1e-3);
        self.camera = OrbitCamera::looking_at(scale([1.5, 1.0, 1.5], max_dim), [0.0; 3], 45.0)
            .with_distance_limits(max_dim * 0.2, max_dim * 10.0);
        tracing::info!(name, faces = mesh.face_count(), "imported STL");
        self.model = Some(Model::Imported { name, mesh });
    }

    pub fn start_grabcad(&mut self, now: Instant) {
        self.grabcad_until = Some(now + GRABCAD_DELAY);
    }

    pub fn is_loading(&self) -> bool {
        self.grabcad_until.is_some()
    }

    /// Notice text once the simulated download finishes
    pub fn poll_grabcad(&mut self, now: Instant) -> Option<String> {
        let until = self.grabcad_until?;
        if now < until {
            return None;
        }
        self.grabcad_until = None;
        Some(format!("已从 GrabCAD 模拟获取模型: '{GRABCAD_MODEL}'"))
    }

    /// Edge check of the current model for the manifold button
    pub fn manifold_summary(&self) -> String {
        let Some(model) = &self.model else {
            return "未加载几何模型".into();
        };
        let tris: Vec<[Point3; 3]> = model.triangles().map(|(t, _)| t).collect();
        let report = edge_report(&tris);
        if report.is_closed() {
            format!("流形检查通过: {} 条边全部闭合", report.edges)
        } else {
            format!(
                "流形检查未通过: {} 条开放边, {} 条非流形边 (共 {} 条边)",
                report.open, report.non_manifold, report.edges
            )
        }
    }

    fn faces(&self) -> Vec<Face> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        let eye = self.camera.eye();
        let key = normalize(KEY_LIGHT);
        let rim = normalize(RIM_LIGHT);
        model
            .triangles()
            .map(|(verts, rgb)| {
                let mut n = face_normal(&verts);
                // two-sided: light the side facing the camera
                if dot(n, sub(eye, verts[0])) < 0.0 {
                    n = scale(n, -1.0);
                }
                let color = match self.mode {
                    RenderMode::Analysis => normal_color(n),
                    _ => {
                        let diffuse = 0.6 + dot(n, key).max(0.0);
                        let back = 0.5 * dot(n, rim).max(0.0);
                        to_color([0usize, 1, 2].map(|i| rgb[i] * diffuse + RIM_TINT[i] * back))
                    }
                };
                Face { verts, color }
            })
            .collect()
    }
}

pub fn show(ui: &mut egui::Ui, viewer: &mut CadViewer, design: Option<&DesignRecord>, out: &mut Vec<UiIntent>) {
    let Some(design) = design else {
        empty_state(ui, "未加载几何模型");
        return;
    };
    viewer.sync(design);
    if let Some(notice) = viewer.poll_grabcad(Instant::now()) {
        out.push(UiIntent::Notice(notice));
    }

    egui::SidePanel::left("cad_tree")
        .exact_width(256.0)
        .resizable(false)
        .frame(Frame::none().fill(SLATE_900).inner_margin(12.0))
        .show_inside(ui, |ui| model_tree(ui, viewer, design));

    egui::SidePanel::right("cad_properties")
        .exact_width(288.0)
        .resizable(false)
        .frame(Frame::none().fill(SLATE_900).inner_margin(16.0))
        .show_inside(ui, |ui| properties(ui, viewer, design, out));

    egui::CentralPanel::default()
        .frame(Frame::none().fill(SLATE_950))
        .show_inside(ui, |ui| viewport(ui, viewer, out));
}

fn model_tree(ui: &mut egui::Ui, viewer: &mut CadViewer, design: &DesignRecord) {
    caption(ui, "模型树 (MODEL TREE)");
    ui.separator();
    Frame::none()
        .fill(SLATE_800.gamma_multiply(0.5))
        .rounding(4.0)
        .inner_margin(egui::Margin::symmetric(8.0, 4.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(format!("▣ {}", design.id)).strong().color(BRAND_BLUE));
        });
    if let Some(name) = viewer.imported_name() {
        ui.label(RichText::new(format!("    ⬆ {name}")).color(SLATE_300));
    }
    for part in design.cad.iter().flat_map(|c| &c.parts) {
        ui.horizontal(|ui| {
            ui.add_space(16.0);
            ui.label(RichText::new("📁").color(BRAND_ACCENT));
            ui.label(RichText::new(part).color(SLATE_300));
        });
    }

    ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
        ui.add(egui::Slider::new(&mut viewer.interpolation, 0.0..=1.0).step_by(0.01));
        caption(ui, "形态插值 (MORPH)");
        ui.separator();
    });
}

fn properties(ui: &mut egui::Ui, viewer: &CadViewer, design: &DesignRecord, out: &mut Vec<UiIntent>) {
    caption(ui, "属性面板 (PROPERTIES)");
    ui.separator();
    ui.label(RichText::new("尺寸 (Dimensions mm)").size(11.0).color(SLATE_500));
    let dims = design.dimensions();
    ui.columns(3, |cols| {
        let cells = [
            ("L", Color32::from_rgb(0xef, 0x44, 0x44), dims.length),
            ("W", Color32::from_rgb(0x22, 0xc5, 0x5e), dims.width),
            ("H", BRAND_BLUE, dims.height),
        ];
        for (ui, (axis, color, value)) in cols.iter_mut().zip(cells) {
            Frame::none()
                .fill(SLATE_950)
                .stroke(Stroke::new(1.0, SLATE_800))
                .rounding(4.0)
                .inner_margin(8.0)
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(RichText::new(axis).strong().color(color));
                    ui.label(RichText::new(format!("{value}")).size(12.0).color(SLATE_200));
                });
        }
    });
    ui.add_space(12.0);

    ui.label(RichText::new("DeepSDF 元数据").size(11.0).color(SLATE_500));
    let latent = design
        .cad
        .iter()
        .flat_map(|c| &c.latent_code)
        .map(|v| format!("{v:.3}"))
        .collect::<Vec<_>>()
        .join(", ");
    Frame::none()
        .fill(SLATE_950)
        .stroke(Stroke::new(1.0, SLATE_800))
        .rounding(4.0)
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(format!("LC: {latent}")).size(10.0).monospace().color(SLATE_400));
        });

    ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
        let full = vec2(ui.available_width(), 32.0);
        if ui
            .add(primary_button("导出至网格划分 (Export)", BRAND_BLUE).min_size(full))
            .clicked()
        {
            out.push(UiIntent::Dispatch(Action::Navigate(ViewMode::Meshing)));
        }
        let manifold = egui::Button::new(RichText::new("检查流形 (Manifold)").color(Color32::WHITE))
            .fill(SLATE_800)
            .stroke(Stroke::new(1.0, SLATE_700))
            .min_size(full);
        if ui.add(manifold).clicked() {
            out.push(UiIntent::Notice(viewer.manifold_summary()));
        }
    });
}

fn toolbar_button(ui: &mut egui::Ui, text: &str, active: bool, active_color: Color32) -> bool {
    let (fill, color) = if active { (SLATE_800, active_color) } else { (Color32::TRANSPARENT, SLATE_400) };
    ui.add(egui::Button::new(RichText::new(text).size(12.0).monospace().color(color)).fill(fill))
        .clicked()
}

fn toolbar_group(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
    Frame::none()
        .fill(SLATE_900)
        .stroke(Stroke::new(1.0, SLATE_700))
        .rounding(8.0)
        .inner_margin(4.0)
        .show(ui, |ui| {
            ui.horizontal(add_contents);
        });
}

fn viewport(ui: &mut egui::Ui, viewer: &mut CadViewer, out: &mut Vec<UiIntent>) {
    let rect = ui.available_rect_before_wrap();
    let response = ui.allocate_rect(rect, Sense::drag());
    if viewer.rotate_tool && response.dragged() {
        viewer.camera.orbit(response.drag_delta());
    }
    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            viewer.camera.zoom(scroll);
        }
    }

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, SLATE_900);
    paint_grid(&painter, &viewer.camera, rect);
    let wire = (viewer.mode == RenderMode::Wireframe).then(|| Stroke::new(1.0, WIRE_COLOR));
    paint_faces(&painter, &viewer.camera, rect, &viewer.faces(), wire);

    let (verts, faces) = viewer.stats();
    painter.text(
        rect.right_bottom() - vec2(16.0, 44.0),
        Align2::RIGHT_BOTTOM,
        "ENGINE: EGUI SOFTWARE RASTER",
        FontId::monospace(11.0),
        SLATE_500,
    );
    painter.text(
        rect.right_bottom() - vec2(16.0, 28.0),
        Align2::RIGHT_BOTTOM,
        format!("VERTS: {verts}"),
        FontId::monospace(11.0),
        SLATE_300,
    );
    painter.text(
        rect.right_bottom() - vec2(16.0, 12.0),
        Align2::RIGHT_BOTTOM,
        format!("FACES: {faces}"),
        FontId::monospace(11.0),
        SLATE_300,
    );

    let toolbar = Rect::from_min_max(rect.min + vec2(16.0, 16.0), pos2(rect.right() - 16.0, rect.top() + 56.0));
    ui.allocate_ui_at_rect(toolbar, |ui| {
        ui.horizontal(|ui| {
            toolbar_group(ui, |ui| {
                if toolbar_button(ui, "⟲", viewer.rotate_tool, Color32::WHITE) {
                    viewer.rotate_tool = !viewer.rotate_tool;
                }
                for preset in ViewPreset::ALL {
                    if toolbar_button(ui, preset.label(), false, SLATE_400) {
                        viewer.set_view(preset);
                    }
                }
            });
            toolbar_group(ui, |ui| {
                for mode in RenderMode::ALL {
                    let color = if mode == RenderMode::Analysis { BRAND_ACCENT } else { BRAND_BLUE };
                    if toolbar_button(ui, mode.label(), viewer.mode == mode, color) {
                        viewer.mode = mode;
                    }
                }
            });
            toolbar_group(ui, |ui| {
                if toolbar_button(ui, "⬆ STL", false, SLATE_400) {
                    if let Some(path) = rfd::FileDialog::new()
                        .set_title("Load STL File")
                        .add_filter("STL", &["stl", "STL"])
                        .pick_file()
                    {
                        if let Err(e) = viewer.import_stl(&path) {
                            tracing::warn!(path = %path.display(), "STL import failed: {e}");
                            out.push(UiIntent::Notice(format!("STL 导入失败: {e}")));
                        }
                    }
                }
                if toolbar_button(ui, "🌐 GrabCAD", false, SLATE_400) {
                    viewer.start_grabcad(Instant::now());
                }
            });
        });
    });

    if viewer.is_loading() {
        painter.rect_filled(rect, 0.0, SLATE_950.gamma_multiply(0.8));
        let angle = ui.input(|i| i.time) as f32 * 4.0;
        let center = rect.center() - vec2(0.0, 16.0);
        let arc: Vec<_> = (0..=20)
            .map(|k| {
                let a = angle + k as f32 * 0.2;
                center + vec2(a.cos(), a.sin()) * 18.0
            })
            .collect();
        painter.add(egui::Shape::line(arc, Stroke::new(3.0, BRAND_BLUE)));
        painter.text(
            rect.center() + vec2(0.0, 24.0),
            Align2::CENTER_CENTER,
            "正在处理几何数据...",
            FontId::monospace(13.0),
            Color32::WHITE,
        );
        ui.ctx().request_repaint();
    }
}

/// 2000-unit floor grid in 40 cells plus a small axis gizmo
fn paint_grid(painter: &egui::Painter, camera: &OrbitCamera, rect: Rect) {
    let stroke = Stroke::new(1.0, SLATE_800);
    let mut segment = |a: Point3, b: Point3, stroke: Stroke| {
        if let (Some((pa, _)), Some((pb, _))) = (camera.project(a, rect), camera.project(b, rect)) {
            painter.line_segment([pa, pb], stroke);
        }
    };
    for k in 0..=40 {
        let t = -1000.0 + k as f32 * 50.0;
        segment([t, 0.0, -1000.0], [t, 0.0, 1000.0], stroke);
        segment([-1000.0, 0.0, t], [1000.0, 0.0, t], stroke);
    }
    let axes = [
        ([100.0, 0.0, 0.0], Color32::from_rgb(0xef, 0x44, 0x44)),
        ([0.0, 100.0, 0.0], Color32::from_rgb(0x22, 0xc5, 0x5e)),
        ([0.0, 0.0, 100.0], BRAND_BLUE),
    ];
    for (end, color) in axes {
        segment([0.0; 3], end, Stroke::new(2.0, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::DesignCatalog;

    fn design() -> DesignRecord {
        DesignCatalog::builtin().first().clone()
    }

    #[test]
    fn test_sync_builds_once_per_design() {
        let mut viewer = CadViewer::default();
        assert_eq!(viewer.stats(), (0, 0));
        let d = design();
        viewer.sync(&d);
        let stats = viewer.stats();
        assert!(stats.1 > 0);
        assert_eq!(stats.0, stats.1 * 3);

        viewer.mode = RenderMode::Wireframe;
        viewer.sync(&d);
        assert_eq!(viewer.stats(), stats);
    }

    #[test]
    fn test_import_stl_replaces_model_and_frames_camera() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wing.stl");
        std::fs::write(
            &path,
            "solid w\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 4 0 0\nvertex 0 2 0\nendloop\nendfacet\nendsolid w\n",
        )
        .unwrap();

        let mut viewer = CadViewer::default();
        viewer.sync(&design());
        viewer.import_stl(&path).unwrap();
        assert_eq!(viewer.stats(), (3, 1));
        assert_eq!(viewer.imported_name(), Some("wing.stl"));
        let eye = viewer.camera.eye();
        assert!((eye[0] - 6.0).abs() < 1e-3 && (eye[1] - 4.0).abs() < 1e-3 && (eye[2] - 6.0).abs() < 1e-3);
        assert!(viewer.manifold_summary().contains("未通过"));
    }

    #[test]
    fn test_failed_import_keeps_model() {
        let mut viewer = CadViewer::default();
        viewer.sync(&design());
        let before = viewer.stats();
        assert!(viewer.import_stl(Path::new("/nonexistent/part.stl")).is_err());
        assert_eq!(viewer.stats(), before);
    }

    #[test]
    fn test_grabcad_notice_after_delay() {
        let mut viewer = CadViewer::default();
        let t0 = Instant::now();
        viewer.start_grabcad(t0);
        assert!(viewer.is_loading());
        assert_eq!(viewer.poll_grabcad(t0 + Duration::from_millis(1000)), None);
        let notice = viewer.poll_grabcad(t0 + GRABCAD_DELAY).unwrap();
        assert!(notice.contains("Generic_Sports_Car_v2.stl"));
        assert!(!viewer.is_loading());
        assert_eq!(viewer.poll_grabcad(t0 + GRABCAD_DELAY * 2), None);
    }

    #[test]
    fn test_analysis_mode_colors_by_normal() {
        let mut viewer = CadViewer::default();
        viewer.sync(&design());
        viewer.mode = RenderMode::Analysis;
        let faces = viewer.faces();
        assert_eq!(faces.len(), viewer.stats().1);
        // every normal color was flipped toward the camera so none is fully dark
        assert!(faces.iter().all(|f| f.color != Color32::BLACK));
    }
}
