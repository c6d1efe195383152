//! Overview dashboard: resource cards, the agent workflow canvas with its
//! node config panel, the job queue and the project table.

use super::{
    card, caption, primary_button, section_title, UiIntent, BRAND_ACCENT, BRAND_BLUE, BRAND_CYAN,
    BRAND_DANGER, BRAND_SUCCESS, PINK, PURPLE, SLATE_200, SLATE_300, SLATE_400, SLATE_500,
    SLATE_600, SLATE_700, SLATE_800, SLATE_900, SLATE_950,
};
use egui::epaint::CubicBezierShape;
use egui::{pos2, vec2, Align2, Color32, FontId, Frame, Pos2, Rect, RichText, Sense, Shape, Stroke};
use pipeline::workflow::{NodeStatus, ParamList, WorkflowNode};
use pipeline::{Action, WorkflowBoard};
use shared::design::{PipelineStage, Project, ProjectStatus};
use shared::{AgentRole, ViewMode};

const CANVAS_HEIGHT: f32 = 500.0;
const CANVAS_MIN_WIDTH: f32 = 880.0;
const NODE_SIZE: egui::Vec2 = vec2(240.0, 112.0);
/// Edges attach this far below a node's top edge
const ANCHOR_Y: f32 = 40.0;
const CONFIG_WIDTH: f32 = 320.0;
/// Seconds for the pulse dot to travel one edge
const EDGE_TRAVEL_SECS: f64 = 1.5;
const INACTIVE_EDGE: Color32 = SLATE_700;

struct Resource {
    label: &'static str,
    value: &'static str,
    sub: &'static str,
    color: Color32,
}

const RESOURCES: [Resource; 4] = [
    Resource { label: "GPU 负载", value: "78%", sub: "24GB / 32GB 显存", color: BRAND_ACCENT },
    Resource { label: "活跃任务", value: "3", sub: "2 个排队中", color: BRAND_BLUE },
    Resource { label: "存储空间", value: "4.2 TB", sub: "总量 12 TB (RAID 5)", color: BRAND_CYAN },
    Resource { label: "运行时间", value: "14天 2小时", sub: "上次更新: 2周前", color: BRAND_SUCCESS },
];

struct Job {
    id: &'static str,
    task: &'static str,
    user: &'static str,
    running: bool,
    progress: u8,
}

const JOBS: [Job; 4] = [
    Job { id: "JOB-992", task: "RANS 湍流仿真", user: "管理员", running: true, progress: 78 },
    Job { id: "JOB-993", task: "DeepSDF 推理", user: "李工", running: true, progress: 45 },
    Job { id: "JOB-994", task: "网格生成", user: "陈工", running: false, progress: 0 },
    Job { id: "JOB-995", task: "风格迁移", user: "设计师 A", running: false, progress: 0 },
];

/// Text buffers for the config panel's parameter fields
#[derive(Default)]
pub struct DashboardState {
    node: Option<&'static str>,
    buffers: Vec<(String, String)>,
}

impl DashboardState {
    fn sync(&mut self, board: &WorkflowBoard) {
        let selected = board.selected().map(|n| n.id);
        if selected == self.node {
            return;
        }
        self.node = selected;
        self.buffers = board
            .draft()
            .map(|d| d.params.iter().map(|(k, v)| (k.clone(), v.to_string())).collect())
            .unwrap_or_default();
    }
}

pub fn role_color(role: AgentRole) -> Color32 {
    match role {
        AgentRole::User | AgentRole::Cad => BRAND_BLUE,
        AgentRole::Orchestrator => PURPLE,
        AgentRole::Styling => PINK,
        AgentRole::Meshing => BRAND_SUCCESS,
        AgentRole::Simulation => BRAND_CYAN,
    }
}

fn stage_color(stage: PipelineStage) -> Color32 {
    match stage {
        PipelineStage::Simulation => BRAND_CYAN,
        PipelineStage::Meshing => BRAND_SUCCESS,
        PipelineStage::Geometry => BRAND_BLUE,
        PipelineStage::Concept => SLATE_400,
    }
}

fn status_color(status: ProjectStatus) -> Color32 {
    match status {
        ProjectStatus::Active => BRAND_BLUE,
        ProjectStatus::Completed => BRAND_SUCCESS,
        ProjectStatus::Queued => SLATE_500,
        ProjectStatus::Error => BRAND_DANGER,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Edge {
    from: (f32, f32),
    to: (f32, f32),
    active: bool,
    color: Color32,
}

/// User feeds the orchestrator, which fans out to every agent
fn edges(nodes: &[WorkflowNode], stage: PipelineStage) -> Vec<Edge> {
    let find = |role: AgentRole| nodes.iter().find(|n| n.role == role);
    let (Some(user), Some(orch)) = (find(AgentRole::User), find(AgentRole::Orchestrator)) else {
        return Vec::new();
    };
    let mut out = vec![Edge {
        from: user.position,
        to: orch.position,
        active: true,
        color: PURPLE,
    }];
    for agent in nodes.iter().filter(|n| !matches!(n.role, AgentRole::User | AgentRole::Orchestrator)) {
        let active = agent.is_active(stage);
        out.push(Edge {
            from: orch.position,
            to: agent.position,
            active,
            color: if active { role_color(agent.role) } else { INACTIVE_EDGE },
        });
    }
    out
}

/// Output handle of `from` to input handle of `to`, control points at mid-x
fn edge_curve(origin: Pos2, from: (f32, f32), to: (f32, f32)) -> [Pos2; 4] {
    let start = origin + vec2(from.0 + NODE_SIZE.x, from.1 + ANCHOR_Y);
    let end = origin + vec2(to.0, to.1 + ANCHOR_Y);
    let mid = start.x + (end.x - start.x) / 2.0;
    [start, pos2(mid, start.y), pos2(mid, end.y), end]
}

pub fn show(
    ui: &mut egui::Ui,
    state: &mut DashboardState,
    projects: &[Project],
    board: &WorkflowBoard,
    stage: PipelineStage,
    out: &mut Vec<UiIntent>,
) {
    state.sync(board);
    egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
        header(ui, out);
        ui.add_space(16.0);
        resource_cards(ui);
        ui.add_space(16.0);
        egui::ScrollArea::horizontal().id_source("workflow_canvas").show(ui, |ui| {
            canvas(ui, state, board, stage, out);
        });
        ui.add_space(16.0);

        let width = ui.available_width();
        ui.horizontal_top(|ui| {
            ui.allocate_ui(vec2(width / 3.0 - 8.0, 0.0), job_queue);
            ui.add_space(8.0);
            ui.allocate_ui(vec2(ui.available_width(), 0.0), |ui| project_table(ui, projects));
        });
    });
}

fn header(ui: &mut egui::Ui, out: &mut Vec<UiIntent>) {
    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.label(RichText::new("运维仪表盘").size(24.0).strong().color(Color32::WHITE));
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;
                ui.label(RichText::new("系统状态:").size(13.0).color(SLATE_400));
                ui.label(RichText::new("在线").size(13.0).monospace().color(BRAND_SUCCESS));
                ui.label(RichText::new("• 集群节点:").size(13.0).color(SLATE_400));
                ui.label(RichText::new("NODE-01").size(13.0).monospace().color(BRAND_BLUE));
            });
        });
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.add(primary_button("新建项目", BRAND_BLUE)).clicked() {
                out.push(UiIntent::Dispatch(Action::Navigate(ViewMode::Styling)));
            }
        });
    });
}

fn resource_cards(ui: &mut egui::Ui) {
    ui.columns(RESOURCES.len(), |cols| {
        for (ui, res) in cols.iter_mut().zip(RESOURCES.iter()) {
            card().show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    caption(ui, res.label);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let (dot, _) = ui.allocate_exact_size(vec2(8.0, 8.0), Sense::hover());
                        ui.painter().circle_filled(dot.center(), 4.0, res.color);
                    });
                });
                ui.label(RichText::new(res.value).size(22.0).strong().monospace().color(Color32::WHITE));
                ui.label(RichText::new(res.sub).size(11.0).color(SLATE_500));
            });
        }
    });
}

fn canvas(
    ui: &mut egui::Ui,
    state: &mut DashboardState,
    board: &WorkflowBoard,
    stage: PipelineStage,
    out: &mut Vec<UiIntent>,
) {
    let width = ui.available_width().max(CANVAS_MIN_WIDTH);
    let (rect, background) = ui.allocate_exact_size(vec2(width, CANVAS_HEIGHT), Sense::click());
    let painter = ui.painter_at(rect);
    let time = ui.input(|i| i.time);

    painter.rect_filled(rect, 12.0, SLATE_950);
    painter.rect_stroke(rect, 12.0, Stroke::new(1.0, SLATE_800));
    let mut y = rect.top() + 10.0;
    while y < rect.bottom() {
        let mut x = rect.left() + 10.0;
        while x < rect.right() {
            painter.circle_filled(pos2(x, y), 1.0, SLATE_800);
            x += 20.0;
        }
        y += 20.0;
    }

    painter.text(
        rect.left_top() + vec2(16.0, 16.0),
        Align2::LEFT_TOP,
        "工作流编排 (Workflow Orchestration)",
        FontId::proportional(14.0),
        Color32::WHITE,
    );
    painter.text(
        rect.left_top() + vec2(16.0, 36.0),
        Align2::LEFT_TOP,
        "Interactive Multi-Agent Pipeline",
        FontId::proportional(11.0),
        SLATE_500,
    );

    for edge in edges(board.nodes(), stage) {
        let points = edge_curve(rect.min, edge.from, edge.to);
        let curve = CubicBezierShape::from_points_stroke(
            points,
            false,
            Color32::TRANSPARENT,
            Stroke::new(2.0, SLATE_800),
        );
        painter.add(curve.clone());
        if edge.active {
            let path = curve.flatten(Some(0.5));
            painter.extend(Shape::dashed_line(
                &path,
                Stroke::new(2.0, edge.color.gamma_multiply(0.6)),
                5.0,
                5.0,
            ));
            let t = ((time % EDGE_TRAVEL_SECS) / EDGE_TRAVEL_SECS) as f32;
            painter.circle_filled(curve.sample(t), 3.0, edge.color);
        }
    }

    let selected = board.selected().map(|n| n.id);
    let mut node_clicked = false;
    for node in board.nodes() {
        let node_rect = Rect::from_min_size(rect.min + vec2(node.position.0, node.position.1), NODE_SIZE);
        let response = ui.interact(node_rect, ui.id().with(node.id), Sense::click());
        paint_node(&painter, node_rect, node, node.is_active(stage), selected == Some(node.id), response.hovered(), time);
        if response.clicked() {
            node_clicked = true;
            out.push(UiIntent::Dispatch(Action::SelectNode(Some(node.id.to_string()))));
        }
    }

    let config_rect = Rect::from_min_max(
        pos2(rect.right() - CONFIG_WIDTH - 16.0, rect.top() + 16.0),
        pos2(rect.right() - 16.0, rect.bottom() - 16.0),
    );
    if let Some(node) = board.selected() {
        ui.allocate_ui_at_rect(config_rect, |ui| config_panel(ui, state, board, node, out));
    }

    if background.clicked() && !node_clicked {
        let inside_config = selected.is_some()
            && background
                .interact_pointer_pos()
                .is_some_and(|p| config_rect.contains(p));
        if !inside_config && selected.is_some() {
            out.push(UiIntent::Dispatch(Action::SelectNode(None)));
        }
    }
    if edges(board.nodes(), stage).iter().any(|e| e.active) {
        ui.ctx().request_repaint();
    }
}

fn paint_node(
    painter: &egui::Painter,
    rect: Rect,
    node: &WorkflowNode,
    active: bool,
    selected: bool,
    hovered: bool,
    time: f64,
) {
    let color = role_color(node.role);
    let lit = active || selected;
    let border = if lit {
        color
    } else if hovered {
        SLATE_500
    } else {
        SLATE_700
    };
    if selected {
        painter.rect_stroke(rect.expand(3.0), 14.0, Stroke::new(2.0, color.gamma_multiply(0.6)));
    }
    painter.rect_filled(rect, 12.0, if lit { SLATE_900 } else { SLATE_900.gamma_multiply(0.5) });
    painter.rect_stroke(rect, 12.0, Stroke::new(1.0, border));

    let header = Rect::from_min_size(rect.min, vec2(rect.width(), 44.0));
    painter.line_segment(
        [header.left_bottom(), header.right_bottom()],
        Stroke::new(1.0, SLATE_800.gamma_multiply(0.5)),
    );
    let icon = Rect::from_center_size(header.left_center() + vec2(26.0, 0.0), vec2(24.0, 24.0));
    painter.rect_filled(icon, 6.0, if lit { color.gamma_multiply(0.2) } else { SLATE_800 });
    painter.circle_filled(icon.center(), 4.0, if lit { color } else { SLATE_400 });
    painter.text(
        header.left_center() + vec2(48.0, 0.0),
        Align2::LEFT_CENTER,
        node.label,
        FontId::proportional(14.0),
        if lit { Color32::WHITE } else { SLATE_300 },
    );

    if active || node.status == NodeStatus::Running {
        let dot = header.right_center() - vec2(16.0, 0.0);
        let phase = (time % 1.0) as f32;
        painter.circle_filled(dot, 3.0 + phase * 5.0, color.gamma_multiply(0.75 * (1.0 - phase)));
        painter.circle_filled(dot, 3.0, color);
    }

    let galley = painter.layout(
        node.description.to_string(),
        FontId::proportional(11.0),
        SLATE_500,
        rect.width() - 32.0,
    );
    painter.galley(rect.min + vec2(16.0, 52.0), galley, SLATE_500);

    let (badge_color, badge_fill) = match node.status {
        NodeStatus::Running => (color, color.gamma_multiply(0.1)),
        NodeStatus::Completed => (BRAND_SUCCESS, BRAND_SUCCESS.gamma_multiply(0.1)),
        _ => (SLATE_500, SLATE_800),
    };
    let badge_text = painter.layout_no_wrap(node.status.as_str().to_string(), FontId::monospace(10.0), badge_color);
    let badge_rect = Rect::from_min_size(
        pos2(rect.left() + 16.0, rect.bottom() - 26.0),
        badge_text.size() + vec2(12.0, 4.0),
    );
    painter.rect_filled(badge_rect, 4.0, badge_fill);
    painter.galley(badge_rect.min + vec2(6.0, 2.0), badge_text, badge_color);

    let handle = if selected { color } else { SLATE_600 };
    painter.circle_filled(pos2(rect.left(), rect.top() + ANCHOR_Y), 4.0, handle);
    painter.circle_filled(pos2(rect.right(), rect.top() + ANCHOR_Y), 4.0, handle);
}

fn kv_block(ui: &mut egui::Ui, entries: &ParamList, empty: &str) {
    Frame::none()
        .fill(SLATE_950)
        .stroke(Stroke::new(1.0, SLATE_800))
        .rounding(4.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            if entries.is_empty() {
                ui.label(RichText::new(empty).size(11.0).italics().color(SLATE_600));
            }
            for (key, value) in entries {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("{key}:")).size(11.0).monospace().color(SLATE_400));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add(egui::Label::new(RichText::new(value.to_string()).size(11.0).color(SLATE_200)).truncate(true));
                    });
                });
            }
        });
}

fn config_panel(
    ui: &mut egui::Ui,
    state: &mut DashboardState,
    board: &WorkflowBoard,
    node: &WorkflowNode,
    out: &mut Vec<UiIntent>,
) {
    let color = role_color(node.role);
    let dirty = board.draft().is_some_and(|d| d.dirty);
    Frame::none()
        .fill(SLATE_900.gamma_multiply(0.95))
        .stroke(Stroke::new(1.0, SLATE_700))
        .rounding(12.0)
        .inner_margin(16.0)
        .show(ui, |ui| {
            ui.set_min_size(ui.available_size());
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("{} 配置", node.label)).strong().color(Color32::WHITE));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.add(egui::Button::new(RichText::new("✕").color(SLATE_500)).frame(false)).clicked() {
                        out.push(UiIntent::Dispatch(Action::SelectNode(None)));
                    }
                });
            });
            ui.separator();

            egui::ScrollArea::vertical().max_height(ui.available_height() - 80.0).show(ui, |ui| {
                caption(ui, "→ 输入数据 (Inputs)");
                kv_block(ui, &node.inputs, "无上游输入数据");
                ui.add_space(12.0);

                caption(ui, "⚙ 运行参数 (Parameters)");
                for (key, buffer) in state.buffers.iter_mut() {
                    ui.label(RichText::new(key.as_str()).size(12.0).color(SLATE_300));
                    let edit = egui::TextEdit::singleline(buffer).desired_width(f32::INFINITY);
                    if ui.add(edit).changed() {
                        out.push(UiIntent::Dispatch(Action::EditParam {
                            key: key.clone(),
                            value: buffer.clone(),
                        }));
                    }
                }
                ui.add_space(12.0);

                caption(ui, "</> 输出预览 (Outputs)");
                kv_block(ui, &node.outputs, "等待执行...");
            });

            ui.separator();
            ui.horizontal(|ui| {
                let save = if dirty {
                    primary_button("保存配置", BRAND_BLUE)
                } else {
                    egui::Button::new(RichText::new("保存配置").color(SLATE_500)).fill(SLATE_800)
                };
                if ui.add_enabled(dirty, save.min_size(vec2(200.0, 28.0))).clicked() {
                    out.push(UiIntent::Dispatch(Action::SaveNode));
                }
                if ui.add(egui::Button::new(RichText::new("重置").color(SLATE_300)).fill(SLATE_800)).clicked() {
                    out.push(UiIntent::Dispatch(Action::ResetNode));
                    // rebuild the text fields from the restored params next frame
                    state.node = None;
                }
            });
            if let Some(view) = node.view {
                let enter = egui::Button::new(RichText::new("进入工作台 →").size(12.0).color(SLATE_300))
                    .stroke(Stroke::new(1.0, color))
                    .fill(Color32::TRANSPARENT)
                    .min_size(vec2(ui.available_width(), 28.0));
                if ui.add(enter).clicked() {
                    out.push(UiIntent::Dispatch(Action::Navigate(view)));
                }
            }
        });
}

fn job_queue(ui: &mut egui::Ui) {
    card().show(ui, |ui| {
        ui.set_width(ui.available_width());
        section_title(ui, "任务队列");
        ui.add_space(8.0);
        for job in &JOBS {
            Frame::none()
                .fill(SLATE_950)
                .stroke(Stroke::new(1.0, SLATE_800))
                .rounding(4.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    let status_color = if job.running { BRAND_BLUE } else { SLATE_500 };
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(job.id).size(11.0).monospace().color(SLATE_400));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            let text = if job.running { "运行中" } else { "排队中" };
                            ui.label(RichText::new(text).size(10.0).strong().color(status_color));
                        });
                    });
                    ui.label(RichText::new(job.task).size(13.0).color(Color32::WHITE));
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(job.user).size(11.0).color(SLATE_500));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(RichText::new(format!("{}%", job.progress)).size(11.0).monospace().color(SLATE_300));
                        });
                    });
                    let (bar, _) = ui.allocate_exact_size(vec2(ui.available_width(), 4.0), Sense::hover());
                    ui.painter().rect_filled(bar, 2.0, SLATE_800);
                    let mut filled = bar;
                    filled.set_width(bar.width() * job.progress as f32 / 100.0);
                    let fill = if job.running { BRAND_BLUE } else { SLATE_700 };
                    ui.painter().rect_filled(filled, 2.0, fill);
                });
            ui.add_space(6.0);
        }
    });
}

fn project_table(ui: &mut egui::Ui, projects: &[Project]) {
    card().show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            section_title(ui, "最近项目");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(RichText::new("查看全部").size(11.0).color(BRAND_BLUE));
            });
        });
        ui.add_space(8.0);
        egui::Grid::new("project_table")
            .num_columns(4)
            .spacing(vec2(24.0, 12.0))
            .striped(false)
            .show(ui, |ui| {
                for title in ["项目 ID", "项目名称", "阶段", "状态"] {
                    caption(ui, title);
                }
                ui.end_row();
                for project in projects {
                    ui.label(RichText::new(&project.id).monospace().color(SLATE_400));
                    ui.label(RichText::new(&project.name).strong().color(Color32::WHITE));
                    super::badge(ui, project.stage.label(), stage_color(project.stage));
                    ui.label(RichText::new(project.status.label()).size(12.0).color(status_color(project.status)));
                    ui.end_row();
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_edge_always_active() {
        let board = WorkflowBoard::default();
        for stage in [PipelineStage::Concept, PipelineStage::Simulation] {
            let all = edges(board.nodes(), stage);
            assert_eq!(all.len(), 5);
            assert!(all[0].active);
            assert_eq!(all[0].color, PURPLE);
        }
    }

    #[test]
    fn test_only_stage_agent_edge_lit() {
        let board = WorkflowBoard::default();
        let all = edges(board.nodes(), PipelineStage::Meshing);
        let lit: Vec<_> = all[1..].iter().filter(|e| e.active).collect();
        assert_eq!(lit.len(), 1);
        assert_eq!(lit[0].color, BRAND_SUCCESS);
        assert!(all[1..].iter().filter(|e| !e.active).all(|e| e.color == INACTIVE_EDGE));
    }

    #[test]
    fn test_edge_curve_mid_x_controls() {
        let [start, c1, c2, end] = edge_curve(Pos2::ZERO, (20.0, 180.0), (300.0, 180.0));
        assert_eq!(start, pos2(260.0, 220.0));
        assert_eq!(end, pos2(300.0, 220.0));
        assert_eq!(c1, pos2(280.0, 220.0));
        assert_eq!(c2, pos2(280.0, 220.0));

        let [start, c1, c2, end] = edge_curve(pos2(10.0, 10.0), (300.0, 180.0), (600.0, 20.0));
        assert_eq!(start, pos2(550.0, 230.0));
        assert_eq!(c1.x, c2.x);
        assert_eq!(c1.y, start.y);
        assert_eq!(c2.y, end.y);
    }

    #[test]
    fn test_buffers_follow_selection() {
        let mut board = WorkflowBoard::default();
        let mut state = DashboardState::default();
        state.sync(&board);
        assert!(state.buffers.is_empty());

        board.select(Some("mesh")).unwrap();
        state.sync(&board);
        assert_eq!(state.node, Some("mesh"));
        assert_eq!(state.buffers.len(), board.draft().unwrap().params.len());

        board.select(None).unwrap();
        state.sync(&board);
        assert!(state.buffers.is_empty());
    }
}
