//! Dashboard workflow board: agent nodes and their editable parameters.

use shared::design::PipelineStage;
use shared::{AgentRole, ViewMode};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("unknown workflow node '{0}'")]
    UnknownNode(String),
    #[error("no workflow node is selected")]
    NoNodeSelected,
    #[error("node '{node}' has no parameter '{key}'")]
    UnknownParam { node: String, key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Idle,
    Running,
    Completed,
    Error,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Idle => "IDLE",
            NodeStatus::Running => "RUNNING",
            NodeStatus::Completed => "COMPLETED",
            NodeStatus::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Number(f64),
    Flag(bool),
    List(Vec<String>),
}

impl ParamValue {
    /// Re-read user input, keeping this value's type when the input allows it
    pub fn reparse(&self, raw: &str) -> ParamValue {
        let trimmed = raw.trim();
        match self {
            ParamValue::Number(_) => trimmed
                .parse::<f64>()
                .map(ParamValue::Number)
                .unwrap_or_else(|_| ParamValue::Text(raw.to_string())),
            ParamValue::Flag(_) => match trimmed {
                "true" => ParamValue::Flag(true),
                "false" => ParamValue::Flag(false),
                _ => ParamValue::Text(raw.to_string()),
            },
            ParamValue::List(_) => ParamValue::List(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            ParamValue::Text(_) => ParamValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Flag(b) => write!(f, "{b}"),
            ParamValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

/// Ordered key/value pairs; order is display order
pub type ParamList = Vec<(String, ParamValue)>;

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowNode {
    pub id: &'static str,
    pub role: AgentRole,
    pub label: &'static str,
    pub description: &'static str,
    /// Workspace panel this agent lives in
    pub view: Option<ViewMode>,
    pub status: NodeStatus,
    /// Canvas position of the top-left corner
    pub position: (f32, f32),
    pub inputs: ParamList,
    pub params: ParamList,
    pub outputs: ParamList,
}

impl WorkflowNode {
    /// Whether the node is lit for the active project's stage
    pub fn is_active(&self, stage: PipelineStage) -> bool {
        match self.role {
            AgentRole::User | AgentRole::Orchestrator => true,
            AgentRole::Styling => stage == PipelineStage::Concept,
            AgentRole::Cad => stage == PipelineStage::Geometry,
            AgentRole::Meshing => stage == PipelineStage::Meshing,
            AgentRole::Simulation => stage == PipelineStage::Simulation,
        }
    }
}

/// Uncommitted edits for the selected node
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDraft {
    pub node_id: &'static str,
    pub params: ParamList,
    pub dirty: bool,
}

#[derive(Debug, Clone)]
pub struct WorkflowBoard {
    nodes: Vec<WorkflowNode>,
    draft: Option<ParamDraft>,
}

impl Default for WorkflowBoard {
    fn default() -> Self {
        Self {
            nodes: initial_nodes(),
            draft: None,
        }
    }
}

impl WorkflowBoard {
    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn draft(&self) -> Option<&ParamDraft> {
        self.draft.as_ref()
    }

    pub fn selected(&self) -> Option<&WorkflowNode> {
        self.draft.as_ref().and_then(|d| self.node(d.node_id))
    }

    /// Select a node (discarding any other draft) or clear the selection
    pub fn select(&mut self, id: Option<&str>) -> Result<(), WorkflowError> {
        let Some(id) = id else {
            self.draft = None;
            return Ok(());
        };
        let node = self
            .node(id)
            .ok_or_else(|| WorkflowError::UnknownNode(id.to_string()))?;
        if self.draft.as_ref().map(|d| d.node_id) == Some(node.id) {
            return Ok(());
        }
        self.draft = Some(ParamDraft {
            node_id: node.id,
            params: node.params.clone(),
            dirty: false,
        });
        Ok(())
    }

    pub fn edit_param(&mut self, key: &str, raw: &str) -> Result<(), WorkflowError> {
        let draft = self.draft.as_mut().ok_or(WorkflowError::NoNodeSelected)?;
        let node_id = draft.node_id;
        let slot = draft
            .params
            .iter_mut()
            .find(|(k, _)| k == key)
            .ok_or_else(|| WorkflowError::UnknownParam {
                node: node_id.to_string(),
                key: key.to_string(),
            })?;
        slot.1 = slot.1.reparse(raw);
        draft.dirty = true;
        Ok(())
    }

    /// Write the draft into the node
    pub fn save(&mut self) -> Result<(), WorkflowError> {
        let draft = self.draft.as_mut().ok_or(WorkflowError::NoNodeSelected)?;
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == draft.node_id)
            .ok_or_else(|| WorkflowError::UnknownNode(draft.node_id.to_string()))?;
        node.params = draft.params.clone();
        draft.dirty = false;
        tracing::info!(node = node.id, "workflow node parameters saved");
        Ok(())
    }

    /// Throw away unsaved edits
    pub fn reset(&mut self) -> Result<(), WorkflowError> {
        let node_id = self
            .draft
            .as_ref()
            .map(|d| d.node_id)
            .ok_or(WorkflowError::NoNodeSelected)?;
        let params = self
            .node(node_id)
            .map(|n| n.params.clone())
            .ok_or_else(|| WorkflowError::UnknownNode(node_id.to_string()))?;
        self.draft = Some(ParamDraft {
            node_id,
            params,
            dirty: false,
        });
        Ok(())
    }
}

fn text(k: &str, v: &str) -> (String, ParamValue) {
    (k.to_string(), ParamValue::Text(v.to_string()))
}

fn num(k: &str, v: f64) -> (String, ParamValue) {
    (k.to_string(), ParamValue::Number(v))
}

fn initial_nodes() -> Vec<WorkflowNode> {
    vec![
        WorkflowNode {
            id: "user",
            role: AgentRole::User,
            label: "用户输入",
            description: "设计需求与参数定义",
            view: None,
            status: NodeStatus::Completed,
            position: (20.0, 180.0),
            inputs: vec![],
            params: vec![
                text("Goal", "High Speed Aero"),
                text("Budget", "Unlimited"),
                text("Deadline", "2 Weeks"),
            ],
            outputs: vec![text("req_id", "REQ-2024-884"), text("intent", "Design Optimization")],
        },
        WorkflowNode {
            id: "orch",
            role: AgentRole::Orchestrator,
            label: "Orchestrator",
            description: "AutoGen 任务调度与协调",
            view: None,
            status: NodeStatus::Running,
            position: (300.0, 180.0),
            inputs: vec![text("req_id", "REQ-2024-884")],
            params: vec![
                text("Strategy", "Sequential"),
                num("Max Rounds", 10.0),
                text("Model", "GPT-4-Turbo"),
            ],
            outputs: vec![text("plan_id", "PLAN-A"), text("next_agent", "Styling")],
        },
        WorkflowNode {
            id: "style",
            role: AgentRole::Styling,
            label: "造型智能体",
            description: "SDXL 图像生成与风格迁移",
            view: Some(ViewMode::Styling),
            status: NodeStatus::Idle,
            position: (600.0, 20.0),
            inputs: vec![text("plan_id", "PLAN-A"), text("style_guide", "Cyberpunk")],
            params: vec![num("Batch Size", 4.0), num("Steps", 50.0), num("Guidance", 7.5)],
            outputs: vec![("image_uris".to_string(), ParamValue::List(Vec::new()))],
        },
        WorkflowNode {
            id: "cad",
            role: AgentRole::Cad,
            label: "建模智能体",
            description: "DeepSDF 3D 几何重构",
            view: Some(ViewMode::Geometry),
            status: NodeStatus::Idle,
            position: (600.0, 130.0),
            inputs: vec![text("image_id", "IMG-001")],
            params: vec![
                num("Resolution", 256.0),
                text("Format", "STL"),
                ("Smoothing".to_string(), ParamValue::Flag(true)),
            ],
            outputs: vec![text("geometry_id", "")],
        },
        WorkflowNode {
            id: "mesh",
            role: AgentRole::Meshing,
            label: "网格智能体",
            description: "OpenFOAM SnappyHexMesh",
            view: Some(ViewMode::Meshing),
            status: NodeStatus::Idle,
            position: (600.0, 240.0),
            inputs: vec![text("geometry_id", "GEO-001")],
            params: vec![num("Base Size", 0.5), num("Layers", 5.0), text("Quality", "High")],
            outputs: vec![text("mesh_id", "")],
        },
        WorkflowNode {
            id: "sim",
            role: AgentRole::Simulation,
            label: "仿真智能体",
            description: "TripNet 快速流场预测",
            view: Some(ViewMode::Simulation),
            status: NodeStatus::Idle,
            position: (600.0, 350.0),
            inputs: vec![text("mesh_id", "MESH-001")],
            params: vec![
                num("Velocity", 30.0),
                text("Turbulence", "k-Omega SST"),
                num("Iterations", 1000.0),
            ],
            outputs: vec![num("drag_coeff", 0.0), num("lift_coeff", 0.0)],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_nodes_follow_stage() {
        let board = WorkflowBoard::default();
        let active: Vec<_> = board
            .nodes()
            .iter()
            .filter(|n| n.is_active(PipelineStage::Meshing))
            .map(|n| n.id)
            .collect();
        assert_eq!(active, vec!["user", "orch", "mesh"]);
    }

    #[test]
    fn test_draft_lifecycle() {
        let mut board = WorkflowBoard::default();
        board.select(Some("mesh")).unwrap();
        assert!(!board.draft().unwrap().dirty);

        board.edit_param("Layers", "8").unwrap();
        let draft = board.draft().unwrap();
        assert!(draft.dirty);
        assert_eq!(draft.params[1].1, ParamValue::Number(8.0));
        // stored params untouched until save
        assert_eq!(board.node("mesh").unwrap().params[1].1, ParamValue::Number(5.0));

        board.save().unwrap();
        assert!(!board.draft().unwrap().dirty);
        assert_eq!(board.node("mesh").unwrap().params[1].1, ParamValue::Number(8.0));
    }

    #[test]
    fn test_reset_restores_stored_params() {
        let mut board = WorkflowBoard::default();
        board.select(Some("style")).unwrap();
        board.edit_param("Steps", "abc").unwrap();
        assert_eq!(
            board.draft().unwrap().params[1].1,
            ParamValue::Text("abc".into())
        );
        board.reset().unwrap();
        let draft = board.draft().unwrap();
        assert!(!draft.dirty);
        assert_eq!(draft.params[1].1, ParamValue::Number(50.0));
    }

    #[test]
    fn test_selecting_other_node_discards_draft() {
        let mut board = WorkflowBoard::default();
        board.select(Some("cad")).unwrap();
        board.edit_param("Format", "OBJ").unwrap();
        board.select(Some("sim")).unwrap();
        board.select(Some("cad")).unwrap();
        assert_eq!(board.draft().unwrap().params[1].1, ParamValue::Text("STL".into()));
        assert_eq!(board.selected().unwrap().id, "cad");

        board.select(None).unwrap();
        assert!(board.selected().is_none());
    }

    #[test]
    fn test_errors_leave_board_unchanged() {
        let mut board = WorkflowBoard::default();
        assert_eq!(board.save(), Err(WorkflowError::NoNodeSelected));
        assert_eq!(board.edit_param("Layers", "1"), Err(WorkflowError::NoNodeSelected));
        assert_eq!(
            board.select(Some("nope")),
            Err(WorkflowError::UnknownNode("nope".into()))
        );
        board.select(Some("user")).unwrap();
        assert!(matches!(
            board.edit_param("Missing", "x"),
            Err(WorkflowError::UnknownParam { .. })
        ));
        assert!(!board.draft().unwrap().dirty);
    }

    #[test]
    fn test_param_display() {
        assert_eq!(ParamValue::Number(7.5).to_string(), "7.5");
        assert_eq!(ParamValue::Number(256.0).to_string(), "256");
        assert_eq!(ParamValue::Flag(true).reparse("false"), ParamValue::Flag(false));
    }
}
