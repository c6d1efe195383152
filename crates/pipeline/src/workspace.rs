//! Workspace state container.
//!
//! Every change to the conversation, the active view, the selected design,
//! the console log and the workflow board goes through [`Workspace::dispatch`].
//! The runtime carries out the returned [`Effect`]s (spawning the upstream
//! call, scheduling repaints); nothing here touches the UI or the network.

use crate::catalog::{initial_logs, DesignCatalog};
use crate::command::{CommandToken, Directive};
use crate::log_stream::LogStream;
use crate::prompts::GREETING;
use crate::session::OrchestratorReply;
use crate::workflow::{WorkflowBoard, WorkflowError};
use shared::design::{PipelineStage, Project};
use shared::{ChatTurn, DesignId, DesignRecord, LogEntry, ViewMode};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a request to the orchestrator is already pending")]
    RequestPending,
    #[error("no orchestrator request is pending")]
    NoPendingRequest,
    #[error("unknown design '{0}'")]
    UnknownDesign(DesignId),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Sidebar or dashboard navigation
    Navigate(ViewMode),
    /// Gallery click
    SelectDesign(DesignId),
    /// Chat input
    Submit(String),
    ReplyReceived {
        reply: OrchestratorReply,
        at: Instant,
    },
    /// Frame clock; releases scheduled log lines
    Tick(Instant),
    SelectNode(Option<String>),
    EditParam {
        key: String,
        value: String,
    },
    SaveNode,
    ResetNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send this message to the orchestrator and dispatch the reply back
    RequestReply { message: String },
    /// Something time-based is still in flight; keep frames coming
    RequestRepaint,
}

/// What the active panel needs, resolved once per frame
#[derive(Debug)]
pub enum PanelView<'a> {
    Overview {
        projects: &'a [Project],
        board: &'a WorkflowBoard,
        stage: PipelineStage,
    },
    Styling {
        designs: &'a [DesignRecord],
        selected: Option<&'a str>,
        generating: bool,
    },
    Geometry {
        design: Option<&'a DesignRecord>,
    },
    Meshing {
        design: Option<&'a DesignRecord>,
        logs: &'a [LogEntry],
    },
    Simulation {
        design: Option<&'a DesignRecord>,
    },
}

pub struct Workspace {
    catalog: DesignCatalog,
    conversation: Vec<ChatTurn>,
    view: ViewMode,
    selection: Option<DesignId>,
    logs: LogStream,
    board: WorkflowBoard,
    pending: bool,
}

impl Workspace {
    pub fn new(catalog: DesignCatalog) -> Self {
        Self {
            catalog,
            conversation: vec![ChatTurn::orchestrator(GREETING)],
            view: ViewMode::default(),
            selection: None,
            logs: LogStream::new(initial_logs()),
            board: WorkflowBoard::default(),
            pending: false,
        }
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn selected_design(&self) -> Option<&DesignRecord> {
        self.selection.as_deref().and_then(|id| self.catalog.get(id))
    }

    pub fn conversation(&self) -> &[ChatTurn] {
        &self.conversation
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Mesh log lines still waiting for their due time
    pub fn has_scheduled_logs(&self) -> bool {
        self.logs.has_scheduled()
    }

    pub fn logs(&self) -> &[LogEntry] {
        self.logs.entries()
    }

    pub fn board(&self) -> &WorkflowBoard {
        &self.board
    }

    pub fn catalog(&self) -> &DesignCatalog {
        &self.catalog
    }

    pub fn panel(&self) -> PanelView<'_> {
        match self.view {
            ViewMode::Overview => PanelView::Overview {
                projects: self.catalog.projects(),
                board: &self.board,
                stage: self
                    .catalog
                    .active_project()
                    .map(|p| p.stage)
                    .unwrap_or(PipelineStage::Concept),
            },
            ViewMode::Styling => PanelView::Styling {
                designs: self.catalog.designs(),
                selected: self.selection(),
                generating: self.pending,
            },
            ViewMode::Geometry => PanelView::Geometry {
                design: self.selected_design(),
            },
            ViewMode::Meshing => PanelView::Meshing {
                design: self.selected_design(),
                logs: self.logs.entries(),
            },
            ViewMode::Simulation => PanelView::Simulation {
                design: self.selected_design(),
            },
        }
    }

    /// Apply one action. On error nothing has changed.
    pub fn dispatch(&mut self, action: Action) -> Result<Vec<Effect>, WorkspaceError> {
        match action {
            Action::Navigate(view) => {
                self.view = view;
                Ok(Vec::new())
            }
            Action::SelectDesign(id) => {
                if !self.catalog.contains(&id) {
                    return Err(WorkspaceError::UnknownDesign(id));
                }
                self.selection = Some(id);
                Ok(Vec::new())
            }
            Action::Submit(text) => self.submit(&text),
            Action::ReplyReceived { reply, at } => {
                if !self.pending {
                    return Err(WorkspaceError::NoPendingRequest);
                }
                Ok(self.receive(reply, at))
            }
            Action::Tick(now) => {
                self.logs.drain_due(now);
                Ok(self.repaint_if_scheduled())
            }
            Action::SelectNode(id) => {
                self.board.select(id.as_deref())?;
                Ok(Vec::new())
            }
            Action::EditParam { key, value } => {
                self.board.edit_param(&key, &value)?;
                Ok(Vec::new())
            }
            Action::SaveNode => {
                self.board.save()?;
                Ok(Vec::new())
            }
            Action::ResetNode => {
                self.board.reset()?;
                Ok(Vec::new())
            }
        }
    }

    fn submit(&mut self, text: &str) -> Result<Vec<Effect>, WorkspaceError> {
        if self.pending {
            return Err(WorkspaceError::RequestPending);
        }
        let message = text.trim();
        if message.is_empty() {
            return Err(WorkspaceError::EmptyMessage);
        }
        self.conversation.push(ChatTurn::user(message));
        self.pending = true;
        Ok(vec![Effect::RequestReply {
            message: message.to_string(),
        }])
    }

    fn receive(&mut self, reply: OrchestratorReply, at: Instant) -> Vec<Effect> {
        self.pending = false;
        self.conversation.push(ChatTurn::orchestrator(reply.text));
        for token in &reply.commands {
            self.apply(token, at);
        }
        self.repaint_if_scheduled()
    }

    /// Apply a single command tag. Later tags see the effects of earlier ones.
    fn apply(&mut self, token: &CommandToken, at: Instant) {
        tracing::info!(command = %token, "applying orchestrator command");
        match token.directive() {
            Directive::ShowStyling => self.view = ViewMode::Styling,
            Directive::ShowGeometry => self.view = ViewMode::Geometry,
            Directive::ShowMeshing => self.view = ViewMode::Meshing,
            Directive::ShowSimulation | Directive::RunCfd => self.view = ViewMode::Simulation,
            Directive::GenerateImages => {
                self.view = ViewMode::Styling;
                self.selection = None;
            }
            Directive::RetrieveCad => {
                self.view = ViewMode::Geometry;
                if self.selection.is_none() {
                    self.selection = Some(self.catalog.first().id.clone());
                }
            }
            Directive::RunMesh => {
                self.view = ViewMode::Meshing;
                if let Some(name) = self.selected_design().map(|d| d.name.clone()) {
                    self.logs.start_mesh_run(&name, at);
                }
            }
            Directive::Unknown => tracing::debug!(command = %token, "ignoring unknown command"),
        }
    }

    fn repaint_if_scheduled(&self) -> Vec<Effect> {
        if self.logs.has_scheduled() {
            vec![Effect::RequestRepaint]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse_reply;
    use crate::prompts::APOLOGY_REPLY;
    use crate::session::testing::orchestrator;
    use crate::session::ReplyOutcome;
    use std::time::Duration;

    fn workspace() -> Workspace {
        Workspace::new(DesignCatalog::builtin())
    }

    fn online(raw: &str) -> OrchestratorReply {
        let parsed = parse_reply(raw);
        OrchestratorReply {
            text: parsed.text,
            commands: parsed.commands,
            outcome: ReplyOutcome::Online,
        }
    }

    fn converse(ws: &mut Workspace, user: &str, raw: &str) -> Vec<Effect> {
        ws.dispatch(Action::Submit(user.into())).unwrap();
        ws.dispatch(Action::ReplyReceived {
            reply: online(raw),
            at: Instant::now(),
        })
        .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let ws = workspace();
        assert_eq!(ws.view(), ViewMode::Overview);
        assert!(ws.selection().is_none());
        assert_eq!(ws.conversation().len(), 1);
        assert_eq!(ws.conversation()[0].text, GREETING);
        assert_eq!(ws.logs().len(), 4);
        assert!(matches!(ws.panel(), PanelView::Overview { stage: PipelineStage::Simulation, .. }));
    }

    #[test]
    fn test_submit_then_reply() {
        let mut ws = workspace();
        let effects = ws.dispatch(Action::Submit("  hello  ".into())).unwrap();
        assert_eq!(
            effects,
            vec![Effect::RequestReply {
                message: "hello".into()
            }]
        );
        assert!(ws.is_pending());
        assert_eq!(ws.conversation().last().unwrap().text, "hello");

        ws.dispatch(Action::ReplyReceived {
            reply: online("你好"),
            at: Instant::now(),
        })
        .unwrap();
        assert!(!ws.is_pending());
        assert_eq!(ws.conversation().len(), 3);
        assert!(!ws.conversation()[2].is_user());
    }

    #[test]
    fn test_unsolicited_reply_is_rejected() {
        let mut ws = workspace();
        ws.dispatch(Action::Navigate(ViewMode::Styling)).unwrap();
        assert_eq!(
            ws.dispatch(Action::ReplyReceived {
                reply: online("[VIEW:CAD] [ACTION:RUN_MESH]"),
                at: Instant::now(),
            }),
            Err(WorkspaceError::NoPendingRequest)
        );
        assert_eq!(ws.conversation().len(), 1);
        assert_eq!(ws.view(), ViewMode::Styling);
        assert_eq!(ws.logs().len(), 4);

        converse(&mut ws, "cad", "[VIEW:CAD]");
        assert_eq!(
            ws.dispatch(Action::ReplyReceived {
                reply: online("again"),
                at: Instant::now(),
            }),
            Err(WorkspaceError::NoPendingRequest)
        );
        assert_eq!(ws.conversation().len(), 3);
    }

    #[test]
    fn test_submit_rejected_while_pending() {
        let mut ws = workspace();
        ws.dispatch(Action::Submit("first".into())).unwrap();
        assert_eq!(
            ws.dispatch(Action::Submit("second".into())),
            Err(WorkspaceError::RequestPending)
        );
        assert_eq!(ws.conversation().len(), 2);
    }

    #[test]
    fn test_blank_submit_rejected() {
        let mut ws = workspace();
        assert_eq!(
            ws.dispatch(Action::Submit(" \t ".into())),
            Err(WorkspaceError::EmptyMessage)
        );
        assert!(!ws.is_pending());
        assert_eq!(ws.conversation().len(), 1);
    }

    #[test]
    fn test_styling_scenario() {
        let mut ws = workspace();
        ws.dispatch(Action::SelectDesign("design-003".into())).unwrap();
        converse(&mut ws, "make some concepts", "好的 [VIEW:STYLING] [ACTION:GENERATE_IMAGES]");
        assert_eq!(ws.conversation().last().unwrap().text, "好的");
        assert_eq!(ws.view(), ViewMode::Styling);
        assert!(ws.selection().is_none());
    }

    #[test]
    fn test_generate_images_always_clears_selection() {
        for start in ViewMode::ALL {
            let mut ws = workspace();
            ws.dispatch(Action::Navigate(start)).unwrap();
            ws.dispatch(Action::SelectDesign("design-002".into())).unwrap();
            converse(&mut ws, "x", "[ACTION:GENERATE_IMAGES]");
            assert_eq!(ws.view(), ViewMode::Styling);
            assert!(ws.selection().is_none());
        }
    }

    #[test]
    fn test_retrieve_cad_selects_first_only_when_empty() {
        let mut ws = workspace();
        converse(&mut ws, "cad", "[ACTION:RETRIEVE_CAD]");
        assert_eq!(ws.view(), ViewMode::Geometry);
        assert_eq!(ws.selection(), Some("design-001"));

        let mut ws = workspace();
        ws.dispatch(Action::SelectDesign("design-004".into())).unwrap();
        converse(&mut ws, "cad", "[ACTION:RETRIEVE_CAD]");
        assert_eq!(ws.selection(), Some("design-004"));
    }

    #[test]
    fn test_view_tokens() {
        let mut ws = workspace();
        for (raw, view) in [
            ("[VIEW:CAD]", ViewMode::Geometry),
            ("[VIEW:MESHING]", ViewMode::Meshing),
            ("[VIEW:CFD]", ViewMode::Simulation),
            ("[VIEW:STYLING]", ViewMode::Styling),
            ("[ACTION:RUN_CFD]", ViewMode::Simulation),
        ] {
            converse(&mut ws, "go", raw);
            assert_eq!(ws.view(), view, "{raw}");
        }
    }

    #[test]
    fn test_tokens_apply_in_order() {
        let mut ws = workspace();
        converse(&mut ws, "go", "[VIEW:CFD] [VIEW:CAD] [ACTION:SELF_DESTRUCT]");
        assert_eq!(ws.view(), ViewMode::Geometry);
    }

    #[test]
    fn test_run_mesh_sees_selection_from_earlier_token() {
        let mut ws = workspace();
        let effects = converse(&mut ws, "mesh it", "[ACTION:RETRIEVE_CAD] [ACTION:RUN_MESH]");
        assert_eq!(ws.view(), ViewMode::Meshing);
        assert_eq!(ws.logs().len(), 7);
        assert_eq!(ws.logs()[4].message, "任务 [MESH-884] 已提交: Aero-Estate 概念 A");
        assert_eq!(effects, vec![Effect::RequestRepaint]);
    }

    #[test]
    fn test_run_mesh_without_selection_only_switches_view() {
        let mut ws = workspace();
        let effects = converse(&mut ws, "mesh", "[ACTION:RUN_MESH]");
        assert_eq!(ws.view(), ViewMode::Meshing);
        assert_eq!(ws.logs().len(), 4);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_tick_releases_mesh_log() {
        let mut ws = workspace();
        ws.dispatch(Action::SelectDesign("design-002".into())).unwrap();
        ws.dispatch(Action::Submit("mesh".into())).unwrap();
        let start = Instant::now();
        ws.dispatch(Action::ReplyReceived {
            reply: online("[ACTION:RUN_MESH]"),
            at: start,
        })
        .unwrap();

        assert!(ws.has_scheduled_logs());
        let effects = ws.dispatch(Action::Tick(start + Duration::from_millis(900))).unwrap();
        assert_eq!(ws.logs().len(), 8);
        assert_eq!(effects, vec![Effect::RequestRepaint]);

        let effects = ws.dispatch(Action::Tick(start + Duration::from_secs(2))).unwrap();
        assert_eq!(ws.logs().len(), 9);
        assert!(effects.is_empty());
        assert!(!ws.has_scheduled_logs());
    }

    #[test]
    fn test_unknown_design_leaves_state() {
        let mut ws = workspace();
        ws.dispatch(Action::SelectDesign("design-001".into())).unwrap();
        assert_eq!(
            ws.dispatch(Action::SelectDesign("design-404".into())),
            Err(WorkspaceError::UnknownDesign("design-404".into()))
        );
        assert_eq!(ws.selection(), Some("design-001"));
    }

    #[test]
    fn test_panel_carries_selection() {
        let mut ws = workspace();
        ws.dispatch(Action::Navigate(ViewMode::Simulation)).unwrap();
        assert!(matches!(ws.panel(), PanelView::Simulation { design: None }));
        ws.dispatch(Action::SelectDesign("design-003".into())).unwrap();
        match ws.panel() {
            PanelView::Simulation { design: Some(d) } => assert_eq!(d.id, "design-003"),
            other => panic!("unexpected panel {other:?}"),
        }
    }

    #[test]
    fn test_workflow_actions_route_to_board() {
        let mut ws = workspace();
        assert_eq!(
            ws.dispatch(Action::SaveNode),
            Err(WorkspaceError::Workflow(WorkflowError::NoNodeSelected))
        );
        ws.dispatch(Action::SelectNode(Some("sim".into()))).unwrap();
        ws.dispatch(Action::EditParam {
            key: "Velocity".into(),
            value: "40".into(),
        })
        .unwrap();
        ws.dispatch(Action::SaveNode).unwrap();
        assert_eq!(
            ws.board().node("sim").unwrap().params[0].1.to_string(),
            "40"
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_scenario() {
        let (orch, _) = orchestrator(vec![None], 0);
        let mut ws = workspace();
        ws.dispatch(Action::Navigate(ViewMode::Meshing)).unwrap();
        ws.dispatch(Action::SelectDesign("design-002".into())).unwrap();

        let effects = ws.dispatch(Action::Submit("run the mesh".into())).unwrap();
        let Effect::RequestReply { message } = &effects[0] else {
            panic!("expected a reply request");
        };
        let reply = orch.send(message).await;
        ws.dispatch(Action::ReplyReceived {
            reply,
            at: Instant::now(),
        })
        .unwrap();

        assert_eq!(ws.conversation().last().unwrap().text, APOLOGY_REPLY);
        assert_eq!(ws.view(), ViewMode::Meshing);
        assert_eq!(ws.selection(), Some("design-002"));
        assert!(!ws.is_pending());
    }

    #[tokio::test]
    async fn test_offline_round_trip_switches_view() {
        let (orch, _) = orchestrator(vec![], usize::MAX);
        let mut ws = workspace();
        ws.dispatch(Action::Submit("show me the CAD".into())).unwrap();
        let reply = orch.send("show me the CAD").await;
        ws.dispatch(Action::ReplyReceived {
            reply,
            at: Instant::now(),
        })
        .unwrap();
        assert_eq!(ws.view(), ViewMode::Geometry);
        assert!(ws.selection().is_none());
    }
}
