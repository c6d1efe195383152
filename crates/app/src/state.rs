//! Application state for the AeroGen workbench
//!
//! `AppState` owns the workspace reducer plus everything that only matters
//! to the UI (input box, viewer cameras, form fields). Orchestrator calls run
//! on a worker thread and come back over a channel polled every frame.

use crate::panels::{PanelState, UiIntent};
use pipeline::{Action, Effect, Orchestrator, OrchestratorReply, Workspace};
use shared::settings::AppSettings;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

/// Run one orchestrator request in a background thread (non-blocking)
pub fn run_orchestrator_request(
    orchestrator: Arc<Orchestrator>,
    message: String,
    tx: Sender<OrchestratorReply>,
) {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to start async runtime: {e}");
            let _ = tx.send(OrchestratorReply::failed());
            return;
        }
    };
    let reply = rt.block_on(orchestrator.send(&message));
    let _ = tx.send(reply);
}

pub struct AppState {
    pub workspace: Workspace,
    orchestrator: Arc<Orchestrator>,
    reply_rx: Option<Receiver<OrchestratorReply>>,
    pub input_text: String,
    pub settings: AppSettings,
    settings_path: Option<PathBuf>,
    settings_dirty: bool,
    pub panels: PanelState,
    /// Modal message (import results, simulated downloads)
    pub notice: Option<String>,
}

impl AppState {
    pub fn new(
        workspace: Workspace,
        orchestrator: Arc<Orchestrator>,
        settings: AppSettings,
        settings_path: Option<PathBuf>,
    ) -> Self {
        Self {
            workspace,
            orchestrator,
            reply_rx: None,
            input_text: String::new(),
            settings,
            settings_path,
            settings_dirty: false,
            panels: PanelState::default(),
            notice: None,
        }
    }

    pub fn is_thinking(&self) -> bool {
        self.workspace.is_pending()
    }

    /// Keep frames coming while mesh log lines are queued or a reply is due
    pub fn wants_repaint(&self) -> bool {
        self.workspace.has_scheduled_logs() || self.is_thinking()
    }

    /// Feed an action through the reducer and carry out its effects
    pub fn dispatch(&mut self, action: Action) {
        match self.workspace.dispatch(action) {
            Ok(effects) => self.run_effects(effects),
            Err(e) => tracing::warn!("action rejected: {e}"),
        }
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RequestReply { message } => {
                    let (tx, rx) = channel();
                    self.reply_rx = Some(rx);
                    let orchestrator = self.orchestrator.clone();
                    std::thread::spawn(move || {
                        run_orchestrator_request(orchestrator, message, tx);
                    });
                }
                // read back through wants_repaint()
                Effect::RequestRepaint => {}
            }
        }
    }

    /// Submit the chat input box
    pub fn send_message(&mut self) {
        let text = std::mem::take(&mut self.input_text);
        self.submit(text);
    }

    /// Send a message on the user's behalf (panel buttons)
    pub fn submit(&mut self, text: String) {
        match self.workspace.dispatch(Action::Submit(text.clone())) {
            Ok(effects) => self.run_effects(effects),
            Err(e) => {
                tracing::debug!("submit rejected: {e}");
                // keep what the user typed
                if self.input_text.is_empty() {
                    self.input_text = text;
                }
            }
        }
    }

    /// Check for a finished orchestrator call (called each frame)
    pub fn poll_ai_response(&mut self) {
        let Some(rx) = &self.reply_rx else {
            return;
        };
        let reply = match rx.try_recv() {
            Ok(reply) => reply,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                tracing::error!("orchestrator worker exited without a reply");
                OrchestratorReply::failed()
            }
        };
        self.reply_rx = None;
        self.dispatch(Action::ReplyReceived {
            reply,
            at: Instant::now(),
        });
    }

    /// Release timed log lines (called each frame)
    pub fn tick(&mut self, now: Instant) {
        self.dispatch(Action::Tick(now));
    }

    /// Carry out what a panel asked for during the frame
    pub fn apply(&mut self, intent: UiIntent) {
        match intent {
            UiIntent::Dispatch(action) => self.dispatch(action),
            UiIntent::SendInput => self.send_message(),
            UiIntent::Submit(text) => self.submit(text),
            UiIntent::Notice(text) => self.notice = Some(text),
            UiIntent::DisplayChanged => self.mark_settings_dirty(),
        }
    }

    pub fn mark_settings_dirty(&mut self) {
        self.settings_dirty = true;
    }

    /// Write settings back if the display knobs changed
    pub fn save_settings(&mut self) {
        if !self.settings_dirty {
            return;
        }
        let Some(path) = &self.settings_path else {
            return;
        };
        match self.settings.save_to(path) {
            Ok(()) => {
                self.settings_dirty = false;
                tracing::info!(path = %path.display(), "settings saved");
            }
            Err(e) => tracing::warn!("could not save settings: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use pipeline::DesignCatalog;
    use providers::{ChatSession, SessionConfig, SessionConnector};
    use shared::ViewMode;
    use std::time::Duration;

    struct Canned(&'static str);

    #[async_trait::async_trait]
    impl ChatSession for Canned {
        async fn send_message(&self, _message: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Connector(Option<&'static str>);

    impl SessionConnector for Connector {
        fn open(&self, _config: &SessionConfig) -> Result<Arc<dyn ChatSession>> {
            match self.0 {
                Some(reply) => Ok(Arc::new(Canned(reply))),
                None => Err(anyhow!("API key missing")),
            }
        }
    }

    fn state(reply: Option<&'static str>) -> AppState {
        let config = SessionConfig {
            model: "m".into(),
            system_instruction: "s".into(),
            temperature: 0.7,
        };
        let orchestrator = Arc::new(Orchestrator::new(Box::new(Connector(reply)), config));
        AppState::new(
            Workspace::new(DesignCatalog::builtin()),
            orchestrator,
            AppSettings::default(),
            None,
        )
    }

    fn wait_for_reply(s: &mut AppState) {
        for _ in 0..200 {
            s.poll_ai_response();
            if !s.is_thinking() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("no reply from worker");
    }

    #[test]
    fn test_round_trip_through_worker() {
        let mut s = state(Some("好的 [VIEW:STYLING] [ACTION:GENERATE_IMAGES]"));
        s.input_text = "design an estate".into();
        s.send_message();
        assert!(s.is_thinking());
        assert!(s.input_text.is_empty());

        wait_for_reply(&mut s);
        assert_eq!(s.workspace.view(), ViewMode::Styling);
        assert_eq!(s.workspace.conversation().last().unwrap().text, "好的");
    }

    #[test]
    fn test_offline_reply_navigates_by_keyword() {
        let mut s = state(None);
        s.submit("open the cad model".into());
        wait_for_reply(&mut s);
        assert_eq!(s.workspace.view(), ViewMode::Geometry);
    }

    #[test]
    fn test_blank_input_is_kept_out() {
        let mut s = state(Some("x"));
        s.input_text = "   ".into();
        s.send_message();
        assert!(!s.is_thinking());
        assert_eq!(s.workspace.conversation().len(), 1);
    }

    #[test]
    fn test_second_submit_while_pending_keeps_text() {
        let mut s = state(Some("ok"));
        s.submit("first".into());
        s.input_text = "second".into();
        s.send_message();
        assert_eq!(s.input_text, "second");
        wait_for_reply(&mut s);
    }

    #[test]
    fn test_apply_routes_panel_intents() {
        let mut s = state(Some("ok"));
        s.apply(UiIntent::Dispatch(pipeline::Action::Navigate(ViewMode::Meshing)));
        assert_eq!(s.workspace.view(), ViewMode::Meshing);

        s.apply(UiIntent::Notice("done".into()));
        assert_eq!(s.notice.as_deref(), Some("done"));

        s.apply(UiIntent::DisplayChanged);
        assert!(s.settings_dirty);

        s.apply(UiIntent::Submit("run the mesh".into()));
        assert!(s.is_thinking());
        wait_for_reply(&mut s);
    }

    #[test]
    fn test_queued_mesh_lines_keep_repainting_across_intents() {
        let mut s = state(Some("[ACTION:RETRIEVE_CAD] [ACTION:RUN_MESH]"));
        s.submit("mesh it".into());
        wait_for_reply(&mut s);
        assert_eq!(s.workspace.view(), ViewMode::Meshing);

        s.tick(Instant::now());
        assert!(s.wants_repaint());

        s.apply(UiIntent::Dispatch(pipeline::Action::Navigate(ViewMode::Meshing)));
        assert!(s.workspace.has_scheduled_logs());
        assert!(s.wants_repaint());

        s.tick(Instant::now() + Duration::from_secs(3));
        assert!(!s.workspace.has_scheduled_logs());
        assert!(!s.wants_repaint());
    }

    #[test]
    fn test_save_settings_only_when_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut s = state(Some("ok"));
        s.settings_path = Some(path.clone());

        s.save_settings();
        assert!(!path.exists());

        s.settings.display.streamline_density = 0.3;
        s.mark_settings_dirty();
        s.save_settings();
        let loaded = AppSettings::load_from(&path).unwrap();
        assert!((loaded.display.streamline_density - 0.3).abs() < f32::EPSILON);
    }
}
