//! Orchestrator agent: one chat session, replies turned into commands.

use crate::command::{fallback_commands, parse_reply, CommandToken};
use crate::prompts::{APOLOGY_REPLY, OFFLINE_REPLY};
use parking_lot::Mutex;
use providers::{ChatSession, SessionConfig, SessionConnector};
use std::sync::Arc;

/// How a reply was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Model answered
    Online,
    /// No session could be opened; canned reply plus keyword guess
    Offline,
    /// Session open but the call failed or came back empty
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorReply {
    pub text: String,
    pub commands: Vec<CommandToken>,
    pub outcome: ReplyOutcome,
}

impl OrchestratorReply {
    pub fn offline(user_message: &str) -> Self {
        Self {
            text: OFFLINE_REPLY.to_string(),
            commands: fallback_commands(user_message),
            outcome: ReplyOutcome::Offline,
        }
    }

    pub fn failed() -> Self {
        Self {
            text: APOLOGY_REPLY.to_string(),
            commands: Vec::new(),
            outcome: ReplyOutcome::Failed,
        }
    }
}

/// Owns the lazily opened chat session. Never returns an error to the caller.
pub struct Orchestrator {
    connector: Box<dyn SessionConnector>,
    config: SessionConfig,
    session: Mutex<Option<Arc<dyn ChatSession>>>,
}

impl Orchestrator {
    pub fn new(connector: Box<dyn SessionConnector>, config: SessionConfig) -> Self {
        Self {
            connector,
            config,
            session: Mutex::new(None),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Current session, opening one if needed
    fn session(&self) -> Option<Arc<dyn ChatSession>> {
        let mut slot = self.session.lock();
        if slot.is_none() {
            match self.connector.open(&self.config) {
                Ok(session) => {
                    tracing::info!(model = %self.config.model, "orchestrator session opened");
                    *slot = Some(session);
                }
                Err(e) => {
                    tracing::warn!("orchestrator offline: {e:#}");
                    return None;
                }
            }
        }
        slot.clone()
    }

    pub async fn send(&self, message: &str) -> OrchestratorReply {
        let Some(session) = self.session() else {
            return OrchestratorReply::offline(message);
        };

        match session.send_message(message).await {
            Ok(raw) if !raw.trim().is_empty() => {
                let parsed = parse_reply(&raw);
                OrchestratorReply {
                    text: parsed.text,
                    commands: parsed.commands,
                    outcome: ReplyOutcome::Online,
                }
            }
            Ok(_) => {
                tracing::warn!("orchestrator returned an empty reply");
                OrchestratorReply::failed()
            }
            Err(e) => {
                tracing::warn!("orchestrator call failed: {e:#}");
                OrchestratorReply::failed()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays canned results in order; `None` means the call fails
    pub struct ScriptedSession {
        replies: Mutex<VecDeque<Option<String>>>,
        pub received: Mutex<Vec<String>>,
    }

    impl ScriptedSession {
        pub fn new(replies: Vec<Option<&str>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
                received: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatSession for ScriptedSession {
        async fn send_message(&self, message: &str) -> Result<String> {
            self.received.lock().push(message.to_string());
            match self.replies.lock().pop_front() {
                Some(Some(text)) => Ok(text),
                Some(None) => Err(anyhow!("503 service unavailable")),
                None => Err(anyhow!("script exhausted")),
            }
        }
    }

    /// Fails the first `failures` opens, then hands out the shared session
    #[derive(Clone)]
    pub struct ScriptedConnector {
        pub session: Arc<ScriptedSession>,
        failures: Arc<AtomicUsize>,
        pub opens: Arc<AtomicUsize>,
    }

    impl ScriptedConnector {
        pub fn new(session: Arc<ScriptedSession>, failures: usize) -> Self {
            Self {
                session,
                failures: Arc::new(AtomicUsize::new(failures)),
                opens: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl SessionConnector for ScriptedConnector {
        fn open(&self, _config: &SessionConfig) -> Result<Arc<dyn ChatSession>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(anyhow!("API key missing"));
            }
            Ok(self.session.clone())
        }
    }

    pub fn config() -> SessionConfig {
        SessionConfig {
            model: "test-model".into(),
            system_instruction: "sys".into(),
            temperature: 0.7,
        }
    }

    pub fn orchestrator(
        replies: Vec<Option<&str>>,
        failures: usize,
    ) -> (Orchestrator, ScriptedConnector) {
        let session = Arc::new(ScriptedSession::new(replies));
        let connector = ScriptedConnector::new(session, failures);
        (Orchestrator::new(Box::new(connector.clone()), config()), connector)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::orchestrator;
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_online_reply_is_parsed() {
        let (orch, _) = orchestrator(vec![Some("好的 [VIEW:STYLING] [ACTION:GENERATE_IMAGES]")], 0);
        let reply = orch.send("design an estate car").await;
        assert_eq!(reply.outcome, ReplyOutcome::Online);
        assert_eq!(reply.text, "好的");
        assert_eq!(reply.commands.len(), 2);
        assert!(orch.is_connected());
    }

    #[tokio::test]
    async fn test_offline_uses_user_message_keywords() {
        let (orch, _) = orchestrator(vec![], usize::MAX);
        let reply = orch.send("please run the mesh").await;
        assert_eq!(reply.outcome, ReplyOutcome::Offline);
        assert_eq!(reply.text, OFFLINE_REPLY);
        assert_eq!(reply.commands, vec![CommandToken::view("MESHING")]);
        assert!(!orch.is_connected());
    }

    #[tokio::test]
    async fn test_session_opened_lazily_and_retried() {
        let (orch, connector) = orchestrator(vec![Some("ok")], 1);
        assert_eq!(orch.send("hi").await.outcome, ReplyOutcome::Offline);
        assert_eq!(orch.send("hi").await.outcome, ReplyOutcome::Online);
        assert_eq!(connector.opens.load(Ordering::SeqCst), 2);
        // already open, no further connects
        orch.send("again").await;
        assert_eq!(connector.opens.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_call_failure_gives_apology_without_commands() {
        let (orch, connector) = orchestrator(vec![None], 0);
        let reply = orch.send("open the cad view").await;
        assert_eq!(reply, OrchestratorReply::failed());
        assert_eq!(reply.text, APOLOGY_REPLY);
        assert_eq!(
            *connector.session.received.lock(),
            vec!["open the cad view".to_string()]
        );
    }

    #[tokio::test]
    async fn test_blank_reply_counts_as_failure() {
        let (orch, _) = orchestrator(vec![Some("   ")], 0);
        assert_eq!(orch.send("x").await.outcome, ReplyOutcome::Failed);
    }
}
