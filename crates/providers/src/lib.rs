//! Chat session plumbing for the orchestrator agent.
//!
//! A session is opened once with a fixed system instruction and temperature
//! and keeps its own conversation history; callers only send the next user
//! message and get the reply text back.

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub use gemini::{GeminiConnector, GeminiSession};

/// Parameters fixed for the lifetime of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub model: String,
    pub system_instruction: String,
    pub temperature: f32,
}

/// A stateful conversation with a hosted text-generation model
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Send one user message, returning the model's reply text
    async fn send_message(&self, message: &str) -> Result<String>;
}

/// Opens sessions. Fails when the service is unavailable (e.g. no credential).
pub trait SessionConnector: Send + Sync {
    fn open(&self, config: &SessionConfig) -> Result<Arc<dyn ChatSession>>;
}
