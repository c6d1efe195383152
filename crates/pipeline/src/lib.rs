//! Pipeline core - orchestrator commands and workspace state
//!
//! This crate provides:
//! - Parsing of `[VIEW:…]` / `[ACTION:…]` tags out of orchestrator replies
//! - The workspace reducer that owns view, selection, chat and console state
//! - The orchestrator session wrapper with offline and failure fallbacks
//! - Catalog data, the dashboard workflow board and STL import

pub mod catalog;
pub mod command;
pub mod log_stream;
pub mod prompts;
pub mod session;
pub mod stl;
pub mod workflow;
pub mod workspace;

pub use catalog::{CatalogError, DesignCatalog};
pub use command::{parse_reply, CommandKind, CommandToken, Directive, ParsedReply};
pub use session::{Orchestrator, OrchestratorReply, ReplyOutcome};
pub use stl::{edge_report, EdgeReport, StlError, StlMesh};
pub use workflow::{WorkflowBoard, WorkflowError};
pub use workspace::{Action, Effect, PanelView, Workspace, WorkspaceError};

use providers::SessionConfig;
use shared::settings::ModelProvider;

/// Session parameters for the orchestrator from user settings
pub fn orchestrator_config(model: &ModelProvider) -> SessionConfig {
    SessionConfig {
        model: model.gemini_model.clone(),
        system_instruction: prompts::SYSTEM_INSTRUCTION.trim().to_string(),
        temperature: model.temperature,
    }
}
