//! Chat transcript turns and console log entries.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a turn or emitted a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    User,
    /// Manager agent that talks to the user and drives the views
    Orchestrator,
    Styling,
    Cad,
    Meshing,
    Simulation,
}

impl AgentRole {
    /// Short tag shown above a chat bubble
    pub fn badge(&self) -> &'static str {
        match self {
            AgentRole::User => "用户",
            AgentRole::Orchestrator => "AUTO-GEN",
            AgentRole::Styling => "STYLING",
            AgentRole::Cad => "CAD",
            AgentRole::Meshing => "MESHING",
            AgentRole::Simulation => "SIMULATION",
        }
    }
}

/// One entry of the conversation. Never mutated after it is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub author: AgentRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(author: AgentRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(AgentRole::User, text)
    }

    pub fn orchestrator(text: impl Into<String>) -> Self {
        Self::new(AgentRole::Orchestrator, text)
    }

    pub fn is_user(&self) -> bool {
        self.author == AgentRole::User
    }

    /// Format timestamp for display
    pub fn formatted_time(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Success,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Success => "SUCCESS",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// A line in the meshing console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Wall-clock time as `HH:MM:SS`
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    pub source: String,
}

impl LogEntry {
    pub fn new(
        timestamp: impl Into<String>,
        level: LogLevel,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            level,
            message: message.into(),
            source: source.into(),
        }
    }

    /// Entry stamped with the current local time
    pub fn now(level: LogLevel, message: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(Local::now().format("%H:%M:%S").to_string(), level, message, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_turn_ids_are_unique() {
        let a = ChatTurn::user("hello");
        let b = ChatTurn::user("hello");
        assert_ne!(a.id, b.id);
        assert!(a.is_user());
        assert!(!ChatTurn::orchestrator("hi").is_user());
    }

    #[test]
    fn test_log_entry_now_uses_clock_format() {
        let entry = LogEntry::now(LogLevel::Info, "读取 STL 几何数据...", "MESHING");
        assert_eq!(entry.timestamp.len(), 8);
        assert_eq!(entry.timestamp.matches(':').count(), 2);
        assert_eq!(entry.source, "MESHING");
    }

    #[test]
    fn test_log_level_serializes_uppercase() {
        let json = serde_json::to_string(&LogLevel::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
    }
}
