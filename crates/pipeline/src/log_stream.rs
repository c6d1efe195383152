//! Meshing console feed.
//!
//! Entries are append-only. A mesh run writes a few lines right away and
//! schedules the rest; scheduled lines are stamped when they are drained so
//! the visible clock never goes backwards.

use shared::{LogEntry, LogLevel};
use std::time::{Duration, Instant};

/// Job id shown in the submit line
const MESH_JOB: &str = "MESH-884";

#[derive(Debug, Clone)]
struct ScheduledEntry {
    due: Instant,
    level: LogLevel,
    message: String,
    source: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct LogStream {
    entries: Vec<LogEntry>,
    scheduled: Vec<ScheduledEntry>,
}

impl LogStream {
    pub fn new(initial: Vec<LogEntry>) -> Self {
        Self {
            entries: initial,
            scheduled: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn has_scheduled(&self) -> bool {
        !self.scheduled.is_empty()
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>, source: &str) {
        self.entries.push(LogEntry::now(level, message, source));
    }

    fn schedule(&mut self, due: Instant, level: LogLevel, message: &str, source: &'static str) {
        self.scheduled.push(ScheduledEntry {
            due,
            level,
            message: message.to_string(),
            source,
        });
    }

    /// Three lines now, one at 800 ms, one at 2 s
    pub fn start_mesh_run(&mut self, design_name: &str, now: Instant) {
        tracing::info!(design = design_name, "mesh run started");
        self.push(
            LogLevel::Info,
            format!("任务 [{MESH_JOB}] 已提交: {design_name}"),
            "ORCHESTRATOR",
        );
        self.push(LogLevel::Debug, "正在分配计算节点 [N1-N4]...", "SCHEDULER");
        self.push(LogLevel::Info, "读取 STL 几何数据...", "MESHING");
        self.schedule(
            now + Duration::from_millis(800),
            LogLevel::Info,
            "执行 snappyHexMesh (castellatedMesh)...",
            "MESHING",
        );
        self.schedule(
            now + Duration::from_millis(2000),
            LogLevel::Success,
            "网格生成完成。质量检查通过。",
            "MESHING",
        );
    }

    /// Append every scheduled entry whose time has come, earliest first.
    /// Returns how many were appended.
    pub fn drain_due(&mut self, now: Instant) -> usize {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.scheduled.drain(..).partition(|s| s.due <= now);
        self.scheduled = rest;
        due.sort_by_key(|s| s.due);
        let count = due.len();
        for entry in due {
            self.push(entry.level, entry.message, entry.source);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::initial_logs;

    #[test]
    fn test_mesh_run_immediate_entries() {
        let mut stream = LogStream::new(initial_logs());
        stream.start_mesh_run("Aero-Estate 概念 A", Instant::now());

        let entries = stream.entries();
        assert_eq!(entries.len(), 7);
        assert_eq!(entries[4].message, "任务 [MESH-884] 已提交: Aero-Estate 概念 A");
        assert_eq!(entries[4].source, "ORCHESTRATOR");
        assert_eq!(entries[5].level, LogLevel::Debug);
        assert_eq!(entries[6].source, "MESHING");
        assert!(stream.has_scheduled());
    }

    #[test]
    fn test_schedule_releases_on_time() {
        let start = Instant::now();
        let mut stream = LogStream::default();
        stream.start_mesh_run("X", start);

        assert_eq!(stream.drain_due(start + Duration::from_millis(799)), 0);
        assert_eq!(stream.drain_due(start + Duration::from_millis(800)), 1);
        assert_eq!(
            stream.entries().last().unwrap().message,
            "执行 snappyHexMesh (castellatedMesh)..."
        );
        assert_eq!(stream.drain_due(start + Duration::from_millis(1999)), 0);
        assert_eq!(stream.drain_due(start + Duration::from_millis(2000)), 1);
        assert_eq!(stream.entries().last().unwrap().level, LogLevel::Success);
        assert!(!stream.has_scheduled());
    }

    #[test]
    fn test_late_drain_keeps_schedule_order() {
        let start = Instant::now();
        let mut stream = LogStream::default();
        stream.start_mesh_run("A", start);
        stream.start_mesh_run("B", start + Duration::from_millis(100));

        assert_eq!(stream.drain_due(start + Duration::from_secs(5)), 4);
        let tail: Vec<_> = stream.entries()[6..].iter().map(|e| e.level).collect();
        assert_eq!(
            tail,
            vec![LogLevel::Info, LogLevel::Info, LogLevel::Success, LogLevel::Success]
        );
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let start = Instant::now();
        let mut stream = LogStream::default();
        stream.start_mesh_run("A", start);
        stream.drain_due(start + Duration::from_secs(3));
        let stamps: Vec<_> = stream.entries().iter().map(|e| e.timestamp.clone()).collect();
        assert_eq!(stamps.len(), 5);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }
}
