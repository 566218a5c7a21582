//! JSONL audit logging for safety-gate
//!
//! Every evaluated request produces one record. Writing is best effort: a
//! failed append never changes a verdict.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::input::Request;
use crate::output::{RuleId, Verdict};

/// Event type recorded in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Allowed,
    Create,
    Overwrite,
    BlockedPath,
    BlockedPattern,
    BlockedContent,
    BlockedSize,
    AskUser,
    BackupCreated,
    BackupFailed,
}

impl EventType {
    /// Routine events are dropped when `enableLogging` is off
    pub fn is_routine(&self) -> bool {
        matches!(
            self,
            EventType::Allowed | EventType::Create | EventType::Overwrite | EventType::BackupCreated
        )
    }

    /// Event type for a block verdict produced by `rule_id`
    pub fn for_block(rule_id: RuleId) -> Self {
        match rule_id {
            RuleId::ZeroAccess | RuleId::ReadOnly | RuleId::NoDelete => EventType::BlockedPath,
            RuleId::DangerousCommand => EventType::BlockedPattern,
            RuleId::DangerousContent => EventType::BlockedContent,
            RuleId::MaxWriteSize => EventType::BlockedSize,
            // Ask-only rules; no block verdict ever carries them.
            RuleId::LargeWrite | RuleId::ImportantFile => EventType::BlockedPath,
        }
    }
}

/// The `action` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Allow,
    Block,
    Ask,
    Backup,
    Error,
}

/// An audit log entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "type")]
    pub event: EventType,

    /// Host tool name
    pub tool: &'static str,

    /// Shell command (Bash only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Target file (file tools only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    pub action: AuditAction,

    pub message: String,
}

impl AuditRecord {
    /// Create a record about `request`
    pub fn new(
        request: &Request,
        event: EventType,
        action: AuditAction,
        message: impl Into<String>,
    ) -> Self {
        let (command, file) = match request {
            Request::Shell { command } => (Some(command.clone()), None),
            other => (None, other.file_path().map(str::to_string)),
        };

        Self {
            timestamp: Utc::now(),
            event,
            tool: request.kind().tool_name(),
            command,
            file,
            action,
            message: message.into(),
        }
    }

    /// Record for a block or ask verdict; `None` for allow
    pub fn for_verdict(request: &Request, verdict: &Verdict) -> Option<Self> {
        match verdict {
            Verdict::Allow { .. } => None,
            Verdict::Block { rule_id, message } => Some(Self::new(
                request,
                EventType::for_block(*rule_id),
                AuditAction::Block,
                message.clone(),
            )),
            Verdict::Ask { message, .. } => Some(Self::new(
                request,
                EventType::AskUser,
                AuditAction::Ask,
                message.clone(),
            )),
        }
    }

    /// Serialize as one JSON line (no trailing newline)
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Destination for audit records
pub trait AuditSink: Send + Sync {
    /// Append a record. Must not fail or panic.
    fn record(&self, record: &AuditRecord);
}

/// Appends records to a JSON Lines file
#[derive(Debug, Clone)]
pub struct JsonlAuditLog {
    path: PathBuf,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one record as a single write so lines never interleave
    pub fn append(&self, record: &AuditRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut line = record.to_json_line()?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl AuditSink for JsonlAuditLog {
    fn record(&self, record: &AuditRecord) {
        if let Err(e) = self.append(record) {
            debug!(path = %self.path.display(), error = %e, "failed to write audit record");
        }
    }
}

/// Drops every record
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAudit;

impl AuditSink for NoopAudit {
    fn record(&self, _record: &AuditRecord) {}
}

/// Keeps records in memory, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryAudit {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, record: &AuditRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
    }
}

impl<T: AuditSink + ?Sized> AuditSink for std::sync::Arc<T> {
    fn record(&self, record: &AuditRecord) {
        (**self).record(record)
    }
}
