//! Verdicts and the hook exit contract
//!
//! Allow is silent with exit 0, ask prints a JSON payload on stdout with
//! exit 0, block prints a message on stderr with exit 2, and malformed
//! input exits 1.

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

use crate::input::Request;

/// Exit code for allow and ask
pub const EXIT_OK: i32 = 0;

/// Exit code when the gate could not evaluate the request
pub const EXIT_ERROR: i32 = 1;

/// Exit code for a hard block
pub const EXIT_BLOCK: i32 = 2;

/// The rule category that produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    ZeroAccess,
    ReadOnly,
    NoDelete,
    DangerousCommand,
    DangerousContent,
    MaxWriteSize,
    LargeWrite,
    ImportantFile,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::ZeroAccess => "zero-access",
            RuleId::ReadOnly => "read-only",
            RuleId::NoDelete => "no-delete",
            RuleId::DangerousCommand => "dangerous-command",
            RuleId::DangerousContent => "dangerous-content",
            RuleId::MaxWriteSize => "max-write-size",
            RuleId::LargeWrite => "large-write",
            RuleId::ImportantFile => "important-file",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Let the operation proceed
    Allow { reason: String },

    /// Refuse the operation
    Block { rule_id: RuleId, message: String },

    /// Require human confirmation
    Ask {
        rule_id: RuleId,
        message: String,
        /// Description of the dangerous pattern that matched, if any
        pattern: Option<String>,
    },
}

impl Verdict {
    /// Create an allow verdict
    pub fn allow(reason: impl Into<String>) -> Self {
        Verdict::Allow {
            reason: reason.into(),
        }
    }

    /// Create a block verdict
    pub fn block(rule_id: RuleId, message: impl Into<String>) -> Self {
        Verdict::Block {
            rule_id,
            message: message.into(),
        }
    }

    /// Create an ask verdict
    pub fn ask(rule_id: RuleId, message: impl Into<String>) -> Self {
        Verdict::Ask {
            rule_id,
            message: message.into(),
            pattern: None,
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow { .. })
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Verdict::Block { .. })
    }

    pub fn is_ask(&self) -> bool {
        matches!(self, Verdict::Ask { .. })
    }

    /// Get the rule ID if applicable
    pub fn rule_id(&self) -> Option<RuleId> {
        match self {
            Verdict::Allow { .. } => None,
            Verdict::Block { rule_id, .. } | Verdict::Ask { rule_id, .. } => Some(*rule_id),
        }
    }

    /// Reason or message text
    pub fn message(&self) -> &str {
        match self {
            Verdict::Allow { reason } => reason,
            Verdict::Block { message, .. } | Verdict::Ask { message, .. } => message,
        }
    }
}

/// Confirmation payload printed for an ask verdict
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub action: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub rule: RuleId,
}

/// What the process prints and how it exits
#[derive(Debug)]
pub enum HookOutput {
    /// Allow: no output
    Silent,

    /// Ask: JSON on stdout
    Ask(AskResponse),

    /// Block: message on stderr
    Block(String),

    /// Could not evaluate: message on stderr
    Error(String),
}

impl HookOutput {
    /// Build the output for a verdict about `request`
    pub fn from_verdict(verdict: &Verdict, request: &Request) -> Self {
        match verdict {
            Verdict::Allow { .. } => HookOutput::Silent,
            Verdict::Block { message, .. } => HookOutput::Block(message.clone()),
            Verdict::Ask {
                rule_id,
                message,
                pattern,
            } => {
                let (command, file) = match request {
                    Request::Shell { command } => (Some(command.clone()), None),
                    other => (None, other.file_path().map(str::to_string)),
                };
                HookOutput::Ask(AskResponse {
                    action: "ask",
                    message: message.clone(),
                    command,
                    file,
                    pattern: pattern.clone(),
                    rule: *rule_id,
                })
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            HookOutput::Silent | HookOutput::Ask(_) => EXIT_OK,
            HookOutput::Block(_) => EXIT_BLOCK,
            HookOutput::Error(_) => EXIT_ERROR,
        }
    }

    /// Write to the given streams
    pub fn emit(&self, stdout: &mut impl Write, stderr: &mut impl Write) -> io::Result<()> {
        match self {
            HookOutput::Silent => Ok(()),
            HookOutput::Ask(response) => {
                let json = serde_json::to_string(response).map_err(io::Error::other)?;
                writeln!(stdout, "{}", json)?;
                stdout.flush()
            }
            HookOutput::Block(message) | HookOutput::Error(message) => {
                writeln!(stderr, "{}", message)?;
                stderr.flush()
            }
        }
    }
}
