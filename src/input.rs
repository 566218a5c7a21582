//! Input parsing for hook JSON envelopes
//!
//! Accepts both `{"tool":{"name":..,"params":{..}}}` and the Claude Code
//! shape `{"tool_name":..,"tool_input":{..}}`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::InputError;

/// Kind of operation a request describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Shell,
    Edit,
    Write,
    Read,
}

impl OperationKind {
    /// Map a host tool name to an operation kind
    pub fn from_tool_name(name: &str) -> Option<Self> {
        match name {
            "Bash" => Some(OperationKind::Shell),
            "Edit" => Some(OperationKind::Edit),
            "Write" => Some(OperationKind::Write),
            "Read" => Some(OperationKind::Read),
            _ => None,
        }
    }

    /// Host tool name for this kind
    pub fn tool_name(&self) -> &'static str {
        match self {
            OperationKind::Shell => "Bash",
            OperationKind::Edit => "Edit",
            OperationKind::Write => "Write",
            OperationKind::Read => "Read",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

/// A single operation to evaluate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Shell command execution
    Shell { command: String },

    /// In-place edit; only the replacement text is inspected
    Edit { file_path: String, new_string: String },

    /// Whole-file write
    Write { file_path: String, content: String },

    /// File read
    Read { file_path: String },
}

impl Request {
    pub fn kind(&self) -> OperationKind {
        match self {
            Request::Shell { .. } => OperationKind::Shell,
            Request::Edit { .. } => OperationKind::Edit,
            Request::Write { .. } => OperationKind::Write,
            Request::Read { .. } => OperationKind::Read,
        }
    }

    /// Target file path, if the operation has one
    pub fn file_path(&self) -> Option<&str> {
        match self {
            Request::Shell { .. } => None,
            Request::Edit { file_path, .. }
            | Request::Write { file_path, .. }
            | Request::Read { file_path } => Some(file_path),
        }
    }

    /// The command or file path this request is about
    pub fn target(&self) -> &str {
        match self {
            Request::Shell { command } => command,
            Request::Edit { file_path, .. }
            | Request::Write { file_path, .. }
            | Request::Read { file_path } => file_path,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    tool: Option<ToolCall>,
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    tool_input: Value,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    #[serde(default)]
    name: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct BashParams {
    #[serde(default)]
    command: String,
}

#[derive(Debug, Deserialize)]
struct EditParams {
    #[serde(default)]
    file_path: String,
    #[serde(default)]
    new_string: String,
}

#[derive(Debug, Deserialize)]
struct WriteParams {
    #[serde(default)]
    file_path: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ReadParams {
    #[serde(default)]
    file_path: String,
}

fn params<T: DeserializeOwned>(value: Value) -> Result<T, InputError> {
    let value = if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    };
    Ok(serde_json::from_value(value)?)
}

/// A parsed hook envelope
#[derive(Debug, Clone)]
pub struct HookInput {
    /// Tool name as sent by the host (may be empty or unrecognized)
    pub tool_name: String,

    /// `None` when there is nothing to evaluate: unknown tool, or an empty
    /// command / file path
    pub request: Option<Request>,

    /// Optional session identifier
    pub session_id: Option<String>,
}

impl HookInput {
    /// Parse input from JSON string
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        if json.trim().is_empty() {
            return Err(InputError::Empty);
        }

        let value: Value = serde_json::from_str(json)?;
        let kind = match &value {
            Value::Object(_) => None,
            Value::Array(_) => Some("an array"),
            Value::Null => Some("null"),
            Value::Bool(_) => Some("a boolean"),
            Value::Number(_) => Some("a number"),
            Value::String(_) => Some("a string"),
        };
        if let Some(kind) = kind {
            return Err(InputError::NotObject(kind));
        }

        let envelope: Envelope = serde_json::from_value(value)?;
        let (tool_name, raw_params) = match envelope.tool {
            Some(call) => (call.name, call.params),
            None => (envelope.tool_name.unwrap_or_default(), envelope.tool_input),
        };

        let request = match OperationKind::from_tool_name(&tool_name) {
            Some(OperationKind::Shell) => {
                let p: BashParams = params(raw_params)?;
                (!p.command.is_empty()).then_some(Request::Shell { command: p.command })
            }
            Some(OperationKind::Edit) => {
                let p: EditParams = params(raw_params)?;
                (!p.file_path.is_empty()).then_some(Request::Edit {
                    file_path: p.file_path,
                    new_string: p.new_string,
                })
            }
            Some(OperationKind::Write) => {
                let p: WriteParams = params(raw_params)?;
                (!p.file_path.is_empty()).then_some(Request::Write {
                    file_path: p.file_path,
                    content: p.content,
                })
            }
            Some(OperationKind::Read) => {
                let p: ReadParams = params(raw_params)?;
                (!p.file_path.is_empty()).then_some(Request::Read { file_path: p.file_path })
            }
            None => None,
        };

        Ok(Self {
            tool_name,
            request,
            session_id: envelope.session_id,
        })
    }

    /// Get a summary of the input for logging
    pub fn summary(&self) -> String {
        match &self.request {
            Some(Request::Shell { command }) => {
                let truncated: String = command.chars().take(100).collect();
                if truncated.len() < command.len() {
                    format!("Bash: {}...", truncated)
                } else {
                    format!("Bash: {}", command)
                }
            }
            Some(request) => format!("{}: {}", request.kind(), request.target()),
            None => format!("Unchecked tool: {}", self.tool_name),
        }
    }
}
