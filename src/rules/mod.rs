//! Rule definitions for safety-gate
//!
//! Dangerous patterns come from the patterns file; the set of important
//! config files guarded against silent overwrite is fixed.

pub mod important;

use regex::Regex;

/// What a matching dangerous pattern asks the gate to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Refuse the operation outright
    Block,

    /// Hand the decision to the user
    Ask,

    /// Entry is disabled
    Skip,
}

impl Action {
    /// Parse from the patterns-file spelling
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "block" => Some(Action::Block),
            "ask" => Some(Action::Ask),
            "skip" => Some(Action::Skip),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Block => "block",
            Action::Ask => "ask",
            Action::Skip => "skip",
        }
    }
}

/// A compiled dangerous-pattern entry
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Case-insensitive regex
    pub regex: Regex,

    pub action: Action,

    /// Message shown on match; empty means "derive from description"
    pub message: String,

    /// Short label for the pattern
    pub description: String,
}

impl PatternRule {
    /// Message for a block verdict
    pub fn block_message(&self) -> String {
        if self.message.is_empty() {
            format!("🚫 BLOCKED: {}", self.label())
        } else {
            self.message.clone()
        }
    }

    /// Message for an ask verdict
    pub fn ask_message(&self) -> String {
        if self.message.is_empty() {
            format!("⚠️  Warning: {}", self.label())
        } else {
            self.message.clone()
        }
    }

    fn label(&self) -> &str {
        if self.description.is_empty() {
            self.regex.as_str()
        } else {
            &self.description
        }
    }
}
