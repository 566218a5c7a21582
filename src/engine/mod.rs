//! Rule evaluation for safety-gate
//!
//! Routes each request to the shell or file checker and returns the first
//! decisive verdict.

pub mod bash;
pub mod common;
pub mod file;

use std::sync::Arc;

use crate::config::RuleConfig;
use crate::input::Request;
use crate::output::Verdict;

/// Evaluates requests against one immutable configuration snapshot
#[derive(Debug, Clone)]
pub struct SecurityEngine {
    config: Arc<RuleConfig>,
}

impl SecurityEngine {
    /// Create a new security engine with the given configuration
    pub fn new(config: Arc<RuleConfig>) -> Self {
        Self { config }
    }

    /// Main entry point: check a request and return a verdict
    pub fn evaluate(&self, request: &Request) -> Verdict {
        match request {
            Request::Shell { command } => bash::check_command(command, &self.config),
            Request::Edit {
                file_path,
                new_string,
            } => file::check_edit(file_path, new_string, &self.config),
            Request::Write { file_path, content } => {
                file::check_write(file_path, content, &self.config)
            }
            Request::Read { file_path } => file::check_read(file_path, &self.config),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &RuleConfig {
        &self.config
    }
}
