//! Gate controller
//!
//! One call per tool invocation: parse, evaluate against the current
//! snapshot, record the decision, optionally back up, and produce the
//! process output.

use std::path::Path;

use tracing::{debug, warn};

use crate::audit::{AuditAction, AuditRecord, AuditSink, EventType};
use crate::backup;
use crate::config::{PatternStore, RuleConfig};
use crate::engine::SecurityEngine;
use crate::error::InputError;
use crate::input::{HookInput, OperationKind, Request};
use crate::output::{HookOutput, Verdict};
use crate::paths;

/// Top-level orchestration of a single evaluation
pub struct SafetyGate {
    store: PatternStore,
    audit: Box<dyn AuditSink>,
    tools: Option<Vec<OperationKind>>,
}

impl SafetyGate {
    pub fn new(store: PatternStore, audit: Box<dyn AuditSink>) -> Self {
        Self {
            store,
            audit,
            tools: None,
        }
    }

    /// Only handle these operation kinds; everything else passes through
    pub fn with_tools(mut self, tools: Vec<OperationKind>) -> Self {
        self.tools = (!tools.is_empty()).then_some(tools);
        self
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    fn handles(&self, kind: OperationKind) -> bool {
        self.tools.as_ref().map_or(true, |tools| tools.contains(&kind))
    }

    /// Parse a raw envelope and handle it
    pub fn handle_json(&self, json: &str) -> Result<HookOutput, InputError> {
        let input = HookInput::from_json(json)?;
        Ok(self.handle(&input))
    }

    /// Handle a parsed envelope
    pub fn handle(&self, input: &HookInput) -> HookOutput {
        match &input.request {
            Some(request) if self.handles(request.kind()) => {
                debug!(summary = %input.summary(), session = ?input.session_id, "evaluating");
                let verdict = self.evaluate(request);
                HookOutput::from_verdict(&verdict, request)
            }
            _ => {
                debug!(summary = %input.summary(), "passing through");
                HookOutput::Silent
            }
        }
    }

    /// Evaluate a request and carry out its side effects (audit, backup)
    pub fn evaluate(&self, request: &Request) -> Verdict {
        let config = self.store.snapshot();

        // Captured before any backup so CREATE/OVERWRITE reflects the caller's view.
        let target_exists = request
            .file_path()
            .is_some_and(|file| Path::new(&paths::expand(file)).exists());

        let verdict = SecurityEngine::new(config.clone()).evaluate(request);

        match AuditRecord::for_verdict(request, &verdict) {
            Some(record) => {
                debug!(rule = ?verdict.rule_id(), target = %request.target(), "decisive verdict");
                self.audit.record(&record);
            }
            None => self.on_allow(request, &config, target_exists),
        }

        verdict
    }

    fn on_allow(&self, request: &Request, config: &RuleConfig, target_exists: bool) {
        let settings = &config.safety_settings;

        if let Request::Edit { file_path, .. } | Request::Write { file_path, .. } = request {
            if settings.backup_before_destructive && target_exists {
                self.backup(request, file_path, config);
            }
        }

        let event = match request {
            Request::Write { .. } if target_exists => EventType::Overwrite,
            Request::Write { .. } => EventType::Create,
            _ => EventType::Allowed,
        };
        self.record(
            config,
            AuditRecord::new(request, event, AuditAction::Allow, ""),
        );
    }

    fn backup(&self, request: &Request, file_path: &str, config: &RuleConfig) {
        let source = paths::expand(file_path);
        let record = match backup::backup_file(Path::new(&source), &config.backup_dir()) {
            Ok(copy) => AuditRecord::new(
                request,
                EventType::BackupCreated,
                AuditAction::Backup,
                format!("Backed up to {}", copy.display()),
            ),
            Err(e) => {
                warn!(file = %file_path, error = %e, "backup failed");
                AuditRecord::new(request, EventType::BackupFailed, AuditAction::Error, e.to_string())
            }
        };
        self.record(config, record);
    }

    /// Routine records respect `enableLogging`; everything else is kept
    fn record(&self, config: &RuleConfig, record: AuditRecord) {
        if record.event.is_routine() && !config.safety_settings.enable_logging {
            return;
        }
        self.audit.record(&record);
    }
}
