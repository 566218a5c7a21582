//! safety-gate - Rule-based safety gate for editor tool calls
//!
//! Evaluates one proposed Bash, Edit, Write or Read operation against a
//! declarative patterns file and returns allow, ask or block.
//!
//! # Features
//!
//! - **Path protection**: zero-access, read-only and no-delete path lists with `~`/`$VAR` expansion and globs
//! - **Dangerous patterns**: ordered, case-insensitive regexes with block/ask/skip actions
//! - **Write limits**: size ceiling and large-write confirmation, plus an overwrite prompt for project manifests
//! - **Audit logging**: JSONL record of every decision
//! - **Backups**: optional copy of a file before an allowed Edit/Write
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use safety_gate::{Request, RuleConfig, SecurityEngine};
//!
//! let config = RuleConfig::from_toml_str(r#"
//!     [[dangerousBashPatterns]]
//!     pattern = "rm -rf /"
//!     action = "block"
//! "#).unwrap();
//! let engine = SecurityEngine::new(Arc::new(config));
//!
//! let request = Request::Shell { command: "rm -rf / --no-preserve-root".to_string() };
//! assert!(engine.evaluate(&request).is_block());
//! ```

pub mod audit;
pub mod backup;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod input;
pub mod output;
pub mod parser;
pub mod paths;
pub mod rules;

// Re-exports for convenience
pub use audit::{AuditRecord, AuditSink, JsonlAuditLog, MemoryAudit, NoopAudit};
pub use config::{PatternStore, RuleConfig};
pub use engine::SecurityEngine;
pub use error::{ConfigError, InputError, ResolutionError};
pub use gate::SafetyGate;
pub use input::{HookInput, OperationKind, Request};
pub use output::{HookOutput, RuleId, Verdict};
