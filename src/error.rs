//! Error types for safety-gate
//!
//! Only `InputError` ever crosses the process boundary. Configuration and
//! path-resolution errors are recovered where they occur, and audit write
//! failures are swallowed by the sink.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce a valid rule configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown action '{action}' in {section} (expected block, ask or skip)")]
    InvalidAction { section: &'static str, action: String },

    #[error("invalid regex in {section} entry {index}: {source}")]
    InvalidRegex {
        section: &'static str,
        index: usize,
        #[source]
        source: regex::Error,
    },
}

/// A candidate path that could not be turned into an absolute path.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("empty path")]
    Empty,

    #[error("path contains a NUL byte")]
    NulByte,

    #[error("cannot determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// Malformed request envelope on stdin.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("empty input")]
    Empty,

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotObject(&'static str),
}
