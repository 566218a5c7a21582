//! Rule configuration loading for safety-gate
//!
//! Supports TOML and YAML pattern files. Loading either yields a fully
//! validated `RuleConfig` or, when the file is missing or broken, the
//! permissive default so a bad rules file never becomes an outage.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use regex::RegexBuilder;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::paths;
use crate::rules::{Action, PatternRule};

/// Environment variable naming an explicit patterns file
pub const PATTERNS_ENV: &str = "SAFETY_GATE_PATTERNS";

/// File names probed next to the executable and in `~/.claude/hooks/`
const PATTERN_FILE_NAMES: &[&str] = &["patterns.toml", "patterns.yaml", "patterns.yml"];

/// Write size limits in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileSizeLimits {
    /// Writes larger than this are blocked
    pub max_write_size: u64,

    /// Writes larger than this require confirmation
    pub warn_on_large_write: u64,
}

impl Default for FileSizeLimits {
    fn default() -> Self {
        Self {
            max_write_size: 5 * 1024 * 1024,
            warn_on_large_write: 1024 * 1024,
        }
    }
}

/// Logging and backup behavior
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SafetySettings {
    /// Record allowed operations too (denials are always recorded)
    pub enable_logging: bool,

    /// Copy existing files aside before an allowed Edit/Write
    pub backup_before_destructive: bool,

    /// Where backups go (`~` and `$VAR` are expanded)
    pub backup_directory: String,

    /// Audit log location (`~` and `$VAR` are expanded)
    pub log_file: Option<String>,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            enable_logging: true,
            backup_before_destructive: false,
            backup_directory: ".claude/backups/".to_string(),
            log_file: None,
        }
    }
}

/// A dangerous-pattern entry as written in the patterns file
#[derive(Debug, Clone, Deserialize)]
struct RawPattern {
    pattern: String,
    #[serde(default = "default_action")]
    action: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    description: String,
}

fn default_action() -> String {
    "ask".to_string()
}

/// The patterns file before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawConfig {
    zero_access_paths: Vec<String>,
    read_only_paths: Vec<String>,
    no_delete_paths: Vec<String>,
    dangerous_bash_patterns: Vec<RawPattern>,
    dangerous_edit_patterns: Vec<RawPattern>,
    file_size_limits: FileSizeLimits,
    safety_settings: SafetySettings,
}

/// Serialization format of a patterns file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Yaml,
}

impl Format {
    /// Pick the format from a file extension; anything but `.yaml`/`.yml` is TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Format::Yaml
            }
            _ => Format::Toml,
        }
    }
}

/// Validated, immutable rule configuration for one evaluation
#[derive(Debug, Clone, Default)]
pub struct RuleConfig {
    pub zero_access_paths: Vec<String>,
    pub read_only_paths: Vec<String>,
    pub no_delete_paths: Vec<String>,

    /// Patterns matched against Bash command text
    pub command_patterns: Vec<PatternRule>,

    /// Patterns matched against Edit/Write content
    pub content_patterns: Vec<PatternRule>,

    pub file_size_limits: FileSizeLimits,
    pub safety_settings: SafetySettings,

    /// File the configuration came from, `None` for defaults
    pub source: Option<PathBuf>,
}

impl RuleConfig {
    /// Discover and load the patterns file, falling back to defaults
    pub fn load(explicit: Option<&Path>) -> Self {
        let Some(path) = locate(explicit) else {
            debug!("no patterns file found; using empty rule set");
            return RuleConfig::default();
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load patterns; using empty rule set");
                RuleConfig::default()
            }
        }
    }

    /// Load and validate a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content, Format::from_path(path), path)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse TOML text (mainly for tests and embedding)
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Format::Toml, Path::new("<inline>"))
    }

    /// Parse YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Format::Yaml, Path::new("<inline>"))
    }

    fn parse(content: &str, format: Format, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = match format {
            Format::Toml => toml::from_str(content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?,
            Format::Yaml if content.trim().is_empty() => RawConfig::default(),
            Format::Yaml => serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?,
        };
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            zero_access_paths: raw.zero_access_paths,
            read_only_paths: raw.read_only_paths,
            no_delete_paths: raw.no_delete_paths,
            command_patterns: compile_patterns("dangerousBashPatterns", raw.dangerous_bash_patterns)?,
            content_patterns: compile_patterns("dangerousEditPatterns", raw.dangerous_edit_patterns)?,
            file_size_limits: raw.file_size_limits,
            safety_settings: raw.safety_settings,
            source: None,
        })
    }

    /// Audit log path (expanded), defaulting to `~/.claude/hooks/safety.log`
    pub fn log_path(&self) -> Option<PathBuf> {
        match self.safety_settings.log_file {
            Some(ref file) => Some(PathBuf::from(paths::expand(file))),
            None => dirs::home_dir().map(|home| home.join(".claude/hooks/safety.log")),
        }
    }

    /// Backup directory (expanded)
    pub fn backup_dir(&self) -> PathBuf {
        PathBuf::from(paths::expand(&self.safety_settings.backup_directory))
    }
}

fn compile_patterns(
    section: &'static str,
    entries: Vec<RawPattern>,
) -> Result<Vec<PatternRule>, ConfigError> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let action = Action::parse(&entry.action).ok_or_else(|| ConfigError::InvalidAction {
                section,
                action: entry.action.clone(),
            })?;
            let regex = RegexBuilder::new(&entry.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| ConfigError::InvalidRegex {
                    section,
                    index,
                    source,
                })?;
            Ok(PatternRule {
                regex,
                action,
                message: entry.message,
                description: entry.description,
            })
        })
        .collect()
}

/// Find the patterns file to use, if any
pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = env::var(PATTERNS_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(paths::expand(&path)));
        }
    }

    let search_dirs = [
        env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf)),
        dirs::home_dir().map(|home| home.join(".claude/hooks")),
    ];

    search_dirs
        .into_iter()
        .flatten()
        .flat_map(|dir| PATTERN_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Holds the active configuration and swaps it whole on reload
pub struct PatternStore {
    explicit: Option<PathBuf>,
    current: RwLock<Arc<RuleConfig>>,
}

impl PatternStore {
    /// Load once from the discovered location (fail open)
    pub fn open(explicit: Option<PathBuf>) -> Self {
        let config = RuleConfig::load(explicit.as_deref());
        Self {
            explicit,
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Wrap an already-built configuration
    pub fn from_config(config: RuleConfig) -> Self {
        Self {
            explicit: config.source.clone(),
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// The configuration in effect right now
    pub fn snapshot(&self) -> Arc<RuleConfig> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Re-read the patterns file. A broken file leaves the current snapshot
    /// in place; a missing file swaps in the defaults.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let next = match locate(self.explicit.as_deref()) {
            Some(path) if path.exists() => RuleConfig::load_from(&path)?,
            _ => RuleConfig::default(),
        };
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(next);
        Ok(())
    }
}

/// Annotated example patterns file
pub const EXAMPLE_PATTERNS_TOML: &str = r#"
zeroAccessPaths = ["~/.ssh/*", "~/.aws/credentials", "~/.gnupg/*", "*.pem"]
readOnlyPaths = ["/etc/*", "/usr/*", "/bin/*"]
noDeletePaths = ["~/.claude/", ".git/*"]

[[dangerousBashPatterns]]
pattern = 'rm\s+-rf\s+/(\s|$)'
action = "block"
description = "Recursive delete of the filesystem root"

[[dangerousBashPatterns]]
pattern = 'git\s+push\s+.*--force'
action = "ask"
description = "Force push rewrites remote history"

[[dangerousBashPatterns]]
pattern = 'git\s+status'
action = "skip"
description = "Explicitly ignored"

[[dangerousEditPatterns]]
pattern = 'AKIA[0-9A-Z]{16}'
action = "block"
message = "🚫 BLOCKED: Content contains an AWS access key"

[[dangerousEditPatterns]]
pattern = 'eval\('
action = "ask"
message = "⚠️  Content uses eval(). Are you sure?"

[fileSizeLimits]
maxWriteSize = 5242880
warnOnLargeWrite = 1048576

[safetySettings]
enableLogging = true
backupBeforeDestructive = false
backupDirectory = ".claude/backups/"
"#;
