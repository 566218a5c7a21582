//! File operation checking
//!
//! Edit and Write always count as mutations, so the read-only list applies
//! to them directly. Write additionally gets the size and important-file
//! checks. Read only cares about zero-access.

use std::path::Path;

use crate::config::RuleConfig;
use crate::output::{RuleId, Verdict};
use crate::paths;
use crate::rules::important;

use super::common::{check_size, scan_patterns, Outcome};

fn zero_access(file_path: &str, config: &RuleConfig, message: impl FnOnce() -> String) -> Option<Verdict> {
    paths::first_match(file_path, &config.zero_access_paths)
        .map(|_| Verdict::block(RuleId::ZeroAccess, message()))
}

fn read_only(file_path: &str, config: &RuleConfig, message: impl FnOnce() -> String) -> Option<Verdict> {
    paths::first_match(file_path, &config.read_only_paths)
        .map(|_| Verdict::block(RuleId::ReadOnly, message()))
}

/// Check an in-place edit; only the replacement text is scanned
pub fn check_edit(file_path: &str, new_string: &str, config: &RuleConfig) -> Verdict {
    if let Some(block) = zero_access(file_path, config, || {
        format!("🚫 BLOCKED: Cannot access '{}' (credentials/secrets protection)", file_path)
    }) {
        return block;
    }

    if let Some(block) = read_only(file_path, config, || {
        format!("🚫 BLOCKED: Cannot modify '{}' (read-only system file)", file_path)
    }) {
        return block;
    }

    let mut outcome = Outcome::default();
    if let Some(block) = outcome.apply(scan_patterns(
        new_string,
        &config.content_patterns,
        RuleId::DangerousContent,
    )) {
        return block;
    }

    outcome.finish("edit passed all checks")
}

/// Check a whole-file write
pub fn check_write(file_path: &str, content: &str, config: &RuleConfig) -> Verdict {
    if let Some(block) = zero_access(file_path, config, || {
        format!("🚫 BLOCKED: Cannot write to '{}' (credentials/secrets protection)", file_path)
    }) {
        return block;
    }

    if let Some(block) = read_only(file_path, config, || {
        format!("🚫 BLOCKED: Cannot write to '{}' (read-only system file)", file_path)
    }) {
        return block;
    }

    let mut outcome = Outcome::default();

    if let Some(block) = outcome.apply(scan_patterns(
        content,
        &config.content_patterns,
        RuleId::DangerousContent,
    )) {
        return block;
    }

    if let Some(block) = outcome.apply(check_size(content, &config.file_size_limits)) {
        return block;
    }

    outcome.apply(check_important_overwrite(file_path));

    outcome.finish("write passed all checks")
}

/// Check a file read
pub fn check_read(file_path: &str, config: &RuleConfig) -> Verdict {
    zero_access(file_path, config, || {
        format!("🚫 BLOCKED: Cannot read '{}' (credentials/secrets protection)", file_path)
    })
    .unwrap_or_else(|| Verdict::allow("read passed all checks"))
}

/// Ask before replacing an existing manifest or build definition
fn check_important_overwrite(file_path: &str) -> Option<Verdict> {
    let name = important::important_file_name(file_path)?;
    if !Path::new(&paths::expand(file_path)).exists() {
        return None;
    }
    Some(Verdict::ask(
        RuleId::ImportantFile,
        format!(
            "⚠️  You are about to OVERWRITE '{}' which is an important config file. Are you sure?",
            name
        ),
    ))
}
