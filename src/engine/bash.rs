//! Bash command checking
//!
//! Path rules run over every candidate path extracted from the command.
//! Zero-access applies to any reference at all; read-only and no-delete
//! only when the command looks like it mutates or deletes.

use crate::config::RuleConfig;
use crate::output::{RuleId, Verdict};
use crate::parser::shell;

use super::common::{find_protected, scan_patterns, Outcome};

/// Check a shell command against the rule configuration
pub fn check_command(command: &str, config: &RuleConfig) -> Verdict {
    let candidates = shell::extract_candidate_paths(command);

    // 1. Zero-access: any mention of a protected path
    if let Some(path) = find_protected(&candidates, &config.zero_access_paths) {
        return Verdict::block(
            RuleId::ZeroAccess,
            format!(
                "🚫 BLOCKED: Access to protected path '{}' is forbidden (credentials/secrets)",
                path
            ),
        );
    }

    // 2. Read-only, for anything that writes
    if shell::is_mutating(command) {
        if let Some(path) = find_protected(&candidates, &config.read_only_paths) {
            return Verdict::block(
                RuleId::ReadOnly,
                format!("🚫 BLOCKED: Path '{}' is read-only (system file protection)", path),
            );
        }
    }

    // 3. No-delete, for rm / rmdir
    if shell::is_deleting(command) {
        if let Some(path) = find_protected(&candidates, &config.no_delete_paths) {
            return Verdict::block(
                RuleId::NoDelete,
                format!("🚫 BLOCKED: Cannot delete '{}' (critical file protection)", path),
            );
        }
    }

    // 4. Dangerous command patterns
    let mut outcome = Outcome::default();
    if let Some(block) = outcome.apply(scan_patterns(
        command,
        &config.command_patterns,
        RuleId::DangerousCommand,
    )) {
        return block;
    }

    outcome.finish("command passed all checks")
}
