//! Checks shared by the shell and file evaluators

use tracing::debug;

use crate::config::FileSizeLimits;
use crate::output::{RuleId, Verdict};
use crate::paths;
use crate::rules::{Action, PatternRule};

/// Accumulates verdicts in evaluation order.
///
/// A block ends evaluation immediately. The first ask is held and only
/// returned if nothing later blocks.
#[derive(Debug, Default)]
pub struct Outcome {
    held_ask: Option<Verdict>,
}

impl Outcome {
    /// Feed one check result; returns the verdict to emit now, if any
    pub fn apply(&mut self, verdict: Option<Verdict>) -> Option<Verdict> {
        match verdict {
            Some(block @ Verdict::Block { .. }) => Some(block),
            Some(ask @ Verdict::Ask { .. }) => {
                if self.held_ask.is_none() {
                    self.held_ask = Some(ask);
                }
                None
            }
            _ => None,
        }
    }

    /// Final verdict when nothing blocked
    pub fn finish(self, allow_reason: &str) -> Verdict {
        self.held_ask.unwrap_or_else(|| Verdict::allow(allow_reason))
    }
}

/// First candidate covered by any of `patterns`
pub fn find_protected<'a, S: AsRef<str>>(
    candidates: &'a [S],
    patterns: &[String],
) -> Option<&'a str> {
    if patterns.is_empty() {
        return None;
    }
    candidates
        .iter()
        .map(AsRef::<str>::as_ref)
        .find(|candidate| paths::first_match(candidate, patterns).is_some())
}

/// Run dangerous patterns against `text` in order.
///
/// Skip entries are ignored; the first block or ask match is decisive and
/// ends the scan.
pub fn scan_patterns(text: &str, rules: &[PatternRule], rule_id: RuleId) -> Option<Verdict> {
    for rule in rules {
        if rule.action == Action::Skip || !rule.regex.is_match(text) {
            continue;
        }
        debug!(action = rule.action.as_str(), pattern = rule.regex.as_str(), "dangerous pattern matched");
        return Some(match rule.action {
            Action::Block => Verdict::block(rule_id, rule.block_message()),
            _ => Verdict::Ask {
                rule_id,
                message: rule.ask_message(),
                pattern: (!rule.description.is_empty()).then(|| rule.description.clone()),
            },
        });
    }
    None
}

/// Compare content size against the write limits
pub fn check_size(content: &str, limits: &FileSizeLimits) -> Option<Verdict> {
    let size = content.len() as u64;

    if size > limits.max_write_size {
        return Some(Verdict::block(
            RuleId::MaxWriteSize,
            format!(
                "🚫 BLOCKED: File size ({} bytes) exceeds maximum ({} bytes)",
                size, limits.max_write_size
            ),
        ));
    }

    if size > limits.warn_on_large_write {
        return Some(Verdict::ask(
            RuleId::LargeWrite,
            format!("⚠️  Large file warning: Writing {} bytes. Are you sure?", size),
        ));
    }

    None
}
