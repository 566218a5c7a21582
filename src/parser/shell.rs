//! Shell tokenization and path extraction
//!
//! Heuristics used by the Bash check to find which paths a command touches
//! and whether it looks like it mutates or deletes them.

use once_cell::sync::Lazy;
use regex::Regex;

/// Command names never treated as paths
pub const KNOWN_COMMANDS: &[&str] = &["rm", "mv", "cp", "cat", "chmod", "chown"];

/// Standalone tokens that separate commands
const OPERATORS: &[&str] = &["|", "||", "&", "&&", ";", ";;", "(", ")", "{", "}", "!"];

/// Redirection prefixes stripped from the front of a token
const REDIRECTS: &[&str] = &["&>>", "&>", "2>>", "1>>", ">>", "2>", "1>", ">", "<<<", "<<", "<"];

static MUTATING_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[\s;&|(/`])(?:rm|rmdir|mv|chmod|chown)(?:\s|$|;|&|\|)").unwrap()
});

static DELETING_VERB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s;&|(/`])(?:rm|rmdir)(?:\s|$|;|&|\|)").unwrap());

static OUTPUT_REDIRECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|[^-=>])>>?\s*[^&>\s=]").unwrap());

static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*=(.*)$").unwrap());

/// Tokenize a shell command into words
///
/// Uses shlex for quoting; unbalanced quotes fall back to whitespace splitting.
pub fn tokenize(command: &str) -> Vec<String> {
    shlex::split(command)
        .unwrap_or_else(|| command.split_whitespace().map(str::to_string).collect())
}

/// Whether the command looks like it writes, moves, deletes or re-permissions files
pub fn is_mutating(command: &str) -> bool {
    MUTATING_VERB.is_match(command) || OUTPUT_REDIRECT.is_match(command)
}

/// Whether the command looks like it deletes files
pub fn is_deleting(command: &str) -> bool {
    DELETING_VERB.is_match(command)
}

fn strip_redirect(token: &str) -> &str {
    REDIRECTS
        .iter()
        .find_map(|prefix| token.strip_prefix(prefix))
        .unwrap_or(token)
}

/// Extract the words of a command that might be file paths.
///
/// Lossy by design: flags, operators, the known command names and the bare
/// command word of each segment are dropped; `KEY=value` contributes `value`;
/// redirection targets are kept.
pub fn extract_candidate_paths(command: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut at_command_position = true;

    for token in tokenize(command) {
        for piece in token.split([';', '|']) {
            if piece.is_empty() {
                continue;
            }
            if OPERATORS.contains(&piece) || piece.chars().all(|c| c == '&') {
                at_command_position = true;
                continue;
            }

            let word = strip_redirect(piece);
            let redirected = word.len() != piece.len();
            if word.is_empty() || word.starts_with('-') {
                continue;
            }

            if let Some(caps) = ASSIGNMENT.captures(word) {
                let value = caps.get(1).map_or("", |m| m.as_str());
                if !value.is_empty() {
                    paths.push(value.to_string());
                }
                continue;
            }

            let is_command_word = at_command_position && !redirected;
            if is_command_word {
                at_command_position = false;
                if !word.contains('/') {
                    continue;
                }
            }

            if KNOWN_COMMANDS.contains(&word) {
                continue;
            }
            paths.push(word.to_string());
        }
        if token.ends_with(';') || token.ends_with('|') {
            at_command_position = true;
        }
    }

    paths.dedup();
    paths
}
