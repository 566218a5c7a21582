//! Path expansion, resolution and protection-pattern matching
//!
//! Matching never fails: when a candidate cannot be resolved to an absolute
//! path the matcher degrades to a literal string-prefix comparison.

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::ResolutionError;

static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))").unwrap());

/// Expand a leading `~` and `$VAR` / `${VAR}` references.
///
/// Unset variables are left as written.
pub fn expand(path: &str) -> String {
    let home_expanded = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => format!("{}{}", home.display(), rest),
            None => path.to_string(),
        },
        _ => path.to_string(),
    };

    ENV_VAR
        .replace_all(&home_expanded, |caps: &regex::Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            env::var(name).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Whether a protection pattern uses glob wildcards
pub fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

/// Turn an already-expanded path into an absolute, normalized path.
///
/// Existing prefixes are canonicalized (symlinks resolved); the part that
/// does not exist yet is appended lexically.
pub fn resolve(path: &str) -> Result<PathBuf, ResolutionError> {
    absolute(path).map(|absolute| canonicalize_lenient(&absolute))
}

/// Absolute, lexically normalized form of `path`; symlinks are left alone
fn absolute(path: &str) -> Result<PathBuf, ResolutionError> {
    if path.is_empty() {
        return Err(ResolutionError::Empty);
    }
    if path.contains('\0') {
        return Err(ResolutionError::NulByte);
    }

    let path = Path::new(path);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map_err(ResolutionError::CurrentDir)?
            .join(path)
    };

    Ok(normalize(&absolute))
}

/// Resolve `.` and `..` lexically
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn canonicalize_lenient(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut tail = Vec::new();

    loop {
        if let Ok(canonical) = fs::canonicalize(&existing) {
            return tail
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match existing.file_name() {
            Some(name) => {
                tail.push(name.to_os_string());
                existing.pop();
            }
            None => return path.to_path_buf(),
        }
    }
}

/// Anchored regex for a glob: `*` → `.*`, `?` → `.`, everything else literal
fn glob_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '*' | '?' => {
                re.push_str(&regex::escape(&literal));
                literal.clear();
                re.push_str(if c == '*' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    re.push_str(&regex::escape(&literal));
    re.push('$');
    Regex::new(&re).ok()
}

/// Relative glob patterns that start with a literal segment are anchored at
/// the working directory; `*`-led patterns stay as they are.
fn anchor_glob(expanded: &str) -> String {
    if expanded.starts_with('/') || expanded.starts_with('*') || expanded.starts_with('?') {
        return expanded.to_string();
    }
    match env::current_dir() {
        Ok(cwd) => {
            let relative = expanded.trim_start_matches("./");
            format!("{}/{}", cwd.display(), relative)
        }
        Err(_) => expanded.to_string(),
    }
}

/// Canonicalize the literal directory part of an absolute glob, so a pattern
/// written through a symlinked directory covers the real location too.
fn canonicalize_glob(glob: &str) -> String {
    if !glob.starts_with('/') {
        return glob.to_string();
    }
    let Some(wildcard) = glob.find(['*', '?']) else {
        return glob.to_string();
    };
    let split = glob[..wildcard].rfind('/').unwrap_or(0);
    if split == 0 {
        return glob.to_string();
    }
    let base = canonicalize_lenient(&normalize(Path::new(&glob[..split])));
    format!("{}{}", base.display(), &glob[split..])
}

fn literal_prefix(candidate: &str, pattern: &str) -> bool {
    candidate.starts_with(pattern)
}

/// Check whether `candidate` is covered by the protection `pattern`.
///
/// Wildcard patterns match the whole candidate, either as written
/// (normalized) or with symlinks resolved; plain patterns match the resolved
/// path itself or anything beneath it.
pub fn matches(candidate: &str, pattern: &str) -> bool {
    let pattern = expand(pattern);
    let candidate = expand(candidate);

    let lexical = match absolute(&candidate) {
        Ok(lexical) => lexical,
        Err(e) => {
            debug!(candidate = %candidate, error = %e, "path resolution failed; using literal match");
            return literal_prefix(&candidate, &pattern);
        }
    };
    let resolved = canonicalize_lenient(&lexical);

    if has_wildcard(&pattern) {
        // Both sides are tried as written and with symlinks resolved.
        let written = anchor_glob(&pattern);
        let globs = [canonicalize_glob(&written), written];
        let mut compiled = globs.iter().filter_map(|glob| glob_regex(glob)).peekable();
        if compiled.peek().is_none() {
            return literal_prefix(&candidate, &pattern);
        }
        let (lexical, resolved) = (lexical.to_string_lossy(), resolved.to_string_lossy());
        return compiled.any(|re| re.is_match(&resolved) || re.is_match(&lexical));
    }

    match resolve(&pattern) {
        Ok(protected) => resolved.starts_with(&protected),
        Err(e) => {
            debug!(pattern = %pattern, error = %e, "pattern resolution failed; using literal match");
            literal_prefix(&candidate, &pattern)
        }
    }
}

/// First pattern in `patterns` that covers `candidate`
pub fn first_match<'a>(candidate: &str, patterns: &'a [String]) -> Option<&'a str> {
    patterns
        .iter()
        .find(|pattern| matches(candidate, pattern))
        .map(String::as_str)
}
