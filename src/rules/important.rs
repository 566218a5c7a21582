//! Project files whose overwrite needs confirmation

use std::path::Path;

/// Manifests, lockfile-like and container definitions
pub const IMPORTANT_FILES: &[&str] = &[
    "package.json",
    "tsconfig.json",
    "pyproject.toml",
    "Cargo.toml",
    ".gitignore",
    "docker-compose.yml",
    "Dockerfile",
];

/// Return the basename if the path names an important file
pub fn important_file_name(file_path: &str) -> Option<&str> {
    let name = Path::new(file_path).file_name()?.to_str()?;
    IMPORTANT_FILES.contains(&name).then_some(name)
}
