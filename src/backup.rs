//! Pre-write backups
//!
//! Copies go to `{dir}/{file_name}.{YYYYmmdd_HHMMSS}.backup`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

/// Timestamp format used in backup file names
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Backup path for `file` inside `dir` at the current local time
pub fn backup_path(file: &Path, dir: &Path) -> io::Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' has no file name", file.display()),
        )
    })?;

    let mut backup_name = name.to_os_string();
    backup_name.push(format!(".{}.backup", Local::now().format(STAMP_FORMAT)));
    Ok(dir.join(backup_name))
}

/// Copy `file` into `dir`, creating the directory if needed
pub fn backup_file(file: &Path, dir: &Path) -> io::Result<PathBuf> {
    let target = backup_path(file, dir)?;
    fs::create_dir_all(dir)?;
    fs::copy(file, &target)?;
    Ok(target)
}
