//! Saving rewritten databases
//!
//! The original file is copied to `<name>.<YYYYmmdd-HHMMSS>.bak` before it
//! is overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use tracing::info;

const BACKUP_TIMESTAMP: &str = "%Y%m%d-%H%M%S";

/// Backup location for `path` taken at `now`
pub fn backup_path(path: &Path, backup_dir: Option<&Path>, now: DateTime<Local>) -> Result<PathBuf> {
    let Some(name) = path.file_name() else {
        bail!("{:?} has no file name", path);
    };
    let backup_name = format!(
        "{}.{}.bak",
        name.to_string_lossy(),
        now.format(BACKUP_TIMESTAMP)
    );

    let dir = match backup_dir {
        Some(dir) => dir.to_path_buf(),
        None => path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    Ok(dir.join(backup_name))
}

/// Back up `path`, then replace its contents with `data`.
/// Returns where the backup was written.
pub fn save_with_backup(path: &Path, data: &[u8], backup_dir: Option<&Path>) -> Result<PathBuf> {
    let backup = backup_path(path, backup_dir, Local::now())?;
    if let Some(dir) = backup.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create backup directory {:?}", dir))?;
    }

    fs::copy(path, &backup).with_context(|| format!("Failed to back up {:?}", path))?;
    info!("Backed up {:?} to {:?}", path, backup);

    fs::write(path, data).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Wrote {} bytes to {:?}", data.len(), path);

    Ok(backup)
}
