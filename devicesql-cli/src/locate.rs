//! Finding export.pdb on a mounted volume

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::debug;
use walkdir::WalkDir;

/// Relative location of the database on an exported volume
pub const EXPORT_DB_PATH: &str = "PIONEER/rekordbox/export.pdb";

/// How deep below the given root the database is searched for
pub const MAX_SEARCH_DEPTH: usize = 4;

/// Resolve a command-line target to a database file. Files are taken as-is;
/// directories are searched for `PIONEER/rekordbox/export.pdb`.
pub fn find_database(target: &Path) -> Result<PathBuf> {
    if target.is_file() {
        return Ok(target.to_path_buf());
    }
    if !target.is_dir() {
        bail!("{:?} does not exist", target);
    }

    let direct = target.join(EXPORT_DB_PATH);
    if direct.is_file() {
        return Ok(direct);
    }

    for entry in WalkDir::new(target)
        .max_depth(MAX_SEARCH_DEPTH)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.ends_with(EXPORT_DB_PATH) {
            debug!("Found database at {:?}", path);
            return Ok(path.to_path_buf());
        }
    }

    bail!("No {} found under {:?}", EXPORT_DB_PATH, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"pdb").unwrap();
    }

    #[test]
    fn test_file_taken_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("copy.pdb");
        touch(&file);

        assert_eq!(find_database(&file).unwrap(), file);
    }

    #[test]
    fn test_volume_root() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(EXPORT_DB_PATH);
        touch(&db);

        assert_eq!(find_database(dir.path()).unwrap(), db);
    }

    #[test]
    fn test_nested_volume() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("usb").join(EXPORT_DB_PATH);
        touch(&db);

        assert_eq!(find_database(dir.path()).unwrap(), db);
    }

    #[test]
    fn test_too_deep() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a/b").join(EXPORT_DB_PATH));

        assert!(find_database(dir.path()).is_err());
    }

    #[test]
    fn test_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_database(&dir.path().join("nope")).is_err());
        assert!(find_database(dir.path()).is_err());
    }
}
