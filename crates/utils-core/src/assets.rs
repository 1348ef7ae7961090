use std::path::{Path, PathBuf};

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");
pub const ASSET_DIR_ENV: &str = "TASKBOARD_ASSET_DIR";

/// Directory holding the database file and `config.json`.
///
/// `TASKBOARD_ASSET_DIR` wins when set; debug builds fall back to
/// `dev_assets/` at the workspace root, release builds to the platform data
/// directory.
pub fn asset_dir() -> PathBuf {
    let path = match std::env::var(ASSET_DIR_ENV) {
        Ok(override_dir) if !override_dir.trim().is_empty() => PathBuf::from(override_dir.trim()),
        _ => default_asset_dir(),
    };
    ensure_dir(&path);
    path
}

fn default_asset_dir() -> PathBuf {
    if cfg!(debug_assertions) {
        return PathBuf::from(PROJECT_ROOT).join("../../dev_assets");
    }
    match ProjectDirs::from("dev", "taskboard", "taskboard") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => {
            tracing::warn!("No home directory available, using ./taskboard-data");
            PathBuf::from("taskboard-data")
        }
    }
}

fn ensure_dir(path: &Path) {
    if path.exists() {
        return;
    }
    if let Err(err) = std::fs::create_dir_all(path) {
        tracing::warn!("Failed to create asset directory {}: {}", path.display(), err);
    }
}

pub fn config_path() -> PathBuf {
    asset_dir().join("config.json")
}
