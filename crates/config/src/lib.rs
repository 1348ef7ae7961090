use std::path::Path;

use thiserror::Error;

mod schema;

pub use schema::{
    BACKEND_PORT_ENV, CURRENT_CONFIG_VERSION, Config, DATABASE_URL_ENV, HOST_ENV, PORT_ENV,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Will always return config, falling back to defaults on missing/invalid files.
pub async fn load_config_from_file(config_path: &Path) -> Config {
    match std::fs::read_to_string(config_path) {
        Ok(raw_config) => Config::from_raw(&raw_config),
        Err(err) => {
            if err.kind() == std::io::ErrorKind::NotFound {
                tracing::info!("No config file found, using defaults");
            } else {
                tracing::warn!("Failed to read config file: {}", err);
            }
            Config::default()
        }
    }
}

/// Saves the config to the given path
pub async fn save_config_to_file(config: &Config, config_path: &Path) -> Result<(), ConfigError> {
    let normalized = config.clone().normalized();
    let raw_config = serde_json::to_string_pretty(&normalized)?;
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(config_path, raw_config)?;
    Ok(())
}

/// Loads `config.json` from the asset directory, writing the defaults back
/// if it did not exist yet.
pub async fn load_default_config() -> Config {
    let path = utils_core::assets::config_path();
    let existed = path.exists();
    let config = load_config_from_file(&path).await;
    if !existed && let Err(err) = save_config_to_file(&config, &path).await {
        tracing::warn!("Failed to write default config: {}", err);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_file(&dir.path().join("config.json")).await;
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            port: 4100,
            default_filter: "shared".to_string(),
            ..Config::default()
        };

        save_config_to_file(&config, &path).await.unwrap();
        let loaded = load_config_from_file(&path).await;

        assert_eq!(loaded, config);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"default_filter\": \"shared\""));
    }

    #[tokio::test]
    async fn corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert_eq!(load_config_from_file(&path).await, Config::default());
    }
}
