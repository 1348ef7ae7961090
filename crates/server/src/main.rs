use std::sync::Arc;

use anyhow::Error as AnyhowError;
use db::{DBService, DbErr, default_database_url};
use server::{AppState, http};
use strip_ansi_escapes::strip;
use tasks::{TaskBoard, store::DbStore};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, prelude::*};
use utils_core::assets::asset_dir;

#[derive(Debug, Error)]
pub enum TaskBoardError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

fn init_tracing() -> Result<(), TaskBoardError> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},tasks={level},db={level},config={level},tower_http={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string)
        .map_err(|err| anyhow::anyhow!("Failed to create tracing filter: {err}"))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();
    Ok(())
}

/// Strips ANSI codes some launchers leave in `PORT`.
fn clean_env_value(raw: &str) -> String {
    String::from_utf8(strip(raw.as_bytes()))
        .unwrap_or_else(|_| raw.to_string())
        .trim()
        .to_string()
}

#[tokio::main]
async fn main() -> Result<(), TaskBoardError> {
    init_tracing()?;

    // Create asset directory if it doesn't exist
    if !asset_dir().exists() {
        std::fs::create_dir_all(asset_dir())?;
    }

    let config = config::load_default_config()
        .await
        .with_overrides(|name| std::env::var(name).ok().map(|value| clean_env_value(&value)));

    let database_url = config
        .database_url
        .clone()
        .unwrap_or_else(default_database_url);
    let db = DBService::connect(&database_url).await?;

    let board = Arc::new(TaskBoard::new(
        Arc::new(DbStore::new(db)),
        config.board_options(),
    ));
    let _session_watcher = board.watch_session();

    let app_router = http::router(AppState::new(board));

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.bind_host, config.port)).await?;
    let actual_port = listener.local_addr()?.port();
    tracing::info!("Server running on http://{}:{actual_port}", config.bind_host);

    axum::serve(listener, app_router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::clean_env_value;

    #[test]
    fn env_values_lose_ansi_codes_and_whitespace() {
        assert_eq!(clean_env_value("\u{1b}[32m4000\u{1b}[0m\n"), "4000");
        assert_eq!(clean_env_value(" 127.0.0.1 "), "127.0.0.1");
    }
}
