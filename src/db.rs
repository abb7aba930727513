use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::AppConfig;
use crate::error::StoreError;

pub type DbPool = SqlitePool;

/// Database pool plus the configuration every call site needs
pub struct AppState {
  pub db: DbPool,
  pub config: AppConfig,
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(config: &AppConfig) -> Result<DbPool, StoreError> {
  let db_path = &config.database_path;
  ensure_parent_dir(db_path)?;
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  info!(path = %db_path.display(), "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(config.max_connections)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}

fn ensure_parent_dir(db_path: &Path) -> Result<(), StoreError> {
  match db_path.parent() {
    Some(dir) if !dir.as_os_str().is_empty() => Ok(fs::create_dir_all(dir)?),
    _ => Ok(()),
  }
}
