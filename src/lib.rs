pub mod adherence;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod goals;
pub mod logging;
pub mod models;
pub mod store;
pub mod summary;

#[cfg(test)]
mod test_utils;

pub use adherence::{AdherenceEvaluator, AdherenceReport};
pub use config::{AdherenceConfig, AppConfig};
pub use db::AppState;
pub use error::{AppError, OnboardingError, StoreError};
pub use goals::{generate_goals, GeneratedGoals, OnboardingAnswers};

use tracing::info;

/// Load configuration from the environment, install logging and open the database
pub async fn initialize() -> Result<AppState, AppError> {
  let config = AppConfig::from_env()?;
  initialize_with(config).await
}

pub async fn initialize_with(config: AppConfig) -> Result<AppState, AppError> {
  logging::init_logging(&config.logging);

  let db = db::initialize_db(&config).await?;
  info!("Database ready");

  Ok(AppState { db, config })
}
