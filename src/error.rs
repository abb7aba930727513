use serde::Serialize;
use thiserror::Error;

/// ---------------------------------------------------------------------------
/// Repository Errors
/// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
  /// A diet plan must schedule at least one meal
  #[error("Diet plan has no scheduled meals")]
  NoMeals,

  #[error("Invalid input: {0}")]
  Invalid(String),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: i64 },

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Storage I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Migration failed: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  /// Stored row could not be decoded into a model
  #[error("Corrupt record: {0}")]
  Corrupt(String),
}

impl StoreError {
  pub fn not_found(entity: &'static str, id: i64) -> Self {
    StoreError::NotFound { entity, id }
  }
}

/// ---------------------------------------------------------------------------
/// Onboarding Answer Validation
/// ---------------------------------------------------------------------------

#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum OnboardingError {
  #[error("Malformed onboarding answers: {0}")]
  Malformed(String),

  #[error("Invalid value for {field}: {reason}")]
  InvalidField { field: String, reason: String },
}

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Invalid value for {key}: {value}")]
  InvalidValue { key: String, value: String },
}

/// ---------------------------------------------------------------------------
/// Command Layer
/// ---------------------------------------------------------------------------

/// Errors surfaced by `commands` to the embedding host
#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Onboarding(#[from] OnboardingError),

  #[error(transparent)]
  Config(#[from] ConfigError),
}
