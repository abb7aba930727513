use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::logging::LoggingConfig;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const DEFAULT_DB_FILE: &str = "calorie-log.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// A logged meal within this many minutes of a scheduled slot can fulfill it
pub const DEFAULT_MATCH_WINDOW_MINUTES: i64 = 120;

/// Symmetric band around the expected calories that still counts as on target
pub const DEFAULT_GOAL_TOLERANCE: f64 = 0.20;

/// ---------------------------------------------------------------------------
/// Adherence Settings
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdherenceConfig {
  pub match_window_minutes: i64,
  pub goal_tolerance: f64,
  /// Offset of the user's wall clock from UTC; meal times are compared in local time
  pub utc_offset_minutes: i32,
}

impl Default for AdherenceConfig {
  fn default() -> Self {
    Self {
      match_window_minutes: DEFAULT_MATCH_WINDOW_MINUTES,
      goal_tolerance: DEFAULT_GOAL_TOLERANCE,
      utc_offset_minutes: 0,
    }
  }
}

impl AdherenceConfig {
  pub fn local_offset(&self) -> FixedOffset {
    FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
  }
}

/// ---------------------------------------------------------------------------
/// Application Configuration
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_path: PathBuf,
  pub max_connections: u32,
  pub adherence: AdherenceConfig,
  pub logging: LoggingConfig,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_path: PathBuf::from(DEFAULT_DB_FILE),
      max_connections: DEFAULT_MAX_CONNECTIONS,
      adherence: AdherenceConfig::default(),
      logging: LoggingConfig::default(),
    }
  }
}

impl AppConfig {
  /// Load configuration from the process environment (and `.env` if present)
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();

    let database_path = env::var("CALORIE_LOG_DB_PATH")
      .map(PathBuf::from)
      .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_FILE));

    let max_connections = parse_var("CALORIE_LOG_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
    if max_connections == 0 {
      return Err(invalid("CALORIE_LOG_MAX_CONNECTIONS", "0"));
    }

    let match_window_minutes =
      parse_var("CALORIE_LOG_MATCH_WINDOW_MINUTES", DEFAULT_MATCH_WINDOW_MINUTES)?;
    if match_window_minutes < 0 {
      return Err(invalid(
        "CALORIE_LOG_MATCH_WINDOW_MINUTES",
        &match_window_minutes.to_string(),
      ));
    }

    let goal_tolerance: f64 = parse_var("CALORIE_LOG_GOAL_TOLERANCE", DEFAULT_GOAL_TOLERANCE)?;
    if !goal_tolerance.is_finite() || goal_tolerance < 0.0 {
      return Err(invalid("CALORIE_LOG_GOAL_TOLERANCE", &goal_tolerance.to_string()));
    }

    let utc_offset_minutes: i32 = parse_var("CALORIE_LOG_UTC_OFFSET_MINUTES", 0)?;
    if utc_offset_minutes.abs() >= 24 * 60 {
      return Err(invalid(
        "CALORIE_LOG_UTC_OFFSET_MINUTES",
        &utc_offset_minutes.to_string(),
      ));
    }

    Ok(Self {
      database_path,
      max_connections,
      adherence: AdherenceConfig {
        match_window_minutes,
        goal_tolerance,
        utc_offset_minutes,
      },
      logging: LoggingConfig::from_env(),
    })
  }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
  match env::var(key) {
    Ok(raw) => raw.trim().parse().map_err(|_| invalid(key, &raw)),
    Err(_) => Ok(default),
  }
}

fn invalid(key: &str, value: &str) -> ConfigError {
  ConfigError::InvalidValue {
    key: key.to_string(),
    value: value.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const KEYS: [&str; 5] = [
    "CALORIE_LOG_DB_PATH",
    "CALORIE_LOG_MAX_CONNECTIONS",
    "CALORIE_LOG_MATCH_WINDOW_MINUTES",
    "CALORIE_LOG_GOAL_TOLERANCE",
    "CALORIE_LOG_UTC_OFFSET_MINUTES",
  ];

  #[test]
  #[serial]
  fn test_defaults_when_unset() {
    temp_env::with_vars_unset(KEYS, || {
      let config = AppConfig::from_env().expect("defaults should load");
      assert_eq!(config.database_path, PathBuf::from("calorie-log.db"));
      assert_eq!(config.max_connections, 5);
      assert_eq!(config.adherence, AdherenceConfig::default());
      assert_eq!(config.adherence.match_window_minutes, 120);
      assert_eq!(config.adherence.goal_tolerance, 0.20);
    });
  }

  #[test]
  #[serial]
  fn test_overrides_from_env() {
    temp_env::with_vars(
      [
        ("CALORIE_LOG_DB_PATH", Some("/tmp/meals.db")),
        ("CALORIE_LOG_MATCH_WINDOW_MINUTES", Some("90")),
        ("CALORIE_LOG_GOAL_TOLERANCE", Some("0.15")),
        ("CALORIE_LOG_UTC_OFFSET_MINUTES", Some("-300")),
      ],
      || {
        let config = AppConfig::from_env().expect("overrides should load");
        assert_eq!(config.database_path, PathBuf::from("/tmp/meals.db"));
        assert_eq!(config.adherence.match_window_minutes, 90);
        assert_eq!(config.adherence.goal_tolerance, 0.15);
        assert_eq!(config.adherence.local_offset().local_minus_utc(), -300 * 60);
      },
    );
  }

  #[test]
  #[serial]
  fn test_invalid_values_rejected() {
    temp_env::with_var("CALORIE_LOG_GOAL_TOLERANCE", Some("lots"), || {
      let err = AppConfig::from_env().unwrap_err();
      assert!(err.to_string().contains("CALORIE_LOG_GOAL_TOLERANCE"));
    });

    temp_env::with_var("CALORIE_LOG_UTC_OFFSET_MINUTES", Some("1440"), || {
      assert!(AppConfig::from_env().is_err());
    });
  }
}
