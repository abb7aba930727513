//! Structured logging setup built on `tracing`
//!
//! The library only emits events; the embedding host decides whether to install
//! this subscriber or its own.

use std::env;
use std::io;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Json,
  Pretty,
  Compact,
}

impl LogFormat {
  fn from_str_lossy(s: &str) -> Self {
    match s.trim().to_ascii_lowercase().as_str() {
      "json" => LogFormat::Json,
      "compact" => LogFormat::Compact,
      _ => LogFormat::Pretty,
    }
  }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
  /// Default level for this crate (trace, debug, info, warn, error)
  pub level: String,
  pub format: LogFormat,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".into(),
      format: LogFormat::Pretty,
    }
  }
}

impl LoggingConfig {
  pub fn from_env() -> Self {
    let level = env::var("CALORIE_LOG_LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let format = env::var("CALORIE_LOG_LOG_FORMAT")
      .map(|f| LogFormat::from_str_lossy(&f))
      .unwrap_or(LogFormat::Pretty);

    Self { level, format }
  }

  fn env_filter(&self) -> EnvFilter {
    // RUST_LOG wins when present; sqlx query logging stays at warn either way
    let base = env::var("RUST_LOG").unwrap_or_else(|_| format!("calorie_log_lib={}", self.level));
    EnvFilter::new(base).add_directive(
      "sqlx=warn"
        .parse()
        .unwrap_or_else(|_| tracing::Level::WARN.into()),
    )
  }
}

/// Install the global subscriber. Returns false if one was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
  let registry = tracing_subscriber::registry().with(config.env_filter());

  let installed = match config.format {
    LogFormat::Json => registry
      .with(fmt::layer().json().with_target(true).with_writer(io::stdout))
      .try_init()
      .is_ok(),
    LogFormat::Pretty => registry
      .with(fmt::layer().with_target(true).with_writer(io::stdout))
      .try_init()
      .is_ok(),
    LogFormat::Compact => registry
      .with(fmt::layer().compact().with_target(false).with_writer(io::stdout))
      .try_init()
      .is_ok(),
  };

  if installed {
    info!(
      service.version = env!("CARGO_PKG_VERSION"),
      log.level = %config.level,
      log.format = ?config.format,
      "calorie log core logging initialized"
    );
  }

  installed
}
