//! Service configuration
//!
//! Loaded from defaults, then environment variables. A `.env` file in the
//! working directory is read first when present.
//!
//! ## Environment Variables
//!
//! - `VGRANT_DATABASE_PATH` - SQLite database file (default: `vgrant.db`)
//! - `VGRANT_TRANSACTION_TIMEOUT_MS` - Per-transaction timeout (default: 30000)
//! - `VGRANT_RESTORE_MODE` - `atomic` or `two_phase` (default: `atomic`)
//! - `VGRANT_LOG_PROFILE` - `development`, `production` or `test`
//!   (default: `development`)

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use vgrant_core::errors::{ExError, ExErrorKind, Result};
use vgrant_core::logging_facility::Profile;
use vgrant_store::RestoreMode;

/// Prefix of every configuration variable
pub const ENV_PREFIX: &str = "VGRANT";

pub const DEFAULT_DATABASE_PATH: &str = "vgrant.db";

const fn default_transaction_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    #[serde(default = "default_transaction_timeout_ms")]
    pub transaction_timeout_ms: u64,
    #[serde(default)]
    pub restore_mode: RestoreMode,
    #[serde(default)]
    pub log_profile: Profile,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            transaction_timeout_ms: default_transaction_timeout_ms(),
            restore_mode: RestoreMode::default(),
            log_profile: Profile::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from `.env` and the process environment
    ///
    /// # Errors
    ///
    /// `ExErrorKind::InvalidInput` when a variable does not parse or the
    /// result fails validation.
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Ignoring unreadable .env file");
            }
        }
        Self::load_from(::config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an explicit environment source
    ///
    /// # Errors
    ///
    /// Same as [`ServiceConfig::load`].
    pub fn load_from(environment: ::config::Environment) -> Result<Self> {
        let settings = ::config::Config::builder()
            .set_default("database_path", DEFAULT_DATABASE_PATH)
            .map_err(config_error)?
            .add_source(environment)
            .build()
            .map_err(config_error)?;

        let config: ServiceConfig = settings.try_deserialize().map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// `ExErrorKind::InvalidInput` for a zero timeout or an empty path.
    pub fn validate(&self) -> Result<()> {
        if self.transaction_timeout_ms == 0 {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("load_config")
                .with_message("transaction_timeout_ms must be positive"));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("load_config")
                .with_message("database_path must not be empty"));
        }
        Ok(())
    }

    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }
}

fn config_error(err: ::config::ConfigError) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("load_config")
        .with_message(err.to_string())
}
