//! Ledger settings.
//!
//! Settings come from an optional TOML file; every field has a default. The environment
//! variables `DATABASE_URL` and `SUPER_ADMIN_ID` (possibly loaded from `.env`) take precedence
//! over the file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Default record store location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/vaccine_ledger.sqlite?mode=rwc";

/// Default identity of the distinguished super-administrator.
pub const DEFAULT_SUPER_ADMIN_ID: &str = "superadmin";

/// Default buffer size of the audit event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Settings structure representing the whole settings file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Connection URL of the record store
    pub database_url: String,
    /// Identity that is recognised as the super-administrator
    pub super_admin_id: String,
    /// Number of audit events buffered per subscriber
    pub event_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            super_admin_id: DEFAULT_SUPER_ADMIN_ID.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Settings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the TOML syntax is invalid or a field has the wrong type.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse settings: {e}"),
        })
    }

    /// Applies `DATABASE_URL` and `SUPER_ADMIN_ID` overrides from the environment.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(id) = std::env::var("SUPER_ADMIN_ID") {
            self.super_admin_id = id;
        }
        self
    }
}

/// Loads settings from `path`, falling back to defaults when the file does not exist,
/// then applies environment overrides.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Attempting to load settings from: {:?}", path_ref);

    let settings = if path_ref.exists() {
        let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
            message: format!("Failed to read settings file {}: {e}", path_ref.display()),
        })?;
        Settings::from_toml(&contents)?
    } else {
        debug!("No settings file at {:?}, using defaults", path_ref);
        Settings::default()
    };

    Ok(settings.with_env_overrides())
}
