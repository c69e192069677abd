//! # CLI Configuration
//!
//! Where the ledgers live, who is selling, and what the shop is called.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command-line flags (highest priority)                              │
//! │     --user maria --data-dir ./data                                     │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     TORTILLA_USER=maria                                                │
//! │     TORTILLA_DATA_DIR=/srv/tortilla                                    │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/tortilla-ledger/config.toml (Linux)                      │
//! │     ~/Library/Application Support/com.tortilla.ledger/config.toml      │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! │     user "admin", platform data directory                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! business_name = "LA ESPERANZA"
//!
//! [storage]
//! data_dir = "/srv/tortilla"
//! max_connections = 4
//! connect_timeout_secs = 30
//!
//! [session]
//! user = "maria"
//! require_login = true
//!
//! [auth]
//! initial_admin_password = "admin123"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use tortilla_core::DEFAULT_BUSINESS_NAME;
use tortilla_db::DbConfig;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("no config path available on this platform")]
    NoPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Shop identity printed on reports and receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_business_name")]
    pub business_name: String,
}

fn default_business_name() -> String {
    DEFAULT_BUSINESS_NAME.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            business_name: default_business_name(),
        }
    }
}

/// Where and how the SQLite files are opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `users.db` and every `sales_<user>.db`.
    /// Platform data directory when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    4
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: None,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Who is operating the register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_user")]
    pub user: String,

    /// Ask for the user's password (`--password` / `TORTILLA_PASSWORD`)
    /// before any command runs.
    #[serde(default = "default_true")]
    pub require_login: bool,
}

fn default_user() -> String {
    "admin".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            user: default_user(),
            require_login: true,
        }
    }
}

/// Credential store bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Password given to `admin` when the credential store is first created.
    #[serde(default = "default_admin_password")]
    pub initial_admin_password: String,
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            initial_admin_password: default_admin_password(),
        }
    }
}

// =============================================================================
// App Configuration
// =============================================================================

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(path)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.session.user.trim().is_empty() {
            return Err(ConfigError::Invalid("session.user must not be empty".into()));
        }
        if self.store.business_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "store.business_name must not be empty".into(),
            ));
        }
        if self.storage.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "storage.max_connections must be greater than 0".into(),
            ));
        }
        if self.auth.initial_admin_password.is_empty() {
            return Err(ConfigError::Invalid(
                "auth.initial_admin_password must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Applies `TORTILLA_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("TORTILLA_DATA_DIR") {
            debug!(data_dir = %dir, "Overriding data directory from environment");
            self.storage.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(user) = lookup("TORTILLA_USER") {
            debug!(user = %user, "Overriding session user from environment");
            self.session.user = user;
        }

        if let Some(name) = lookup("TORTILLA_BUSINESS_NAME") {
            self.store.business_name = name;
        }

        if let Some(password) = lookup("TORTILLA_ADMIN_PASSWORD") {
            self.auth.initial_admin_password = password;
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "tortilla", "ledger")
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The configured data directory, the platform one, or `./data`.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    fn tune(&self, config: DbConfig) -> DbConfig {
        config
            .max_connections(self.storage.max_connections)
            .connect_timeout(Duration::from_secs(self.storage.connect_timeout_secs))
    }

    /// Database settings for `user`'s ledger file.
    pub fn ledger_db(&self, user: &str) -> DbConfig {
        self.tune(DbConfig::user_ledger(self.data_dir(), user))
    }

    /// Database settings for the credential store.
    pub fn users_db(&self) -> DbConfig {
        self.tune(DbConfig::users(self.data_dir()))
    }
}
