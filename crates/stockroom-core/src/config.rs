//! Configuration loading and typed config structures for Stockroom.
//!
//! The configuration lives in `config.json` next to the data files. This
//! module defines strongly-typed structs that mirror the JSON structure,
//! and a loader that reads, overrides and validates it. Every field has a
//! default, so a missing file or a partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Lowest cost accepted by bcrypt.
const MIN_BCRYPT_COST: u32 = 4;

/// Highest cost accepted by bcrypt.
const MAX_BCRYPT_COST: u32 = 31;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse JSON content.
    #[error("failed to parse config JSON: {source}")]
    Json {
        /// The underlying JSON parse error.
        #[from]
        source: serde_json::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level application configuration.
///
/// Mirrors the structure of `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Title shown in page headers.
    #[serde(default = "default_title")]
    pub title: String,

    /// Items per page on the listing.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Thumbnail dimensions in pixels.
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,

    /// Display width of a photo preview on the edit page, in pixels.
    #[serde(default = "default_preview_width")]
    pub preview_width: u32,

    /// Session and login lockout settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Where persisted state lives.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Listen address.
    #[serde(default)]
    pub server: ServerSettings,

    /// Account created when the user file is empty.
    #[serde(default)]
    pub bootstrap_admin: BootstrapAdmin,

    /// Bcrypt work factor for new password hashes.
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            page_size: default_page_size(),
            thumbnail: ThumbnailConfig::default(),
            preview_width: default_preview_width(),
            session: SessionConfig::default(),
            storage: StorageConfig::default(),
            server: ServerSettings::default(),
            bootstrap_admin: BootstrapAdmin::default(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file at the given path.
    ///
    /// Environment variables override file values:
    /// - `STOCKROOM_HOST` overrides `server.host`
    /// - `STOCKROOM_PORT` overrides `server.port`
    /// - `STOCKROOM_DATA_FILE` overrides `storage.data_file`
    /// - `STOCKROOM_USERS_FILE` overrides `storage.users_file`
    /// - `STOCKROOM_STATIC_DIR` overrides `storage.static_dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Json`] if it is not valid JSON, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`AppConfig::from_file`], but a missing file yields the
    /// defaults (still subject to environment overrides).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }

        info!(path = %path.display(), "config file not found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string without overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the string is not valid JSON.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("STOCKROOM_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("STOCKROOM_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("invalid STOCKROOM_PORT: {e}")))?;
        }
        if let Some(path) = lookup("STOCKROOM_DATA_FILE") {
            self.storage.data_file = PathBuf::from(path);
        }
        if let Some(path) = lookup("STOCKROOM_USERS_FILE") {
            self.storage.users_file = PathBuf::from(path);
        }
        if let Some(path) = lookup("STOCKROOM_STATIC_DIR") {
            self.storage.static_dir = PathBuf::from(path);
        }
        Ok(())
    }

    /// Reject values the rest of the application cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".to_owned()));
        }
        if self.thumbnail.width == 0 || self.thumbnail.height == 0 {
            return Err(ConfigError::Invalid(
                "thumbnail width and height must be non-zero".to_owned(),
            ));
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid(format!(
                "bcrypt_cost must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"
            )));
        }
        Ok(())
    }

    /// Directory uploaded photos are written to (`<static_dir>/uploads`).
    pub fn upload_dir(&self) -> PathBuf {
        self.storage.static_dir.join("uploads")
    }
}

/// Thumbnail size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Width in pixels.
    #[serde(default = "default_thumbnail_side")]
    pub width: u32,
    /// Height in pixels.
    #[serde(default = "default_thumbnail_side")]
    pub height: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: default_thumbnail_side(),
            height: default_thumbnail_side(),
        }
    }
}

/// Session lifetime and login lockout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minutes of inactivity before a session expires.
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u32,

    /// Consecutive failures before a username is locked out (0 disables).
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: u32,

    /// How long a lockout lasts.
    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: u32,

    /// Mark the session cookie `Secure` (HTTPS only).
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: default_timeout_minutes(),
            max_login_attempts: default_max_login_attempts(),
            lockout_minutes: default_lockout_minutes(),
            secure_cookie: false,
        }
    }
}

/// Locations of persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Catalog file (items + shelves).
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Account file.
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,

    /// Directory served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Largest accepted request body, in bytes (photo uploads).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            users_file: default_users_file(),
            static_dir: default_static_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// HTTP listen address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Credentials of the account seeded into an empty user file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    /// Login name.
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Initial password. Change it after the first login.
    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl Default for BootstrapAdmin {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_title() -> String {
    String::from("Workshop Inventory")
}

const fn default_page_size() -> usize {
    10
}

const fn default_thumbnail_side() -> u32 {
    200
}

const fn default_preview_width() -> u32 {
    600
}

const fn default_timeout_minutes() -> u32 {
    60
}

const fn default_max_login_attempts() -> u32 {
    5
}

const fn default_lockout_minutes() -> u32 {
    15
}

fn default_data_file() -> PathBuf {
    PathBuf::from("dados.json")
}

fn default_users_file() -> PathBuf {
    PathBuf::from("usuarios.json")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

const fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

fn default_admin_username() -> String {
    String::from("admin")
}

fn default_admin_password() -> String {
    String::from("admin")
}

const fn default_bcrypt_cost() -> u32 {
    12
}
