//! Configuration and login policy for the Stockroom inventory.
//!
//! - [`config`] -- Typed mirror of `config.json` plus environment overrides
//! - [`throttle`] -- Per-username failed-login counting and lockout

pub mod config;
pub mod throttle;

pub use config::{AppConfig, ConfigError};
pub use throttle::{LoginThrottle, Lockout};
