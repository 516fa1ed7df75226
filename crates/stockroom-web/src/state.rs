//! Shared application state for the web server.
//!
//! [`AppState`] owns the two file-backed stores, the photo store, the
//! compiled templates and the login throttle. Handlers receive it as
//! `State<Arc<AppState>>`. Each store sits behind its own async mutex,
//! held for the whole check-then-mutate-then-persist sequence.

use stockroom_core::{AppConfig, LoginThrottle};
use stockroom_store::{CatalogStore, PhotoStore, UserStore};
use tokio::sync::Mutex;

use crate::error::WebError;
use crate::templates::Templates;

/// Shared state passed to all Axum handlers via [`axum::extract::State`].
#[derive(Debug)]
pub struct AppState {
    /// Loaded configuration.
    pub config: AppConfig,
    /// The catalog (items and shelves).
    pub catalog: Mutex<CatalogStore>,
    /// Accounts.
    pub users: Mutex<UserStore>,
    /// Upload directory writer.
    pub photos: PhotoStore,
    /// Compiled page templates.
    pub templates: Templates,
    /// Failed-login bookkeeping.
    pub throttle: Mutex<LoginThrottle>,
}

impl AppState {
    /// Assemble the state from already-opened stores.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Template`] if a bundled template fails to
    /// compile.
    pub fn new(
        config: AppConfig,
        catalog: CatalogStore,
        users: UserStore,
        photos: PhotoStore,
    ) -> Result<Self, WebError> {
        let throttle = LoginThrottle::new(
            config.session.max_login_attempts,
            config.session.lockout_minutes,
        );
        Ok(Self {
            config,
            catalog: Mutex::new(catalog),
            users: Mutex::new(users),
            photos,
            templates: Templates::new()?,
            throttle: Mutex::new(throttle),
        })
    }
}
