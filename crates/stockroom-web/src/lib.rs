//! HTTP server for the Stockroom inventory.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **HTML pages** for browsing, searching and editing items, managing
//!   shelves and managing accounts, rendered with `minijinja`
//! - **REST endpoints** (`/products`, `/product/{id}`, `/cabinets`) for
//!   the same catalog as JSON
//! - **Static files** under `/static`, including uploaded photos
//!
//! # Architecture
//!
//! Handlers share one [`AppState`] holding the file-backed catalog and
//! account stores, each behind an async mutex. Sessions live in an
//! in-memory `tower-sessions` store; [`auth::require_auth`] and
//! [`auth::require_role`] gate the route groups built in
//! [`router::build_router`]. Photo decoding and password hashing run on
//! the blocking pool.

pub mod accounts;
pub mod api;
pub mod auth;
pub mod error;
pub mod forms;
pub mod pages;
pub mod router;
pub mod server;
pub mod shelves;
pub mod state;
pub mod templates;

// Re-export primary types for convenience.
pub use auth::SessionUser;
pub use error::WebError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
