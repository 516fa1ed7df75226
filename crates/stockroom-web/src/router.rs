//! Axum router construction.
//!
//! Routes fall into three groups, each with its own middleware stack:
//!
//! - public: sign-in, sign-out and `/static`
//! - signed in: read-only pages and API reads
//! - admin: everything that mutates state
//!
//! The whole router runs inside the session layer, a request body limit
//! sized for photo uploads, and HTTP tracing.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use stockroom_types::Role;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::auth::{require_auth, require_role};
use crate::state::AppState;
use crate::{accounts, api, auth, pages, shelves};

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET/POST /login`, `GET /logout`, `GET /static/*` -- public
/// - `GET/POST /`, `GET /estantes`, `GET /products`, `GET /product/{id}`,
///   `GET /cabinets` -- any signed-in role
/// - `/novo`, `/editar`, `/deletar`, `/estantes/*` posts, `/usuarios*`,
///   `POST /product`, `PUT/DELETE /product/{id}` -- `admin` only
pub fn build_router(state: Arc<AppState>) -> Router {
    let config = &state.config;

    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.session.secure_cookie)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(i64::from(
            config.session.timeout_minutes,
        ))));

    let public = Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .nest_service("/static", ServeDir::new(&config.storage.static_dir));

    let signed_in = Router::new()
        // Pages
        .route("/", get(pages::index).post(pages::search))
        .route("/estantes", get(shelves::list_shelves))
        // REST API
        .route("/products", get(api::list_products))
        .route("/product/{id}", get(api::get_product))
        .route("/cabinets", get(api::list_cabinets))
        .route_layer(from_fn_with_state(Arc::clone(&state), require_auth));

    let admin = Router::new()
        // Items
        .route("/novo", get(pages::new_item_page).post(pages::create_item))
        .route("/editar", get(pages::edit_item_page).post(pages::update_item))
        .route("/deletar", get(pages::delete_item))
        // Shelves
        .route("/estantes/nova", post(shelves::add_shelf))
        .route("/estantes/renomear", post(shelves::rename_shelf))
        .route("/estantes/deletar", post(shelves::delete_shelf))
        // Accounts
        .route("/usuarios", get(accounts::list_users))
        .route("/usuarios/novo", post(accounts::create_user))
        .route("/usuarios/deletar", get(accounts::delete_user))
        // REST API
        .route("/product", post(api::create_product))
        .route(
            "/product/{id}",
            put(api::update_product).delete(api::delete_product),
        )
        .route_layer(from_fn_with_state(Role::Admin, require_role))
        .route_layer(from_fn_with_state(Arc::clone(&state), require_auth));

    public
        .merge(signed_in)
        .merge(admin)
        .layer(DefaultBodyLimit::max(config.storage.max_upload_bytes))
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
