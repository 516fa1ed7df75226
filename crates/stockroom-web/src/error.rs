//! Error types for the web layer.
//!
//! [`WebError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. The
//! underlying error text is passed through as the payload.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use stockroom_store::StoreError;
use tracing::error;

/// Errors that can occur while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A path, query or form value was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The request conflicts with stored state (occupied location,
    /// duplicate name, shelf in use).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The session's role does not permit the request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A template failed to render.
    #[error("template error: {0}")]
    Template(String),

    /// The session store failed.
    #[error("session error: {0}")]
    Session(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WebError {
    /// HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Template(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message shown to the client.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::InvalidInput(msg)
            | Self::Conflict(msg)
            | Self::Unauthorized(msg)
            | Self::Template(msg)
            | Self::Session(msg)
            | Self::Internal(msg) => msg.clone(),
        }
    }

    /// Whether a form handler should re-render the form with this error
    /// instead of failing the request.
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::Conflict(_))
    }
}

impl From<StoreError> for WebError {
    fn from(e: StoreError) -> Self {
        let msg = e.to_string();
        match e {
            StoreError::ItemNotFound(_)
            | StoreError::ShelfNotFound(_)
            | StoreError::UserNotFound(_) => Self::NotFound(msg),
            StoreError::DuplicateLocation { .. }
            | StoreError::DuplicateShelf(_)
            | StoreError::ShelfInUse { .. }
            | StoreError::DuplicateUser(_)
            | StoreError::LastAdmin => Self::Conflict(msg),
            StoreError::Invalid(_) => Self::InvalidInput(msg),
            StoreError::Io(_)
            | StoreError::Serialization(_)
            | StoreError::PasswordHash(_)
            | StoreError::IdsExhausted => Self::Internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for WebError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let messages: Vec<String> = fields
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| {
                    err.message
                        .as_ref()
                        .map_or_else(|| format!("{field} is invalid"), ToString::to_string)
                })
            })
            .collect();
        Self::InvalidInput(messages.join("; "))
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for WebError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<minijinja::Error> for WebError {
    fn from(e: minijinja::Error) -> Self {
        Self::Template(e.to_string())
    }
}

impl From<tower_sessions::session::Error> for WebError {
    fn from(e: tower_sessions::session::Error) -> Self {
        Self::Session(e.to_string())
    }
}

impl From<tokio::task::JoinError> for WebError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("background task failed: {e}"))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "error": self.message(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use stockroom_types::{ItemId, Location};

    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let dup = WebError::from(StoreError::DuplicateLocation {
            location: Location::new("A", "1", "1"),
            occupant: ItemId(3),
        });
        assert_eq!(dup.status(), StatusCode::CONFLICT);
        assert!(dup.message().contains("A/1/1"));

        let missing = WebError::from(StoreError::ItemNotFound(ItemId(9)));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let io = WebError::from(StoreError::Io(std::io::Error::other("disk")));
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!io.is_user_error());
    }

    #[test]
    fn only_input_and_conflict_errors_rerender_forms() {
        assert!(WebError::InvalidInput("name".to_owned()).is_user_error());
        assert!(WebError::Conflict("A/1/1".to_owned()).is_user_error());
        assert!(!WebError::NotFound("item 9".to_owned()).is_user_error());
        assert!(!WebError::Unauthorized("admin".to_owned()).is_user_error());
    }
}
