use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use slate_engine::EngineError;
use slate_types::status::{LifecycleEvent, PostStatus};

/// The API error taxonomy. Persistence failures are caught here at the
/// boundary and mapped; nothing is silently swallowed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("username or email already taken")]
    DuplicateUser,

    #[error("{0} not found")]
    NotFound(String),

    #[error("placement already exists for this media and platform")]
    DuplicatePlacement,

    #[error("placement in status '{from}' does not accept event '{event}'")]
    InvalidTransition {
        from: PostStatus,
        event: LifecycleEvent,
    },

    #[error("placement is not posted; interactions require a posted placement")]
    PlacementNotPosted,

    #[error("placement was modified concurrently; retry")]
    Conflict,

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::DuplicateUser => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicatePlacement
            | ApiError::InvalidTransition { .. }
            | ApiError::PlacementNotPosted
            | ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Log the cause of 500s; the client only ever sees the generic text.
        if let ApiError::Internal(e) = &self {
            error!("Internal error: {:#}", e);
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::PlacementNotFound(id) => ApiError::NotFound(format!("placement {id}")),
            EngineError::InteractionTypeNotFound(id) => {
                ApiError::NotFound(format!("interaction type {id}"))
            }
            EngineError::InvalidTransition { from, event } => {
                ApiError::InvalidTransition { from, event }
            }
            EngineError::NotPosted(_) => ApiError::PlacementNotPosted,
            EngineError::Conflict(_) => ApiError::Conflict,
            EngineError::Db(e) => ApiError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(ApiError::DuplicateUser.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Validation("too short".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("media 7".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InvalidTransition {
                from: PostStatus::Posted,
                event: LifecycleEvent::Reject,
            }
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::PlacementNotPosted.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::DuplicatePlacement.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("db exploded")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn engine_errors_translate() {
        let e: ApiError = EngineError::PlacementNotFound(3).into();
        assert_eq!(e.status(), StatusCode::NOT_FOUND);

        let e: ApiError = EngineError::NotPosted(3).into();
        assert_eq!(e.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_error_hides_detail() {
        let e = ApiError::Internal(anyhow::anyhow!("UNIQUE constraint failed: users.email"));
        assert_eq!(e.to_string(), "internal server error");
    }
}
