use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use slate_types::api::CreateUserRequest;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 155 {
        return Err(ApiError::Validation(
            "username must be 3-155 characters".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("email is not valid".into()));
    }

    if state.db.user_exists(&req.username, &req.email)? {
        return Err(ApiError::DuplicateUser);
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?
        .to_string();

    // req.created_at is ignored on purpose; creation time is server-stamped.
    // The insert can still hit the UNIQUE constraint if a concurrent create
    // raced past the pre-check; that is the same duplicate, not a 500.
    let user = state
        .db
        .create_user(&req.username, &password_hash, &req.email, req.is_admin)?
        .ok_or(ApiError::DuplicateUser)?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.db.list_users()?;
    Ok(Json(users))
}

/// Declared in the API surface but never given semantics upstream; partial
/// vs. full replace is an open contract question, so this stays a 501.
pub async fn update_user(Path(_id): Path<i64>) -> impl IntoResponse {
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(serde_json::json!({ "error": "user update is not implemented" })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use slate_db::Database;
    use slate_types::api::CreateUserRequest;

    use crate::state::{AppState, AppStateInner};

    fn test_state() -> AppState {
        let db = Arc::new(Database::open_in_memory().unwrap());
        Arc::new(AppStateInner::new(db))
    }

    fn request(username: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.into(),
            password: "long-enough-password".into(),
            email: email.into(),
            is_admin: false,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn duplicate_username_maps_to_400() {
        let state = test_state();

        create_user(State(state.clone()), Json(request("ana", "ana@example.com")))
            .await
            .unwrap();

        let err = create_user(State(state.clone()), Json(request("ana", "other@example.com")))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::DuplicateUser));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        // First user is untouched.
        let users = state.db.list_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "ana@example.com");
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let state = test_state();

        let mut req = request("ana", "ana@example.com");
        req.password = "short".into();

        let err = create_user(State(state), Json(req)).await.err().unwrap();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
