use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use slate_types::api::CreatePlatformRequest;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn create_platform(
    State(state): State<AppState>,
    Json(req): Json<CreatePlatformRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.label.is_empty() {
        return Err(ApiError::Validation("label must not be empty".into()));
    }

    if state.db.platform_exists(&req.label)? {
        return Err(ApiError::Validation(format!(
            "platform '{}' already exists",
            req.label
        )));
    }

    let platform = state.db.create_platform(&req.label)?;
    Ok((StatusCode::CREATED, Json(platform)))
}

pub async fn list_platforms(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let platforms = state.db.list_platforms()?;
    Ok(Json(platforms))
}
