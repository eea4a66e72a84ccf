use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use slate_types::api::{CreateMediaRequest, MediaQuery};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn create_media(
    State(state): State<AppState>,
    Json(req): Json<CreateMediaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.filepath.is_empty() {
        return Err(ApiError::Validation("filepath must not be empty".into()));
    }

    if state.db.get_user(req.user_id)?.is_none() {
        return Err(ApiError::NotFound(format!("user {}", req.user_id)));
    }
    if state.db.get_format(req.format_id)?.is_none() {
        return Err(ApiError::NotFound(format!("format {}", req.format_id)));
    }

    let media = state.db.create_media(
        &req.filepath,
        req.caption.as_deref(),
        req.user_id,
        req.format_id,
    )?;

    Ok((StatusCode::CREATED, Json(media)))
}

pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let media = state.db.list_media(query.user_id)?;
    Ok(Json(media))
}

pub async fn list_formats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let formats = state.db.list_formats()?;
    Ok(Json(formats))
}

pub async fn list_interaction_types(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let kinds = state.db.list_interaction_types()?;
    Ok(Json(kinds))
}
