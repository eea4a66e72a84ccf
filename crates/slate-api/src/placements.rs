use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use slate_types::api::{AdvanceRequest, PlacementQuery, RecordInteractionRequest, SchedulePlacementRequest};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /placements — bind one media item to one platform, starting in
/// SCHEDULED.
pub async fn schedule_placement(
    State(state): State<AppState>,
    Json(req): Json<SchedulePlacementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_media(req.media_id)?.is_none() {
        return Err(ApiError::NotFound(format!("media {}", req.media_id)));
    }
    if state.db.get_platform(req.platform_id)?.is_none() {
        return Err(ApiError::NotFound(format!("platform {}", req.platform_id)));
    }
    if state
        .db
        .get_placement_for_pair(req.media_id, req.platform_id)?
        .is_some()
    {
        return Err(ApiError::DuplicatePlacement);
    }

    // The UNIQUE (media, platform) constraint backstops the pre-check above
    // when two schedule requests race.
    let placement = state
        .db
        .schedule_placement(req.media_id, req.platform_id, req.scheduled_at)?
        .ok_or(ApiError::DuplicatePlacement)?;

    Ok((StatusCode::CREATED, Json(placement)))
}

pub async fn get_placement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let placement = state
        .db
        .get_placement(id)?
        .ok_or_else(|| ApiError::NotFound(format!("placement {id}")))?;
    Ok(Json(placement))
}

pub async fn list_placements(
    State(state): State<AppState>,
    Query(query): Query<PlacementQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let placements = state.db.list_placements(query.status)?;
    Ok(Json(placements))
}

/// POST /placements/{id}/advance — apply one lifecycle event. The engine
/// validates against the transition table; anything else is a 409.
pub async fn advance_placement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AdvanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let placement = state.engine.advance(id, req.event)?;
    Ok(Json(placement))
}

/// POST /placements/{id}/interactions — append a reaction. Only valid once
/// the placement is POSTED.
pub async fn record_interaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<RecordInteractionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let interaction = state.engine.record_interaction(id, req.interaction_type_id)?;
    Ok((StatusCode::CREATED, Json(interaction)))
}

pub async fn list_interactions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_placement(id)?.is_none() {
        return Err(ApiError::NotFound(format!("placement {id}")));
    }
    let interactions = state.db.list_interactions(id)?;
    Ok(Json(interactions))
}
