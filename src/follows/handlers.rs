use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::follows::dto::{map_rows, UserWithFollowOut};
use crate::follows::repo;
use crate::state::AppState;
use crate::users::repo as users_repo;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/follow/:id", post(toggle))
        .route("/search", get(search))
        .route("/following", get(following))
        .route("/followers", get(followers))
        .route("/follow-back", get(follow_back))
        .route("/explore", get(explore))
}

#[instrument(skip(state))]
pub async fn toggle(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if id == viewer_id {
        return Err(ApiError::Unprocessable("Cannot follow yourself"));
    }
    let target = users_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    let outcome = repo::toggle(&state.db, viewer_id, target.id).await?;
    info!(follower = %viewer_id, followed = %target.id, status = outcome.as_str(), "follow toggled");
    Ok(Json(json!({ "status": outcome.as_str() })))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: String,
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<UserWithFollowOut>>, ApiError> {
    let rows = repo::search(&state.db, viewer_id, &params.search).await?;
    Ok(Json(map_rows(&rows, state.storage.as_ref())))
}

#[instrument(skip(state))]
pub async fn following(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
) -> Result<Json<Vec<UserWithFollowOut>>, ApiError> {
    let rows = repo::following(&state.db, viewer_id).await?;
    Ok(Json(map_rows(&rows, state.storage.as_ref())))
}

#[instrument(skip(state))]
pub async fn followers(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
) -> Result<Json<Vec<UserWithFollowOut>>, ApiError> {
    let rows = repo::followers(&state.db, viewer_id).await?;
    Ok(Json(map_rows(&rows, state.storage.as_ref())))
}

#[instrument(skip(state))]
pub async fn follow_back(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
) -> Result<Json<Vec<UserWithFollowOut>>, ApiError> {
    let rows = repo::follow_back(&state.db, viewer_id).await?;
    Ok(Json(map_rows(&rows, state.storage.as_ref())))
}

#[instrument(skip(state))]
pub async fn explore(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
) -> Result<Json<Vec<UserWithFollowOut>>, ApiError> {
    let rows = repo::explore(&state.db, viewer_id).await?;
    Ok(Json(map_rows(&rows, state.storage.as_ref())))
}
