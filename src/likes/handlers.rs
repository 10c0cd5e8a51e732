use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::likes::dto::LikeOut;
use crate::likes::repo;
use crate::posts::repo as posts_repo;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/like/:id", post(toggle))
        .route("/likes/:id", get(index))
}

#[instrument(skip(state))]
pub async fn toggle(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let post = posts_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Post not found"))?;

    let outcome = repo::toggle(&state.db, user_id, post.id).await?;
    info!(user_id = %user_id, post_id = %post.id, status = outcome.as_str(), "like toggled");
    Ok(Json(json!({ "status": outcome.as_str() })))
}

#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LikeOut>>, ApiError> {
    let post = posts_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Post not found"))?;

    let likes = repo::for_post(&state.db, post.id).await?;
    let out = likes
        .iter()
        .map(|like| LikeOut::from_row(like, state.storage.as_ref()))
        .collect();
    Ok(Json(out))
}
