use std::collections::HashMap;

use anyhow::anyhow;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::error::{ApiError, ValidationErrors};
use crate::likes::dto::LikeOut;
use crate::likes::repo as likes_repo;
use crate::likes::repo::LikeWithUser;
use crate::posts::dto::PostOut;
use crate::posts::repo::{self, Post};
use crate::state::AppState;
use crate::uploads::{self, validate_image, FormData};
use crate::users::dto::UserOut;
use crate::users::repo as users_repo;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(index).post(store))
        .route("/posts/:id", delete(destroy))
        .route("/user-posts", get(user_posts))
        .route("/users/:id/posts", get(posts_of_user))
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
}

/// Batch-loads authors and likes for a page of posts and assembles the
/// response views in one pass.
async fn annotate(
    state: &AppState,
    posts: Vec<Post>,
    viewer_id: Uuid,
) -> anyhow::Result<Vec<PostOut>> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let mut author_ids: Vec<Uuid> = posts.iter().map(|p| p.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<Uuid, users_repo::User> =
        users_repo::find_by_ids(&state.db, &author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

    let mut likes_by_post: HashMap<Uuid, Vec<LikeWithUser>> = HashMap::new();
    for like in likes_repo::for_posts(&state.db, &post_ids).await? {
        likes_by_post.entry(like.like_post_id).or_default().push(like);
    }

    posts
        .into_iter()
        .map(|post| {
            let author = authors
                .get(&post.user_id)
                .ok_or_else(|| anyhow!("author {} missing for post {}", post.user_id, post.id))?;
            let likes = likes_by_post.remove(&post.id).unwrap_or_default();
            let user_liked = likes.iter().any(|l| l.like_user_id == viewer_id);
            Ok(PostOut {
                id: post.id,
                user_id: post.user_id,
                content: post.content,
                image_url: post
                    .image
                    .as_deref()
                    .map(|key| state.storage.public_url(key)),
                image: post.image,
                created_at: post.created_at,
                user: UserOut::from_user(author, state.storage.as_ref()),
                likes: likes
                    .iter()
                    .map(|l| LikeOut::from_row(l, state.storage.as_ref()))
                    .collect(),
                user_liked,
            })
        })
        .collect()
}

#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
) -> Result<Json<Vec<PostOut>>, ApiError> {
    let posts = repo::feed_for(&state.db, viewer_id).await?;
    let out = annotate(&state, posts, viewer_id).await?;
    Ok(Json(out))
}

#[instrument(skip(state))]
pub async fn user_posts(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
) -> Result<Json<Vec<PostOut>>, ApiError> {
    let posts = repo::list_by_user(&state.db, viewer_id).await?;
    let out = annotate(&state, posts, viewer_id).await?;
    Ok(Json(out))
}

#[instrument(skip(state))]
pub async fn posts_of_user(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PostOut>>, ApiError> {
    let user = users_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    let posts = repo::list_by_user(&state.db, user.id).await?;
    let out = annotate(&state, posts, viewer_id).await?;
    Ok(Json(out))
}

#[instrument(skip(state, multipart))]
pub async fn store(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PostOut>), ApiError> {
    let mut form = FormData::read(multipart).await?;
    let content = form.take_text("content").unwrap_or_default();
    let image = form.take_file("image");

    let mut errors = ValidationErrors::new();
    if content.trim().is_empty() {
        errors.add("content", "The content field is required.");
    }
    if let Some(image) = &image {
        validate_image("image", image, &mut errors);
    }
    errors.into_result()?;

    let author = users_repo::find_by_id(&state.db, viewer_id)
        .await?
        .ok_or(ApiError::Unauthorized("Invalid or expired token"))?;

    let image_key = match &image {
        Some(image) => Some(uploads::store_image(state.storage.as_ref(), "posts", image).await?),
        None => None,
    };

    let post = repo::create(&state.db, author.id, &content, image_key.as_deref()).await?;
    info!(post_id = %post.id, user_id = %author.id, "post created");

    let out = PostOut {
        id: post.id,
        user_id: post.user_id,
        content: post.content,
        image_url: post
            .image
            .as_deref()
            .map(|key| state.storage.public_url(key)),
        image: post.image,
        created_at: post.created_at,
        user: UserOut::from_user(&author, state.storage.as_ref()),
        likes: Vec::new(),
        user_liked: false,
    };
    Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let post = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Post not found"))?;

    if post.user_id != viewer_id {
        return Err(ApiError::Forbidden("Unauthorized"));
    }

    if let Some(key) = &post.image {
        state.storage.delete_object(key).await?;
    }
    repo::delete(&state.db, post.id).await?;

    info!(post_id = %post.id, user_id = %viewer_id, "post deleted");
    Ok(Json(json!({ "message": "Post deleted" })))
}
