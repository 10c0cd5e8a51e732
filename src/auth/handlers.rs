use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::auth::dto::{LoginRequest, LoginResponse, RegisterForm, RegisterResponse};
use crate::auth::jwt::{CurrentToken, JwtKeys};
use crate::auth::{password, repo};
use crate::error::{ApiError, ValidationErrors};
use crate::state::AppState;
use crate::uploads::{self, FormData};
use crate::users::dto::UserOut;
use crate::users::repo as users_repo;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
}

#[instrument(skip(state, multipart))]
pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let mut form = FormData::read(multipart).await?;
    let form = RegisterForm::from_form(&mut form);

    let mut errors = ValidationErrors::new();
    let dob = form.validate(&mut errors);

    if !form.username.trim().is_empty()
        && users_repo::username_taken(&state.db, &form.username, None).await?
    {
        errors.add("username", "The username has already been taken.");
    }
    if !form.email.trim().is_empty() && users_repo::email_taken(&state.db, &form.email, None).await?
    {
        errors.add("email", "The email has already been taken.");
    }
    errors.into_result()?;

    let dob = dob.ok_or_else(|| anyhow::anyhow!("dob unset after validation"))?;
    let password_hash = password::hash_password(&form.password)?;

    let profile_picture = match &form.profile_picture {
        Some(image) => {
            Some(uploads::store_image(state.storage.as_ref(), "profiles", image).await?)
        }
        None => None,
    };

    let user = users_repo::create(
        &state.db,
        users_repo::NewUser {
            name: form.name,
            username: form.username,
            email: form.email,
            password_hash,
            phone_num: form.phone_num,
            dob,
            gender: form.gender,
            bio: form.bio,
            profile_picture,
        },
    )
    .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful. Please login to continue.",
            user: UserOut::from_user(&user, state.storage.as_ref()),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.validate().into_result()?;

    let Some(user) = users_repo::find_by_username(&state.db, &payload.username).await? else {
        warn!(username = %payload.username, "login with unknown username");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    };

    if !password::verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let token_id = repo::create_token(&state.db, user.id).await?;
    let token = JwtKeys::from_ref(&state).sign(user.id, token_id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        user: UserOut::from_user(&user, state.storage.as_ref()),
        token,
    }))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    CurrentToken(token_id): CurrentToken,
) -> Result<Json<serde_json::Value>, ApiError> {
    repo::delete_token(&state.db, token_id).await?;
    info!(token_id = %token_id, "token revoked");
    Ok(Json(json!({ "message": "Logged out" })))
}
