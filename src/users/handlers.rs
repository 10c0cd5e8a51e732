use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::dto::is_valid_email;
use crate::auth::jwt::AuthUser;
use crate::auth::password;
use crate::error::{ApiError, ValidationErrors};
use crate::state::AppState;
use crate::uploads::{self, validate_image, FormData, UploadedImage};
use crate::users::dto::{parse_date, ProfileOut, UserOut};
use crate::users::repo;
use crate::{follows, posts};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile).put(update_profile))
        .route("/password", put(update_password))
        .route("/users/:id", get(user_profile))
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserOut>, ApiError> {
    let user = repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::Unauthorized("Invalid or expired token"))?;
    Ok(Json(UserOut::from_user(&user, state.storage.as_ref())))
}

#[instrument(skip(state))]
pub async fn user_profile(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileOut>, ApiError> {
    let user = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    let is_followed = follows::repo::edge_exists(&state.db, viewer_id, user.id).await?;
    let posts_count = posts::repo::count_by_user(&state.db, user.id).await?;
    let followers_count = follows::repo::followers_count(&state.db, user.id).await?;
    let following_count = follows::repo::following_count(&state.db, user.id).await?;

    Ok(Json(ProfileOut {
        user: UserOut::from_user(&user, state.storage.as_ref()),
        is_followed: is_followed as i64,
        posts_count,
        followers_count,
        following_count,
    }))
}

/// Profile update form: everything optional, constraints only apply to
/// fields that were sent.
pub struct UpdateProfileForm {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_num: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<UploadedImage>,
}

impl UpdateProfileForm {
    pub fn from_form(form: &mut FormData) -> Self {
        Self {
            name: form.take_text("name"),
            username: form.take_text("username"),
            email: form.take_text("email"),
            phone_num: form.take_text("phone_num").filter(|s| !s.is_empty()),
            dob: form.take_text("dob"),
            gender: form.take_text("gender"),
            bio: form.take_text("bio").filter(|s| !s.is_empty()),
            profile_picture: form.take_file("profile_picture"),
        }
    }

    pub fn validate(&self, errors: &mut ValidationErrors) -> Option<time::Date> {
        if let Some(name) = &self.name {
            if name.chars().count() > 255 {
                errors.add("name", "The name must not be greater than 255 characters.");
            }
        }
        if let Some(username) = &self.username {
            if username.chars().count() > 255 {
                errors.add(
                    "username",
                    "The username must not be greater than 255 characters.",
                );
            }
        }
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                errors.add("email", "The email must be a valid email address.");
            } else if email.chars().count() > 255 {
                errors.add("email", "The email must not be greater than 255 characters.");
            }
        }
        if let Some(phone) = &self.phone_num {
            if phone.chars().count() > 15 {
                errors.add(
                    "phone_num",
                    "The phone num must not be greater than 15 characters.",
                );
            }
        }
        let dob = self.dob.as_deref().and_then(|raw| match parse_date(raw.trim()) {
            None => {
                errors.add("dob", "The dob is not a valid date.");
                None
            }
            Some(date) if date >= OffsetDateTime::now_utc().date() => {
                errors.add("dob", "The dob must be a date before today.");
                None
            }
            Some(date) => Some(date),
        });
        if let Some(gender) = &self.gender {
            if !matches!(gender.as_str(), "Male" | "Female") {
                errors.add("gender", "The selected gender is invalid.");
            }
        }
        if let Some(bio) = &self.bio {
            if bio.chars().count() > 100 {
                errors.add("bio", "The bio must not be greater than 100 characters.");
            }
        }
        if let Some(image) = &self.profile_picture {
            validate_image("profile_picture", image, errors);
        }
        dob
    }
}

#[instrument(skip(state, multipart))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<Json<UserOut>, ApiError> {
    let mut form = FormData::read(multipart).await?;
    let form = UpdateProfileForm::from_form(&mut form);

    let mut errors = ValidationErrors::new();
    let dob = form.validate(&mut errors);

    if let Some(username) = &form.username {
        if repo::username_taken(&state.db, username, Some(user_id)).await? {
            errors.add("username", "The username has already been taken.");
        }
    }
    if let Some(email) = &form.email {
        if repo::email_taken(&state.db, email, Some(user_id)).await? {
            errors.add("email", "The email has already been taken.");
        }
    }
    errors.into_result()?;

    let mut user = repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::Unauthorized("Invalid or expired token"))?;

    if let Some(image) = &form.profile_picture {
        if let Some(old_key) = &user.profile_picture {
            state.storage.delete_object(old_key).await?;
        }
        let key = uploads::store_image(state.storage.as_ref(), "profiles", image).await?;
        user.profile_picture = Some(key);
    }

    if let Some(name) = form.name {
        user.name = name;
    }
    if let Some(username) = form.username {
        user.username = username;
    }
    if let Some(email) = form.email {
        user.email = email;
    }
    if let Some(phone) = form.phone_num {
        user.phone_num = Some(phone);
    }
    if let Some(dob) = dob {
        user.dob = dob;
    }
    if let Some(gender) = form.gender {
        user.gender = gender;
    }
    if let Some(bio) = form.bio {
        user.bio = Some(bio);
    }

    let updated = repo::update(&state.db, &user).await?;
    info!(user_id = %updated.id, "profile updated");
    Ok(Json(UserOut::from_user(&updated, state.storage.as_ref())))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

impl UpdatePasswordRequest {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.password.is_empty() {
            errors.add("password", "The password field is required.");
        } else if self.password.chars().count() < 5 {
            errors.add("password", "The password must be at least 5 characters.");
        }
        if self.password != self.password_confirmation {
            errors.add("password", "The password confirmation does not match.");
        }
        errors
    }
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    payload.validate().into_result()?;

    let hash = password::hash_password(&payload.password)?;
    repo::update_password(&state.db, user_id, &hash).await?;

    info!(user_id = %user_id, "password updated");
    Ok(Json(json!({ "message": "Password updated" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_form_skips_absent_fields() {
        let form = UpdateProfileForm {
            name: None,
            username: None,
            email: None,
            phone_num: None,
            dob: None,
            gender: None,
            bio: None,
            profile_picture: None,
        };
        let mut errors = ValidationErrors::new();
        assert_eq!(form.validate(&mut errors), None);
        assert!(errors.is_empty());
    }

    #[test]
    fn update_form_checks_present_fields() {
        let form = UpdateProfileForm {
            name: Some("x".repeat(256)),
            username: None,
            email: Some("bogus".into()),
            phone_num: None,
            dob: Some("1990-02-30".into()),
            gender: Some("Robot".into()),
            bio: None,
            profile_picture: None,
        };
        let mut errors = ValidationErrors::new();
        assert_eq!(form.validate(&mut errors), None);
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["dob", "email", "gender", "name"]
        );
    }

    #[test]
    fn password_confirmation_must_match() {
        let request = UpdatePasswordRequest {
            password: "longenough".into(),
            password_confirmation: "different".into(),
        };
        assert!(!request.validate().is_empty());

        let request = UpdatePasswordRequest {
            password: "longenough".into(),
            password_confirmation: "longenough".into(),
        };
        assert!(request.validate().is_empty());
    }

    #[test]
    fn short_password_is_rejected_even_when_confirmed() {
        let request = UpdatePasswordRequest {
            password: "abcd".into(),
            password_confirmation: "abcd".into(),
        };
        assert_eq!(
            request.validate().fields().collect::<Vec<_>>(),
            vec!["password"]
        );
    }
}
