use serde::Serialize;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::storage::StorageClient;
use crate::users::repo::User;

pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value, DATE_FORMAT).ok()
}

/// Public view of a user. The password hash is never here; the picture is
/// exposed only as a derived URL, never as the raw storage key.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone_num: Option<String>,
    pub dob: String,
    pub gender: String,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UserOut {
    pub fn from_user(user: &User, storage: &dyn StorageClient) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone_num: user.phone_num.clone(),
            dob: user.dob.to_string(),
            gender: user.gender.clone(),
            bio: user.bio.clone(),
            profile_picture_url: user
                .profile_picture
                .as_deref()
                .map(|key| storage.public_url(key)),
            created_at: user.created_at,
        }
    }
}

/// `GET /users/{id}`: the user plus follow state and counters.
#[derive(Debug, Serialize)]
pub struct ProfileOut {
    #[serde(flatten)]
    pub user: UserOut,
    pub is_followed: i64,
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use time::macros::{date, datetime};

    fn fixture() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Alice Example".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
            phone_num: Some("123456789".into()),
            dob: date!(1995 - 04 - 12),
            gender: "Female".into(),
            bio: None,
            profile_picture: Some("profiles/abc.jpg".into()),
            created_at: datetime!(2026-01-15 10:00 UTC),
        }
    }

    #[tokio::test]
    async fn user_out_hides_hash_and_raw_key() {
        let state = AppState::fake();
        let out = UserOut::from_user(&fixture(), state.storage.as_ref());
        let json = serde_json::to_value(&out).unwrap();

        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("profile_picture").is_none());
        assert_eq!(
            json["profile_picture_url"],
            "https://fake.local/mingle/profiles/abc.jpg"
        );
        assert_eq!(json["dob"], "1995-04-12");
        assert_eq!(json["username"], "alice");
    }

    #[tokio::test]
    async fn missing_picture_serializes_as_null_url() {
        let state = AppState::fake();
        let mut user = fixture();
        user.profile_picture = None;
        let json =
            serde_json::to_value(UserOut::from_user(&user, state.storage.as_ref())).unwrap();
        assert!(json["profile_picture_url"].is_null());
    }

    #[tokio::test]
    async fn profile_out_flattens_user_fields() {
        let state = AppState::fake();
        let out = ProfileOut {
            user: UserOut::from_user(&fixture(), state.storage.as_ref()),
            is_followed: 1,
            posts_count: 3,
            followers_count: 2,
            following_count: 5,
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["is_followed"], 1);
        assert_eq!(json["posts_count"], 3);
    }

    #[test]
    fn parse_date_handles_valid_and_garbage() {
        assert_eq!(parse_date("1990-05-01"), Some(date!(1990 - 05 - 01)));
        assert_eq!(parse_date("01/05/1990"), None);
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("1990-13-01"), None);
    }
}
