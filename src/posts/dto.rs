use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::likes::dto::LikeOut;
use crate::users::dto::UserOut;

/// Post view: the row plus its author, likes, a derived image URL (the
/// stored key stays alongside it) and the viewer's like state.
#[derive(Debug, Serialize)]
pub struct PostOut {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub image: Option<String>,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user: UserOut,
    pub likes: Vec<LikeOut>,
    pub user_liked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::users::repo::User;
    use time::macros::{date, datetime};

    #[tokio::test]
    async fn post_out_keeps_key_and_derived_url_side_by_side() {
        let state = AppState::fake();
        let author = User {
            id: Uuid::new_v4(),
            name: "Bob".into(),
            username: "bob".into(),
            email: "bob@example.com".into(),
            password_hash: "hash".into(),
            phone_num: None,
            dob: date!(1990 - 01 - 01),
            gender: "Male".into(),
            bio: None,
            profile_picture: None,
            created_at: datetime!(2026-01-01 00:00 UTC),
        };
        let out = PostOut {
            id: Uuid::new_v4(),
            user_id: author.id,
            content: "hello".into(),
            image: Some("posts/pic.jpg".into()),
            image_url: Some(state.storage.public_url("posts/pic.jpg")),
            created_at: datetime!(2026-02-01 12:00 UTC),
            user: UserOut::from_user(&author, state.storage.as_ref()),
            likes: vec![],
            user_liked: false,
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["image"], "posts/pic.jpg");
        assert_eq!(json["image_url"], "https://fake.local/mingle/posts/pic.jpg");
        assert_eq!(json["user"]["username"], "bob");
        assert_eq!(json["user_liked"], false);
        assert!(json["likes"].as_array().unwrap().is_empty());
    }
}
