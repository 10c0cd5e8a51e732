use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::likes::repo::LikeWithUser;
use crate::storage::StorageClient;
use crate::users::dto::UserOut;

#[derive(Debug, Serialize)]
pub struct LikeOut {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user: UserOut,
}

impl LikeOut {
    pub fn from_row(row: &LikeWithUser, storage: &dyn StorageClient) -> Self {
        Self {
            id: row.like_id,
            user_id: row.like_user_id,
            post_id: row.like_post_id,
            created_at: row.like_created_at,
            user: UserOut::from_user(&row.user, storage),
        }
    }
}
