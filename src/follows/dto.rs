use serde::Serialize;

use crate::follows::repo::UserWithFollow;
use crate::storage::StorageClient;
use crate::users::dto::UserOut;

/// List-entry view: the user plus the viewer's follow state as 0/1.
#[derive(Debug, Serialize)]
pub struct UserWithFollowOut {
    #[serde(flatten)]
    pub user: UserOut,
    pub is_followed: i64,
}

impl UserWithFollowOut {
    pub fn from_row(row: &UserWithFollow, storage: &dyn StorageClient) -> Self {
        Self {
            user: UserOut::from_user(&row.user, storage),
            is_followed: row.is_followed as i64,
        }
    }
}

pub fn map_rows(rows: &[UserWithFollow], storage: &dyn StorageClient) -> Vec<UserWithFollowOut> {
    rows.iter()
        .map(|row| UserWithFollowOut::from_row(row, storage))
        .collect()
}
