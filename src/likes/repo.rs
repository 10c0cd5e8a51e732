use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Liked,
    Unliked,
}

impl ToggleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleOutcome::Liked => "liked",
            ToggleOutcome::Unliked => "unliked",
        }
    }
}

/// Same transactional flip as follow-toggle; the (user_id, post_id) unique
/// key absorbs concurrent duplicate likes.
pub async fn toggle(db: &PgPool, user_id: Uuid, post_id: Uuid) -> anyhow::Result<ToggleOutcome> {
    let mut tx = db.begin().await?;

    let deleted = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let outcome = if deleted > 0 {
        ToggleOutcome::Unliked
    } else {
        sqlx::query(
            r#"
            INSERT INTO likes (id, user_id, post_id) VALUES ($1, $2, $3)
            ON CONFLICT (user_id, post_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
        ToggleOutcome::Liked
    };

    tx.commit().await?;
    Ok(outcome)
}

/// A like joined with its user. Like columns are aliased so the flattened
/// user row keeps its own names.
#[derive(Debug, FromRow)]
pub struct LikeWithUser {
    pub like_id: Uuid,
    pub like_user_id: Uuid,
    pub like_post_id: Uuid,
    pub like_created_at: OffsetDateTime,
    #[sqlx(flatten)]
    pub user: User,
}

pub async fn for_post(db: &PgPool, post_id: Uuid) -> anyhow::Result<Vec<LikeWithUser>> {
    let rows = sqlx::query_as::<_, LikeWithUser>(
        r#"
        SELECT l.id AS like_id, l.user_id AS like_user_id,
               l.post_id AS like_post_id, l.created_at AS like_created_at,
               u.*
        FROM likes l
        JOIN users u ON u.id = l.user_id
        WHERE l.post_id = $1
        ORDER BY l.created_at ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn for_posts(db: &PgPool, post_ids: &[Uuid]) -> anyhow::Result<Vec<LikeWithUser>> {
    let rows = sqlx::query_as::<_, LikeWithUser>(
        r#"
        SELECT l.id AS like_id, l.user_id AS like_user_id,
               l.post_id AS like_post_id, l.created_at AS like_created_at,
               u.*
        FROM likes l
        JOIN users u ON u.id = l.user_id
        WHERE l.post_id = ANY($1)
        ORDER BY l.created_at ASC
        "#,
    )
    .bind(post_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_outcome_labels() {
        assert_eq!(ToggleOutcome::Liked.as_str(), "liked");
        assert_eq!(ToggleOutcome::Unliked.as_str(), "unliked");
    }
}
