use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::users::repo::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Followed,
    Unfollowed,
}

impl ToggleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleOutcome::Followed => "followed",
            ToggleOutcome::Unfollowed => "unfollowed",
        }
    }
}

/// Flips the edge inside one transaction. The composite primary key plus
/// `ON CONFLICT DO NOTHING` keeps concurrent duplicate toggles from ever
/// creating a second edge.
pub async fn toggle(
    db: &PgPool,
    follower_id: Uuid,
    followed_id: Uuid,
) -> anyhow::Result<ToggleOutcome> {
    let mut tx = db.begin().await?;

    let deleted = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
        .bind(follower_id)
        .bind(followed_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let outcome = if deleted > 0 {
        ToggleOutcome::Unfollowed
    } else {
        sqlx::query(
            "INSERT INTO follows (follower_id, followed_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&mut *tx)
        .await?;
        ToggleOutcome::Followed
    };

    tx.commit().await?;
    Ok(outcome)
}

pub async fn edge_exists(
    db: &PgPool,
    follower_id: Uuid,
    followed_id: Uuid,
) -> anyhow::Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2)",
    )
    .bind(follower_id)
    .bind(followed_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

pub async fn followers_count(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE followed_id = $1")
            .bind(user_id)
            .fetch_one(db)
            .await?;
    Ok(count)
}

pub async fn following_count(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
            .bind(user_id)
            .fetch_one(db)
            .await?;
    Ok(count)
}

/// A user row annotated with whether the viewer follows them.
#[derive(Debug, FromRow)]
pub struct UserWithFollow {
    #[sqlx(flatten)]
    pub user: User,
    pub is_followed: bool,
}

pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Prefix search on username, viewer excluded, followed users first.
pub async fn search(db: &PgPool, viewer_id: Uuid, query: &str) -> anyhow::Result<Vec<UserWithFollow>> {
    let pattern = format!("{}%", escape_like(query));
    let rows = sqlx::query_as::<_, UserWithFollow>(
        r#"
        SELECT u.*,
               EXISTS(SELECT 1 FROM follows f
                      WHERE f.follower_id = $2 AND f.followed_id = u.id) AS is_followed
        FROM users u
        WHERE u.username LIKE $1 AND u.id <> $2
        ORDER BY is_followed DESC, u.username ASC
        "#,
    )
    .bind(&pattern)
    .bind(viewer_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn following(db: &PgPool, viewer_id: Uuid) -> anyhow::Result<Vec<UserWithFollow>> {
    let rows = sqlx::query_as::<_, UserWithFollow>(
        r#"
        SELECT u.*, TRUE AS is_followed
        FROM users u
        JOIN follows f ON f.followed_id = u.id
        WHERE f.follower_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(viewer_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// People following the viewer, each flagged with whether the viewer
/// follows them back.
pub async fn followers(db: &PgPool, viewer_id: Uuid) -> anyhow::Result<Vec<UserWithFollow>> {
    let rows = sqlx::query_as::<_, UserWithFollow>(
        r#"
        SELECT u.*,
               EXISTS(SELECT 1 FROM follows b
                      WHERE b.follower_id = $1 AND b.followed_id = u.id) AS is_followed
        FROM users u
        JOIN follows f ON f.follower_id = u.id
        WHERE f.followed_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(viewer_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Followers with no outgoing edge back to them: follow-back candidates.
pub async fn follow_back(db: &PgPool, viewer_id: Uuid) -> anyhow::Result<Vec<UserWithFollow>> {
    let rows = sqlx::query_as::<_, UserWithFollow>(
        r#"
        SELECT u.*, FALSE AS is_followed
        FROM users u
        JOIN follows f ON f.follower_id = u.id
        WHERE f.followed_id = $1
          AND NOT EXISTS(SELECT 1 FROM follows b
                         WHERE b.follower_id = $1 AND b.followed_id = u.id)
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(viewer_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// The 20 newest accounts the viewer does not follow yet.
pub async fn explore(db: &PgPool, viewer_id: Uuid) -> anyhow::Result<Vec<UserWithFollow>> {
    let rows = sqlx::query_as::<_, UserWithFollow>(
        r#"
        SELECT u.*, FALSE AS is_followed
        FROM users u
        WHERE u.id <> $1
          AND NOT EXISTS(SELECT 1 FROM follows f
                         WHERE f.follower_id = $1 AND f.followed_id = u.id)
        ORDER BY u.created_at DESC, u.id DESC
        LIMIT 20
        "#,
    )
    .bind(viewer_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_outcome_labels() {
        assert_eq!(ToggleOutcome::Followed.as_str(), "followed");
        assert_eq!(ToggleOutcome::Unfollowed.as_str(), "unfollowed");
    }

    #[test]
    fn escape_like_neutralizes_metacharacters() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
