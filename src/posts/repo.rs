use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Feed: the viewer's own posts plus posts of everyone they follow,
/// newest first.
pub async fn feed_for(db: &PgPool, viewer_id: Uuid) -> anyhow::Result<Vec<Post>> {
    let rows = sqlx::query_as::<_, Post>(
        r#"
        SELECT * FROM posts
        WHERE user_id = $1
           OR user_id IN (SELECT followed_id FROM follows WHERE follower_id = $1)
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(viewer_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Post>> {
    let rows = sqlx::query_as::<_, Post>(
        "SELECT * FROM posts WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(post)
}

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    content: &str,
    image: Option<&str>,
) -> anyhow::Result<Post> {
    let post = sqlx::query_as::<_, Post>(
        "INSERT INTO posts (user_id, content, image) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(content)
    .bind(image)
    .fetch_one(db)
    .await?;
    Ok(post)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn count_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}
