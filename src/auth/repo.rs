use sqlx::PgPool;
use uuid::Uuid;

/// Issues a new token row and returns its id, which becomes the JWT `jti`.
pub async fn create_token(db: &PgPool, user_id: Uuid) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO auth_tokens (id, user_id) VALUES ($1, $2)")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(id)
}

pub async fn token_exists(db: &PgPool, token_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM auth_tokens WHERE id = $1 AND user_id = $2)",
    )
    .bind(token_id)
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

pub async fn delete_token(db: &PgPool, token_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM auth_tokens WHERE id = $1")
        .bind(token_id)
        .execute(db)
        .await?;
    Ok(())
}
