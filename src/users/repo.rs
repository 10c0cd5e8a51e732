use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// User record in the database. The hash and the raw picture key never leave
/// the server; responses go through `UserOut`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone_num: Option<String>,
    pub dob: Date,
    pub gender: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: OffsetDateTime,
}

pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone_num: Option<String>,
    pub dob: Date,
    pub gender: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_by_ids(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(db)
        .await?;
    Ok(users)
}

/// Uniqueness check; `exclude` skips a row (the caller's own on update).
pub async fn username_taken(
    db: &PgPool,
    username: &str,
    exclude: Option<Uuid>,
) -> anyhow::Result<bool> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(username)
    .bind(exclude)
    .fetch_one(db)
    .await?;
    Ok(taken)
}

pub async fn email_taken(db: &PgPool, email: &str, exclude: Option<Uuid>) -> anyhow::Result<bool> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(email)
    .bind(exclude)
    .fetch_one(db)
    .await?;
    Ok(taken)
}

pub async fn create(db: &PgPool, new: NewUser) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, username, email, password_hash, phone_num, dob, gender, bio, profile_picture)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(&new.name)
    .bind(&new.username)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(&new.phone_num)
    .bind(new.dob)
    .bind(&new.gender)
    .bind(&new.bio)
    .bind(&new.profile_picture)
    .fetch_one(db)
    .await?;
    Ok(user)
}

/// Persists the mutable profile columns of an already-loaded record.
pub async fn update(db: &PgPool, user: &User) -> anyhow::Result<User> {
    let updated = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET name = $1, username = $2, email = $3, phone_num = $4,
            dob = $5, gender = $6, bio = $7, profile_picture = $8
        WHERE id = $9
        RETURNING *
        "#,
    )
    .bind(&user.name)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.phone_num)
    .bind(user.dob)
    .bind(&user.gender)
    .bind(&user.bio)
    .bind(&user.profile_picture)
    .bind(user.id)
    .fetch_one(db)
    .await?;
    Ok(updated)
}

pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
