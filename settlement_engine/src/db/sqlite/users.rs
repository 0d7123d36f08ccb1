use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewUserProfile, UserId, UserProfile},
};

pub async fn insert_user(profile: NewUserProfile, conn: &mut SqliteConnection) -> Result<UserId, SqliteDatabaseError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (display_name, email) VALUES ($1, $2) RETURNING id",
    )
    .bind(&profile.display_name)
    .bind(&profile.email)
    .fetch_one(conn)
    .await?;
    Ok(UserId(id))
}

pub async fn fetch_user(id: UserId, conn: &mut SqliteConnection) -> Result<Option<UserProfile>, SqliteDatabaseError> {
    let profile = sqlx::query_as::<_, UserProfile>("SELECT id, display_name, email FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(profile)
}
