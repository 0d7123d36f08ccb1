use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Chat, UserId},
};

pub async fn insert_chat(
    user_a: UserId,
    user_b: UserId,
    conn: &mut SqliteConnection,
) -> Result<Chat, SqliteDatabaseError> {
    let chat = sqlx::query_as::<_, Chat>(
        r#"
            INSERT INTO chats (user_a, user_b)
            VALUES ($1, $2)
            RETURNING id, user_a, user_b, created_at;
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Chat #{} created between {user_a} and {user_b}", chat.id);
    Ok(chat)
}

pub async fn fetch_chats_for_user(user: UserId, conn: &mut SqliteConnection) -> Result<Vec<Chat>, SqliteDatabaseError> {
    let chats = sqlx::query_as::<_, Chat>(
        "SELECT id, user_a, user_b, created_at FROM chats WHERE user_a = $1 OR user_b = $2 ORDER BY created_at ASC",
    )
    .bind(user)
    .bind(user)
    .fetch_all(conn)
    .await?;
    Ok(chats)
}
