use sqlx::{types::Json, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewNotification, Notification, UserId},
};

const NOTIFICATION_COLUMNS: &str = "id, recipient_id, kind, title, message, payload, sender_id, sender_name, \
                                    sender_email, is_read, created_at";

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, SqliteDatabaseError> {
    let notification = sqlx::query_as::<_, Notification>(&format!(
        r#"
            INSERT INTO notifications (recipient_id, kind, title, message, payload, sender_id, sender_name, sender_email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {NOTIFICATION_COLUMNS};
        "#
    ))
    .bind(notification.recipient_id)
    .bind(notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(Json(notification.payload.clone()))
    .bind(notification.sender_id)
    .bind(&notification.sender_name)
    .bind(&notification.sender_email)
    .fetch_one(conn)
    .await?;
    Ok(notification)
}

/// A recipient's notifications, newest first.
pub async fn fetch_notifications_for_recipient(
    recipient: UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, SqliteDatabaseError> {
    let notifications = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE recipient_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(recipient)
    .fetch_all(conn)
    .await?;
    Ok(notifications)
}

pub async fn mark_notification_read(id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = $1 AND is_read = 0")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
