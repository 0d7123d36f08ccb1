use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::db_types::{Chat, NewNotification, Notification, UserId, UserProfile};

#[derive(Debug, Clone, Error)]
pub enum SideEffectError {
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Persists a notification for later retrieval by the recipient's inbox.
///
/// Settlement treats every call as best-effort: a failure here is logged and swallowed and must
/// never abort a settlement decision that has already been committed.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: NewNotification) -> Result<Notification, SideEffectError>;
}

/// Creates the winner↔owner communication channel after a sale or award.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_chat(&self, user_a: UserId, user_b: UserId) -> Result<Chat, SideEffectError>;
}

/// Live push to a connected user. Fire-and-forget: an offline recipient silently misses the push
/// and relies on the persisted notification instead.
#[async_trait]
pub trait RealtimePush: Send + Sync {
    async fn push_to_user(&self, user_id: UserId, event: &str, payload: Value);
}

/// Resolves display identity for notification payloads. Lookup failures degrade to placeholder
/// text; they never block settlement.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn profile(&self, user_id: UserId) -> Result<Option<UserProfile>, SideEffectError>;
}

/// A [`RealtimePush`] that drops everything. Used in tests and in headless deployments that rely
/// on persisted notifications only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPush;

#[async_trait]
impl RealtimePush for NullPush {
    async fn push_to_user(&self, _user_id: UserId, _event: &str, _payload: Value) {}
}

/// The bundle of collaborators the settlement pipeline fans out to.
#[derive(Clone)]
pub struct SideEffects {
    pub notifications: Arc<dyn NotificationSink>,
    pub chats: Arc<dyn ChatStore>,
    pub realtime: Arc<dyn RealtimePush>,
    pub users: Arc<dyn UserDirectory>,
}

impl SideEffects {
    pub fn new(
        notifications: Arc<dyn NotificationSink>,
        chats: Arc<dyn ChatStore>,
        realtime: Arc<dyn RealtimePush>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self { notifications, chats, realtime, users }
    }

    /// Display name for a user, falling back to a placeholder when the directory cannot resolve
    /// the id.
    pub async fn display_name(&self, user_id: UserId) -> String {
        match self.users.profile(user_id).await {
            Ok(Some(profile)) => profile.display_name,
            Ok(None) => format!("participant {user_id}"),
            Err(e) => {
                log::warn!("👤️ Could not resolve user {user_id} for a notification payload: {e}");
                format!("participant {user_id}")
            },
        }
    }
}
