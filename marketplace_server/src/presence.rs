//! Tracks which users currently hold a live connection to this server instance.
//!
//! The settlement engine pushes realtime events through the [`RealtimePush`] seam. This registry
//! is the server-side implementation: each connected user owns an unbounded channel, and a push to
//! a user without a registered channel is silently dropped. The persisted notification is the
//! durable record; the push is only a latency optimisation.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use log::*;
use serde_json::{json, Value};
use settlement_engine::{db_types::UserId, traits::RealtimePush};
use tokio::sync::mpsc;

#[derive(Clone, Default)]
pub struct PresenceRegistry {
    connections: Arc<RwLock<HashMap<UserId, mpsc::UnboundedSender<Value>>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a live connection for `user_id` and returns the receiving half. A second
    /// registration replaces the first; the old receiver starts reporting disconnection.
    pub fn register(&self, user_id: UserId) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        let old = self.connections.write().unwrap().insert(user_id, tx);
        if old.is_some() {
            debug!("📡️ User {user_id} reconnected, replacing the previous connection");
        }
        rx
    }

    pub fn unregister(&self, user_id: UserId) {
        self.connections.write().unwrap().remove(&user_id);
    }

    pub fn is_connected(&self, user_id: UserId) -> bool {
        self.connections.read().unwrap().contains_key(&user_id)
    }

    pub fn connected_count(&self) -> usize {
        self.connections.read().unwrap().len()
    }
}

#[async_trait]
impl RealtimePush for PresenceRegistry {
    async fn push_to_user(&self, user_id: UserId, event: &str, payload: Value) {
        let message = json!({ "event": event, "data": payload });
        let sender = self.connections.read().unwrap().get(&user_id).cloned();
        match sender {
            Some(tx) => {
                if tx.send(message).is_err() {
                    debug!("📡️ User {user_id} disconnected mid-push, dropping the connection");
                    self.unregister(user_id);
                }
            },
            None => trace!("📡️ User {user_id} is not connected, skipping {event} push"),
        }
    }
}
