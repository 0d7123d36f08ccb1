//! Shared harness for the engine integration tests: a throwaway sqlite database per test, the two
//! engine APIs wired to it, and a recording realtime-push double.

pub mod prepare_env;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::*;
use serde_json::Value;
use settlement_engine::{
    db_types::{NewUserProfile, UserId},
    events::EventProducers,
    traits::{RealtimePush, SideEffects},
    MarketplaceDatabase,
    OfferFlowApi,
    SettlementApi,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::support::prepare_env::{prepare_test_env, random_db_path};

/// A [`RealtimePush`] that records every push for later assertions.
#[derive(Clone, Default)]
pub struct RecordingPush {
    pushes: Arc<Mutex<Vec<(UserId, String, Value)>>>,
}

impl RecordingPush {
    pub fn pushes_for(&self, user: UserId) -> Vec<(String, Value)> {
        self.pushes
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _, _)| *u == user)
            .map(|(_, event, payload)| (event.clone(), payload.clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.pushes.lock().unwrap().len()
    }
}

#[async_trait]
impl RealtimePush for RecordingPush {
    async fn push_to_user(&self, user_id: UserId, event: &str, payload: Value) {
        self.pushes.lock().unwrap().push((user_id, event.to_string(), payload));
    }
}

pub struct TestEngine {
    pub db: SqliteDatabase,
    pub offers: OfferFlowApi<SqliteDatabase>,
    pub settlement: SettlementApi<SqliteDatabase>,
    pub push: RecordingPush,
}

/// Creates a fresh migrated database and both engine APIs on top of it. The sqlite backend serves
/// as the notification sink, chat store and user directory, exactly as it does in production.
pub async fn new_engine() -> TestEngine {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    engine_on(db, EventProducers::default())
}

pub fn engine_on(db: SqliteDatabase, producers: EventProducers) -> TestEngine {
    let push = RecordingPush::default();
    let side_effects = SideEffects::new(
        Arc::new(db.clone()),
        Arc::new(db.clone()),
        Arc::new(push.clone()),
        Arc::new(db.clone()),
    );
    let offers = OfferFlowApi::new(db.clone(), side_effects.clone(), producers.clone());
    let settlement = SettlementApi::new(db.clone(), side_effects, producers);
    TestEngine { db, offers, settlement, push }
}

pub async fn tear_down(engine: TestEngine) {
    let TestEngine { mut db, offers, settlement, .. } = engine;
    drop((offers, settlement));
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}

pub async fn seed_user(db: &SqliteDatabase, name: &str) -> UserId {
    let profile = NewUserProfile::new(name, format!("{name}@example.com"));
    db.insert_user(profile).await.expect("Error creating user")
}

/// A listing window that started `started_hours_ago` hours ago and ends `ends_in_hours` hours from
/// now. Negative `ends_in_hours` makes a listing that is already due for settlement.
pub fn window(started_hours_ago: i64, ends_in_hours: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    (now - Duration::hours(started_hours_ago), now + Duration::hours(ends_in_hours))
}
