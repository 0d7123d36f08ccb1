//! Event hook delivery: subscribers must see every offer, bid and settlement exactly once.

use std::{
    future::Future,
    pin::Pin,
    sync::{atomic::AtomicI32, Arc},
};

use log::*;
use mkt_common::Money;
use settlement_engine::{
    db_types::{NewAuction, NewTender},
    events::{EventHandlers, EventHooks},
    MarketplaceDatabase,
    SqliteDatabase,
};
use tokio::runtime::Runtime;

mod support;

use support::{
    engine_on,
    prepare_env::{prepare_test_env, random_db_path},
    seed_user,
    tear_down,
    window,
};

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(std::sync::atomic::Ordering::Relaxed)
    }
}

fn boxed() -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async {})
}

#[test]
fn hooks_fire_for_offers_bids_and_settlements() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let rt = Runtime::new().unwrap();
    let offers_seen = HookCalled::default();
    let bids_seen = HookCalled::default();
    let settlements_seen = HookCalled::default();
    let (o, b, s) = (offers_seen.clone(), bids_seen.clone(), settlements_seen.clone());
    rt.block_on(async move {
        let mut hooks = EventHooks::default();
        hooks
            .on_offer_placed(move |ev| {
                info!("🪝️ offer placed: {:?}", ev.offer.id);
                o.called();
                boxed()
            })
            .on_bid_placed(move |ev| {
                info!("🪝️ bid placed: {:?}", ev.bid.id);
                b.called();
                boxed()
            })
            .on_listing_settled(move |ev| {
                info!("🪝️ listing #{} settled: {:?}", ev.listing_id, ev.outcome);
                s.called();
                boxed()
            });
        let handlers = EventHandlers::new(10, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;

        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let engine = engine_on(db, producers);
        let owner = seed_user(&engine.db, "olivia").await;
        let alice = seed_user(&engine.db, "alice").await;
        let (start, end) = window(10, 1);
        let auction = engine
            .db
            .insert_auction(NewAuction::new(owner, "Hook auction", Money::from_units(50), start, end))
            .await
            .unwrap();
        let tender = engine
            .db
            .insert_tender(NewTender::new(owner, "Hook tender", Money::from_units(500), start, end))
            .await
            .unwrap();
        engine.offers.place_offer(auction, alice, Money::from_units(100)).await.unwrap();
        engine.offers.place_offer(auction, alice, Money::from_units(120)).await.unwrap();
        engine.offers.place_bid(tender, alice, Money::from_units(300), "hook bid").await.unwrap();
        engine.settlement.settle_auction(auction).await.unwrap();
        engine.settlement.settle_tender(tender).await.unwrap();
        tear_down(engine).await;

        // dropping the APIs closed the producer channels; give the handlers a moment to drain
        tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;
    });
    assert_eq!(offers_seen.count(), 2);
    assert_eq!(bids_seen.count(), 1);
    assert_eq!(settlements_seen.count(), 2);
    info!("🪝️ test complete");
}
