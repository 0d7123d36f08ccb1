//! Submission-path behaviour: validation, the strictly-improving price rule, and the manual
//! accept/decline flow.

use log::*;
use mkt_common::Money;
use settlement_engine::{
    db_types::{NewAuction, NewTender, NotificationKind, OfferStatus},
    MarketplaceApiError,
    MarketplaceDatabase,
};
use tokio::runtime::Runtime;

mod support;

use support::{new_engine, seed_user, tear_down, window};

#[test]
fn offers_must_strictly_improve_the_price() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let engine = new_engine().await;
        let owner = seed_user(&engine.db, "olivia").await;
        let alice = seed_user(&engine.db, "alice").await;
        let bob = seed_user(&engine.db, "bob").await;
        let (start, end) = window(1, 5);
        let auction = NewAuction::new(owner, "Bookshelf", Money::from_units(50), start, end);
        let auction_id = engine.db.insert_auction(auction).await.unwrap();

        // must beat the starting price
        let err = engine.offers.place_offer(auction_id, alice, Money::from_units(50)).await.unwrap_err();
        assert!(matches!(err, MarketplaceApiError::InvalidPrice { .. }));

        engine.offers.place_offer(auction_id, alice, Money::from_units(100)).await.unwrap();
        // equal is not an improvement
        let err = engine.offers.place_offer(auction_id, bob, Money::from_units(100)).await.unwrap_err();
        assert!(matches!(err, MarketplaceApiError::InvalidPrice { .. }));
        let err = engine.offers.place_offer(auction_id, bob, Money::from_units(90)).await.unwrap_err();
        assert!(matches!(err, MarketplaceApiError::InvalidPrice { .. }));

        engine.offers.place_offer(auction_id, bob, Money::from_units(110)).await.unwrap();
        let auction = engine.db.fetch_auction(auction_id).await.unwrap().unwrap();
        assert_eq!(auction.current_price, Money::from_units(110));
        assert_eq!(engine.db.fetch_offers(auction_id).await.unwrap().len(), 2);
        tear_down(engine).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn bids_must_strictly_undercut() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let engine = new_engine().await;
        let owner = seed_user(&engine.db, "olivia").await;
        let alice = seed_user(&engine.db, "alice").await;
        let (start, end) = window(1, 5);
        let tender = NewTender::new(owner, "House painting", Money::from_units(1000), start, end);
        let tender_id = engine.db.insert_tender(tender).await.unwrap();

        let err =
            engine.offers.place_bid(tender_id, alice, Money::from_units(1000), "At budget").await.unwrap_err();
        assert!(matches!(err, MarketplaceApiError::InvalidPrice { .. }));

        engine.offers.place_bid(tender_id, alice, Money::from_units(800), "First pass").await.unwrap();
        let err =
            engine.offers.place_bid(tender_id, alice, Money::from_units(900), "Higher").await.unwrap_err();
        assert!(matches!(err, MarketplaceApiError::InvalidPrice { .. }));

        let tender = engine.db.fetch_tender(tender_id).await.unwrap().unwrap();
        assert_eq!(tender.current_lowest_bid, Money::from_units(800));
        tear_down(engine).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn submissions_are_rejected_once_a_listing_settles() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let engine = new_engine().await;
        let owner = seed_user(&engine.db, "olivia").await;
        let alice = seed_user(&engine.db, "alice").await;
        let bob = seed_user(&engine.db, "bob").await;
        let (start, end) = window(10, 1);
        let auction = NewAuction::new(owner, "Standing desk", Money::from_units(50), start, end);
        let auction_id = engine.db.insert_auction(auction).await.unwrap();
        engine.offers.place_offer(auction_id, alice, Money::from_units(100)).await.unwrap();
        engine.settlement.settle_auction(auction_id).await.unwrap();

        let err = engine.offers.place_offer(auction_id, bob, Money::from_units(200)).await.unwrap_err();
        assert!(matches!(err, MarketplaceApiError::ListingClosed { .. }));
        tear_down(engine).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn unknown_listings_are_reported_as_not_found() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let engine = new_engine().await;
        let alice = seed_user(&engine.db, "alice").await;
        let err = engine.offers.place_offer(404, alice, Money::from_units(100)).await.unwrap_err();
        assert!(matches!(err, MarketplaceApiError::ListingNotFound(404)));
        let err = engine.offers.place_bid(404, alice, Money::from_units(100), "hello").await.unwrap_err();
        assert!(matches!(err, MarketplaceApiError::ListingNotFound(404)));
        tear_down(engine).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn submissions_notify_both_parties() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let engine = new_engine().await;
        let owner = seed_user(&engine.db, "olivia").await;
        let alice = seed_user(&engine.db, "alice").await;
        let (start, end) = window(1, 5);
        let auction = NewAuction::new(owner, "Guitar amp", Money::from_units(50), start, end);
        let auction_id = engine.db.insert_auction(auction).await.unwrap();
        engine.offers.place_offer(auction_id, alice, Money::from_units(75)).await.unwrap();

        let owner_inbox = engine.db.fetch_notifications(owner).await.unwrap();
        assert_eq!(owner_inbox.len(), 1);
        assert_eq!(owner_inbox[0].kind, NotificationKind::NewOffer);
        assert!(owner_inbox[0].message.contains("alice"));
        let offerer_inbox = engine.db.fetch_notifications(alice).await.unwrap();
        assert_eq!(offerer_inbox.len(), 1);
        assert_eq!(offerer_inbox[0].kind, NotificationKind::OfferPlaced);
        assert!(!offerer_inbox[0].is_read);

        assert!(engine.db.mark_notification_read(offerer_inbox[0].id).await.unwrap());
        let offerer_inbox = engine.db.fetch_notifications(alice).await.unwrap();
        assert!(offerer_inbox[0].is_read);
        tear_down(engine).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn owners_can_decide_an_offer_exactly_once() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let engine = new_engine().await;
        let owner = seed_user(&engine.db, "olivia").await;
        let alice = seed_user(&engine.db, "alice").await;
        let bob = seed_user(&engine.db, "bob").await;
        let (start, end) = window(1, 5);
        let auction = NewAuction::new(owner, "Kayak", Money::from_units(50), start, end);
        let auction_id = engine.db.insert_auction(auction).await.unwrap();
        let first = engine.offers.place_offer(auction_id, alice, Money::from_units(100)).await.unwrap();
        let second = engine.offers.place_offer(auction_id, bob, Money::from_units(150)).await.unwrap();

        let declined = engine.offers.decide_offer(first.id, false).await.unwrap();
        assert_eq!(declined.status, OfferStatus::Declined);
        let err = engine.offers.decide_offer(first.id, true).await.unwrap_err();
        assert!(matches!(err, MarketplaceApiError::OfferAlreadyDecided(_)));

        let accepted = engine.offers.decide_offer(second.id, true).await.unwrap();
        assert_eq!(accepted.status, OfferStatus::Accepted);

        let err = engine.offers.decide_offer(999, true).await.unwrap_err();
        assert!(matches!(err, MarketplaceApiError::OfferNotFound(999)));
        tear_down(engine).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn declined_offers_lose_the_settlement() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async move {
        let engine = new_engine().await;
        let owner = seed_user(&engine.db, "olivia").await;
        let alice = seed_user(&engine.db, "alice").await;
        let bob = seed_user(&engine.db, "bob").await;
        let (start, end) = window(10, 1);
        let auction = NewAuction::new(owner, "Turntable", Money::from_units(50), start, end);
        let auction_id = engine.db.insert_auction(auction).await.unwrap();
        engine.offers.place_offer(auction_id, alice, Money::from_units(100)).await.unwrap();
        let top = engine.offers.place_offer(auction_id, bob, Money::from_units(200)).await.unwrap();
        engine.offers.decide_offer(top.id, false).await.unwrap();

        let outcome = engine.settlement.settle_auction(auction_id).await.unwrap();
        assert_eq!(
            outcome,
            settlement_engine::SettlementOutcome::Sold { winner: alice, price: Money::from_units(100) }
        );
        tear_down(engine).await;
    });
    info!("🚀️ test complete");
}
