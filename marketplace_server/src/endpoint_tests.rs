use std::sync::Arc;

use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use chrono::{Duration, Utc};
use mkt_common::Money;
use serde_json::{json, Value};
use settlement_engine::{
    db_types::{NewAuction, NewTender, NewUserProfile, UserId},
    events::EventProducers,
    run_migrations,
    traits::{NullPush, SideEffects},
    MarketplaceDatabase,
    OfferFlowApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::routes::{auction_by_id, health, place_bid, place_offer, run_settlement};

async fn test_db() -> SqliteDatabase {
    let db = SqliteDatabase::new_with_url("sqlite::memory:", 1).await.expect("Error creating database");
    run_migrations(db.pool()).await.expect("Error running migrations");
    db
}

fn engine_apis(db: &SqliteDatabase) -> (OfferFlowApi<SqliteDatabase>, SettlementApi<SqliteDatabase>) {
    let side_effects = SideEffects::new(
        Arc::new(db.clone()),
        Arc::new(db.clone()),
        Arc::new(NullPush),
        Arc::new(db.clone()),
    );
    let offers = OfferFlowApi::new(db.clone(), side_effects.clone(), EventProducers::default());
    let settlement = SettlementApi::new(db.clone(), side_effects, EventProducers::default());
    (offers, settlement)
}

async fn seed_user(db: &SqliteDatabase, name: &str) -> UserId {
    db.insert_user(NewUserProfile::new(name, format!("{name}@example.com"))).await.unwrap()
}

macro_rules! test_app {
    ($db:expr) => {{
        let (offers, settlement) = engine_apis($db);
        test::init_service(
            App::new()
                .app_data(web::Data::new(offers))
                .app_data(web::Data::new(settlement))
                .service(health)
                .service(place_offer)
                .service(place_bid)
                .service(run_settlement)
                .service(auction_by_id),
        )
        .await
    }};
}

async fn body_json(res: actix_web::dev::ServiceResponse) -> Value {
    let body = res.into_body().try_into_bytes().unwrap();
    serde_json::from_slice(&body).expect("Response body was not JSON")
}

#[actix_web::test]
async fn health_check() {
    let db = test_db().await;
    let app = test_app!(&db);
    let req = TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn offers_flow_through_the_ledger() {
    let db = test_db().await;
    let owner = seed_user(&db, "olivia").await;
    let alice = seed_user(&db, "alice").await;
    let now = Utc::now();
    let auction = NewAuction::new(owner, "Ceramic vase", Money::from_units(50), now, now + Duration::hours(5));
    let auction_id = db.insert_auction(auction).await.unwrap();
    let app = test_app!(&db);

    let req = TestRequest::post()
        .uri(&format!("/auction/{auction_id}/offers"))
        .set_json(json!({ "offerer_id": alice, "price": 10_000 }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let offer = body_json(res).await;
    assert_eq!(offer["auction_id"], auction_id);
    assert_eq!(offer["price"], 10_000);

    // a non-improving price is rejected with 400 and nothing is recorded
    let req = TestRequest::post()
        .uri(&format!("/auction/{auction_id}/offers"))
        .set_json(json!({ "offerer_id": alice, "price": 10_000 }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err = body_json(res).await;
    assert!(err["error"].as_str().unwrap().contains("does not improve"));
    assert_eq!(db.fetch_offers(auction_id).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn unknown_listings_return_404() {
    let db = test_db().await;
    let alice = seed_user(&db, "alice").await;
    let app = test_app!(&db);
    let req = TestRequest::post()
        .uri("/auction/999/offers")
        .set_json(json!({ "offerer_id": alice, "price": 10_000 }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let req = TestRequest::get().uri("/auction/999").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn settled_listings_conflict_on_new_submissions() {
    let db = test_db().await;
    let owner = seed_user(&db, "olivia").await;
    let alice = seed_user(&db, "alice").await;
    let now = Utc::now();
    let auction = NewAuction::new(
        owner,
        "Old bureau",
        Money::from_units(50),
        now - Duration::hours(10),
        now - Duration::hours(1),
    );
    let auction_id = db.insert_auction(auction).await.unwrap();
    let app = test_app!(&db);

    let req = TestRequest::post().uri("/settle/run").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let summary = body_json(res).await;
    assert_eq!(summary["closed_unsold"], 1);

    let req = TestRequest::post()
        .uri(&format!("/auction/{auction_id}/offers"))
        .set_json(json!({ "offerer_id": alice, "price": 10_000 }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn bids_and_snapshots_round_trip() {
    let db = test_db().await;
    let owner = seed_user(&db, "olivia").await;
    let alice = seed_user(&db, "alice").await;
    let now = Utc::now();
    let tender = NewTender::new(owner, "Fence repair", Money::from_units(800), now, now + Duration::hours(5));
    let tender_id = db.insert_tender(tender).await.unwrap();
    let auction = NewAuction::new(owner, "Ceramic vase", Money::from_units(50), now, now + Duration::hours(5));
    let auction_id = db.insert_auction(auction).await.unwrap();
    let app = test_app!(&db);

    let req = TestRequest::post()
        .uri(&format!("/tender/{tender_id}/bids"))
        .set_json(json!({ "bidder_id": alice, "amount": 50_000, "proposal": "New posts and panels" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let bid = body_json(res).await;
    assert_eq!(bid["tender_id"], tender_id);

    let req = TestRequest::get().uri(&format!("/auction/{auction_id}")).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let snapshot = body_json(res).await;
    assert_eq!(snapshot["auction"]["id"], auction_id);
    assert_eq!(snapshot["offers"].as_array().unwrap().len(), 0);
}
