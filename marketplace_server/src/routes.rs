//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into
//! a separate module. Keep this module neat and tidy 🙏

use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use settlement_engine::{MarketplaceDatabase, OfferFlowApi, SettlementApi, SqliteDatabase};

use crate::{
    data_objects::{AuctionResult, BidParams, OfferParams},
    errors::ServerError,
};

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Offers  ----------------------------------------------------
#[post("/auction/{id}/offers")]
pub async fn place_offer(
    path: web::Path<i64>,
    params: web::Json<OfferParams>,
    api: web::Data<OfferFlowApi<SqliteDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let auction_id = path.into_inner();
    let params = params.into_inner();
    trace!("💻️ Offer of {} on auction #{auction_id} from user {}", params.price, params.offerer_id);
    let offer = api.place_offer(auction_id, params.offerer_id, params.price).await?;
    Ok(HttpResponse::Ok().json(offer))
}

#[post("/tender/{id}/bids")]
pub async fn place_bid(
    path: web::Path<i64>,
    params: web::Json<BidParams>,
    api: web::Data<OfferFlowApi<SqliteDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let tender_id = path.into_inner();
    let params = params.into_inner();
    trace!("💻️ Bid of {} on tender #{tender_id} from user {}", params.amount, params.bidder_id);
    let bid = api.place_bid(tender_id, params.bidder_id, params.amount, params.proposal).await?;
    Ok(HttpResponse::Ok().json(bid))
}

// --------------------------------------------   Settlement  --------------------------------------------------
/// Manual trigger for a settlement sweep. The timed worker runs the identical code path, so a
/// manual run racing the timer is harmless.
#[post("/settle/run")]
pub async fn run_settlement(
    api: web::Data<SettlementApi<SqliteDatabase>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ Manual settlement sweep requested");
    let summary = api.settle_due(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

// ----------------------------------------------   Listings  --------------------------------------------------
#[get("/auction/{id}")]
pub async fn auction_by_id(
    path: web::Path<i64>,
    api: web::Data<SettlementApi<SqliteDatabase>>,
) -> Result<HttpResponse, ServerError> {
    let auction_id = path.into_inner();
    trace!("💻️ Fetching auction #{auction_id}");
    let auction = api
        .db()
        .fetch_auction(auction_id)
        .await
        .map_err(|e| ServerError::BackendError(e.to_string()))?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Auction #{auction_id} does not exist")))?;
    let offers =
        api.db().fetch_offers(auction_id).await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(AuctionResult { auction, offers }))
}
