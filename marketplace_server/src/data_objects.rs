use mkt_common::Money;
use serde::{Deserialize, Serialize};
use settlement_engine::db_types::{Auction, Offer, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferParams {
    pub offerer_id: UserId,
    pub price: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidParams {
    pub bidder_id: UserId,
    pub amount: Money,
    pub proposal: String,
}

/// Display snapshot of an auction and its ledger. The `current_price` field is the cached value
/// and may briefly trail the ledger under concurrent submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionResult {
    pub auction: Auction,
    pub offers: Vec<Offer>,
}
