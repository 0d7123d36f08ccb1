use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Auction, Offer, Tender, TenderBid},
    sem_api::objects::SettlementOutcome,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferPlacedEvent {
    pub auction: Auction,
    pub offer: Offer,
}

impl OfferPlacedEvent {
    pub fn new(auction: Auction, offer: Offer) -> Self {
        Self { auction, offer }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidPlacedEvent {
    pub tender: Tender,
    pub bid: TenderBid,
}

impl BidPlacedEvent {
    pub fn new(tender: Tender, bid: TenderBid) -> Self {
        Self { tender, bid }
    }
}

/// Emitted once per listing settlement, after the status transition has committed. Subscribers
/// observing this event can rely on the listing never re-entering `Open`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSettledEvent {
    pub listing_id: i64,
    pub title: String,
    pub outcome: SettlementOutcome,
}

impl ListingSettledEvent {
    pub fn new(listing_id: i64, title: impl Into<String>, outcome: SettlementOutcome) -> Self {
        Self { listing_id, title: title.into(), outcome }
    }
}
