//! The synchronous submission path: offers on auctions and bids on tenders.
//!
//! `OfferFlowApi` is the write side of the offer ledger. Every accepted submission is an append;
//! the cached `current_price` / `current_lowest_bid` columns are bumped with a guarded conditional
//! update so that two racing submissions can never regress them.

use log::*;
use mkt_common::Money;
use serde_json::json;

use crate::{
    db_types::{
        Auction,
        NewNotification,
        NewOffer,
        NewTenderBid,
        NotificationKind,
        Offer,
        OfferStatus,
        Tender,
        TenderBid,
        UserId,
    },
    events::{BidPlacedEvent, EventProducers, OfferPlacedEvent},
    sem_api::errors::MarketplaceApiError,
    traits::{MarketplaceDatabase, SideEffects},
};

pub struct OfferFlowApi<B> {
    db: B,
    side_effects: SideEffects,
    producers: EventProducers,
}

impl<B: std::fmt::Debug> std::fmt::Debug for OfferFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OfferFlowApi ({:?})", self.db)
    }
}

impl<B> OfferFlowApi<B> {
    pub fn new(db: B, side_effects: SideEffects, producers: EventProducers) -> Self {
        Self { db, side_effects, producers }
    }
}

impl<B> OfferFlowApi<B>
where B: MarketplaceDatabase
{
    /// Submits a new offer against an open auction.
    ///
    /// The offer must strictly beat the auction's current price. On success the offer is appended
    /// to the ledger, the cached price is raised (unless a concurrent higher offer got there
    /// first), the owner and offerer are notified, and the offer-placed hook fires.
    pub async fn place_offer(
        &self,
        auction_id: i64,
        offerer_id: UserId,
        price: Money,
    ) -> Result<Offer, MarketplaceApiError> {
        let auction = self
            .db
            .fetch_auction(auction_id)
            .await
            .map_err(MarketplaceApiError::database)?
            .ok_or(MarketplaceApiError::ListingNotFound(auction_id))?;
        if !auction.is_open() {
            return Err(MarketplaceApiError::ListingClosed { id: auction_id, status: auction.status.to_string() });
        }
        if price <= auction.current_price {
            return Err(MarketplaceApiError::InvalidPrice { submitted: price, current: auction.current_price });
        }
        let offer = self
            .db
            .insert_offer(NewOffer::new(auction_id, offerer_id, price))
            .await
            .map_err(MarketplaceApiError::database)?;
        let raised =
            self.db.raise_current_price(auction_id, price).await.map_err(MarketplaceApiError::database)?;
        if !raised {
            debug!(
                "🔨️ Offer #{} on auction #{auction_id} lost the cached-price race. A higher concurrent offer \
                 is already reflected; settlement re-derives the winner from the ledger anyway.",
                offer.id
            );
        }
        info!("🔨️ Offer #{} of {price} recorded against auction #{auction_id}", offer.id);
        self.notify_offer_parties(&auction, &offer).await;
        self.call_offer_placed_hook(auction, offer.clone()).await;
        Ok(offer)
    }

    /// Submits a new bid against an open tender. The mirror image of [`Self::place_offer`]: a bid
    /// must strictly undercut the tender's current lowest bid.
    pub async fn place_bid(
        &self,
        tender_id: i64,
        bidder_id: UserId,
        amount: Money,
        proposal: impl Into<String>,
    ) -> Result<TenderBid, MarketplaceApiError> {
        let tender = self
            .db
            .fetch_tender(tender_id)
            .await
            .map_err(MarketplaceApiError::database)?
            .ok_or(MarketplaceApiError::ListingNotFound(tender_id))?;
        if !tender.is_open() {
            return Err(MarketplaceApiError::ListingClosed { id: tender_id, status: tender.status.to_string() });
        }
        if amount >= tender.current_lowest_bid {
            return Err(MarketplaceApiError::InvalidPrice {
                submitted: amount,
                current: tender.current_lowest_bid,
            });
        }
        let bid = self
            .db
            .insert_tender_bid(NewTenderBid::new(tender_id, bidder_id, amount, proposal))
            .await
            .map_err(MarketplaceApiError::database)?;
        let lowered =
            self.db.lower_current_bid(tender_id, amount).await.map_err(MarketplaceApiError::database)?;
        if !lowered {
            debug!(
                "🔨️ Bid #{} on tender #{tender_id} lost the cached-price race to a lower concurrent bid",
                bid.id
            );
        }
        info!("🔨️ Bid #{} of {amount} recorded against tender #{tender_id}", bid.id);
        self.notify_bid_parties(&tender, &bid).await;
        self.call_bid_placed_hook(tender, bid.clone()).await;
        Ok(bid)
    }

    /// The manual decision path: the auction owner accepts or declines a pending offer. Declined
    /// offers drop out of price aggregation; timed settlement never calls this.
    pub async fn decide_offer(&self, offer_id: i64, accept: bool) -> Result<Offer, MarketplaceApiError> {
        let offer = self
            .db
            .fetch_offer(offer_id)
            .await
            .map_err(MarketplaceApiError::database)?
            .ok_or(MarketplaceApiError::OfferNotFound(offer_id))?;
        if offer.status != OfferStatus::Pending {
            return Err(MarketplaceApiError::OfferAlreadyDecided(offer_id));
        }
        let status = if accept { OfferStatus::Accepted } else { OfferStatus::Declined };
        let decided = self.db.decide_offer(offer_id, status).await.map_err(MarketplaceApiError::database)?;
        if !decided {
            // another decision landed between the fetch and the guarded update
            return Err(MarketplaceApiError::OfferAlreadyDecided(offer_id));
        }
        info!("🔨️ Offer #{offer_id} has been {status}");
        self.db
            .fetch_offer(offer_id)
            .await
            .map_err(MarketplaceApiError::database)?
            .ok_or(MarketplaceApiError::OfferNotFound(offer_id))
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    async fn notify_offer_parties(&self, auction: &Auction, offer: &Offer) {
        let offerer_name = self.side_effects.display_name(offer.offerer_id).await;
        let payload = json!({
            "auction_id": auction.id,
            "offer_id": offer.id,
            "price": offer.price,
        });
        let to_owner = NewNotification::new(
            auction.owner_id,
            NotificationKind::NewOffer,
            format!("New offer on {}", auction.title),
            format!("{offerer_name} offered {}.", offer.price),
        )
        .with_payload(payload.clone());
        self.notify_quietly(to_owner).await;
        let to_offerer = NewNotification::new(
            offer.offerer_id,
            NotificationKind::OfferPlaced,
            format!("Offer placed on {}", auction.title),
            format!("Your offer of {} was recorded.", offer.price),
        )
        .with_payload(payload);
        self.notify_quietly(to_offerer).await;
    }

    async fn notify_bid_parties(&self, tender: &Tender, bid: &TenderBid) {
        let bidder_name = self.side_effects.display_name(bid.bidder_id).await;
        let payload = json!({
            "tender_id": tender.id,
            "bid_id": bid.id,
            "amount": bid.amount,
        });
        let to_owner = NewNotification::new(
            tender.owner_id,
            NotificationKind::NewOffer,
            format!("New bid on {}", tender.title),
            format!("{bidder_name} bid {}.", bid.amount),
        )
        .with_payload(payload.clone());
        self.notify_quietly(to_owner).await;
        let to_bidder = NewNotification::new(
            bid.bidder_id,
            NotificationKind::OfferPlaced,
            format!("Bid placed on {}", tender.title),
            format!("Your bid of {} was recorded.", bid.amount),
        )
        .with_payload(payload);
        self.notify_quietly(to_bidder).await;
    }

    // Notification delivery is best-effort. The submission has already been committed, so a sink
    // failure is logged and swallowed.
    async fn notify_quietly(&self, notification: NewNotification) {
        let recipient = notification.recipient_id;
        if let Err(e) = self.side_effects.notifications.notify(notification).await {
            warn!("🔔️ Could not persist a notification for user {recipient}: {e}");
        }
    }

    async fn call_offer_placed_hook(&self, auction: Auction, offer: Offer) {
        for producer in &self.producers.offer_placed_producer {
            let event = OfferPlacedEvent::new(auction.clone(), offer.clone());
            producer.publish_event(event).await;
        }
    }

    async fn call_bid_placed_hook(&self, tender: Tender, bid: TenderBid) {
        for producer in &self.producers.bid_placed_producer {
            let event = BidPlacedEvent::new(tender.clone(), bid.clone());
            producer.publish_event(event).await;
        }
    }
}
