//! Timed settlement of expired listings.
//!
//! `SettlementApi` owns the exactly-once resolution of auctions and tenders. The decision for a
//! record is a single guarded status update; the process that wins that update runs the
//! side-effect pipeline, every other caller observes `AlreadySettled` and does nothing. The
//! pipeline itself is best-effort: once a listing has left `Open` it never comes back, regardless
//! of which notifications or chats could be delivered afterwards.

use chrono::{DateTime, Utc};
use log::*;
use serde_json::json;

use crate::{
    db_types::{Auction, Chat, NewNotification, NotificationKind, Offer, Tender, TenderBid, UserId},
    events::{EventProducers, ListingSettledEvent},
    pricing,
    sem_api::{
        errors::MarketplaceApiError,
        objects::{SettlementOutcome, SweepSummary},
    },
    traits::{MarketplaceDatabase, SideEffects},
};

pub struct SettlementApi<B> {
    db: B,
    side_effects: SideEffects,
    producers: EventProducers,
}

impl<B: std::fmt::Debug> std::fmt::Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi ({:?})", self.db)
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, side_effects: SideEffects, producers: EventProducers) -> Self {
        Self { db, side_effects, producers }
    }
}

impl<B> SettlementApi<B>
where B: MarketplaceDatabase
{
    /// Settles every auction and tender whose `ending_at` has passed `now`.
    ///
    /// Each record is settled in isolation. A failure is logged and counted, and the record stays
    /// `Open` so the next sweep retries it; it never aborts the rest of the sweep.
    pub async fn settle_due(&self, now: DateTime<Utc>) -> Result<SweepSummary, MarketplaceApiError> {
        let due_auctions = self.db.fetch_due_auctions(now).await.map_err(MarketplaceApiError::database)?;
        let due_tenders = self.db.fetch_due_tenders(now).await.map_err(MarketplaceApiError::database)?;
        if due_auctions.is_empty() && due_tenders.is_empty() {
            trace!("⚖️ Nothing is due for settlement");
            return Ok(SweepSummary::default());
        }
        debug!("⚖️ {} auctions and {} tenders are due for settlement", due_auctions.len(), due_tenders.len());
        let mut summary = SweepSummary::default();
        for auction in due_auctions {
            match self.settle_auction(auction.id).await {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!("⚖️ Could not settle auction #{}: {e}. It stays open for the next sweep.", auction.id);
                    summary.failed += 1;
                },
            }
        }
        for tender in due_tenders {
            match self.settle_tender(tender.id).await {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!("⚖️ Could not settle tender #{}: {e}. It stays open for the next sweep.", tender.id);
                    summary.failed += 1;
                },
            }
        }
        info!("⚖️ Settlement sweep complete: {summary}");
        Ok(summary)
    }

    /// Resolves a single auction.
    ///
    /// The winner is re-derived from the full offer ledger rather than the cached `current_price`.
    /// When a reserve price is set, a best offer below it settles the auction unsold. The status
    /// transition is conditional on the row still being `Open`, which is what makes a concurrent
    /// double settlement collapse into one winner and one `AlreadySettled`.
    pub async fn settle_auction(&self, auction_id: i64) -> Result<SettlementOutcome, MarketplaceApiError> {
        let auction = self
            .db
            .fetch_auction(auction_id)
            .await
            .map_err(MarketplaceApiError::database)?
            .ok_or(MarketplaceApiError::ListingNotFound(auction_id))?;
        if !auction.is_open() {
            debug!("⚖️ Auction #{auction_id} is already {}. Nothing to do.", auction.status);
            return Ok(SettlementOutcome::AlreadySettled);
        }
        let offers = self.db.fetch_offers(auction_id).await.map_err(MarketplaceApiError::database)?;
        let winning = pricing::best_offer(&offers)
            .filter(|best| auction.reserve_price.map_or(true, |reserve| best.price >= reserve))
            .cloned();
        let outcome = match winning {
            Some(winning) => {
                let marked = self
                    .db
                    .mark_auction_sold(auction_id, winning.offerer_id)
                    .await
                    .map_err(MarketplaceApiError::database)?;
                if !marked {
                    debug!("⚖️ Auction #{auction_id} was settled by a concurrent sweep");
                    return Ok(SettlementOutcome::AlreadySettled);
                }
                info!(
                    "⚖️ Auction #{auction_id} ({}) sold to user {} for {}",
                    auction.title, winning.offerer_id, winning.price
                );
                self.run_sale_side_effects(&auction, &winning, &offers).await;
                SettlementOutcome::Sold { winner: winning.offerer_id, price: winning.price }
            },
            None => {
                let closed =
                    self.db.close_auction(auction_id).await.map_err(MarketplaceApiError::database)?;
                if !closed {
                    debug!("⚖️ Auction #{auction_id} was settled by a concurrent sweep");
                    return Ok(SettlementOutcome::AlreadySettled);
                }
                info!("⚖️ Auction #{auction_id} ({}) closed without a sale", auction.title);
                self.notify_auction_unsold(&auction, &offers).await;
                SettlementOutcome::ClosedUnsold
            },
        };
        self.call_listing_settled_hook(auction_id, &auction.title, outcome.clone()).await;
        Ok(outcome)
    }

    /// Resolves a single tender. The mirror of [`Self::settle_auction`]: the lowest bid wins, and
    /// a minimum-price floor below which the best bid disqualifies the award.
    pub async fn settle_tender(&self, tender_id: i64) -> Result<SettlementOutcome, MarketplaceApiError> {
        let tender = self
            .db
            .fetch_tender(tender_id)
            .await
            .map_err(MarketplaceApiError::database)?
            .ok_or(MarketplaceApiError::ListingNotFound(tender_id))?;
        if !tender.is_open() {
            debug!("⚖️ Tender #{tender_id} is already {}. Nothing to do.", tender.status);
            return Ok(SettlementOutcome::AlreadySettled);
        }
        let bids = self.db.fetch_tender_bids(tender_id).await.map_err(MarketplaceApiError::database)?;
        let winning = pricing::best_bid(&bids)
            .filter(|best| tender.minimum_price.map_or(true, |floor| best.amount >= floor))
            .cloned();
        let outcome = match winning {
            Some(winning) => {
                let marked = self
                    .db
                    .mark_tender_awarded(tender_id, winning.bidder_id)
                    .await
                    .map_err(MarketplaceApiError::database)?;
                if !marked {
                    debug!("⚖️ Tender #{tender_id} was settled by a concurrent sweep");
                    return Ok(SettlementOutcome::AlreadySettled);
                }
                info!(
                    "⚖️ Tender #{tender_id} ({}) awarded to user {} at {}",
                    tender.title, winning.bidder_id, winning.amount
                );
                self.run_award_side_effects(&tender, &winning, &bids).await;
                SettlementOutcome::Awarded { winner: winning.bidder_id, amount: winning.amount }
            },
            None => {
                let closed = self.db.close_tender(tender_id).await.map_err(MarketplaceApiError::database)?;
                if !closed {
                    debug!("⚖️ Tender #{tender_id} was settled by a concurrent sweep");
                    return Ok(SettlementOutcome::AlreadySettled);
                }
                info!("⚖️ Tender #{tender_id} ({}) closed without an award", tender.title);
                self.notify_tender_unsold(&tender, &bids).await;
                SettlementOutcome::ClosedUnsold
            },
        };
        self.call_listing_settled_hook(tender_id, &tender.title, outcome.clone()).await;
        Ok(outcome)
    }

    /// Scans open auctions and alerts the participants of every auction that has entered the final
    /// 5% of its listing window. The alert flag is set with a guarded update after the
    /// notifications go out, so each auction alerts at most once across concurrent sweeps.
    pub async fn send_closing_alerts(&self, now: DateTime<Utc>) -> Result<usize, MarketplaceApiError> {
        let candidates = self.db.fetch_alert_candidates(now).await.map_err(MarketplaceApiError::database)?;
        let mut alerted = 0;
        for auction in candidates.into_iter().filter(|a| a.in_closing_window(now)) {
            match self.alert_auction_participants(&auction).await {
                Ok(participants) => {
                    debug!(
                        "⏳️ Auction #{} ({}) is ending soon. {participants} participants alerted.",
                        auction.id, auction.title
                    );
                    alerted += 1;
                },
                Err(e) => error!("⏳️ Could not send closing alerts for auction #{}: {e}", auction.id),
            }
        }
        if alerted > 0 {
            info!("⏳️ Closing alerts sent for {alerted} auctions");
        }
        Ok(alerted)
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    async fn alert_auction_participants(&self, auction: &Auction) -> Result<usize, MarketplaceApiError> {
        let offers = self.db.fetch_offers(auction.id).await.map_err(MarketplaceApiError::database)?;
        let participants = pricing::other_offerers(&offers, auction.owner_id);
        let payload = json!({
            "auction_id": auction.id,
            "ending_at": auction.ending_at,
            "current_price": auction.current_price,
        });
        for participant in &participants {
            let note = NewNotification::new(
                *participant,
                NotificationKind::EndingSoon,
                format!("{} is ending soon", auction.title),
                format!("The auction closes at {}. The price to beat is {}.", auction.ending_at, auction.current_price),
            )
            .with_payload(payload.clone());
            self.notify_quietly(note).await;
        }
        let flagged =
            self.db.mark_closing_alert_sent(auction.id).await.map_err(MarketplaceApiError::database)?;
        if !flagged {
            debug!("⏳️ Auction #{} was flagged by a concurrent alert sweep", auction.id);
        }
        Ok(participants.len())
    }

    // -------------------------------------- side-effect pipeline ----------------------------------------------------
    // Steps run in order: chat, realtime pushes, winner/owner notifications, chat-created
    // notifications, loser notifications. Each step is isolated; a failure is logged and the
    // remaining steps still run.

    async fn run_sale_side_effects(&self, auction: &Auction, winning: &Offer, offers: &[Offer]) {
        let winner = winning.offerer_id;
        let owner = auction.owner_id;
        let winner_name = self.side_effects.display_name(winner).await;
        let owner_name = self.side_effects.display_name(owner).await;
        let chat = self.open_winner_chat(auction.id, owner, winner).await;
        let payload = json!({
            "auction_id": auction.id,
            "title": auction.title,
            "final_price": winning.price,
        });
        let to_winner = NewNotification::new(
            winner,
            NotificationKind::AuctionWon,
            format!("You won {}", auction.title),
            format!("Your offer of {} won the auction. The seller is {owner_name}.", winning.price),
        )
        .with_payload(payload.clone());
        self.notify_quietly(to_winner).await;
        let to_owner = NewNotification::new(
            owner,
            NotificationKind::ItemSold,
            format!("{} has sold", auction.title),
            format!("{winner_name} won the auction with an offer of {}.", winning.price),
        )
        .with_payload(payload);
        self.notify_quietly(to_owner).await;
        if let Some(chat) = &chat {
            self.notify_chat_created(chat, winner, &owner_name).await;
            self.notify_chat_created(chat, owner, &winner_name).await;
        }
        for loser in pricing::other_offerers(offers, winner) {
            let note = NewNotification::new(
                loser,
                NotificationKind::AuctionLost,
                format!("{} has ended", auction.title),
                format!("The auction closed with a winning offer of {}.", winning.price),
            )
            .with_payload(json!({ "auction_id": auction.id, "winning_price": winning.price }));
            self.notify_quietly(note).await;
        }
    }

    async fn run_award_side_effects(&self, tender: &Tender, winning: &TenderBid, bids: &[TenderBid]) {
        let winner = winning.bidder_id;
        let owner = tender.owner_id;
        let winner_name = self.side_effects.display_name(winner).await;
        let owner_name = self.side_effects.display_name(owner).await;
        let chat = self.open_winner_chat(tender.id, owner, winner).await;
        let payload = json!({
            "tender_id": tender.id,
            "title": tender.title,
            "final_amount": winning.amount,
        });
        let to_winner = NewNotification::new(
            winner,
            NotificationKind::TenderAwarded,
            format!("You were awarded {}", tender.title),
            format!("Your bid of {} won the tender. The client is {owner_name}.", winning.amount),
        )
        .with_payload(payload.clone());
        self.notify_quietly(to_winner).await;
        let to_owner = NewNotification::new(
            owner,
            NotificationKind::ItemSold,
            format!("{} has been awarded", tender.title),
            format!("{winner_name} won the tender with a bid of {}.", winning.amount),
        )
        .with_payload(payload);
        self.notify_quietly(to_owner).await;
        if let Some(chat) = &chat {
            self.notify_chat_created(chat, winner, &owner_name).await;
            self.notify_chat_created(chat, owner, &winner_name).await;
        }
        for loser in pricing::other_bidders(bids, winner) {
            let note = NewNotification::new(
                loser,
                NotificationKind::BidLost,
                format!("{} has closed", tender.title),
                format!("The tender was awarded at {}.", winning.amount),
            )
            .with_payload(json!({ "tender_id": tender.id, "winning_amount": winning.amount }));
            self.notify_quietly(note).await;
        }
    }

    async fn open_winner_chat(&self, listing_id: i64, owner: UserId, winner: UserId) -> Option<Chat> {
        match self.side_effects.chats.create_chat(owner, winner).await {
            Ok(chat) => {
                debug!("💬️ Chat #{} created between users {owner} and {winner}", chat.id);
                let payload = json!({
                    "chat_id": chat.id,
                    "listing_id": listing_id,
                    "participants": [owner, winner],
                });
                self.side_effects.realtime.push_to_user(owner, "chat.created", payload.clone()).await;
                self.side_effects.realtime.push_to_user(winner, "chat.created", payload).await;
                Some(chat)
            },
            Err(e) => {
                error!("💬️ Could not create the winner chat for listing #{listing_id}: {e}");
                None
            },
        }
    }

    async fn notify_chat_created(&self, chat: &Chat, recipient: UserId, other_name: &str) {
        let note = NewNotification::new(
            recipient,
            NotificationKind::ChatCreated,
            format!("You can now chat with {other_name}"),
            format!("A conversation with {other_name} has been opened for you."),
        )
        .with_payload(json!({ "chat_id": chat.id }));
        self.notify_quietly(note).await;
    }

    async fn notify_auction_unsold(&self, auction: &Auction, offers: &[Offer]) {
        let reason = if offers.is_empty() {
            "It received no offers.".to_string()
        } else {
            "The best offer did not reach the reserve price.".to_string()
        };
        let note = NewNotification::new(
            auction.owner_id,
            NotificationKind::ClosedUnsold,
            format!("{} has ended without a sale", auction.title),
            reason,
        )
        .with_payload(json!({ "auction_id": auction.id }));
        self.notify_quietly(note).await;
    }

    async fn notify_tender_unsold(&self, tender: &Tender, bids: &[TenderBid]) {
        let reason = if bids.is_empty() {
            "It received no bids.".to_string()
        } else {
            "The best bid was below the minimum price.".to_string()
        };
        let note = NewNotification::new(
            tender.owner_id,
            NotificationKind::ClosedUnsold,
            format!("{} has ended without an award", tender.title),
            reason,
        )
        .with_payload(json!({ "tender_id": tender.id }));
        self.notify_quietly(note).await;
    }

    async fn notify_quietly(&self, notification: NewNotification) {
        let recipient = notification.recipient_id;
        if let Err(e) = self.side_effects.notifications.notify(notification).await {
            warn!("🔔️ Could not persist a notification for user {recipient}: {e}");
        }
    }

    async fn call_listing_settled_hook(&self, listing_id: i64, title: &str, outcome: SettlementOutcome) {
        for producer in &self.producers.listing_settled_producer {
            let event = ListingSettledEvent::new(listing_id, title, outcome.clone());
            producer.publish_event(event).await;
        }
    }
}
