use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::trace;
use mkt_common::Money;
use sqlx::SqlitePool;

use super::{auctions, chats, db_url, new_pool, notifications, offers, tenders, users, SqliteDatabaseError};
use crate::{
    db_types::{
        Auction,
        Chat,
        NewAuction,
        NewNotification,
        NewOffer,
        NewTender,
        NewTenderBid,
        NewUserProfile,
        Notification,
        Offer,
        OfferStatus,
        Tender,
        TenderBid,
        UserId,
        UserProfile,
    },
    traits::{ChatStore, MarketplaceDatabase, NotificationSink, SideEffectError, UserDirectory},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn fetch_notifications(&self, recipient: UserId) -> Result<Vec<Notification>, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        notifications::fetch_notifications_for_recipient(recipient, &mut conn).await
    }

    pub async fn mark_notification_read(&self, id: i64) -> Result<bool, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_notification_read(id, &mut conn).await
    }

    pub async fn fetch_chats_for_user(&self, user: UserId) -> Result<Vec<Chat>, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        chats::fetch_chats_for_user(user, &mut conn).await
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    type Error = SqliteDatabaseError;

    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_auction(&self, auction: NewAuction) -> Result<i64, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        auctions::insert_auction(auction, &mut conn).await
    }

    async fn fetch_auction(&self, id: i64) -> Result<Option<Auction>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        auctions::fetch_auction(id, &mut conn).await
    }

    async fn fetch_due_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        auctions::fetch_due_auctions(now, &mut conn).await
    }

    async fn fetch_alert_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        auctions::fetch_alert_candidates(now, &mut conn).await
    }

    async fn raise_current_price(&self, auction_id: i64, price: Money) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        auctions::raise_current_price(auction_id, price, &mut conn).await
    }

    async fn mark_auction_sold(&self, auction_id: i64, winner: UserId) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        auctions::mark_auction_sold(auction_id, winner, &mut conn).await
    }

    async fn close_auction(&self, auction_id: i64) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        auctions::close_auction(auction_id, &mut conn).await
    }

    async fn mark_closing_alert_sent(&self, auction_id: i64) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        auctions::mark_closing_alert_sent(auction_id, &mut conn).await
    }

    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        offers::insert_offer(offer, &mut conn).await
    }

    async fn fetch_offer(&self, id: i64) -> Result<Option<Offer>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        offers::fetch_offer(id, &mut conn).await
    }

    async fn fetch_offers(&self, auction_id: i64) -> Result<Vec<Offer>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        offers::fetch_offers_for_auction(auction_id, &mut conn).await
    }

    async fn decide_offer(&self, offer_id: i64, status: OfferStatus) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        offers::decide_offer(offer_id, status, &mut conn).await
    }

    async fn insert_tender(&self, tender: NewTender) -> Result<i64, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        tenders::insert_tender(tender, &mut conn).await
    }

    async fn fetch_tender(&self, id: i64) -> Result<Option<Tender>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        tenders::fetch_tender(id, &mut conn).await
    }

    async fn fetch_due_tenders(&self, now: DateTime<Utc>) -> Result<Vec<Tender>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        tenders::fetch_due_tenders(now, &mut conn).await
    }

    async fn lower_current_bid(&self, tender_id: i64, amount: Money) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        tenders::lower_current_bid(tender_id, amount, &mut conn).await
    }

    async fn mark_tender_awarded(&self, tender_id: i64, winner: UserId) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        tenders::mark_tender_awarded(tender_id, winner, &mut conn).await
    }

    async fn close_tender(&self, tender_id: i64) -> Result<bool, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        tenders::close_tender(tender_id, &mut conn).await
    }

    async fn insert_tender_bid(&self, bid: NewTenderBid) -> Result<TenderBid, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        tenders::insert_tender_bid(bid, &mut conn).await
    }

    async fn fetch_tender_bids(&self, tender_id: i64) -> Result<Vec<TenderBid>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        tenders::fetch_tender_bids(tender_id, &mut conn).await
    }

    async fn insert_user(&self, profile: NewUserProfile) -> Result<UserId, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(profile, &mut conn).await
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserProfile>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(id, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.pool.close().await;
        Ok(())
    }
}

// The sqlite backend doubles as the persisted half of the side-effect seams. Delivery layers
// (realtime push) live with the hosting crate.

#[async_trait]
impl NotificationSink for SqliteDatabase {
    async fn notify(&self, notification: NewNotification) -> Result<Notification, SideEffectError> {
        let mut conn =
            self.pool.acquire().await.map_err(|e| SideEffectError::StorageError(e.to_string()))?;
        notifications::insert_notification(notification, &mut conn)
            .await
            .map_err(|e| SideEffectError::StorageError(e.to_string()))
    }
}

#[async_trait]
impl ChatStore for SqliteDatabase {
    async fn create_chat(&self, user_a: UserId, user_b: UserId) -> Result<Chat, SideEffectError> {
        let mut conn =
            self.pool.acquire().await.map_err(|e| SideEffectError::StorageError(e.to_string()))?;
        chats::insert_chat(user_a, user_b, &mut conn)
            .await
            .map_err(|e| SideEffectError::StorageError(e.to_string()))
    }
}

#[async_trait]
impl UserDirectory for SqliteDatabase {
    async fn profile(&self, user_id: UserId) -> Result<Option<UserProfile>, SideEffectError> {
        let mut conn =
            self.pool.acquire().await.map_err(|e| SideEffectError::StorageError(e.to_string()))?;
        users::fetch_user(user_id, &mut conn)
            .await
            .map_err(|e| SideEffectError::StorageError(e.to_string()))
    }
}
