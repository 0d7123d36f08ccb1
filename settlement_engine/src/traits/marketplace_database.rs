use chrono::{DateTime, Utc};
use mkt_common::Money;

use crate::db_types::{
    Auction,
    NewAuction,
    NewOffer,
    NewTender,
    NewTenderBid,
    NewUserProfile,
    Offer,
    OfferStatus,
    Tender,
    TenderBid,
    UserId,
    UserProfile,
};

/// This trait defines the storage behaviour backends must provide to host the settlement engine.
///
/// Two families of operations matter here:
/// * Plain reads and inserts for listings, offers and bids.
/// * Conditional mutations. Every state-changing update on a listing is guarded by the current
///   value of the field it changes (`status = 'Open'`, `current_price < $new`,
///   `closing_alert_sent = 0`) and reports whether a row actually changed. Settlement's
///   exactly-once guarantee rests on these guards, never on scheduling.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone {
    type Error: std::error::Error + Send + Sync + 'static;

    /// The URL of the database
    fn url(&self) -> &str;

    //----------------------------------------- Auctions -------------------------------------------------------------

    async fn insert_auction(&self, auction: NewAuction) -> Result<i64, Self::Error>;

    async fn fetch_auction(&self, id: i64) -> Result<Option<Auction>, Self::Error>;

    /// All auctions that are still `Open` but whose window elapsed before `now`.
    async fn fetch_due_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, Self::Error>;

    /// Open, unexpired auctions whose one-shot "ending soon" flag is unset. Window math is applied
    /// by the caller; this returns the candidate superset.
    async fn fetch_alert_candidates(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, Self::Error>;

    /// Raise the cached `current_price`, but only if `price` still improves on the stored value.
    /// Returns false when a concurrent submission got a higher value in first.
    async fn raise_current_price(&self, auction_id: i64, price: Money) -> Result<bool, Self::Error>;

    /// Transition `Open → OnAuction` and assign the winner in one guarded statement. Returns false
    /// when the auction already left `Open`, in which case the caller must not fire side effects.
    /// The cached `current_price` is deliberately left alone; only the offer ledger writes it.
    async fn mark_auction_sold(&self, auction_id: i64, winner: UserId) -> Result<bool, Self::Error>;

    /// Transition `Open → Closed` (no sale). Same guard semantics as [`Self::mark_auction_sold`].
    async fn close_auction(&self, auction_id: i64) -> Result<bool, Self::Error>;

    /// Set the one-shot closing-alert flag. Returns false if another sweep got there first.
    async fn mark_closing_alert_sent(&self, auction_id: i64) -> Result<bool, Self::Error>;

    //----------------------------------------- Offers ---------------------------------------------------------------

    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, Self::Error>;

    async fn fetch_offer(&self, id: i64) -> Result<Option<Offer>, Self::Error>;

    /// The complete offer set for an auction, ordered by creation time.
    async fn fetch_offers(&self, auction_id: i64) -> Result<Vec<Offer>, Self::Error>;

    /// Decide a `Pending` offer (manual accept/decline path). Guarded on the current status being
    /// `Pending`; returns false when the offer was already decided.
    async fn decide_offer(&self, offer_id: i64, status: OfferStatus) -> Result<bool, Self::Error>;

    //----------------------------------------- Tenders --------------------------------------------------------------

    async fn insert_tender(&self, tender: NewTender) -> Result<i64, Self::Error>;

    async fn fetch_tender(&self, id: i64) -> Result<Option<Tender>, Self::Error>;

    async fn fetch_due_tenders(&self, now: DateTime<Utc>) -> Result<Vec<Tender>, Self::Error>;

    /// Lower the cached `current_lowest_bid`, only if `amount` still improves on the stored value.
    async fn lower_current_bid(&self, tender_id: i64, amount: Money) -> Result<bool, Self::Error>;

    /// Transition `Open → Awarded` and assign the winning bidder. Guarded like
    /// [`Self::mark_auction_sold`].
    async fn mark_tender_awarded(&self, tender_id: i64, winner: UserId) -> Result<bool, Self::Error>;

    async fn close_tender(&self, tender_id: i64) -> Result<bool, Self::Error>;

    async fn insert_tender_bid(&self, bid: NewTenderBid) -> Result<TenderBid, Self::Error>;

    async fn fetch_tender_bids(&self, tender_id: i64) -> Result<Vec<TenderBid>, Self::Error>;

    //----------------------------------------- Users ----------------------------------------------------------------

    async fn insert_user(&self, profile: NewUserProfile) -> Result<UserId, Self::Error>;

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserProfile>, Self::Error>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
