use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use mkt_common::Money;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

/// Listings enter their "ending soon" window when the remaining time drops below 1/20th (5%) of
/// the total listing duration.
pub const CLOSING_WINDOW_DIVISOR: i32 = 20;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------      UserId        ----------------------------------------------------------
/// A lightweight wrapper around a user record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl UserId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------    ListingKind     ----------------------------------------------------------
/// What is being sold. Product and service listings flow through the identical settlement
/// pipeline; the kind only matters to the client UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ListingKind {
    Product,
    Service,
}

impl Display for ListingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingKind::Product => write!(f, "Product"),
            ListingKind::Service => write!(f, "Service"),
        }
    }
}

impl FromStr for ListingKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Product" => Ok(Self::Product),
            "Service" => Ok(Self::Service),
            s => Err(ConversionError(format!("Invalid listing kind: {s}"))),
        }
    }
}

//--------------------------------------   AuctionStatus    ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum AuctionStatus {
    /// The auction is live and accepting offers.
    Open,
    /// The auction settled with a sale. A winner has been assigned.
    OnAuction,
    /// The auction settled without a sale. No winner exists.
    Closed,
}

impl Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuctionStatus::Open => write!(f, "Open"),
            AuctionStatus::OnAuction => write!(f, "OnAuction"),
            AuctionStatus::Closed => write!(f, "Closed"),
        }
    }
}

impl FromStr for AuctionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "OnAuction" => Ok(Self::OnAuction),
            "Closed" => Ok(Self::Closed),
            s => Err(ConversionError(format!("Invalid auction status: {s}"))),
        }
    }
}

//--------------------------------------    TenderStatus    ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TenderStatus {
    /// The tender is live and accepting bids.
    Open,
    /// The tender settled with an award. A winning bidder has been assigned.
    Awarded,
    /// The tender settled without an award.
    Closed,
}

impl Display for TenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenderStatus::Open => write!(f, "Open"),
            TenderStatus::Awarded => write!(f, "Awarded"),
            TenderStatus::Closed => write!(f, "Closed"),
        }
    }
}

impl FromStr for TenderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Awarded" => Ok(Self::Awarded),
            "Closed" => Ok(Self::Closed),
            s => Err(ConversionError(format!("Invalid tender status: {s}"))),
        }
    }
}

//--------------------------------------    OfferStatus     ----------------------------------------------------------
/// Offers are `Pending` unless the owner has decided them through the manual accept/decline path.
/// Timed settlement never changes an offer's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
}

impl Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferStatus::Pending => write!(f, "Pending"),
            OfferStatus::Accepted => write!(f, "Accepted"),
            OfferStatus::Declined => write!(f, "Declined"),
        }
    }
}

impl FromStr for OfferStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Accepted" => Ok(Self::Accepted),
            "Declined" => Ok(Self::Declined),
            s => Err(ConversionError(format!("Invalid offer status: {s}"))),
        }
    }
}

//--------------------------------------  NotificationKind  ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Sent to a listing owner when somebody places an offer or bid.
    NewOffer,
    /// Confirmation to the offerer that their submission was recorded.
    OfferPlaced,
    AuctionWon,
    AuctionLost,
    ItemSold,
    TenderAwarded,
    BidLost,
    ClosedUnsold,
    EndingSoon,
    ChatCreated,
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationKind::NewOffer => "NewOffer",
            NotificationKind::OfferPlaced => "OfferPlaced",
            NotificationKind::AuctionWon => "AuctionWon",
            NotificationKind::AuctionLost => "AuctionLost",
            NotificationKind::ItemSold => "ItemSold",
            NotificationKind::TenderAwarded => "TenderAwarded",
            NotificationKind::BidLost => "BidLost",
            NotificationKind::ClosedUnsold => "ClosedUnsold",
            NotificationKind::EndingSoon => "EndingSoon",
            NotificationKind::ChatCreated => "ChatCreated",
        };
        write!(f, "{s}")
    }
}

impl FromStr for NotificationKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NewOffer" => Ok(Self::NewOffer),
            "OfferPlaced" => Ok(Self::OfferPlaced),
            "AuctionWon" => Ok(Self::AuctionWon),
            "AuctionLost" => Ok(Self::AuctionLost),
            "ItemSold" => Ok(Self::ItemSold),
            "TenderAwarded" => Ok(Self::TenderAwarded),
            "BidLost" => Ok(Self::BidLost),
            "ClosedUnsold" => Ok(Self::ClosedUnsold),
            "EndingSoon" => Ok(Self::EndingSoon),
            "ChatCreated" => Ok(Self::ChatCreated),
            s => Err(ConversionError(format!("Invalid notification kind: {s}"))),
        }
    }
}

//--------------------------------------      Auction       ----------------------------------------------------------
/// A forward auction. `current_price` is a cached display value maintained by the offer ledger;
/// settlement re-derives the true maximum from the offer set and never trusts this field.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Auction {
    pub id: i64,
    pub owner_id: UserId,
    pub title: String,
    pub category: String,
    pub kind: ListingKind,
    pub starting_at: DateTime<Utc>,
    pub ending_at: DateTime<Utc>,
    pub starting_price: Money,
    pub current_price: Money,
    pub reserve_price: Option<Money>,
    pub status: AuctionStatus,
    pub winner_id: Option<UserId>,
    pub closing_alert_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auction {
    pub fn is_open(&self) -> bool {
        self.status == AuctionStatus::Open
    }

    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.ending_at < now
    }

    /// True when the remaining time is at most 5% of the total listing window and the auction has
    /// not yet expired.
    pub fn in_closing_window(&self, now: DateTime<Utc>) -> bool {
        in_final_window(self.starting_at, self.ending_at, now)
    }
}

//--------------------------------------     NewAuction     ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewAuction {
    pub owner_id: UserId,
    pub title: String,
    pub category: String,
    pub kind: ListingKind,
    pub starting_at: DateTime<Utc>,
    pub ending_at: DateTime<Utc>,
    pub starting_price: Money,
    /// The minimum acceptable sale price. When set, the auction settles unsold unless the best
    /// offer reaches it.
    pub reserve_price: Option<Money>,
}

impl NewAuction {
    pub fn new(
        owner_id: UserId,
        title: impl Into<String>,
        starting_price: Money,
        starting_at: DateTime<Utc>,
        ending_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id,
            title: title.into(),
            category: "general".to_string(),
            kind: ListingKind::Product,
            starting_at,
            ending_at,
            starting_price,
            reserve_price: None,
        }
    }

    pub fn with_kind(mut self, kind: ListingKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_reserve_price(mut self, reserve: Money) -> Self {
        self.reserve_price = Some(reserve);
        self
    }
}

//--------------------------------------       Offer        ----------------------------------------------------------
/// A single price submission against an auction. Immutable once created, except for `status` in
/// the manual accept/decline flow.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Offer {
    pub id: i64,
    pub auction_id: i64,
    pub offerer_id: UserId,
    pub price: Money,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOffer {
    pub auction_id: i64,
    pub offerer_id: UserId,
    pub price: Money,
}

impl NewOffer {
    pub fn new(auction_id: i64, offerer_id: UserId, price: Money) -> Self {
        Self { auction_id, offerer_id, price }
    }
}

//--------------------------------------       Tender       ----------------------------------------------------------
/// A reverse auction. `current_lowest_bid` starts at `max_budget` and only ever falls; like the
/// auction's cached price it is a display value, not the settlement source of truth.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Tender {
    pub id: i64,
    pub owner_id: UserId,
    pub title: String,
    pub category: String,
    pub starting_at: DateTime<Utc>,
    pub ending_at: DateTime<Utc>,
    pub max_budget: Money,
    pub current_lowest_bid: Money,
    pub minimum_price: Option<Money>,
    pub status: TenderStatus,
    pub awarded_to: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tender {
    pub fn is_open(&self) -> bool {
        self.status == TenderStatus::Open
    }

    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.ending_at < now
    }
}

#[derive(Debug, Clone)]
pub struct NewTender {
    pub owner_id: UserId,
    pub title: String,
    pub category: String,
    pub starting_at: DateTime<Utc>,
    pub ending_at: DateTime<Utc>,
    pub max_budget: Money,
    /// The floor below which no bid is acceptable. When set, the tender settles without an award
    /// unless the best (lowest) bid is at or above it.
    pub minimum_price: Option<Money>,
}

impl NewTender {
    pub fn new(
        owner_id: UserId,
        title: impl Into<String>,
        max_budget: Money,
        starting_at: DateTime<Utc>,
        ending_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id,
            title: title.into(),
            category: "general".to_string(),
            starting_at,
            ending_at,
            max_budget,
            minimum_price: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_minimum_price(mut self, floor: Money) -> Self {
        self.minimum_price = Some(floor);
        self
    }
}

//--------------------------------------     TenderBid      ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TenderBid {
    pub id: i64,
    pub tender_id: i64,
    pub bidder_id: UserId,
    pub amount: Money,
    pub proposal: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTenderBid {
    pub tender_id: i64,
    pub bidder_id: UserId,
    pub amount: Money,
    pub proposal: String,
}

impl NewTenderBid {
    pub fn new(tender_id: i64, bidder_id: UserId, amount: Money, proposal: impl Into<String>) -> Self {
        Self { tender_id, bidder_id, amount, proposal: proposal.into() }
    }
}

//--------------------------------------        Chat        ----------------------------------------------------------
/// A two-party communication channel. Created exactly once per settlement that produces a winner.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub user_a: UserId,
    pub user_b: UserId,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn links(&self, a: UserId, b: UserId) -> bool {
        (self.user_a == a && self.user_b == b) || (self.user_a == b && self.user_b == a)
    }
}

//--------------------------------------    Notification    ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub payload: Json<Value>,
    pub sender_id: Option<UserId>,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub payload: Value,
    pub sender_id: Option<UserId>,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
}

impl NewNotification {
    pub fn new(
        recipient_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id,
            kind,
            title: title.into(),
            message: message.into(),
            payload: Value::Null,
            sender_id: None,
            sender_name: None,
            sender_email: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_sender(mut self, id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.sender_id = Some(id);
        self.sender_name = Some(name.into());
        self.sender_email = Some(email.into());
        self
    }
}

//--------------------------------------    UserProfile     ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct NewUserProfile {
    pub display_name: String,
    pub email: String,
}

impl NewUserProfile {
    pub fn new(display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { display_name: display_name.into(), email: email.into() }
    }
}

//--------------------------------------     window math    ----------------------------------------------------------
/// Integer check for "remaining time is at most 1/[`CLOSING_WINDOW_DIVISOR`] of the total window".
fn in_final_window(starting_at: DateTime<Utc>, ending_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    if now >= ending_at || ending_at <= starting_at {
        return false;
    }
    let total: Duration = ending_at - starting_at;
    let remaining: Duration = ending_at - now;
    remaining * CLOSING_WINDOW_DIVISOR <= total
}
