//! Marketplace Settlement Engine
//!
//! The settlement engine is the core of the marketplace backend. It accepts competing price offers
//! against forward auctions (prices rise) and reverse-auction tenders (prices fall), and decides,
//! exactly once, when and how each listing closes, who wins, and which side effects must fire.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). Sqlite is the supported backend. You should
//!    never need to access the database directly; use the public API instead. The exception is the
//!    data types used in the database, defined in the public `db_types` module.
//! 2. The engine public API ([`mod@sem_api`]). [`OfferFlowApi`] handles the synchronous offer and
//!    bid submission path (the offer ledger), and [`SettlementApi`] is the state machine that
//!    resolves expired listings and fans out the resulting side effects.
//! 3. The collaborator seams ([`mod@traits`]). Notification persistence, chat creation, realtime
//!    push and user lookups are consumed through narrow trait objects so the settlement core never
//!    depends on the hosting layer.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted
//! when certain actions occur, e.g. when an offer is placed or a listing settles. A simple actor
//! framework is used so that you can easily hook into these events and perform custom actions.
mod db;

pub mod db_types;
pub mod events;
pub mod pricing;
mod sem_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{db_url, new_pool, run_migrations, SqliteDatabase, SqliteDatabaseError};
pub use sem_api::{
    errors::MarketplaceApiError,
    objects::{SettlementOutcome, SweepSummary},
    offer_flow_api::OfferFlowApi,
    settlement_api::SettlementApi,
};
pub use traits::MarketplaceDatabase;
