//! # Settlement engine public API
//!
//! The `sem_api` module exposes the programmatic API for the settlement engine. The pattern for
//! using both APIs is the same: an instance is created by supplying a database backend that
//! implements [`crate::traits::MarketplaceDatabase`], the bundle of side-effect collaborators, and
//! the event producers to publish to.
//!
//! * [`offer_flow_api`] is the synchronous submission path: it validates and appends offers and
//!   bids (the offer ledger) and maintains the cached current-price fields.
//! * [`settlement_api`] is the autonomous path: it resolves expired listings exactly once, fans
//!   out the resulting side effects, and runs the near-close alert scan.

pub mod errors;
pub mod objects;
pub mod offer_flow_api;
pub mod settlement_api;
