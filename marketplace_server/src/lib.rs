//! # Marketplace server
//!
//! This crate hosts the REST surface and the background scheduling for the settlement engine. It
//! is responsible for:
//! * Accepting offer and bid submissions and routing them into the offer ledger.
//! * Running the timed settlement sweep and the near-close alert scan.
//! * Holding the presence registry that delivers realtime pushes to connected users.
//!
//! ## Configuration
//! The server is configured via `MKT_*` environment variables. See [config] for the full list.
//!
//! ## Routes
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /auction/{id}/offers`: Submit an offer against an open auction.
//! * `POST /tender/{id}/bids`: Submit a bid against an open tender.
//! * `POST /settle/run`: Trigger a settlement sweep immediately.
//! * `GET /auction/{id}`: Fetch an auction and its offer ledger.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod presence;
pub mod routes;
pub mod server;
pub mod sweeps;

#[cfg(test)]
mod endpoint_tests;
