use mkt_common::Money;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MarketplaceApiError {
    #[error("Storage error: {0}")]
    DatabaseError(String),
    #[error("Listing #{0} does not exist")]
    ListingNotFound(i64),
    #[error("Offer #{0} does not exist")]
    OfferNotFound(i64),
    #[error("Listing #{id} is no longer accepting submissions (status: {status})")]
    ListingClosed { id: i64, status: String },
    #[error("Submitted price {submitted} does not improve on the current best of {current}")]
    InvalidPrice { submitted: Money, current: Money },
    #[error("Offer #{0} has already been decided")]
    OfferAlreadyDecided(i64),
}

impl MarketplaceApiError {
    pub fn database<E: std::fmt::Display>(e: E) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
