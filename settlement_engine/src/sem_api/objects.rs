use std::fmt::Display;

use mkt_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::UserId;

/// The terminal decision for a single listing. Settlement of a record that already left `Open` is
/// reported as [`SettlementOutcome::AlreadySettled`] and has no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    /// The auction sold. A winner was assigned and the winner↔owner chat was created.
    Sold { winner: UserId, price: Money },
    /// The tender was awarded to the lowest qualifying bidder.
    Awarded { winner: UserId, amount: Money },
    /// No offers, or the best offer failed the reserve/minimum gate. No winner, no chat.
    ClosedUnsold,
    /// The record had already left `Open` when this settlement attempt looked at it.
    AlreadySettled,
}

/// Per-tick tally returned by [`crate::SettlementApi::settle_due`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub sold: usize,
    pub awarded: usize,
    pub closed_unsold: usize,
    pub already_settled: usize,
    pub failed: usize,
}

impl SweepSummary {
    pub fn total_settled(&self) -> usize {
        self.sold + self.awarded + self.closed_unsold
    }

    pub(crate) fn record(&mut self, outcome: &SettlementOutcome) {
        match outcome {
            SettlementOutcome::Sold { .. } => self.sold += 1,
            SettlementOutcome::Awarded { .. } => self.awarded += 1,
            SettlementOutcome::ClosedUnsold => self.closed_unsold += 1,
            SettlementOutcome::AlreadySettled => self.already_settled += 1,
        }
    }
}

impl Display for SweepSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} sold, {} awarded, {} closed unsold, {} already settled, {} failed",
            self.sold, self.awarded, self.closed_unsold, self.already_settled, self.failed
        )
    }
}
