//! Price aggregation over the complete offer/bid set of a listing.
//!
//! Settlement never trusts the cached `current_price` / `current_lowest_bid` columns. Those fields
//! are written with a read-then-check submission path and can lose an update under concurrent
//! offers; the functions here re-derive the true extremum from the full ledger, which is the
//! compensating control for that race.

use crate::db_types::{Offer, OfferStatus, TenderBid};

/// The best (highest-priced) offer on a forward auction.
///
/// Declined offers are out of the running. Ties cannot occur when the ledger's strictly-improving
/// validation held, but hand-seeded or raced data is still settled deterministically: earliest
/// `created_at` wins, then the lowest id.
pub fn best_offer(offers: &[Offer]) -> Option<&Offer> {
    offers
        .iter()
        .filter(|o| o.status != OfferStatus::Declined)
        .max_by(|a, b| a.price.cmp(&b.price).then_with(|| earlier(a, b)))
}

/// The best (lowest-amount) bid on a tender. Same tie-break as [`best_offer`].
pub fn best_bid(bids: &[TenderBid]) -> Option<&TenderBid> {
    bids.iter().min_by(|a, b| a.amount.cmp(&b.amount).then_with(|| later(a, b)))
}

/// Every distinct offerer other than `exclude`, in first-seen order.
pub fn other_offerers(offers: &[Offer], exclude: crate::db_types::UserId) -> Vec<crate::db_types::UserId> {
    let mut seen = Vec::new();
    for offer in offers {
        if offer.offerer_id != exclude && !seen.contains(&offer.offerer_id) {
            seen.push(offer.offerer_id);
        }
    }
    seen
}

/// Every distinct bidder other than `exclude`, in first-seen order.
pub fn other_bidders(bids: &[TenderBid], exclude: crate::db_types::UserId) -> Vec<crate::db_types::UserId> {
    let mut seen = Vec::new();
    for bid in bids {
        if bid.bidder_id != exclude && !seen.contains(&bid.bidder_id) {
            seen.push(bid.bidder_id);
        }
    }
    seen
}

// `max_by` keeps the *last* maximum, so to prefer the earliest submission on a tie the comparator
// must rank the earlier offer higher.
fn earlier(a: &Offer, b: &Offer) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
}

// `min_by` keeps the *first* minimum; rank the earlier bid lower so it survives the scan.
fn later(a: &TenderBid, b: &TenderBid) -> std::cmp::Ordering {
    a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use mkt_common::Money;

    use super::*;
    use crate::db_types::{OfferStatus, UserId};

    fn offer(id: i64, offerer: i64, price: i64, minute: u32) -> Offer {
        Offer {
            id,
            auction_id: 1,
            offerer_id: UserId(offerer),
            price: Money::from_units(price),
            status: OfferStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0).unwrap(),
        }
    }

    fn bid(id: i64, bidder: i64, amount: i64, minute: u32) -> TenderBid {
        TenderBid {
            id,
            tender_id: 1,
            bidder_id: UserId(bidder),
            amount: Money::from_units(amount),
            proposal: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn highest_offer_wins() {
        let offers = vec![offer(1, 10, 80, 0), offer(2, 11, 150, 1), offer(3, 12, 120, 2)];
        assert_eq!(best_offer(&offers).unwrap().id, 2);
    }

    #[test]
    fn empty_ledger_has_no_best() {
        assert!(best_offer(&[]).is_none());
        assert!(best_bid(&[]).is_none());
    }

    #[test]
    fn declined_offers_are_ignored() {
        let mut offers = vec![offer(1, 10, 100, 0), offer(2, 11, 200, 1)];
        offers[1].status = OfferStatus::Declined;
        assert_eq!(best_offer(&offers).unwrap().id, 1);
    }

    #[test]
    fn offer_ties_break_by_first_submitted() {
        let offers = vec![offer(1, 10, 100, 5), offer(2, 11, 100, 1), offer(3, 12, 100, 3)];
        assert_eq!(best_offer(&offers).unwrap().id, 2);
    }

    #[test]
    fn lowest_bid_wins() {
        let bids = vec![bid(1, 20, 600, 0), bid(2, 21, 550, 1), bid(3, 22, 700, 2)];
        assert_eq!(best_bid(&bids).unwrap().id, 2);
    }

    #[test]
    fn bid_ties_break_by_first_submitted() {
        let bids = vec![bid(1, 20, 550, 4), bid(2, 21, 550, 2)];
        assert_eq!(best_bid(&bids).unwrap().id, 2);
    }

    #[test]
    fn other_offerers_are_distinct_and_exclude_winner() {
        let offers =
            vec![offer(1, 10, 80, 0), offer(2, 11, 90, 1), offer(3, 10, 100, 2), offer(4, 12, 110, 3)];
        let losers = other_offerers(&offers, UserId(12));
        assert_eq!(losers, vec![UserId(10), UserId(11)]);
    }
}
