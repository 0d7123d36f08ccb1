use chrono::{DateTime, Utc};
use log::trace;
use mkt_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewTender, NewTenderBid, Tender, TenderBid, UserId},
};

const TENDER_COLUMNS: &str = "id, owner_id, title, category, starting_at, ending_at, max_budget, \
                              current_lowest_bid, minimum_price, status, awarded_to, created_at, updated_at";

pub async fn insert_tender(tender: NewTender, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO tenders (
                owner_id, title, category, starting_at, ending_at, max_budget, current_lowest_bid, minimum_price
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id;
        "#,
    )
    .bind(tender.owner_id)
    .bind(&tender.title)
    .bind(&tender.category)
    .bind(tender.starting_at)
    .bind(tender.ending_at)
    .bind(tender.max_budget)
    // the ceiling doubles as the initial "current lowest bid"
    .bind(tender.max_budget)
    .bind(tender.minimum_price)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn fetch_tender(id: i64, conn: &mut SqliteConnection) -> Result<Option<Tender>, SqliteDatabaseError> {
    let tender = sqlx::query_as::<_, Tender>(&format!("SELECT {TENDER_COLUMNS} FROM tenders WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(tender)
}

pub async fn fetch_due_tenders(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Tender>, SqliteDatabaseError> {
    let tenders = sqlx::query_as::<_, Tender>(&format!(
        "SELECT {TENDER_COLUMNS} FROM tenders WHERE status = 'Open' AND ending_at < $1 ORDER BY ending_at ASC"
    ))
    .bind(now)
    .fetch_all(conn)
    .await?;
    trace!("🗃️ {} tenders are due for settlement", tenders.len());
    Ok(tenders)
}

/// Set-if-less update on the cached lowest bid; mirror image of the auction's set-if-greater.
pub async fn lower_current_bid(
    tender_id: i64,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE tenders SET current_lowest_bid = $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 AND status = 'Open' AND current_lowest_bid > $3",
    )
    .bind(amount)
    .bind(tender_id)
    .bind(amount)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_tender_awarded(
    tender_id: i64,
    winner: UserId,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE tenders SET status = 'Awarded', awarded_to = $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 AND status = 'Open'",
    )
    .bind(winner)
    .bind(tender_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn close_tender(tender_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE tenders SET status = 'Closed', awarded_to = NULL, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 AND status = 'Open'",
    )
    .bind(tender_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_tender_bid(
    bid: NewTenderBid,
    conn: &mut SqliteConnection,
) -> Result<TenderBid, SqliteDatabaseError> {
    let bid = sqlx::query_as::<_, TenderBid>(
        r#"
            INSERT INTO tender_bids (tender_id, bidder_id, amount, proposal)
            VALUES ($1, $2, $3, $4)
            RETURNING id, tender_id, bidder_id, amount, proposal, created_at;
        "#,
    )
    .bind(bid.tender_id)
    .bind(bid.bidder_id)
    .bind(bid.amount)
    .bind(&bid.proposal)
    .fetch_one(conn)
    .await?;
    Ok(bid)
}

/// The complete bid set for a tender, ordered by creation time.
pub async fn fetch_tender_bids(
    tender_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<TenderBid>, SqliteDatabaseError> {
    let bids = sqlx::query_as::<_, TenderBid>(
        "SELECT id, tender_id, bidder_id, amount, proposal, created_at FROM tender_bids \
         WHERE tender_id = $1 ORDER BY created_at ASC, id ASC",
    )
    .bind(tender_id)
    .fetch_all(conn)
    .await?;
    Ok(bids)
}
