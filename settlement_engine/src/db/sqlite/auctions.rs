use chrono::{DateTime, Utc};
use log::trace;
use mkt_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Auction, NewAuction, UserId},
};

const AUCTION_COLUMNS: &str = "id, owner_id, title, category, kind, starting_at, ending_at, starting_price, \
                               current_price, reserve_price, status, winner_id, closing_alert_sent, created_at, \
                               updated_at";

pub async fn insert_auction(auction: NewAuction, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO auctions (
                owner_id, title, category, kind, starting_at, ending_at, starting_price, current_price, reserve_price
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id;
        "#,
    )
    .bind(auction.owner_id)
    .bind(&auction.title)
    .bind(&auction.category)
    .bind(auction.kind)
    .bind(auction.starting_at)
    .bind(auction.ending_at)
    .bind(auction.starting_price)
    // the cached current price starts at the starting price
    .bind(auction.starting_price)
    .bind(auction.reserve_price)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn fetch_auction(id: i64, conn: &mut SqliteConnection) -> Result<Option<Auction>, SqliteDatabaseError> {
    let auction = sqlx::query_as::<_, Auction>(&format!("SELECT {AUCTION_COLUMNS} FROM auctions WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(auction)
}

/// Auctions that are still `Open` but whose window elapsed before `now`.
pub async fn fetch_due_auctions(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Auction>, SqliteDatabaseError> {
    let auctions = sqlx::query_as::<_, Auction>(&format!(
        "SELECT {AUCTION_COLUMNS} FROM auctions WHERE status = 'Open' AND ending_at < $1 ORDER BY ending_at ASC"
    ))
    .bind(now)
    .fetch_all(conn)
    .await?;
    trace!("🗃️ {} auctions are due for settlement", auctions.len());
    Ok(auctions)
}

/// Open, unexpired auctions whose one-shot "ending soon" flag is still unset. The caller applies
/// the 5%-window filter.
pub async fn fetch_alert_candidates(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Auction>, SqliteDatabaseError> {
    let auctions = sqlx::query_as::<_, Auction>(&format!(
        "SELECT {AUCTION_COLUMNS} FROM auctions \
         WHERE status = 'Open' AND closing_alert_sent = 0 AND ending_at > $1 \
         ORDER BY ending_at ASC"
    ))
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(auctions)
}

/// Set-if-greater update on the cached current price. The guard closes the lost-update race: of
/// two concurrent valid offers, the smaller one leaves the field untouched.
pub async fn raise_current_price(
    auction_id: i64,
    price: Money,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE auctions SET current_price = $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 AND status = 'Open' AND current_price < $3",
    )
    .bind(price)
    .bind(auction_id)
    .bind(price)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// The `Open → OnAuction` transition. The status guard makes this atomic and idempotent under
/// concurrent sweep ticks: exactly one caller observes `true`.
pub async fn mark_auction_sold(
    auction_id: i64,
    winner: UserId,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE auctions SET status = 'OnAuction', winner_id = $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 AND status = 'Open'",
    )
    .bind(winner)
    .bind(auction_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// The `Open → Closed` (no sale) transition. `Closed` implies no winner, so `winner_id` is
/// explicitly nulled.
pub async fn close_auction(auction_id: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE auctions SET status = 'Closed', winner_id = NULL, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 AND status = 'Open'",
    )
    .bind(auction_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_closing_alert_sent(
    auction_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE auctions SET closing_alert_sent = 1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 AND closing_alert_sent = 0",
    )
    .bind(auction_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
