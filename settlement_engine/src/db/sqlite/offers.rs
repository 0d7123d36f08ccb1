use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewOffer, Offer, OfferStatus},
};

const OFFER_COLUMNS: &str = "id, auction_id, offerer_id, price, status, created_at";

pub async fn insert_offer(offer: NewOffer, conn: &mut SqliteConnection) -> Result<Offer, SqliteDatabaseError> {
    let offer = sqlx::query_as::<_, Offer>(&format!(
        r#"
            INSERT INTO offers (auction_id, offerer_id, price)
            VALUES ($1, $2, $3)
            RETURNING {OFFER_COLUMNS};
        "#
    ))
    .bind(offer.auction_id)
    .bind(offer.offerer_id)
    .bind(offer.price)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Offer #{} appended to the ledger of auction #{}", offer.id, offer.auction_id);
    Ok(offer)
}

pub async fn fetch_offer(id: i64, conn: &mut SqliteConnection) -> Result<Option<Offer>, SqliteDatabaseError> {
    let offer = sqlx::query_as::<_, Offer>(&format!("SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(offer)
}

/// The complete offer set for an auction, ordered by creation time. Settlement reads this as a
/// whole; it never pages.
pub async fn fetch_offers_for_auction(
    auction_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Offer>, SqliteDatabaseError> {
    let offers = sqlx::query_as::<_, Offer>(&format!(
        "SELECT {OFFER_COLUMNS} FROM offers WHERE auction_id = $1 ORDER BY created_at ASC, id ASC"
    ))
    .bind(auction_id)
    .fetch_all(conn)
    .await?;
    Ok(offers)
}

/// Manual accept/decline path. Guarded on the offer still being `Pending`.
pub async fn decide_offer(
    offer_id: i64,
    status: OfferStatus,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE offers SET status = $1 WHERE id = $2 AND status = 'Pending'")
        .bind(status)
        .bind(offer_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
