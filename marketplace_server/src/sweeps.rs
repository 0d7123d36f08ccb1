use std::time::Duration;

use chrono::Utc;
use log::*;
use settlement_engine::{events::EventProducers, traits::SideEffects, SettlementApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the settlement sweep. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_settlement_worker(
    db: SqliteDatabase,
    side_effects: SideEffects,
    producers: EventProducers,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = SettlementApi::new(db, side_effects, producers);
        info!("🕰️ Settlement worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running settlement sweep");
            match api.settle_due(Utc::now()).await {
                Ok(summary) if summary.total_settled() + summary.failed > 0 => {
                    info!("🕰️ Settlement sweep done: {summary}");
                },
                Ok(_) => trace!("🕰️ Settlement sweep found nothing due"),
                Err(e) => error!("🕰️ Error running settlement sweep: {e}"),
            }
        }
    })
}

/// Starts the near-close alert scan. Do not await the returned JoinHandle, as it will run
/// indefinitely.
pub fn start_closing_alert_worker(
    db: SqliteDatabase,
    side_effects: SideEffects,
    producers: EventProducers,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = SettlementApi::new(db, side_effects, producers);
        info!("🕰️ Near-close alert worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running near-close alert scan");
            match api.send_closing_alerts(Utc::now()).await {
                Ok(0) => trace!("🕰️ No auctions entered their closing window"),
                Ok(n) => info!("🕰️ Closing alerts sent for {n} auctions"),
                Err(e) => error!("🕰️ Error running near-close alert scan: {e}"),
            }
        }
    })
}
