use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use settlement_engine::{
    events::EventProducers,
    traits::SideEffects,
    OfferFlowApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    presence::PresenceRegistry,
    routes::{auction_by_id, health, place_bid, place_offer, run_settlement},
    sweeps::{start_closing_alert_worker, start_settlement_worker},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.database_pool_size)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let presence = PresenceRegistry::new();
    let srv = create_server_instance(config, db, presence)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Builds the HTTP server and spawns the two background workers. The sqlite backend provides the
/// persisted side effects (notifications, chats, user directory); the presence registry provides
/// the realtime push.
pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    presence: PresenceRegistry,
) -> Result<Server, ServerError> {
    let side_effects = SideEffects::new(
        Arc::new(db.clone()),
        Arc::new(db.clone()),
        Arc::new(presence.clone()),
        Arc::new(db.clone()),
    );
    let producers = EventProducers::default();
    start_settlement_worker(db.clone(), side_effects.clone(), producers.clone(), config.settlement_interval);
    start_closing_alert_worker(db.clone(), side_effects.clone(), producers.clone(), config.alert_interval);
    let srv = HttpServer::new(move || {
        let offer_api = OfferFlowApi::new(db.clone(), side_effects.clone(), producers.clone());
        let settlement_api = SettlementApi::new(db.clone(), side_effects.clone(), producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mkt::access_log"))
            .app_data(web::Data::new(offer_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(presence.clone()))
            .service(health)
            .service(place_offer)
            .service(place_bid)
            .service(run_settlement)
            .service(auction_by_id)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
