use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use fine_payment_engine::{SqliteDatabase, TransactionFlowApi};
use log::info;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    middleware::PaymeAuthMiddlewareFactory,
    routes::{health, PaymeWebhookRoute},
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let api = TransactionFlowApi::new(db, config.transaction_timeout);
    let _worker = start_expiry_worker(api.clone(), config.expiry_sweep_interval);
    let srv = create_server_instance(config, api)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Builds the HTTP server. Every worker shares `api` (and with it, the transaction locks) through `web::Data`.
pub fn create_server_instance(
    config: ServerConfig,
    api: TransactionFlowApi<SqliteDatabase>,
) -> Result<Server, ServerError> {
    let api = web::Data::new(api);
    info!("💻️ Gateway webhook will be served at http://{}:{}/payme", config.host, config.port);
    let srv = HttpServer::new(move || {
        let payme = config.payme.clone();
        let payme_scope = web::scope("/payme")
            .wrap(PaymeAuthMiddlewareFactory::new(&payme.login, payme.merchant_key, payme.auth_checks))
            .service(PaymeWebhookRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("fpg::access_log"))
            .app_data(api.clone())
            .service(health)
            .service(payme_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
