use std::str::FromStr;

use clap::Parser;
use dotenvy::dotenv;
use log::{info, LevelFilter};
use loyalty_engine::{
    accrual::{ClientPool, PoolConfig},
    run_migrations,
    traits::LoyaltyDatabase,
    AccrualApi, PgLoyaltyDatabase,
};
use loyalty_server::{
    accrual_worker::AccrualWorker,
    cli::Arguments,
    config::ServerConfig,
    errors::ServerError,
    server::create_server_instance,
};

const MAX_DB_CONNECTIONS: u32 = 25;

#[actix_web::main]
async fn main() {
    dotenv().ok();
    let args = Arguments::parse();
    let config = ServerConfig::assemble(args);
    init_logging(&config.log_level);
    match run(config).await {
        Ok(()) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}

fn init_logging(level: &str) {
    let level = LevelFilter::from_str(level).unwrap_or(LevelFilter::Debug);
    env_logger::Builder::from_default_env().filter_level(level).init();
}

async fn run(config: ServerConfig) -> Result<(), ServerError> {
    if config.database_uri.is_empty() {
        return Err(ServerError::ConfigurationError(
            "DATABASE_URI is not set. Point it at the loyalty database before starting.".to_string(),
        ));
    }

    let db = PgLoyaltyDatabase::connect(&config.database_uri, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    run_migrations(db.pool()).await.map_err(|e| ServerError::ConfigurationError(e.to_string()))?;

    let pool = ClientPool::new(PoolConfig::new(config.rate_limit, &config.accrual_address))
        .map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let worker = AccrualWorker::start(AccrualApi::new(db.clone(), pool), config.poll_interval_secs);

    info!("🚀️ Starting server on {}", config.address);
    let srv = create_server_instance(config, db.clone())?;
    let result = srv.await.map_err(ServerError::from);

    // LIFO teardown: the HTTP server has drained by now; stop the poller, then the store.
    worker.stop().await;
    db.close().await;
    info!("🚀️ Shutdown complete");
    result
}
