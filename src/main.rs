use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use banner_audit::api::health::HealthState;
use banner_audit::api::latency::QueryLatency;
use banner_audit::api::{router, ApiState};
use banner_audit::config::{Config, DEFAULT_PAGE_SIZE};
use banner_audit::db::{RecordStore, RecordWriter};
use banner_audit::error::Result;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let options = SqliteConnectOptions::new()
        .filename(&cfg.db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);

    let store = RecordStore::new(pool);
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(QueryLatency::new());

    // --- Append-only writer ---
    let (writer_tx, writer_rx) = mpsc::channel(cfg.write_queue_capacity);
    let writer = RecordWriter::new(store.clone(), writer_rx, Arc::clone(&health));
    tokio::spawn(async move { writer.run().await });

    // --- HTTP API server ---
    let api_state = ApiState {
        store,
        writer_tx,
        health,
        latency,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        page_size = DEFAULT_PAGE_SIZE,
        write_queue = cfg.write_queue_capacity,
        "HTTP API listening on {bind_addr}"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
