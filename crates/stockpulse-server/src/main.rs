//! stockpulse HTTP service.
//!
//! Exposes the daily pipeline triggers (`POST /sync`, `POST /ta-metrics`)
//! for an external scheduler, plus the read API the presentation layer
//! consumes. Both triggers are idempotent and safe to re-invoke.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use stockpulse_core::{
    FmpAdapter, MarketDataSource, PipelineConfig, ReqwestHttpClient, FMP_API_KEY_ENV,
};
use stockpulse_warehouse::{Warehouse, WarehouseConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod error;
mod routes;
mod state;

use state::AppState;

#[derive(Debug, Parser)]
#[command(name = "stockpulse", about = "Daily TA pipeline service")]
struct Args {
    /// Address to bind the HTTP server on.
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: SocketAddr,

    /// Pipeline configuration file (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Warehouse database file. Defaults to $STOCKPULSE_HOME/warehouse.duckdb.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Serve seeded provider data instead of calling the real API.
    #[arg(long)]
    mock_provider: bool,
}

fn build_provider(mock: bool) -> Arc<dyn MarketDataSource> {
    if mock {
        tracing::info!("using mock market-data provider");
        return Arc::new(FmpAdapter::default());
    }

    let api_key = match std::env::var(FMP_API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            tracing::warn!(
                "{} is not set; falling back to the provider demo key",
                FMP_API_KEY_ENV
            );
            String::from("demo")
        }
    };
    Arc::new(FmpAdapter::with_http_client(
        Arc::new(ReqwestHttpClient::new()),
        api_key,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockpulse=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    let mut warehouse_config = WarehouseConfig::default();
    if let Some(db_path) = args.db_path {
        warehouse_config.db_path = db_path;
    }
    // Total-loss condition: an unreachable store fails startup, not runs.
    let warehouse = Warehouse::open(warehouse_config)?;

    let provider = build_provider(args.mock_provider);
    let state = AppState::new(warehouse, provider, config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/sync", post(routes::run_sync))
        .route("/ta-metrics", post(routes::run_ta_metrics))
        .route("/bars/:symbol", get(routes::bars))
        .route("/patterns", get(routes::patterns))
        .route("/symbols", get(routes::symbols))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    tracing::info!("stockpulse v{} listening on {}", env!("CARGO_PKG_VERSION"), args.bind);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
