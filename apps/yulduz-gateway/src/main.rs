use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod handlers;
mod ledger;
mod rpc;

use config::GatewayConfig;
use ledger::{Ledger, PgLedger};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn Ledger>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yulduz_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env()?;
    tracing::info!("Payment gateway starting...");

    let pool = yulduz_db::connect(&config.database_url).await?;
    let state = AppState {
        ledger: Arc::new(PgLedger::new(pool)),
    };

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/paynet", post(handlers::paynet::paynet_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    tracing::info!("Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
