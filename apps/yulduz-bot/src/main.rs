use dotenvy::dotenv;
use teloxide::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod bot;
mod config;
mod services;
mod session;
mod state;

use crate::config::BotConfig;
use crate::services::catalog_service::CatalogService;
use crate::services::order_service::OrderService;
use crate::session::SessionStore;
use crate::state::AppState;
use yulduz_db::repositories::{PriceRepository, UserRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yulduz_bot=debug,teloxide=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Yulduz Bot...");

    let config = BotConfig::from_env()?;
    let pool = yulduz_db::connect(&config.database_url).await?;

    let catalog = CatalogService::new(PriceRepository::new(pool.clone()));
    catalog.seed_defaults().await?;

    let state = AppState {
        config: std::sync::Arc::new(config.clone()),
        users: UserRepository::new(pool.clone()),
        catalog,
        orders: OrderService::new(pool),
        sessions: SessionStore::new(),
    };

    let bot = Bot::new(&config.bot_token);
    bot::run_bot(bot, state).await;

    Ok(())
}
