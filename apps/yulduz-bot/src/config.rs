use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub database_url: String,
    /// Channel users must join before registering, "@username" or numeric id.
    pub required_channel: String,
    pub admin_chat_id: i64,
    pub bot_username: String,
    pub support_username: String,
    pub payment_link: String,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bot_token: env::var("BOT_TOKEN").context("BOT_TOKEN is not set")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
            required_channel: env::var("REQUIRED_CHANNEL")
                .context("REQUIRED_CHANNEL is not set")?,
            admin_chat_id: env::var("ADMIN_CHAT_ID")
                .context("ADMIN_CHAT_ID is not set")?
                .parse()
                .context("ADMIN_CHAT_ID must be a number")?,
            bot_username: env::var("BOT_USERNAME").unwrap_or_default(),
            support_username: env::var("SUPPORT_USERNAME").unwrap_or_default(),
            payment_link: env::var("PAYMENT_LINK")
                .unwrap_or_else(|_| "https://t.me/m/8YE5e4r-MzAy".to_string()),
        })
    }
}
