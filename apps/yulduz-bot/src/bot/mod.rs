use teloxide::{dptree, prelude::*, types::Update};
use tracing::{error, info};

pub mod handlers;
pub mod keyboards;
pub mod utils;

use crate::state::AppState;

pub async fn run_bot(bot: Bot, state: AppState) {
    info!("Bot identity check...");
    match bot.get_me().await {
        Ok(me) => {
            info!(
                "Bot connected as: @{}",
                me.username.clone().unwrap_or("unknown".into())
            );
        }
        Err(e) => {
            error!("CRITICAL: Bot failed to connect to Telegram: {}", e);
            return;
        }
    }

    let message_handler = Update::filter_message().endpoint(handlers::message::message_handler);
    let callback_handler =
        Update::filter_callback_query().endpoint(handlers::callback::callback_handler);

    Dispatcher::builder(
        bot,
        dptree::entry()
            .branch(message_handler)
            .branch(callback_handler),
    )
    .dependencies(dptree::deps![state])
    .default_handler(|upd: std::sync::Arc<Update>| async move {
        info!("Unhandled update: {:?}", upd);
    })
    .build()
    .dispatch()
    .await;

    info!("Bot dispatcher exited");
}
