use teloxide::prelude::*;
use tracing::error;

use crate::bot::handlers::message::send_admin_panel;
use crate::bot::keyboards::{self, labels};
use crate::bot::utils::input;
use crate::session::Step;
use crate::state::AppState;
use yulduz_db::models::{Order, PriceType, ORDER_TYPE_STARS};

/// Admin panel text dispatch. Returns true when the message was consumed
/// so the regular menu dispatch is skipped.
pub async fn handle_admin_text(bot: &Bot, state: &AppState, chat_id: ChatId, text: &str) -> bool {
    match text {
        labels::ADMIN_ALL_USERS => {
            list_users(bot, state, chat_id).await;
            true
        }
        labels::ADMIN_FIND_BY_ID => {
            state.sessions.enter(chat_id.0, Step::SearchById);
            let _ = bot
                .send_message(chat_id, "🔍 Foydalanuvchining Telegram ID sini kiriting:")
                .reply_markup(keyboards::back_keyboard())
                .await;
            true
        }
        labels::ADMIN_PAYMENTS => {
            list_payments(bot, state, chat_id).await;
            true
        }
        labels::ADMIN_PRICES => {
            show_price_board(bot, state, chat_id).await;
            true
        }
        _ => handle_admin_step(bot, state, chat_id, text).await,
    }
}

async fn handle_admin_step(bot: &Bot, state: &AppState, chat_id: ChatId, text: &str) -> bool {
    match state.sessions.step(chat_id.0) {
        Some(Step::SearchById) => {
            find_user(bot, state, chat_id, text).await;
            true
        }
        Some(Step::AdjustStars { target_tg_id }) => {
            adjust_stars(bot, state, chat_id, target_tg_id, text).await;
            true
        }
        Some(Step::SelectPriceType) => {
            select_price_type(bot, state, chat_id, text).await;
            true
        }
        Some(Step::UpdatePrice { price_type }) => {
            update_price(bot, state, chat_id, price_type, text).await;
            true
        }
        _ => false,
    }
}

async fn list_users(bot: &Bot, state: &AppState, chat_id: ChatId) {
    let users = match state.users.list(50).await {
        Ok(users) => users,
        Err(e) => {
            error!("Failed to list users: {:#}", e);
            send_admin_error(bot, chat_id).await;
            return;
        }
    };
    if users.is_empty() {
        let _ = bot
            .send_message(chat_id, "Hozircha foydalanuvchilar yo‘q.")
            .await;
        return;
    }

    let mut lines = vec![format!("📋 Oxirgi {} foydalanuvchi:\n", users.len())];
    for user in &users {
        lines.push(format!(
            "👤 {} | @{} | ID: {} | ⭐ {}",
            user.first_name,
            if user.username.is_empty() {
                "nomalum"
            } else {
                &user.username
            },
            user.tg_id,
            user.stars_earned
        ));
    }
    let _ = bot.send_message(chat_id, lines.join("\n")).await;
}

async fn find_user(bot: &Bot, state: &AppState, chat_id: ChatId, text: &str) {
    let Ok(target) = text.trim().parse::<i64>() else {
        let _ = bot
            .send_message(chat_id, "❌ Raqamli Telegram ID kiriting.")
            .reply_markup(keyboards::back_keyboard())
            .await;
        return;
    };

    match state.users.get_by_tg_id(target).await {
        Ok(Some(user)) => {
            state.sessions.enter(
                chat_id.0,
                Step::AdjustStars {
                    target_tg_id: user.tg_id,
                },
            );
            let _ = bot
                .send_message(
                    chat_id,
                    format!(
                        "👤 {}\n📞 {}\n@{}\nID: {}\n⭐ {}\n\nNechta yulduz qo‘shamiz? Sonini kiriting:",
                        user.first_name,
                        user.phone_number,
                        if user.username.is_empty() {
                            "nomalum"
                        } else {
                            &user.username
                        },
                        user.tg_id,
                        user.stars_earned
                    ),
                )
                .reply_markup(keyboards::back_keyboard())
                .await;
        }
        Ok(None) => {
            let _ = bot
                .send_message(chat_id, "❌ Bunday foydalanuvchi topilmadi.")
                .reply_markup(keyboards::back_keyboard())
                .await;
        }
        Err(e) => {
            error!("Failed to find user {}: {:#}", target, e);
            send_admin_error(bot, chat_id).await;
        }
    }
}

async fn adjust_stars(bot: &Bot, state: &AppState, chat_id: ChatId, target_tg_id: i64, text: &str) {
    let Some(amount) = input::parse_positive_amount(text) else {
        let _ = bot
            .send_message(chat_id, "❌ Musbat son kiriting.")
            .reply_markup(keyboards::back_keyboard())
            .await;
        return;
    };

    match state.users.add_stars(target_tg_id, amount).await {
        Ok(Some(user)) => {
            state.sessions.clear(chat_id.0);
            let _ = bot
                .send_message(
                    ChatId(user.tg_id),
                    format!(
                        "🎉 Sizga {} ta ⭐ qo‘shildi! Jami: {} ⭐",
                        amount, user.stars_earned
                    ),
                )
                .await;
            let _ = bot
                .send_message(
                    chat_id,
                    format!(
                        "✅ {} ga {} ta ⭐ qo‘shildi. Yangi balans: {} ⭐",
                        user.tg_id, amount, user.stars_earned
                    ),
                )
                .reply_markup(keyboards::admin_menu())
                .await;
        }
        Ok(None) => {
            let _ = bot
                .send_message(chat_id, "❌ Bunday foydalanuvchi topilmadi.")
                .reply_markup(keyboards::back_keyboard())
                .await;
        }
        Err(e) => {
            error!("Failed to adjust stars for {}: {:#}", target_tg_id, e);
            send_admin_error(bot, chat_id).await;
        }
    }
}

async fn list_payments(bot: &Bot, state: &AppState, chat_id: ChatId) {
    let orders = match state.orders.recent(20).await {
        Ok(orders) => orders,
        Err(e) => {
            error!("Failed to list orders: {:#}", e);
            send_admin_error(bot, chat_id).await;
            return;
        }
    };
    if orders.is_empty() {
        let _ = bot.send_message(chat_id, "Hozircha buyurtmalar yo‘q.").await;
        return;
    }

    let mut lines = vec![format!("💰 Oxirgi {} buyurtma:\n", orders.len())];
    for order in &orders {
        lines.push(format_order_line(order));
    }
    let _ = bot.send_message(chat_id, lines.join("\n")).await;
}

fn format_order_line(order: &Order) -> String {
    let what = if order.order_type == ORDER_TYPE_STARS {
        format!("⭐ {} ta", order.stars_count.unwrap_or_default())
    } else {
        format!("🎁 Premium {} oy", order.months.unwrap_or_default())
    };
    let status = if order.paid { "✅" } else { "⏳" };
    format!(
        "{} #{} | {} | {} so'm | {} | {}",
        status,
        order.order_id,
        what,
        order.amount,
        order.recipient,
        order.created_at.format("%Y-%m-%d %H:%M")
    )
}

async fn show_price_board(bot: &Bot, state: &AppState, chat_id: ChatId) {
    let board = match state.catalog.board().await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to load price board: {:#}", e);
            send_admin_error(bot, chat_id).await;
            return;
        }
    };
    let price = |pt: PriceType| board.get(&pt).copied().unwrap_or(pt.default_value());

    state.sessions.enter(chat_id.0, Step::SelectPriceType);
    let _ = bot
        .send_message(
            chat_id,
            format!(
                "💵 Joriy narxlar:\n\n\
                📦 Premium 3 oy: {} so'm\n\
                📦 Premium 6 oy: {} so'm\n\
                📦 Premium 1 yil: {} so'm\n\
                💎 Yulduz narxi: {} so'm\n\n\
                Qaysi narxni o‘zgartiramiz?",
                price(PriceType::Premium3Months),
                price(PriceType::Premium6Months),
                price(PriceType::Premium12Months),
                price(PriceType::StarPerUnit),
            ),
        )
        .reply_markup(keyboards::price_type_keyboard())
        .await;
}

async fn select_price_type(bot: &Bot, state: &AppState, chat_id: ChatId, text: &str) {
    let Some(price_type) = input::price_type_from_label(text) else {
        let _ = bot
            .send_message(chat_id, "❌ Tugmalardan birini tanlang.")
            .reply_markup(keyboards::price_type_keyboard())
            .await;
        return;
    };

    state
        .sessions
        .enter(chat_id.0, Step::UpdatePrice { price_type });
    let _ = bot
        .send_message(
            chat_id,
            format!(
                "{} uchun yangi narxni kiriting (so'mda):",
                price_type_display(price_type)
            ),
        )
        .reply_markup(keyboards::back_keyboard())
        .await;
}

async fn update_price(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    price_type: PriceType,
    text: &str,
) {
    let Some(value) = input::parse_positive_amount(text) else {
        let _ = bot
            .send_message(chat_id, "❌ Musbat son kiriting.")
            .reply_markup(keyboards::back_keyboard())
            .await;
        return;
    };

    if let Err(e) = state.catalog.set_price(price_type, value).await {
        error!("Failed to update price {:?}: {:#}", price_type, e);
        send_admin_error(bot, chat_id).await;
        return;
    }

    state.sessions.clear(chat_id.0);
    let _ = bot
        .send_message(
            chat_id,
            format!(
                "✅ {} narxi {} so'mga o‘zgartirildi.",
                price_type_display(price_type),
                value
            ),
        )
        .reply_markup(keyboards::admin_menu())
        .await;
}

fn price_type_display(price_type: PriceType) -> &'static str {
    match price_type {
        PriceType::Premium3Months => "Premium 3 oy",
        PriceType::Premium6Months => "Premium 6 oy",
        PriceType::Premium12Months => "Premium 1 yil",
        PriceType::StarPerUnit => "Yulduz narxi",
    }
}

async fn send_admin_error(bot: &Bot, chat_id: ChatId) {
    let _ = bot
        .send_message(chat_id, "❌ Xatolik yuz berdi. Keyinroq urinib ko‘ring.")
        .await;
    send_admin_panel(bot, chat_id).await;
}
