use teloxide::prelude::*;
use teloxide::types::{ParseMode, User as TgUser};
use tracing::{error, info, warn};

use crate::bot::handlers::admin;
use crate::bot::keyboards::{self, labels};
use crate::bot::utils::channel_check::check_channel_membership;
use crate::bot::utils::input;
use crate::bot::utils::phone::normalize_phone;
use crate::session::Step;
use crate::state::AppState;
use yulduz_db::models::{NewOrder, PriceType};

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    let chat_id = msg.chat.id;
    let Some(from) = msg.from.clone() else {
        return Ok(());
    };
    let tg_id = from.id.0 as i64;

    if let Some(contact) = msg.contact() {
        if matches!(
            state.sessions.step(chat_id.0),
            Some(Step::WaitingForPhone { .. })
        ) {
            submit_phone(&bot, &state, chat_id, &from, &contact.phone_number).await;
        }
        return Ok(());
    }

    let Some(text) = msg.text().map(str::trim) else {
        return Ok(());
    };
    if text.is_empty() {
        return Ok(());
    }
    info!("Message from {}: {:?}", tg_id, text);

    if text.starts_with("/start") {
        handle_start(&bot, &state, chat_id, &from, text).await;
        return Ok(());
    }

    // Back works from any step and clears everything.
    if text == labels::BACK {
        state.sessions.clear(chat_id.0);
        if state.is_admin(tg_id) {
            send_admin_panel(&bot, chat_id).await;
        } else {
            send_main_menu(&bot, chat_id).await;
        }
        return Ok(());
    }

    // A typed phone number while registration waits for one.
    if matches!(
        state.sessions.step(chat_id.0),
        Some(Step::WaitingForPhone { .. })
    ) {
        submit_phone(&bot, &state, chat_id, &from, text).await;
        return Ok(());
    }

    if state.is_admin(tg_id) && admin::handle_admin_text(&bot, &state, chat_id, text).await {
        return Ok(());
    }

    // Step-scoped funnel input takes precedence over menu entries.
    match state.sessions.step(chat_id.0) {
        Some(Step::WaitingForStarAmount) => {
            handle_star_amount(&bot, &state, chat_id, text).await;
        }
        Some(Step::WaitingForStarRecipient { stars, price }) => {
            handle_star_recipient(&bot, &state, chat_id, &from, text, stars, price).await;
        }
        Some(Step::ChoosingPackage) => {
            handle_package_choice(&bot, &state, chat_id, text).await;
        }
        Some(Step::ChoosingRecipient { package, price }) => {
            handle_premium_recipient(&bot, &state, chat_id, &from, text, package, price).await;
        }
        _ => {
            handle_menu(&bot, &state, chat_id, text).await;
        }
    }

    Ok(())
}

async fn handle_start(bot: &Bot, state: &AppState, chat_id: ChatId, from: &TgUser, text: &str) {
    let tg_id = from.id.0 as i64;
    if state.is_admin(tg_id) {
        send_admin_panel(bot, chat_id).await;
        return;
    }

    match state.users.get_by_tg_id(tg_id).await {
        Ok(Some(_)) => {
            send_main_menu(bot, chat_id).await;
            return;
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to look up user {}: {:#}", tg_id, e);
            let _ = bot
                .send_message(chat_id, "❌ Xatolik yuz berdi. Keyinroq urinib ko‘ring.")
                .await;
            return;
        }
    }

    // Referral payloads arrive as "/start ref123456" or "/start?ref=123456".
    let payload = text.strip_prefix("/start").unwrap_or("").trim();
    let payload = payload.strip_prefix("?ref=").unwrap_or(payload);
    if let Some(referrer) = input::parse_referral_payload(payload) {
        if referrer != tg_id {
            state.sessions.set_referral(tg_id, referrer);
            if let Err(e) = bot
                .send_message(ChatId(referrer), "🆕 Sizda yangi taklif mavjud!")
                .await
            {
                warn!("Failed to notify referrer {}: {}", referrer, e);
            }
        }
    }

    state.sessions.enter(
        chat_id.0,
        Step::WaitingForPhone {
            pending_phone: None,
        },
    );
    let _ = bot
        .send_message(chat_id, "📲 Telefon raqamingizni yuboring (faqat +998).")
        .reply_markup(keyboards::contact_keyboard())
        .await;
}

async fn submit_phone(bot: &Bot, state: &AppState, chat_id: ChatId, from: &TgUser, raw: &str) {
    let Some(phone) = normalize_phone(raw) else {
        let _ = bot
            .send_message(
                chat_id,
                "❌ Noto‘g‘ri format. Iltimos, telefon raqamingizni +998 bilan boshlanadigan holda kiriting (masalan, +998901234567).",
            )
            .reply_markup(keyboards::contact_keyboard())
            .await;
        return;
    };

    if !check_channel_membership(bot, &state.config.required_channel, from.id).await {
        // Keep the validated phone so the "I joined" re-check can finish
        // registration without asking again.
        state.sessions.enter(
            chat_id.0,
            Step::WaitingForPhone {
                pending_phone: Some(phone),
            },
        );
        let _ = bot
            .send_message(
                chat_id,
                format!(
                    "❗️Avval {} kanaliga a’zo bo‘ling!",
                    state.config.required_channel
                ),
            )
            .reply_markup(keyboards::membership_keyboard(
                &state.config.required_channel,
            ))
            .await;
        return;
    }

    complete_registration(bot, state, chat_id, from, phone).await;
}

/// Creates the User record, credits a pending referral, and lands the user
/// on the main menu. Called from the phone step and the membership re-check
/// callback.
pub(crate) async fn complete_registration(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    from: &TgUser,
    phone: String,
) {
    let tg_id = from.id.0 as i64;
    let referred_by = state.sessions.referral(tg_id);
    let username = from.username.clone().unwrap_or_default();

    if let Err(e) = state
        .users
        .create(tg_id, &phone, &from.first_name, &username, referred_by)
        .await
    {
        error!("Failed to register user {}: {:#}", tg_id, e);
        let _ = bot
            .send_message(
                chat_id,
                "❌ Ro‘yxatdan o‘tishda xatolik yuz berdi. Keyinroq urinib ko‘ring.",
            )
            .await;
        // Step untouched so the user can retry.
        return;
    }

    if let Some(referrer) = state.sessions.take_referral(tg_id) {
        match state.users.add_stars(referrer, 1).await {
            Ok(Some(ref_user)) => {
                if let Err(e) = bot
                    .send_message(
                        ChatId(ref_user.tg_id),
                        format!(
                            "✅ Sizga 1 ta ⭐ qo‘shildi! Jami: {} ⭐",
                            ref_user.stars_earned
                        ),
                    )
                    .await
                {
                    warn!("Failed to notify referrer {}: {}", referrer, e);
                }
            }
            Ok(None) => warn!("Referrer {} is not registered, bonus skipped", referrer),
            Err(e) => warn!("Failed to credit referral bonus to {}: {:#}", referrer, e),
        }
    }

    state.sessions.clear(chat_id.0);
    send_main_menu(bot, chat_id).await;
}

async fn handle_menu(bot: &Bot, state: &AppState, chat_id: ChatId, text: &str) {
    match text {
        labels::BUY_STARS => {
            state.sessions.enter(chat_id.0, Step::WaitingForStarAmount);
            let _ = bot
                .send_message(
                    chat_id,
                    "Yozing nechta star kerak? (Minimal 50 ta, maksimal 5000 ta)",
                )
                .reply_markup(keyboards::back_keyboard())
                .await;
        }
        labels::BUY_PREMIUM => {
            let board = match state.catalog.board().await {
                Ok(b) => b,
                Err(e) => {
                    error!("Failed to load price board: {:#}", e);
                    let _ = bot
                        .send_message(chat_id, "❌ Xatolik yuz berdi. Keyinroq urinib ko‘ring.")
                        .await;
                    return;
                }
            };
            let price = |pt: PriceType| board.get(&pt).copied().unwrap_or(pt.default_value());
            state.sessions.enter(chat_id.0, Step::ChoosingPackage);
            let _ = bot
                .send_message(
                    chat_id,
                    format!(
                        "⚠️ <b>PREMIUM NARXLARI 🧙</b>\n\n\
                        🎁3 oylik - {} so’m\n\
                        🎁6 oylik - {} so’m\n\
                        🎁12 oylik - {} so’m",
                        price(PriceType::Premium3Months),
                        price(PriceType::Premium6Months),
                        price(PriceType::Premium12Months),
                    ),
                )
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::package_keyboard())
                .await;
        }
        labels::EARN_STARS => {
            let _ = bot
                .send_message(
                    chat_id,
                    format!(
                        "👥 Do‘stlaringizni taklif qilib yutib oling!\n\n\
                        Sizning referal havolangiz:\n\
                        https://t.me/{}?start=ref{}\n\n\
                        Har bir do‘st telefon raqamini yuborsa sizga 1 ⭐ beriladi. 50⭐ dan keyin almashtirish mumkin!",
                        state.config.bot_username, chat_id.0
                    ),
                )
                .reply_markup(keyboards::back_keyboard())
                .await;
        }
        labels::SUPPORT => {
            match keyboards::support_keyboard(&state.config.support_username) {
                Some(kb) => {
                    let _ = bot
                        .send_message(
                            chat_id,
                            "📞 Admin bilan bog‘lanish uchun quyidagi tugmani bosing:",
                        )
                        .reply_markup(kb)
                        .await;
                }
                None => {
                    let _ = bot
                        .send_message(chat_id, "❌ Support hozircha sozlanmagan.")
                        .reply_markup(keyboards::main_menu())
                        .await;
                }
            }
        }
        _ => {
            // Unknown input outside any funnel is ignored.
        }
    }
}

async fn handle_star_amount(bot: &Bot, state: &AppState, chat_id: ChatId, text: &str) {
    let Some(count) = input::parse_star_amount(text) else {
        let _ = bot
            .send_message(chat_id, "❌ Stars miqdori 50-5000 oralig'ida bo'lishi kerak.")
            .reply_markup(keyboards::back_keyboard())
            .await;
        return;
    };

    let price = match state.catalog.star_total(count).await {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to fetch star price: {:#}", e);
            let _ = bot
                .send_message(chat_id, "❌ Xatolik yuz berdi. Keyinroq urinib ko‘ring.")
                .await;
            return;
        }
    };
    state.sessions.enter(
        chat_id.0,
        Step::WaitingForStarRecipient {
            stars: count,
            price,
        },
    );
    let _ = bot
        .send_message(
            chat_id,
            format!(
                "⭐ {} ta star narxi: {} so'm\n\nKimga yuboramiz? @username kiriting yoki 'O‘zimga' ni tanlang:",
                count, price
            ),
        )
        .reply_markup(keyboards::recipient_keyboard())
        .await;
}

async fn handle_star_recipient(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    from: &TgUser,
    text: &str,
    stars: i64,
    price: i64,
) {
    let recipient = input::resolve_recipient(text, from.username.as_deref());
    let Some(user) = resolve_registered_user(bot, state, chat_id, from).await else {
        return;
    };

    let order = match state
        .orders
        .place(NewOrder::stars(user.id, stars, price, recipient.clone()))
        .await
    {
        Ok(o) => o,
        Err(e) => {
            error!("Failed to create star order for {}: {:#}", user.tg_id, e);
            abort_order(bot, state, chat_id).await;
            return;
        }
    };
    state.sessions.clear(chat_id.0);

    let sender = format!("@{}", from.username.as_deref().unwrap_or("nomalum"));
    notify_admin(
        bot,
        state,
        &format!(
            "💎 STARS BUYURTMA #{}\n\n👤 Kimdan: {}\n⭐ Miqdor: {} ta\n💵 Narxi: {} so'm\n👥 Kimga: {}",
            order.order_id, sender, stars, price, recipient
        ),
    )
    .await;

    let _ = bot
        .send_message(
            chat_id,
            format!(
                "✅ Buyurtma tayyor!\n\n🆔 Buyurtma raqami: {}\n⭐ {} ta star\nNarxi: {} so'm\nKimga: {}\n\nTo‘lovda buyurtma raqamini ko‘rsating.",
                order.order_id, stars, price, recipient
            ),
        )
        .reply_markup(keyboards::payment_keyboard(&state.config.payment_link))
        .await;
}

async fn handle_package_choice(bot: &Bot, state: &AppState, chat_id: ChatId, text: &str) {
    let Some(package) = input::package_from_label(text) else {
        let _ = bot
            .send_message(chat_id, "❌ Noto‘g‘ri paket.")
            .reply_markup(keyboards::package_keyboard())
            .await;
        return;
    };

    let price = match state.catalog.price_of(package).await {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to fetch premium price: {:#}", e);
            let _ = bot
                .send_message(chat_id, "❌ Xatolik yuz berdi. Keyinroq urinib ko‘ring.")
                .await;
            return;
        }
    };

    state
        .sessions
        .enter(chat_id.0, Step::ChoosingRecipient { package, price });
    let months = package.months().unwrap_or_default();
    let _ = bot
        .send_message(
            chat_id,
            format!(
                "Premium: {} oy\nNarxi: {} so'm\n\nKimga yuboramiz? @username kiriting yoki 'O‘zimga' ni tanlang:",
                months, price
            ),
        )
        .reply_markup(keyboards::recipient_keyboard())
        .await;
}

async fn handle_premium_recipient(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    from: &TgUser,
    text: &str,
    package: PriceType,
    price: i64,
) {
    let recipient = input::resolve_recipient(text, from.username.as_deref());
    let Some(user) = resolve_registered_user(bot, state, chat_id, from).await else {
        return;
    };
    let months = package.months().unwrap_or_default();

    let order = match state
        .orders
        .place(NewOrder::premium(user.id, months, price, recipient.clone()))
        .await
    {
        Ok(o) => o,
        Err(e) => {
            error!("Failed to create premium order for {}: {:#}", user.tg_id, e);
            abort_order(bot, state, chat_id).await;
            return;
        }
    };
    state.sessions.clear(chat_id.0);

    let sender = format!("@{}", from.username.as_deref().unwrap_or("nomalum"));
    notify_admin(
        bot,
        state,
        &format!(
            "🚕 PREMIUM BUYURTMA #{}\n\n👤 Kimdan: {}\n🎓 Paket: {} oy\n💵 Narxi: {} so'm\n👥 Kimga: {}",
            order.order_id, sender, months, price, recipient
        ),
    )
    .await;

    let _ = bot
        .send_message(
            chat_id,
            format!(
                "✅ Buyurtma tayyor!\n\n🆔 Buyurtma raqami: {}\nPaket: {} oy\nNarxi: {} so'm\nKimga: {}\n\nTo‘lovda buyurtma raqamini ko‘rsating.",
                order.order_id, months, price, recipient
            ),
        )
        .reply_markup(keyboards::payment_keyboard(&state.config.payment_link))
        .await;
}

async fn resolve_registered_user(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    from: &TgUser,
) -> Option<yulduz_db::models::User> {
    let tg_id = from.id.0 as i64;
    match state.users.get_by_tg_id(tg_id).await {
        Ok(Some(user)) => Some(user),
        Ok(None) => {
            state.sessions.clear(chat_id.0);
            let _ = bot
                .send_message(chat_id, "❌ Avval ro‘yxatdan o‘ting: /start")
                .await;
            None
        }
        Err(e) => {
            error!("Failed to look up user {}: {:#}", tg_id, e);
            abort_order(bot, state, chat_id).await;
            None
        }
    }
}

/// Critical-path failure: clear the funnel and surface a generic error. No
/// partial ledger state exists at this point.
async fn abort_order(bot: &Bot, state: &AppState, chat_id: ChatId) {
    state.sessions.clear(chat_id.0);
    let _ = bot
        .send_message(
            chat_id,
            "❌ Buyurtma yaratishda xatolik yuz berdi. Keyinroq urinib ko‘ring.",
        )
        .reply_markup(keyboards::main_menu())
        .await;
}

async fn notify_admin(bot: &Bot, state: &AppState, text: &str) {
    if let Err(e) = bot
        .send_message(ChatId(state.config.admin_chat_id), text)
        .await
    {
        warn!("Failed to notify admin: {}", e);
    }
}

pub(crate) async fn send_main_menu(bot: &Bot, chat_id: ChatId) {
    let _ = bot
        .send_message(chat_id, "✅ Endi xizmat turini tanlang:")
        .reply_markup(keyboards::main_menu())
        .await;
}

pub(crate) async fn send_admin_panel(bot: &Bot, chat_id: ChatId) {
    let _ = bot
        .send_message(chat_id, "🛠 Admin paneliga xush kelibsiz")
        .reply_markup(keyboards::admin_menu())
        .await;
}
