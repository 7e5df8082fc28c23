use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};
use url::Url;

/// Menu button captions, shared between keyboards and the text dispatcher.
pub mod labels {
    pub const BACK: &str = "🔙 Ortga";
    pub const MYSELF: &str = "🙋‍♂️ O‘zimga";
    pub const BUY_PREMIUM: &str = "⭐ Premium sotib olish";
    pub const BUY_STARS: &str = "💎 Stars sotib olish";
    pub const EARN_STARS: &str = "👥 Stars ishlash";
    pub const SUPPORT: &str = "🚘 Support";
    pub const SEND_CONTACT: &str = "📞 Telefon raqamni yuborish";

    pub const ADMIN_ALL_USERS: &str = "📋 Barcha foydalanuvchilar";
    pub const ADMIN_FIND_BY_ID: &str = "🔍 Foydalanuvchini ID bo‘yicha topish";
    pub const ADMIN_PAYMENTS: &str = "💰 To‘lovlar tarixi";
    pub const ADMIN_PRICES: &str = "💵 Narxlarni o‘zgartirish";

    pub const PRICE_PREMIUM_3: &str = "📦 Premium 3 oy";
    pub const PRICE_PREMIUM_6: &str = "📦 Premium 6 oy";
    pub const PRICE_PREMIUM_12: &str = "📦 Premium 1 yil";
    pub const PRICE_STAR: &str = "💎 Yulduz narxi";

    pub const PACKAGE_3: &str = "📦 3 oy";
    pub const PACKAGE_6: &str = "📦 6 oy";
    pub const PACKAGE_12: &str = "📦 1 yil";
}

pub fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(labels::BUY_PREMIUM),
            KeyboardButton::new(labels::BUY_STARS),
        ],
        vec![
            KeyboardButton::new(labels::EARN_STARS),
            KeyboardButton::new(labels::SUPPORT),
        ],
    ])
    .resize_keyboard()
}

pub fn admin_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(labels::ADMIN_ALL_USERS)],
        vec![KeyboardButton::new(labels::ADMIN_FIND_BY_ID)],
        vec![KeyboardButton::new(labels::ADMIN_PAYMENTS)],
        vec![KeyboardButton::new(labels::ADMIN_PRICES)],
    ])
    .resize_keyboard()
}

pub fn back_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(labels::BACK)]]).resize_keyboard()
}

pub fn contact_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(labels::SEND_CONTACT).request(ButtonRequest::Contact),
    ]])
    .resize_keyboard()
    .one_time_keyboard()
}

pub fn recipient_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(labels::MYSELF),
        KeyboardButton::new(labels::BACK),
    ]])
    .resize_keyboard()
}

pub fn package_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(labels::PACKAGE_3),
            KeyboardButton::new(labels::PACKAGE_6),
        ],
        vec![
            KeyboardButton::new(labels::PACKAGE_12),
            KeyboardButton::new(labels::BACK),
        ],
    ])
    .resize_keyboard()
}

pub fn price_type_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(labels::PRICE_PREMIUM_3),
            KeyboardButton::new(labels::PRICE_PREMIUM_6),
        ],
        vec![
            KeyboardButton::new(labels::PRICE_PREMIUM_12),
            KeyboardButton::new(labels::PRICE_STAR),
        ],
        vec![KeyboardButton::new(labels::BACK)],
    ])
    .resize_keyboard()
}

pub fn membership_keyboard(channel: &str) -> InlineKeyboardMarkup {
    let channel_url = format!("https://t.me/{}", channel.trim_start_matches('@'));
    let mut row = Vec::new();
    if let Ok(url) = channel_url.parse::<Url>() {
        row.push(InlineKeyboardButton::url("🔗 Kanalga o'tish", url));
    }
    row.push(InlineKeyboardButton::callback(
        "✅ A'zo bo‘ldim",
        "check_subscription",
    ));
    InlineKeyboardMarkup::new(vec![row])
}

pub fn payment_keyboard(payment_link: &str) -> InlineKeyboardMarkup {
    let mut buttons = Vec::new();
    if let Ok(url) = payment_link.parse::<Url>() {
        buttons.push(vec![
            InlineKeyboardButton::url("💳 Click orqali to'lash", url.clone()),
            InlineKeyboardButton::url("💳 Paynet orqali to'lash", url),
        ]);
    }
    buttons.push(vec![InlineKeyboardButton::callback(
        labels::BACK,
        "back_to_main",
    )]);
    InlineKeyboardMarkup::new(buttons)
}

pub fn support_keyboard(support_username: &str) -> Option<InlineKeyboardMarkup> {
    let clean = support_username.trim_start_matches('@');
    if clean.is_empty() {
        return None;
    }
    let url = format!("https://t.me/{}", clean).parse::<Url>().ok()?;
    Some(InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::url("👨‍💻 Admin bilan bog‘lanish", url),
    ]]))
}
