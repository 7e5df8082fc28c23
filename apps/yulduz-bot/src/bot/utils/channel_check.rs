use teloxide::prelude::*;
use teloxide::types::{ChatId, Recipient, UserId};

/// Whether the user has joined the required channel. Only member,
/// administrator, and owner count; any API failure is treated as not a
/// member so the gate fails closed.
pub async fn check_channel_membership(bot: &Bot, channel: &str, user_id: UserId) -> bool {
    let recipient = match channel.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => {
            let username = if channel.starts_with('@') {
                channel.to_string()
            } else {
                format!("@{}", channel)
            };
            Recipient::ChannelUsername(username)
        }
    };

    match bot.get_chat_member(recipient, user_id).await {
        Ok(member) => {
            use teloxide::types::ChatMemberKind;
            let is_member = matches!(
                member.kind,
                ChatMemberKind::Administrator(_) | ChatMemberKind::Owner(_) | ChatMemberKind::Member(_)
            );
            if !is_member {
                tracing::debug!(
                    "User {} is not a member of {} (status: {:?})",
                    user_id,
                    channel,
                    member.kind
                );
            }
            is_member
        }
        Err(e) => {
            tracing::warn!("Failed to check channel membership for {}: {}", user_id, e);
            false
        }
    }
}
