use teloxide::prelude::*;
use tracing::info;

use crate::bot::handlers::message::{complete_registration, send_admin_panel, send_main_menu};
use crate::bot::keyboards;
use crate::bot::utils::channel_check::check_channel_membership;
use crate::session::Step;
use crate::state::AppState;

/// What a confirmed membership check leads to, given the chat's current
/// funnel step.
#[derive(Debug, PartialEq, Eq)]
enum MembershipFollowUp {
    /// A validated phone is waiting; registration can finish now.
    CompleteRegistration(String),
    /// Registration started but no phone arrived yet; ask for it again.
    AskPhone,
    /// Not mid-registration; just land on the menu.
    MainMenu,
}

fn membership_follow_up(step: Option<Step>) -> MembershipFollowUp {
    match step {
        Some(Step::WaitingForPhone {
            pending_phone: Some(phone),
        }) => MembershipFollowUp::CompleteRegistration(phone),
        Some(Step::WaitingForPhone {
            pending_phone: None,
        }) => MembershipFollowUp::AskPhone,
        _ => MembershipFollowUp::MainMenu,
    }
}

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    state: AppState,
) -> Result<(), teloxide::RequestError> {
    let data = q.data.clone().unwrap_or_default();
    let callback_id = q.id.clone();
    let from = q.from.clone();
    let tg_id = from.id.0 as i64;
    info!("Callback from {}: {:?}", tg_id, data);

    let Some(msg) = q.message else {
        bot.answer_callback_query(callback_id).await?;
        return Ok(());
    };
    let chat_id = msg.chat().id;

    match data.as_str() {
        "check_subscription" => {
            if check_channel_membership(&bot, &state.config.required_channel, from.id).await {
                bot.answer_callback_query(callback_id)
                    .text("✅ Tasdiqlandi!")
                    .await?;
                match membership_follow_up(state.sessions.step(chat_id.0)) {
                    MembershipFollowUp::CompleteRegistration(phone) => {
                        complete_registration(&bot, &state, chat_id, &from, phone).await;
                    }
                    MembershipFollowUp::AskPhone => {
                        let _ = bot
                            .send_message(
                                chat_id,
                                "📲 Telefon raqamingizni yuboring (faqat +998).",
                            )
                            .reply_markup(keyboards::contact_keyboard())
                            .await;
                    }
                    MembershipFollowUp::MainMenu => {
                        send_main_menu(&bot, chat_id).await;
                    }
                }
            } else {
                bot.answer_callback_query(callback_id)
                    .text("❌ Siz hali a’zo emassiz.")
                    .await?;
            }
        }
        "back_to_main" => {
            bot.answer_callback_query(callback_id).await?;
            state.sessions.clear(chat_id.0);
            if state.is_admin(tg_id) {
                send_admin_panel(&bot, chat_id).await;
            } else {
                send_main_menu(&bot, chat_id).await;
            }
        }
        _ => {
            bot.answer_callback_query(callback_id).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stashed_phone_finishes_registration() {
        let step = Some(Step::WaitingForPhone {
            pending_phone: Some("+998901234567".to_string()),
        });
        assert_eq!(
            membership_follow_up(step),
            MembershipFollowUp::CompleteRegistration("+998901234567".to_string())
        );
    }

    #[test]
    fn membership_without_a_phone_reprompts_instead_of_showing_the_menu() {
        let step = Some(Step::WaitingForPhone {
            pending_phone: None,
        });
        assert_eq!(membership_follow_up(step), MembershipFollowUp::AskPhone);
    }

    #[test]
    fn idle_and_unrelated_steps_land_on_the_menu() {
        assert_eq!(membership_follow_up(None), MembershipFollowUp::MainMenu);
        assert_eq!(
            membership_follow_up(Some(Step::WaitingForStarAmount)),
            MembershipFollowUp::MainMenu
        );
    }
}
