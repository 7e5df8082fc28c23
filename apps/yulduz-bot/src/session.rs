use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use yulduz_db::models::PriceType;

/// One variant per funnel step, carrying exactly the transient fields that
/// step needs. At most one step is active per chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Registration: waiting for a contact or typed phone number. A phone
    /// that validated but failed the channel gate is kept here so the
    /// "I joined" re-check can finish registration without re-asking.
    WaitingForPhone { pending_phone: Option<String> },
    WaitingForStarAmount,
    WaitingForStarRecipient { stars: i64, price: i64 },
    ChoosingPackage,
    ChoosingRecipient { package: PriceType, price: i64 },
    // Admin-only steps.
    SearchById,
    AdjustStars { target_tg_id: i64 },
    SelectPriceType,
    UpdatePrice { price_type: PriceType },
}

/// In-process per-chat conversation state. Ephemeral by design: a restart
/// drops in-flight funnels and the user starts over.
#[derive(Clone, Default)]
pub struct SessionStore {
    steps: Arc<Mutex<HashMap<i64, Step>>>,
    /// Pending referral links, keyed by the joining user's tg id, resolved
    /// when registration completes.
    referrals: Arc<Mutex<HashMap<i64, i64>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self, chat_id: i64) -> Option<Step> {
        self.steps.lock().expect("session lock poisoned").get(&chat_id).cloned()
    }

    /// Entering a new step overwrites whatever transient state was there.
    pub fn enter(&self, chat_id: i64, step: Step) {
        self.steps.lock().expect("session lock poisoned").insert(chat_id, step);
    }

    pub fn clear(&self, chat_id: i64) {
        self.steps.lock().expect("session lock poisoned").remove(&chat_id);
    }

    pub fn set_referral(&self, user_tg_id: i64, referrer_tg_id: i64) {
        self.referrals
            .lock()
            .expect("session lock poisoned")
            .insert(user_tg_id, referrer_tg_id);
    }

    pub fn referral(&self, user_tg_id: i64) -> Option<i64> {
        self.referrals
            .lock()
            .expect("session lock poisoned")
            .get(&user_tg_id)
            .copied()
    }

    pub fn take_referral(&self, user_tg_id: i64) -> Option<i64> {
        self.referrals
            .lock()
            .expect("session lock poisoned")
            .remove(&user_tg_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entering_a_new_funnel_overwrites_prior_state() {
        let store = SessionStore::new();
        store.enter(1, Step::WaitingForStarAmount);
        store.enter(
            1,
            Step::WaitingForStarRecipient {
                stars: 100,
                price: 24_000,
            },
        );
        assert_eq!(
            store.step(1),
            Some(Step::WaitingForStarRecipient {
                stars: 100,
                price: 24_000
            })
        );
    }

    #[test]
    fn back_clears_state_unconditionally() {
        let store = SessionStore::new();
        store.enter(7, Step::ChoosingPackage);
        store.clear(7);
        assert_eq!(store.step(7), None);
        // Clearing an idle chat is a no-op.
        store.clear(7);
    }

    #[test]
    fn sessions_are_isolated_per_chat() {
        let store = SessionStore::new();
        store.enter(1, Step::WaitingForStarAmount);
        store.enter(2, Step::ChoosingPackage);
        assert_eq!(store.step(1), Some(Step::WaitingForStarAmount));
        assert_eq!(store.step(2), Some(Step::ChoosingPackage));
    }

    #[test]
    fn referral_is_consumed_once() {
        let store = SessionStore::new();
        store.set_referral(10, 99);
        assert_eq!(store.referral(10), Some(99));
        assert_eq!(store.take_referral(10), Some(99));
        assert_eq!(store.take_referral(10), None);
    }
}
