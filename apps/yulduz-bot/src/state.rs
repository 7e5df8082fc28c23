use std::sync::Arc;

use crate::config::BotConfig;
use crate::services::catalog_service::CatalogService;
use crate::services::order_service::OrderService;
use crate::session::SessionStore;
use yulduz_db::repositories::UserRepository;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BotConfig>,
    pub users: UserRepository,
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn is_admin(&self, tg_id: i64) -> bool {
        tg_id == self.config.admin_chat_id
    }
}
