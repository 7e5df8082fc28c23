pub mod order_repo;
pub mod price_repo;
pub mod user_repo;

pub use order_repo::{LedgerError, OrderRepository};
pub use price_repo::PriceRepository;
pub use user_repo::UserRepository;
