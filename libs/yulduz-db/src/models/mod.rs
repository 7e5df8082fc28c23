pub mod order;
pub mod price;
pub mod user;

pub use order::{NewOrder, Order, ORDER_TYPE_PREMIUM, ORDER_TYPE_STARS};
pub use price::{PriceEntry, PriceType};
pub use user::User;
