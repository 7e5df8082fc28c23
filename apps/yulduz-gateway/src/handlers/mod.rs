pub mod health;
pub mod paynet;
