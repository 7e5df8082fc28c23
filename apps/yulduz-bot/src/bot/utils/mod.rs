pub mod channel_check;
pub mod input;
pub mod phone;
