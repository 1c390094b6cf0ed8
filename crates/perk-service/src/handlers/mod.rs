//! HTTP request handlers.

pub mod auth;
pub mod buy;
pub mod health;
pub mod info;
pub mod send_coin;
