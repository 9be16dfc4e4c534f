pub mod auth;
pub mod balance;
pub mod health;
pub mod items;
pub mod metrics;
pub mod purchases;
pub mod users;
