pub mod ai;
pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod health;
pub mod users;
pub mod wellbeing;
