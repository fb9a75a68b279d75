pub mod ai;
pub mod chat;
pub mod coach;
pub mod metrics;
pub mod mood_analysis;
pub mod recommendations;
