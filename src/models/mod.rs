pub mod analysis;
pub mod mood;
pub mod recommendation;
pub mod user;
