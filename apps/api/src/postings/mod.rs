pub mod dedup;
pub mod handlers;
pub mod models;
pub mod normalize;
