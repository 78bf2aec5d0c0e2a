pub mod handlers;
pub mod loader;
pub mod models;
pub mod validation;
