//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod notify;
mod products;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use notify::run_notify;
pub use products::run_products;
pub use serve::run_serve;
