pub mod checks;
pub mod client;
pub mod config;
pub mod metrics;
pub mod monitor;
pub mod reporter;
pub mod server;
