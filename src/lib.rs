pub mod analytics;
pub mod config;
pub mod errors;
pub mod models;
pub mod report;
pub mod risk;
pub mod server;
pub mod state;
pub mod viz;
