pub mod aggregate;
pub mod analytics;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod filter;
pub mod generator;
pub mod logging;
pub mod model;
pub mod report;
pub mod server;
