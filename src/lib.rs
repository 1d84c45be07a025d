pub mod app;
pub mod cli;
pub mod config;
pub mod insights;
pub mod records;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
