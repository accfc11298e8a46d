pub mod app;
pub mod cli;
pub mod config;
pub mod filter;
pub mod notes;
pub mod storage;
pub mod ui;
pub mod weather;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
