// src/app/mod.rs
//
// Application initialization: configuration and wiring.

pub mod bootstrap;
pub mod config;

pub use bootstrap::bootstrap;
pub use config::AppConfig;
