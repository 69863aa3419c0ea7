// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between views and services
// - Commands take plain arguments, return slice data
// - Commands convert failures into ErrorResponse
// - Commands NEVER contain business logic

pub mod race_data_commands;

pub use race_data_commands::*;
