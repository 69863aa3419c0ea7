// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - This layer sits ABOVE the store and the services
// - It provides the boundary between views and the data layer
// - It translates failures into ErrorResponse

pub mod commands;
pub mod error_handling;
pub mod state;

pub use commands::*;
pub use error_handling::{ErrorResponse, ErrorType};
pub use state::AppState;
