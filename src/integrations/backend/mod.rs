// src/integrations/backend/mod.rs
//
// F1 Insight backend API.
//
// ApiClient is the single HTTP entry point. Endpoint groups live in their
// own files as `impl ApiClient` blocks; the two groups other layers depend
// on through a seam (season data and auth) are also exposed as traits.

pub mod account;
pub mod auth;
pub mod client;
pub mod envelope;
pub mod f1;
pub mod notifications;
pub mod predictions;
pub mod session;
pub mod strategy;


pub use auth::{AuthGateway, LoginOutcome, OtpPurpose};
pub use client::ApiClient;
pub use envelope::ApiEnvelope;
pub use f1::F1Gateway;
pub use session::SessionContext;

#[cfg(test)]
pub use auth::MockAuthGateway;
#[cfg(test)]
pub use f1::MockF1Gateway;
