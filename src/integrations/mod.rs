// src/integrations/mod.rs
//
// External Integrations Module
//
// Everything that talks to a system this crate does not own.

pub mod backend;

pub use backend::{
    ApiClient, AuthGateway, F1Gateway, LoginOutcome, OtpPurpose, SessionContext,
};
