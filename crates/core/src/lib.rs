//! AccountDesk Core - account and contact lifecycle engine.
//!
//! This crate contains the business rules for service-desk accounts and
//! their contacts. It is transport-agnostic and defines remote traits that
//! are implemented by the `connect` crate.

pub mod accounts;
pub mod cache;
pub mod config;
pub mod contacts;
pub mod dealers;
pub mod deletion;
pub mod errors;
pub mod events;
pub mod selection;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use config::EngineConfig;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
