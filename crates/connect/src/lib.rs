//! AccountDesk Connect - HTTP access to the service desk account API.
//!
//! This crate implements the remote traits of `accountdesk-core` with
//! `reqwest` and reads client settings from the environment.

pub mod client;
pub mod config;

// Re-export commonly used types
pub use client::AccountDeskClient;
pub use config::{ConnectConfig, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_MS};
