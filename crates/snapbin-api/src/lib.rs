//! HTTP API for the snapbin image host.
//!
//! Exposed as a library so integration tests can build the application
//! without going through the binary.

pub mod error;
pub mod handlers;
pub mod identity;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
