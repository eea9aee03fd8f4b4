//! Core types shared across the snapbin workspace: configuration, the
//! application error taxonomy, constants, and domain models.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{AppError, LogLevel};
