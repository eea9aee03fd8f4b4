//! CPU-bound transforms and upload validation.
//!
//! Everything in [`image`] is a pure function of (bytes, parameters) and is
//! meant to run inside the concurrency governor's worker pool, never on the
//! request path directly.

pub mod image;
pub mod validator;
