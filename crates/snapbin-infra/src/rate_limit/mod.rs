//! Fixed-window per-client rate limiting.

mod limiter;

pub use limiter::{Admission, RateLimiter};
