//! Shared infrastructure for the snapbin service:
//! - Per-client rate limiting
//! - Pipeline and CPU concurrency control
//! - Disk capacity monitoring

pub mod capacity;
pub mod governor;
pub mod rate_limit;

pub use capacity::DiskMonitor;
pub use governor::{ConcurrencyGovernor, GovernorError, PipelineSlot};
pub use rate_limit::{Admission, RateLimiter};
