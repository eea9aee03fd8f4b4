//! Durable storage of raw asset bytes, keyed by generated filename.
//! No business logic lives here; callers own filename generation.

mod local;
mod traits;

pub use local::LocalAssetStore;
pub use traits::{AssetStore, StorageError, StorageResult};
