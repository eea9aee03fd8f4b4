//! Domain models.

mod asset;
mod audit;
mod identity;
mod short_link;

pub use asset::{NewAsset, StoredAsset};
pub use audit::{AuditRecord, AuditStatus, NewAuditRecord};
pub use identity::Identity;
pub use short_link::ShortLink;
