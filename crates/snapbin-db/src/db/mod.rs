//! Repository-per-entity data access layer.

mod asset;
mod audit;
mod short_link;

pub use asset::AssetRepository;
pub use audit::AuditRepository;
pub use short_link::ShortLinkRepository;

/// True when the error is a unique-constraint violation, used to detect
/// short-code collisions on insert.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
        }
        _ => false,
    }
}
