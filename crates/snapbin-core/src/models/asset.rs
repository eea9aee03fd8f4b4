use chrono::{DateTime, Utc};
use serde::Serialize;

/// A persisted asset record. The `filename` is generated (uuid hex + extension)
/// and never derived from the client-supplied name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredAsset {
    pub id: i64,
    pub filename: String,
    pub original_filename: String,
    pub size_kb: f64,
    pub mime_type: String,
    pub owner: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new asset row.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub filename: String,
    pub original_filename: String,
    pub size_kb: f64,
    pub mime_type: String,
    pub owner: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}
