use chrono::{DateTime, Utc};
use serde::Serialize;

/// Terminal outcome of an upload attempt, or an explicit delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failed,
    Deleted,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Failed => "failed",
            AuditStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(AuditStatus::Success),
            "failed" => Some(AuditStatus::Failed),
            "deleted" => Some(AuditStatus::Deleted),
            _ => None,
        }
    }
}

/// Append-only audit log row. Never mutated after creation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditRecord {
    pub id: i64,
    pub original_filename: String,
    pub saved_filename: Option<String>,
    pub status: String,
    pub size_kb: Option<f64>,
    pub error_message: Option<String>,
    pub identity: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an audit entry.
#[derive(Debug, Clone)]
pub struct NewAuditRecord {
    pub original_filename: String,
    pub saved_filename: Option<String>,
    pub status: AuditStatus,
    pub size_kb: Option<f64>,
    pub error_message: Option<String>,
    pub identity: String,
    pub user_agent: Option<String>,
}
