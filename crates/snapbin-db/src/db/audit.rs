use chrono::Utc;
use snapbin_core::models::{AuditRecord, NewAuditRecord};
use snapbin_core::AppError;
use sqlx::SqlitePool;

/// Append-only audit log.
#[derive(Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, entry: &NewAuditRecord) -> Result<(), AppError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO audit_log (original_filename, saved_filename, status, size_kb, error_message, identity, user_agent, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.original_filename)
        .bind(&entry.saved_filename)
        .bind(entry.status.as_str())
        .bind(entry.size_kb)
        .bind(&entry.error_message)
        .bind(&entry.identity)
        .bind(&entry.user_agent)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<AuditRecord>, AppError> {
        let rows = sqlx::query_as::<_, AuditRecord>(
            r#"
            SELECT id, original_filename, saved_filename, status, size_kb, error_message, identity, user_agent, created_at
            FROM audit_log ORDER BY id DESC LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
