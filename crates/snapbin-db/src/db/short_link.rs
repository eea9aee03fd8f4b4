use chrono::{DateTime, Utc};
use snapbin_core::models::ShortLink;
use snapbin_core::AppError;
use sqlx::SqlitePool;

use super::is_unique_violation;

/// Short-link repository. Code uniqueness is enforced by the UNIQUE index;
/// [`ShortLinkRepository::try_insert`] is the atomic check-and-insert.
#[derive(Clone)]
pub struct ShortLinkRepository {
    pool: SqlitePool,
}

impl ShortLinkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Attempt to claim `code`. Returns `Ok(None)` when a concurrent (or
    /// earlier) insert already holds it, so the issuer can regenerate.
    pub async fn try_insert(
        &self,
        code: &str,
        target_file: &str,
        owner: Option<&str>,
        expire_at: Option<DateTime<Utc>>,
    ) -> Result<Option<ShortLink>, AppError> {
        let now = Utc::now();
        let result = sqlx::query_as::<_, ShortLink>(
            r#"
            INSERT INTO short_links (code, target_file, owner, created_at, expire_at, access_count)
            VALUES (?, ?, ?, ?, ?, 0)
            RETURNING id, code, target_file, owner, created_at, expire_at, access_count
            "#,
        )
        .bind(code)
        .bind(target_file)
        .bind(owner)
        .bind(now)
        .bind(expire_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(link) => Ok(Some(link)),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        let row = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, code, target_file, owner, created_at, expire_at, access_count
            FROM short_links WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Best-effort access counter bump; not serialized with reads.
    pub async fn increment_access(&self, code: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE short_links SET access_count = access_count + 1 WHERE code = ?")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove links whose expiry passed before `before`. Storage reclamation
    /// only; expiry itself is checked logically at resolve time.
    pub async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM short_links WHERE expire_at IS NOT NULL AND expire_at < ?")
                .bind(before)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    #[tokio::test]
    async fn try_insert_yields_none_when_the_code_is_taken() {
        let (_dir, pool) = test_pool().await;
        let repo = ShortLinkRepository::new(pool);

        let first = repo.try_insert("aB3x9Z", "a.png", None, None).await.unwrap();
        assert!(first.is_some());

        let second = repo
            .try_insert("aB3x9Z", "b.png", Some("alice"), None)
            .await
            .unwrap();
        assert!(second.is_none());

        // The first claim stands untouched.
        let link = repo.get_by_code("aB3x9Z").await.unwrap().unwrap();
        assert_eq!(link.target_file, "a.png");
        assert_eq!(link.owner, None);
    }

    #[tokio::test]
    async fn delete_expired_spares_live_and_permanent_links() {
        let (_dir, pool) = test_pool().await;
        let repo = ShortLinkRepository::new(pool);
        let now = Utc::now();

        repo.try_insert("stale1", "a.png", None, Some(now - chrono::Duration::minutes(5)))
            .await
            .unwrap();
        repo.try_insert("live01", "a.png", None, Some(now + chrono::Duration::minutes(5)))
            .await
            .unwrap();
        repo.try_insert("perm01", "a.png", None, None).await.unwrap();

        assert_eq!(repo.delete_expired(now).await.unwrap(), 1);
        assert!(repo.get_by_code("stale1").await.unwrap().is_none());
        assert!(repo.get_by_code("live01").await.unwrap().is_some());
        assert!(repo.get_by_code("perm01").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn increment_access_bumps_the_counter() {
        let (_dir, pool) = test_pool().await;
        let repo = ShortLinkRepository::new(pool);

        repo.try_insert("count1", "a.png", None, None).await.unwrap();
        repo.increment_access("count1").await.unwrap();
        repo.increment_access("count1").await.unwrap();

        let link = repo.get_by_code("count1").await.unwrap().unwrap();
        assert_eq!(link.access_count, 2);
    }
}
