use chrono::Utc;
use snapbin_core::models::{NewAsset, StoredAsset};
use snapbin_core::AppError;
use sqlx::SqlitePool;

/// Asset metadata repository.
#[derive(Clone)]
pub struct AssetRepository {
    pool: SqlitePool,
}

impl AssetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, asset: &NewAsset) -> Result<StoredAsset, AppError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, StoredAsset>(
            r#"
            INSERT INTO assets (filename, original_filename, size_kb, mime_type, owner, width, height, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, filename, original_filename, size_kb, mime_type, owner, width, height, created_at
            "#,
        )
        .bind(&asset.filename)
        .bind(&asset.original_filename)
        .bind(asset.size_kb)
        .bind(&asset.mime_type)
        .bind(&asset.owner)
        .bind(asset.width)
        .bind(asset.height)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_by_filename(&self, filename: &str) -> Result<Option<StoredAsset>, AppError> {
        let row = sqlx::query_as::<_, StoredAsset>(
            r#"
            SELECT id, filename, original_filename, size_kb, mime_type, owner, width, height, created_at
            FROM assets WHERE filename = ?
            "#,
        )
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<StoredAsset>, AppError> {
        let row = sqlx::query_as::<_, StoredAsset>(
            r#"
            SELECT id, filename, original_filename, size_kb, mime_type, owner, width, height, created_at
            FROM assets WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Delete an asset row together with every short link referencing it, in
    /// one transaction. Returns false when no such asset existed. The backing
    /// bytes are removed by the caller afterwards; file deletion is idempotent,
    /// so a crash between commit and unlink leaves no dangling records.
    pub async fn delete_with_links(&self, filename: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM short_links WHERE target_file = ?")
            .bind(filename)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM assets WHERE filename = ?")
            .bind(filename)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use crate::db::ShortLinkRepository;

    fn sample(filename: &str) -> NewAsset {
        NewAsset {
            filename: filename.to_string(),
            original_filename: "cat.png".to_string(),
            size_kb: 12.5,
            mime_type: "image/png".to_string(),
            owner: Some("alice".to_string()),
            width: Some(640),
            height: Some(480),
        }
    }

    #[tokio::test]
    async fn insert_returns_the_stored_row() {
        let (_dir, pool) = test_pool().await;
        let repo = AssetRepository::new(pool);

        let asset = repo.insert(&sample("abc.png")).await.unwrap();
        assert!(asset.id > 0);
        assert_eq!(asset.filename, "abc.png");
        assert_eq!(asset.owner.as_deref(), Some("alice"));

        let found = repo.get_by_id(asset.id).await.unwrap().unwrap();
        assert_eq!(found.filename, "abc.png");
    }

    #[tokio::test]
    async fn delete_with_links_removes_the_asset_and_its_links() {
        let (_dir, pool) = test_pool().await;
        let assets = AssetRepository::new(pool.clone());
        let links = ShortLinkRepository::new(pool);

        assets.insert(&sample("doomed.png")).await.unwrap();
        links.try_insert("code01", "doomed.png", None, None).await.unwrap();
        links.try_insert("code02", "doomed.png", None, None).await.unwrap();
        links.try_insert("code03", "other.png", None, None).await.unwrap();

        assert!(assets.delete_with_links("doomed.png").await.unwrap());

        assert!(assets.get_by_filename("doomed.png").await.unwrap().is_none());
        assert!(links.get_by_code("code01").await.unwrap().is_none());
        assert!(links.get_by_code("code02").await.unwrap().is_none());
        // Links to other files survive.
        assert!(links.get_by_code("code03").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_with_links_is_false_for_missing_assets() {
        let (_dir, pool) = test_pool().await;
        let repo = AssetRepository::new(pool);
        assert!(!repo.delete_with_links("never-there.png").await.unwrap());
    }
}
