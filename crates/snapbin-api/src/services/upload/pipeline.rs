//! The upload pipeline.
//!
//! One upload flows through admission (rate limit, pipeline slot),
//! validation, durable storage, best-effort size normalization, content
//! screening, metadata persistence, and short-link issuance. Failures after
//! the bytes hit disk must leave no orphans: `StoredFileGuard` deletes the
//! stored file unless the pipeline reaches the persisted state and disarms
//! it, and a failed persistence also removes any rows written so far.

use serde::Serialize;
use snapbin_core::constants::mime_type_for_extension;
use snapbin_core::models::{AuditStatus, Identity, NewAsset, NewAuditRecord};
use snapbin_core::{AppError, Config};
use snapbin_db::{AssetRepository, AuditRepository};
use snapbin_infra::{Admission, ConcurrencyGovernor, GovernorError, RateLimiter};
use snapbin_processing::image::{normalize, screen, NormalizeOutcome, ScreenVerdict};
use snapbin_processing::validator::{sanitize_filename, validate_upload};
use snapbin_storage::AssetStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::services::short_link::ShortLinkIssuer;

pub struct UploadRequest {
    pub original_filename: String,
    /// Size the client declared (Content-Length), if any.
    pub declared_size: Option<u64>,
    pub data: Vec<u8>,
    pub identity: Identity,
    pub client_key: String,
    pub user_agent: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadOutcome {
    pub id: i64,
    pub filename: String,
    pub original_filename: String,
    pub size_kb: f64,
    pub mime_type: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Ready-to-paste embed snippets.
    pub html: String,
    pub markdown: String,
}

#[derive(Clone)]
pub struct UploadPipeline {
    config: Config,
    storage: Arc<dyn AssetStore>,
    assets: AssetRepository,
    audits: AuditRepository,
    issuer: ShortLinkIssuer,
    limiter: RateLimiter,
    governor: ConcurrencyGovernor,
}

impl UploadPipeline {
    pub fn new(
        config: Config,
        storage: Arc<dyn AssetStore>,
        assets: AssetRepository,
        audits: AuditRepository,
        issuer: ShortLinkIssuer,
        limiter: RateLimiter,
        governor: ConcurrencyGovernor,
    ) -> Self {
        Self {
            config,
            storage,
            assets,
            audits,
            issuer,
            limiter,
            governor,
        }
    }

    pub async fn run(&self, req: UploadRequest) -> Result<UploadOutcome, AppError> {
        // Admission: rejected requests must stay cheap, so the rate check
        // comes before any slot is taken or byte is touched.
        if let Admission::Denied { retry_after } =
            self.limiter.admit(&req.client_key, Instant::now())
        {
            return Err(AppError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }

        let _slot = match self
            .governor
            .acquire_pipeline(Duration::from_secs(self.config.pipeline_acquire_timeout_secs))
            .await
        {
            Ok(slot) => slot,
            Err(e) => {
                let err = match e {
                    GovernorError::PipelineFull => AppError::Overloaded(e.to_string()),
                    other => AppError::Internal(other.to_string()),
                };
                self.audit_failure(&req, &req.original_filename, None, &err.to_string())
                    .await;
                return Err(err);
            }
        };

        let original_filename = sanitize_filename(&req.original_filename);
        let extension = match validate_upload(
            &original_filename,
            req.declared_size,
            req.data.len() as u64,
            self.config.max_file_size_bytes as u64,
            &self.config.allowed_extensions,
        ) {
            Ok(ext) => ext,
            Err(e) => {
                self.audit_failure(&req, &original_filename, None, &e.to_string())
                    .await;
                return Err(AppError::Validation(e.to_string()));
            }
        };

        let filename = format!("{}.{}", uuid::Uuid::new_v4().simple(), extension);

        if let Err(e) = self.storage.store(&filename, req.data.clone()).await {
            let err = AppError::Storage(e.to_string());
            self.audit_failure(&req, &original_filename, None, &err.to_string())
                .await;
            return Err(err);
        }
        let mut guard = StoredFileGuard::new(self.storage.clone(), filename.clone());

        // Normalization is best effort: a source the decoder chokes on is
        // kept as uploaded.
        let (stored_len, width, height) =
            match self.normalize_stored(&filename, &req.data, &extension).await {
                Ok((len, w, h)) => (len, Some(w as i64), Some(h as i64)),
                Err(e) => {
                    tracing::warn!(filename = %filename, error = %e, "Normalization skipped");
                    (req.data.len(), None, None)
                }
            };

        if self.config.screening_enabled {
            match self.screen_stored(&req.data).await {
                Ok(ScreenVerdict::Safe) => {}
                Ok(ScreenVerdict::Unsafe { skin_ratio }) => {
                    guard.cleanup_now().await;
                    self.audit_failure(
                        &req,
                        &original_filename,
                        Some(&filename),
                        &format!("Content screen flagged image (skin ratio {skin_ratio:.2})"),
                    )
                    .await;
                    return Err(AppError::PolicyRejection(
                        "Image rejected by content screen".to_string(),
                    ));
                }
                Err(e) => {
                    tracing::warn!(filename = %filename, error = %e, "Content screen skipped");
                }
            }
        }

        let size_kb = (stored_len as f64 / 1024.0 * 100.0).round() / 100.0;

        let new_asset = NewAsset {
            filename: filename.clone(),
            original_filename: original_filename.clone(),
            size_kb,
            mime_type: mime_type_for_extension(&extension).to_string(),
            owner: req.identity.owner().map(str::to_string),
            width,
            height,
        };
        let asset = match self.assets.insert(&new_asset).await {
            Ok(asset) => asset,
            Err(e) => {
                guard.cleanup_now().await;
                self.audit_failure(&req, &original_filename, Some(&filename), &e.to_string())
                    .await;
                return Err(e);
            }
        };

        // The asset is durable from here on; a short-link failure degrades
        // the response instead of failing the upload.
        guard.disarm();

        let link = match self
            .issuer
            .issue(&filename, req.identity.owner(), None)
            .await
        {
            Ok(link) => Some(link),
            Err(e) => {
                tracing::warn!(filename = %filename, error = %e, "Short link issuance failed");
                None
            }
        };

        self.audit(&req, &original_filename, Some(&filename), AuditStatus::Success, Some(size_kb), None)
            .await;

        let url = format!("{}/images/{}", self.config.base_url, filename);
        let short_url = link
            .as_ref()
            .map(|l| format!("{}/s/{}", self.config.base_url, l.code));
        let embed_target = short_url.as_deref().unwrap_or(&url);
        let html = format!(r#"<img src="{embed_target}" alt="{original_filename}">"#);
        let markdown = format!("![{original_filename}]({embed_target})");

        tracing::info!(
            filename = %asset.filename,
            size_kb,
            identity = %req.identity.audit_label(),
            "Upload completed"
        );

        Ok(UploadOutcome {
            id: asset.id,
            filename: asset.filename,
            original_filename: asset.original_filename,
            size_kb,
            mime_type: asset.mime_type,
            width,
            height,
            url,
            short_url,
            code: link.map(|l| l.code),
            html,
            markdown,
        })
    }

    /// Downscale on a CPU worker and, when the image shrank, overwrite the
    /// stored bytes. Returns the stored length and final dimensions.
    async fn normalize_stored(
        &self,
        filename: &str,
        data: &[u8],
        extension: &str,
    ) -> Result<(usize, u32, u32), AppError> {
        let bytes = data.to_vec();
        let ext = extension.to_string();
        let max_long_edge = self.config.max_long_edge;
        let max_dimension = self.config.max_dimension;

        let outcome: NormalizeOutcome = self
            .governor
            .run_cpu(move || normalize(&bytes, &ext, max_long_edge, max_dimension))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(|e| AppError::Transform(e.to_string()))?;

        match outcome.data {
            Some(resized) => {
                let len = resized.len();
                self.storage
                    .store(filename, resized)
                    .await
                    .map_err(|e| AppError::Storage(e.to_string()))?;
                Ok((len, outcome.width, outcome.height))
            }
            None => Ok((data.len(), outcome.width, outcome.height)),
        }
    }

    async fn screen_stored(&self, data: &[u8]) -> Result<ScreenVerdict, AppError> {
        let bytes = data.to_vec();
        let threshold = self.config.skin_threshold;
        self.governor
            .run_cpu(move || screen(&bytes, threshold))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(|e| AppError::Transform(e.to_string()))
    }

    async fn audit_failure(
        &self,
        req: &UploadRequest,
        original_filename: &str,
        saved_filename: Option<&str>,
        error: &str,
    ) {
        self.audit(
            req,
            original_filename,
            saved_filename,
            AuditStatus::Failed,
            None,
            Some(error.to_string()),
        )
        .await;
    }

    async fn audit(
        &self,
        req: &UploadRequest,
        original_filename: &str,
        saved_filename: Option<&str>,
        status: AuditStatus,
        size_kb: Option<f64>,
        error_message: Option<String>,
    ) {
        let entry = NewAuditRecord {
            original_filename: original_filename.to_string(),
            saved_filename: saved_filename.map(str::to_string),
            status,
            size_kb,
            error_message,
            identity: req.identity.audit_label(),
            user_agent: req.user_agent.clone(),
        };
        if let Err(e) = self.audits.record(&entry).await {
            tracing::error!(error = %e, "Failed to write audit record");
        }
    }
}

/// Compensating cleanup for stored bytes. Explicit `cleanup_now` is used on
/// known failure paths; `Drop` covers cancellation, where the delete is
/// handed to a background task because `Drop` cannot await.
struct StoredFileGuard {
    storage: Arc<dyn AssetStore>,
    filename: String,
    armed: bool,
}

impl StoredFileGuard {
    fn new(storage: Arc<dyn AssetStore>, filename: String) -> Self {
        Self {
            storage,
            filename,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    async fn cleanup_now(&mut self) {
        self.armed = false;
        if let Err(e) = self.storage.delete(&self.filename).await {
            tracing::error!(filename = %self.filename, error = %e, "Compensating delete failed");
        }
    }
}

impl Drop for StoredFileGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let storage = self.storage.clone();
        let filename = std::mem::take(&mut self.filename);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                tracing::debug!(filename = %filename, "Cleaning up abandoned upload");
                if let Err(e) = storage.delete(&filename).await {
                    tracing::error!(filename = %filename, error = %e, "Compensating delete failed");
                }
            });
        }
    }
}
