//! Shared application state.

use ab_glyph::FontVec;
use snapbin_core::Config;
use snapbin_db::{AssetRepository, AuditRepository, ShortLinkRepository};
use snapbin_infra::{ConcurrencyGovernor, RateLimiter};
use snapbin_storage::AssetStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::services::short_link::ShortLinkIssuer;
use crate::services::upload::UploadPipeline;

pub struct AppState {
    pub config: Config,
    pub pool: sqlx::SqlitePool,
    pub storage: Arc<dyn AssetStore>,
    pub assets: AssetRepository,
    pub links: ShortLinkRepository,
    pub audits: AuditRepository,
    pub limiter: RateLimiter,
    pub governor: ConcurrencyGovernor,
    pub issuer: ShortLinkIssuer,
    pub pipeline: UploadPipeline,
    /// Loaded once at startup; `None` when no configured font path is usable,
    /// in which case watermark requests fall back to the unmodified source.
    pub watermark_font: Option<Arc<FontVec>>,
    /// Root token for background tasks; cancelled on shutdown.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/s/{}", self.config.base_url, code)
    }
}
