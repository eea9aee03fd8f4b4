//! Application setup and initialization.

pub mod routes;
pub mod server;

use anyhow::{Context, Result};
use snapbin_core::Config;
use snapbin_db::{AssetRepository, AuditRepository, ShortLinkRepository};
use snapbin_infra::{ConcurrencyGovernor, DiskMonitor, RateLimiter};
use snapbin_processing::image::load_font;
use snapbin_storage::{AssetStore, LocalAssetStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::services::short_link::ShortLinkIssuer;
use crate::services::upload::UploadPipeline;
use crate::state::AppState;

/// Build the whole application: database, storage, services, background
/// tasks, and the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let pool = snapbin_db::connect(&config.database_url)
        .await
        .context("Failed to open database")?;
    snapbin_db::run_migrations(&pool).await?;

    let storage: Arc<dyn AssetStore> = Arc::new(
        LocalAssetStore::new(config.upload_dir.clone())
            .await
            .context("Failed to initialize upload storage")?,
    );

    let assets = AssetRepository::new(pool.clone());
    let links = ShortLinkRepository::new(pool.clone());
    let audits = AuditRepository::new(pool.clone());

    let limiter = RateLimiter::new(
        config.rate_limit,
        Duration::from_secs(config.rate_limit_window_secs),
    );
    let governor = ConcurrencyGovernor::new(config.max_concurrent_uploads, config.transform_workers);
    let issuer = ShortLinkIssuer::new(links.clone());

    let watermark_font = match load_font(&config.watermark_font_paths) {
        Ok(font) => Some(Arc::new(font)),
        Err(e) => {
            tracing::warn!(error = %e, "Watermark requests will serve unmodified images");
            None
        }
    };

    let pipeline = UploadPipeline::new(
        config.clone(),
        storage.clone(),
        assets.clone(),
        audits.clone(),
        issuer.clone(),
        limiter.clone(),
        governor.clone(),
    );

    let state = Arc::new(AppState {
        config,
        pool,
        storage,
        assets,
        links,
        audits,
        limiter,
        governor,
        issuer,
        pipeline,
        watermark_font,
        shutdown: CancellationToken::new(),
    });

    spawn_background_tasks(&state);

    let router = routes::build_router(state.clone());
    Ok((state, router))
}

/// Periodic maintenance: rate limit window eviction, expired link reaping,
/// and disk usage checks. Each gets a child token so a server shutdown stops
/// them all.
fn spawn_background_tasks(state: &Arc<AppState>) {
    let config = &state.config;

    let _ = state.limiter.spawn_sweeper(
        Duration::from_secs(config.rate_limit_sweep_interval_secs),
        state.shutdown.child_token(),
    );

    let _ = state.issuer.spawn_reaper(
        Duration::from_secs(config.link_reaper_interval_secs),
        state.shutdown.child_token(),
    );

    let _ = DiskMonitor::new(state.storage.root(), config.disk_usage_warn_percent).spawn(
        Duration::from_secs(config.disk_check_interval_secs),
        state.shutdown.child_token(),
    );
}
