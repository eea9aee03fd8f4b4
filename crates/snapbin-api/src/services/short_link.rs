//! Short-link issuance and resolution.

use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use snapbin_core::constants::{MAX_CODE_ATTEMPTS, SHORT_CODE_LENGTH};
use snapbin_core::models::ShortLink;
use snapbin_core::AppError;
use snapbin_db::ShortLinkRepository;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Issues unique short codes and resolves them back to target files.
///
/// Uniqueness rests entirely on the code column's UNIQUE index: generation is
/// random and a collision simply retries with a fresh code. No in-process
/// reservation set exists, so concurrent issuers on separate processes stay
/// correct.
#[derive(Clone)]
pub struct ShortLinkIssuer {
    links: ShortLinkRepository,
}

impl ShortLinkIssuer {
    pub fn new(links: ShortLinkRepository) -> Self {
        Self { links }
    }

    fn generate_code() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SHORT_CODE_LENGTH)
            .map(char::from)
            .collect()
    }

    /// Claim a fresh code for `target_file`. Bounded retries; with a 62^6
    /// code space, more than a couple of attempts indicates a real problem.
    pub async fn issue(
        &self,
        target_file: &str,
        owner: Option<&str>,
        expire_at: Option<DateTime<Utc>>,
    ) -> Result<ShortLink, AppError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = Self::generate_code();
            if let Some(link) = self
                .links
                .try_insert(&code, target_file, owner, expire_at)
                .await?
            {
                if attempt > 1 {
                    tracing::debug!(attempt, code = %link.code, "Short code issued after collision retry");
                }
                return Ok(link);
            }
        }
        Err(AppError::Internal(format!(
            "Could not allocate a unique short code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }

    /// Resolve `code` at time `now`. An expired link is reported as such,
    /// never conflated with an unknown code.
    pub async fn resolve(&self, code: &str, now: DateTime<Utc>) -> Result<ShortLink, AppError> {
        let link = self
            .links
            .get_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Short link '{code}'")))?;

        if link.is_expired(now) {
            return Err(AppError::Expired(format!("Short link '{code}'")));
        }
        Ok(link)
    }

    /// Best-effort access counting, decoupled from serving the bytes.
    pub async fn record_access(&self, code: &str) {
        if let Err(e) = self.links.increment_access(code).await {
            tracing::warn!(code, error = %e, "Failed to bump short link access count");
        }
    }

    /// Spawn the periodic reaper that deletes expired link rows.
    pub fn spawn_reaper(
        &self,
        reap_interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let links = self.links.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(reap_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Short link reaper shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        match links.delete_expired(Utc::now()).await {
                            Ok(0) => {}
                            Ok(reaped) => tracing::info!(reaped, "Deleted expired short links"),
                            Err(e) => tracing::error!(error = %e, "Short link reaping failed"),
                        }
                    }
                }
            }
        })
    }
}
