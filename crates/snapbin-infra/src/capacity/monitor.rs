use std::path::{Path, PathBuf};
use std::time::Duration;
use sysinfo::Disks;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Free space below this is treated as critical regardless of the configured
/// usage threshold.
const CRITICAL_FREE_BYTES: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct DiskStatus {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_percent: f64,
}

impl DiskStatus {
    pub fn is_critical(&self) -> bool {
        self.available_bytes < CRITICAL_FREE_BYTES
    }
}

/// Periodically samples the disk holding the upload directory and logs when
/// usage crosses the warning threshold or free space goes critical.
#[derive(Clone)]
pub struct DiskMonitor {
    path: PathBuf,
    warn_percent: f64,
}

impl DiskMonitor {
    pub fn new(path: impl Into<PathBuf>, warn_percent: f64) -> Self {
        Self {
            path: path.into(),
            warn_percent,
        }
    }

    /// Sample the disk backing the monitored path. `None` when no mounted
    /// disk matches (containers without a populated mount table).
    pub fn check(&self) -> Option<DiskStatus> {
        let target = self.path.canonicalize().unwrap_or_else(|_| self.path.clone());
        let disks = Disks::new_with_refreshed_list();

        // Longest matching mount point wins so /data beats / for /data/uploads.
        let disk = disks
            .iter()
            .filter(|d| target.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())?;

        let total = disk.total_space();
        let available = disk.available_space();
        if total == 0 {
            return None;
        }
        let used_percent = ((total - available) as f64 / total as f64) * 100.0;

        Some(DiskStatus {
            total_bytes: total,
            available_bytes: available,
            used_percent,
        })
    }

    fn report(&self, path: &Path, status: DiskStatus) {
        if status.is_critical() {
            error!(
                path = %path.display(),
                available_bytes = status.available_bytes,
                used_percent = format!("{:.1}", status.used_percent),
                "Disk space critically low"
            );
        } else if status.used_percent >= self.warn_percent {
            warn!(
                path = %path.display(),
                available_bytes = status.available_bytes,
                used_percent = format!("{:.1}", status.used_percent),
                threshold = self.warn_percent,
                "Disk usage above warning threshold"
            );
        } else {
            info!(
                path = %path.display(),
                available_bytes = status.available_bytes,
                used_percent = format!("{:.1}", status.used_percent),
                "Disk usage check"
            );
        }
    }

    /// Spawn the periodic check task; the sysinfo sampling runs on the
    /// blocking pool.
    pub fn spawn(&self, check_interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Disk monitor shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let sampler = monitor.clone();
                        let sampled = tokio::task::spawn_blocking(move || sampler.check()).await;
                        match sampled {
                            Ok(Some(status)) => monitor.report(&monitor.path, status),
                            Ok(None) => {
                                warn!(
                                    path = %monitor.path.display(),
                                    "Could not determine disk usage for upload directory"
                                );
                            }
                            Err(e) => {
                                error!(error = %e, "Disk usage sampling task failed");
                            }
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_reports_sane_numbers_for_a_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = DiskMonitor::new(dir.path(), 80.0);

        if let Some(status) = monitor.check() {
            assert!(status.total_bytes > 0);
            assert!(status.available_bytes <= status.total_bytes);
            assert!((0.0..=100.0).contains(&status.used_percent));
        }
    }

    #[test]
    fn critical_flag_tracks_free_bytes() {
        let low = DiskStatus {
            total_bytes: 10 * CRITICAL_FREE_BYTES,
            available_bytes: CRITICAL_FREE_BYTES / 2,
            used_percent: 95.0,
        };
        assert!(low.is_critical());

        let fine = DiskStatus {
            total_bytes: 10 * CRITICAL_FREE_BYTES,
            available_bytes: 5 * CRITICAL_FREE_BYTES,
            used_percent: 50.0,
        };
        assert!(!fine.is_critical());
    }

    #[tokio::test]
    async fn monitor_task_stops_on_cancellation() {
        let monitor = DiskMonitor::new("/tmp", 80.0);
        let shutdown = CancellationToken::new();
        let handle = monitor.spawn(Duration::from_secs(600), shutdown.clone());

        shutdown.cancel();
        handle.await.unwrap();
    }
}
