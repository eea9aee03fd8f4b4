//! Configuration module.
//!
//! All settings are environment-variable driven with sensible defaults, loaded
//! once at startup via [`Config::from_env`].

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::ALLOWED_EXTENSIONS;

const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 15 * 1024 * 1024;
const DEFAULT_MAX_CONCURRENT_UPLOADS: usize = 20;
const DEFAULT_RATE_LIMIT: u32 = 20;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
const DEFAULT_RATE_LIMIT_SWEEP_INTERVAL_SECS: u64 = 600;
const DEFAULT_PIPELINE_ACQUIRE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_LONG_EDGE: u32 = 1920;
const DEFAULT_MAX_DIMENSION: u32 = 5000;
const DEFAULT_SKIN_THRESHOLD: f64 = 0.5;
const DEFAULT_LINK_REAPER_INTERVAL_SECS: u64 = 3600;
const DEFAULT_DISK_CHECK_INTERVAL_SECS: u64 = 600;
const DEFAULT_DISK_USAGE_WARN_PERCENT: f64 = 80.0;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub base_url: String,
    pub environment: String,
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    /// Pipeline admission bound N: uploads mid-processing at once.
    pub max_concurrent_uploads: usize,
    pub pipeline_acquire_timeout_secs: u64,
    /// CPU worker bound M for image transforms.
    pub transform_workers: usize,
    pub rate_limit: u32,
    pub rate_limit_window_secs: u64,
    pub rate_limit_sweep_interval_secs: u64,
    pub screening_enabled: bool,
    pub skin_threshold: f64,
    pub max_long_edge: u32,
    pub max_dimension: u32,
    /// Ordered font fallback chain for text watermarks.
    pub watermark_font_paths: Vec<PathBuf>,
    pub link_reaper_interval_secs: u64,
    pub disk_check_interval_secs: u64,
    pub disk_usage_warn_percent: f64,
    pub admin_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let allowed_extensions = env_list("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|| ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect());

        let default_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .min(8);

        Ok(Self {
            server_port: env_parse("SERVER_PORT", 8000),
            base_url: env_string("BASE_URL", "http://localhost:8000"),
            environment: env_string("ENVIRONMENT", "development"),
            database_url: env_string("DATABASE_URL", "sqlite://snapbin.db"),
            upload_dir: PathBuf::from(env_string("UPLOAD_DIR", "uploads")),
            max_file_size_bytes: env_parse("MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE_BYTES),
            allowed_extensions,
            max_concurrent_uploads: env_parse(
                "MAX_CONCURRENT_UPLOADS",
                DEFAULT_MAX_CONCURRENT_UPLOADS,
            ),
            pipeline_acquire_timeout_secs: env_parse(
                "PIPELINE_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_PIPELINE_ACQUIRE_TIMEOUT_SECS,
            ),
            transform_workers: env_parse("TRANSFORM_WORKERS", default_workers),
            rate_limit: env_parse("RATE_LIMIT", DEFAULT_RATE_LIMIT),
            rate_limit_window_secs: env_parse(
                "RATE_LIMIT_WINDOW",
                DEFAULT_RATE_LIMIT_WINDOW_SECS,
            ),
            rate_limit_sweep_interval_secs: env_parse(
                "RATE_LIMIT_SWEEP_INTERVAL_SECS",
                DEFAULT_RATE_LIMIT_SWEEP_INTERVAL_SECS,
            ),
            screening_enabled: env_bool("OFFLINE_CHECK_ENABLED", false),
            skin_threshold: env_parse("SKIN_THRESHOLD", DEFAULT_SKIN_THRESHOLD),
            max_long_edge: env_parse("MAX_LONG_EDGE", DEFAULT_MAX_LONG_EDGE),
            max_dimension: env_parse("MAX_DIMENSION", DEFAULT_MAX_DIMENSION),
            watermark_font_paths: env_list("WATERMARK_FONT_PATHS")
                .map(|paths| paths.into_iter().map(PathBuf::from).collect())
                .unwrap_or_else(default_font_paths),
            link_reaper_interval_secs: env_parse(
                "LINK_REAPER_INTERVAL_SECS",
                DEFAULT_LINK_REAPER_INTERVAL_SECS,
            ),
            disk_check_interval_secs: env_parse(
                "DISK_CHECK_INTERVAL_SECS",
                DEFAULT_DISK_CHECK_INTERVAL_SECS,
            ),
            disk_usage_warn_percent: env_parse(
                "DISK_USAGE_WARN_PERCENT",
                DEFAULT_DISK_USAGE_WARN_PERCENT,
            ),
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

fn default_font_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
        PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"),
        PathBuf::from("/usr/share/fonts/dejavu/DejaVuSans.ttf"),
    ]
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}

/// Comma-separated list variable; `None` when unset or empty.
fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = env::var(key).ok()?;
    let items: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
