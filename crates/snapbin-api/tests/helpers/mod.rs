//! Test helpers: build the application against a temp SQLite database and
//! temp upload directory.
//!
//! Run with `cargo test -p snapbin-api`.

// Each integration test binary compiles its own copy; not every test uses
// every helper.
#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use snapbin_api::setup;
use snapbin_api::state::AppState;
use snapbin_core::Config;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    _db_dir: TempDir,
    _storage_dir: TempDir,
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Build an app with per-test config tweaks (rate limits, screening, etc).
pub async fn setup_test_app_with(tweak: impl FnOnce(&mut Config)) -> TestApp {
    let db_dir = tempfile::tempdir().expect("Failed to create temp db directory");
    let storage_dir = tempfile::tempdir().expect("Failed to create temp storage directory");

    let mut config = test_config(&db_dir, &storage_dir);
    tweak(&mut config);

    let (state, router) = setup::initialize_app(config)
        .await
        .expect("Failed to initialize test app");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        _db_dir: db_dir,
        _storage_dir: storage_dir,
    }
}

fn test_config(db_dir: &TempDir, storage_dir: &TempDir) -> Config {
    Config {
        server_port: 0,
        base_url: "http://localhost:8000".to_string(),
        environment: "test".to_string(),
        database_url: format!("sqlite://{}", db_dir.path().join("snapbin.db").display()),
        upload_dir: storage_dir.path().to_path_buf(),
        max_file_size_bytes: 15 * 1024 * 1024,
        allowed_extensions: ["jpg", "jpeg", "png", "gif", "webp"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        max_concurrent_uploads: 4,
        pipeline_acquire_timeout_secs: 5,
        transform_workers: 2,
        rate_limit: 100,
        rate_limit_window_secs: 60,
        rate_limit_sweep_interval_secs: 600,
        screening_enabled: false,
        skin_threshold: 0.5,
        max_long_edge: 1920,
        max_dimension: 5000,
        watermark_font_paths: vec![
            PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
            PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"),
            PathBuf::from("/usr/share/fonts/dejavu/DejaVuSans.ttf"),
        ],
        link_reaper_interval_secs: 3600,
        disk_check_interval_secs: 600,
        disk_usage_warn_percent: 99.0,
        admin_token: Some(TEST_ADMIN_TOKEN.to_string()),
    }
}

/// Solid-color PNG fixture.
pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    encode_png(RgbImage::from_pixel(width, height, Rgb([40, 90, 160])))
}

/// Fixture where every pixel matches the content screen's skin mask.
pub fn skin_png_fixture(width: u32, height: u32) -> Vec<u8> {
    encode_png(RgbImage::from_pixel(width, height, Rgb([200, 80, 60])))
}

fn encode_png(img: RgbImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    buf.into_inner()
}

pub fn upload_form(filename: &str, bytes: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes)
            .file_name(filename)
            .mime_type("image/png"),
    )
}
