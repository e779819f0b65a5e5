//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p pixform-api --test image_test`.
//! Each app gets its own upload directory so tests can assert it is left empty.

#![allow(dead_code)]

pub mod fixtures;

use axum_test::TestServer;
use pixform_api::setup::routes;
use pixform_api::AppState;
use pixform_core::Config;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Test application: server plus the upload directory it writes to.
pub struct TestApp {
    pub server: TestServer,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn upload_dir(&self) -> &Path {
        self.upload_dir.path()
    }

    /// Names of files still present in the upload directory
    pub fn leftover_uploads(&self) -> Vec<String> {
        std::fs::read_dir(self.upload_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

/// Setup test app with default configuration.
pub fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {})
}

/// Setup test app, letting the caller adjust the configuration first.
pub fn setup_test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();

    let mut config = Config {
        upload_dir: upload_dir.path().to_path_buf(),
        max_concurrent_transforms: 2,
        ..Config::default()
    };
    configure(&mut config);
    config.validate().unwrap();

    let state = Arc::new(AppState::new(config.clone()));
    let app = routes::setup_routes(&config, state).unwrap();
    let server = TestServer::new(app).unwrap();

    TestApp { server, upload_dir }
}
