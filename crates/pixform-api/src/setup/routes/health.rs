//! Health check handler and response type.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Run an async check with timeout; returns status string "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(serde::Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: String,
    pub version: &'static str,
    pub upload_dir: String,
    pub transform_pool: TransformPoolStatus,
}

#[derive(serde::Serialize)]
pub(super) struct TransformPoolStatus {
    pub size: usize,
    pub available: usize,
}

async fn check_upload_dir(dir: PathBuf) -> Result<(), std::io::Error> {
    let metadata = tokio::fs::metadata(&dir).await?;
    if !metadata.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{} is not a directory", dir.display()),
        ));
    }
    if metadata.permissions().readonly() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("{} is read-only", dir.display()),
        ));
    }
    Ok(())
}

/// Liveness plus an upload directory check.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let upload_dir = run_check(
        TIMEOUT,
        check_upload_dir(state.config.upload_dir.clone()),
        "unhealthy",
    )
    .await;
    let overall_healthy = upload_dir == "healthy";

    if !overall_healthy {
        tracing::error!(upload_dir = %upload_dir, "Upload directory health check failed");
    }

    let response = HealthCheckResponse {
        status: if overall_healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION"),
        upload_dir,
        transform_pool: TransformPoolStatus {
            size: state.pool.size(),
            available: state.pool.available(),
        },
    };

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_check_statuses() {
        let ok = run_check(Duration::from_secs(1), async { Ok::<(), String>(()) }, "x").await;
        assert_eq!(ok, "healthy");

        let failed = run_check(
            Duration::from_secs(1),
            async { Err::<(), _>("disk gone") },
            "unhealthy",
        )
        .await;
        assert_eq!(failed, "unhealthy: disk gone");

        let slow = run_check(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<(), String>(())
            },
            "x",
        )
        .await;
        assert_eq!(slow, "timeout");
    }

    #[tokio::test]
    async fn test_check_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_upload_dir(dir.path().to_path_buf()).await.is_ok());
        assert!(check_upload_dir(dir.path().join("missing")).await.is_err());

        let file = dir.path().join("plain-file");
        std::fs::write(&file, b"x").unwrap();
        assert!(check_upload_dir(file).await.is_err());
    }
}
