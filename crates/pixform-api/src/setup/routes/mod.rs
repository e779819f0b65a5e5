//! Route configuration and setup.
//!
//! Transform endpoints live under `/image`; health checks in [health](health).

mod health;

use crate::error::HttpAppError;
use crate::handlers;
use crate::middleware::{get_request_id, request_id_middleware};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, Request, Uri},
    routing::{get, post},
    Json, Router,
};
use pixform_core::{AppError, Config};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and text fields on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let body_limit = config.max_upload_size_bytes + MULTIPART_OVERHEAD_BYTES;
    let http_concurrency_limit = config.http_concurrency_limit.max(1);
    tracing::info!(
        http_concurrency_limit,
        body_limit,
        "HTTP limits configured"
    );

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = get_request_id(request).unwrap_or("-"),
        )
    });

    let app = Router::new()
        .merge(image_routes())
        .merge(public_routes())
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(trace_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
///
/// Credentials are allowed, so a wildcard origin is answered by echoing the
/// caller's origin back rather than with `*`.
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let origin = if config.allows_any_origin() {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        AllowOrigin::mirror_request()
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Health and documentation routes
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

async fn route_not_found(uri: Uri) -> HttpAppError {
    AppError::NotFound(format!("No route for {}", uri.path())).into()
}

/// Image transform routes
fn image_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/image", get(handlers::image::check_connection))
        .route("/image/convert", post(handlers::image::convert_image))
        .route("/image/resize", post(handlers::image::resize_image))
        .route("/image/compress", post(handlers::image::compress_image))
}
