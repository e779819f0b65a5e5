//! Pixform API Library
//!
//! This crate provides the HTTP handlers, middleware, and application setup for the
//! image transform service.

// Module declarations
mod api_doc;
mod handlers;
mod middleware;
mod params;
mod telemetry;
mod utils;

// Public modules
pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
