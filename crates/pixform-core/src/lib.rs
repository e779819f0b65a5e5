//! Pixform Core Library
//!
//! This crate provides the error types and configuration shared by the
//! processing pipeline and the HTTP API.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
