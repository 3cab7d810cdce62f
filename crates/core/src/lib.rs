//! Statute Core Library
//!
//! This crate provides the foundational utilities shared by every statute crate:
//! - Error handling (`AppError`, `AppResult`, `ErrorKind`)
//! - Logging infrastructure
//! - Typed configuration for the retrieval pipeline and its providers

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult, ErrorKind};
