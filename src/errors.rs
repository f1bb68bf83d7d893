//! Error Types
//!
//! This module defines the error types used throughout the baker.
//!
//! # Overview
//!
//! The main error type [`BakerError`] covers all failure modes including:
//! - Render target and texture creation failures
//! - Asset loading and decoding errors
//! - Configuration parsing errors
//! - Misuse of the property graph (dependency cycles)
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, BakerError>`.
//!
//! ```rust,ignore
//! use ibl_baker::errors::{BakerError, Result};
//!
//! fn cache_probe() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the baker.
#[derive(Error, Debug)]
pub enum BakerError {
    // ========================================================================
    // Device & Resource Errors
    // ========================================================================
    /// A texture or render target could not be created.
    #[error("Failed to create resource '{name}': {reason}")]
    ResourceCreation {
        /// Debug name of the resource
        name: String,
        /// Why the device refused it
        reason: String,
    },

    /// A texture handle did not resolve to a live resource.
    #[error("Unknown texture handle: {0}")]
    UnknownTexture(String),

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// Cube map validation error.
    #[error("Cube map error: {0}")]
    CubeMap(String),

    // ========================================================================
    // I/O & Format Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// File watcher error.
    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),

    // ========================================================================
    // Logic Errors
    // ========================================================================
    /// A property was read while it was already being evaluated.
    #[error("Cyclic property dependency detected while evaluating '{name}'")]
    PropertyCycle {
        /// Debug name of the property that was re-entered
        name: String,
    },

    /// BRDF index out of bounds.
    #[error("BRDF index out of bounds: {index} (loaded: {count})")]
    InvalidBrdfIndex {
        /// The invalid index
        index: usize,
        /// Number of loaded BRDFs
        count: usize,
    },
}

impl From<image::ImageError> for BakerError {
    fn from(err: image::ImageError) -> Self {
        BakerError::ImageDecode(err.to_string())
    }
}

/// Alias for `Result<T, BakerError>`.
pub type Result<T> = std::result::Result<T, BakerError>;
