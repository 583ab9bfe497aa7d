//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`BasaltError`] covers all failure modes including:
//! - HDR source loading and decoding errors
//! - Registry lookups for images that no longer exist
//! - Pipeline-ordering violations in the environment map state machine
//!
//! Structural attachment errors (dimension mismatch, duplicate render
//! buffer) are deliberately *not* represented here: per the render target
//! contract they log and leave the target untouched instead of failing the
//! call.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, BasaltError>`.

use thiserror::Error;

/// The main error type for the rendering core.
#[derive(Error, Debug)]
pub enum BasaltError {
    // ========================================================================
    // I/O & Decoding Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding error (corrupt or unsupported HDR source).
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// A handle referred to an image that is no longer in the registry.
    #[error("Image not found in registry: {0}")]
    ImageNotFound(String),

    /// An operation was given dimensions it cannot work with.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    // ========================================================================
    // Environment Pipeline Errors
    // ========================================================================
    /// A precomputation pass was requested before its input stage existed.
    #[error("{operation} requires {missing}")]
    EnvironmentState {
        /// The rejected operation
        operation: &'static str,
        /// The missing pipeline stage
        missing: &'static str,
    },
}

impl From<image::ImageError> for BasaltError {
    fn from(err: image::ImageError) -> Self {
        BasaltError::ImageDecode(err.to_string())
    }
}

/// Alias for `Result<T, BasaltError>`.
pub type Result<T> = std::result::Result<T, BasaltError>;
