//! Unified error handling for ms-platform
//!
//! Every fallible helper in the platform crate returns this error type. The
//! sensor accessors never hand it to their callers: they log it and fall back
//! to the documented default for the field.

use std::io;
use std::path::PathBuf;

/// Result type alias using PlatformError
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Unified error type for all platform operations
#[derive(thiserror::Error, Debug)]
pub enum PlatformError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // ============================================================================
    // Hardware Value Errors
    // ============================================================================
    #[error("Unexpected value in {path}: {raw:?}")]
    Parse {
        path: PathBuf,
        raw: String,
    },

    #[error("FRU decode failed: {0}")]
    FruDecode(String),

    #[error("No entry for {kind} index {index}")]
    UnknownIndex {
        kind: &'static str,
        index: usize,
    },

    #[error("Failed to bind device {address} on i2c-{bus}: {reason}")]
    DeviceBind {
        bus: u32,
        address: String,
        reason: String,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl PlatformError {
    /// Create a parse error for a raw value read from `path`
    pub fn parse(path: impl Into<PathBuf>, raw: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            raw: raw.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }
}
