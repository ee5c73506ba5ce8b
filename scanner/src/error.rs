//! Error types for the wheel scanner.
//!
//! Degenerate geometry (zero rays, zero slices, axle parallel to up) is not an
//! error; those cases have well-defined fallbacks. Only configuration loading
//! and query-backend failures surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// A configuration option is outside its authored range.
    #[error("invalid scanner configuration: {0}")]
    InvalidConfig(String),

    /// The configuration text could not be parsed.
    #[error("failed to parse scanner configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The collision backend failed to answer a shape cast.
    #[error("shape cast query failed: {0}")]
    QueryFailed(String),

    /// A cast was about to be issued with NaN or infinite parameters.
    #[error("non-finite cast parameters for ray {ray_index}")]
    NonFiniteCast { ray_index: usize },
}

/// Convenience alias for `Result<T, ScanError>`.
pub type ScanResult<T> = Result<T, ScanError>;
