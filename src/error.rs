//! Error types for luag-panel.

use thiserror::Error;

/// Invalid display or console geometry.
///
/// Raised where configuration enters the crate. A snapshot built from bad
/// geometry would corrupt every coordinate produced afterwards, so these are
/// never clamped or ignored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The logical console resolution has a zero or negative axis.
    #[error("invalid logical size: {width}x{height}")]
    InvalidLogicalSize { width: i64, height: i64 },

    /// The scaled console size has a zero or negative axis.
    #[error("invalid scaled size: {width}x{height}")]
    InvalidScaledSize { width: i32, height: i32 },

    /// The physical window has a zero or negative axis.
    #[error("invalid window size: {width}x{height}")]
    InvalidWindow { width: i32, height: i32 },

    /// The window is too small to show a single scaled pixel on one axis.
    #[error("window {width}x{height} is too small for the console")]
    WindowTooSmall { width: i32, height: i32 },
}

/// Errors from the host side of the input layer.
#[derive(Error, Debug)]
pub enum InputError {
    /// An I/O error occurred while reading terminal events.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Display geometry was rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias using [`InputError`].
pub type Result<T> = std::result::Result<T, InputError>;
