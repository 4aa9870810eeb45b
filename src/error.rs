//! Error types for the layout analysis library.
//!
//! The analysis core itself is total over validated input (empty or degenerate
//! geometry degrades to documented defaults rather than failing), so errors
//! surface only at the genuine fallible seams: configuration validation and
//! JSON ingestion of positioned lines.

/// Result type alias for layout library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur at the library boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value is non-finite, non-positive, or otherwise unusable
    #[error("Invalid configuration: {field} = {value} ({reason})")]
    InvalidConfig {
        /// Name of the offending configuration field
        field: &'static str,
        /// The rejected value
        value: f32,
        /// Reason the value was rejected
        reason: &'static str,
    },

    /// Positioned-line JSON could not be parsed
    #[error("Failed to parse positioned lines: {0}")]
    Parse(#[from] serde_json::Error),
}
