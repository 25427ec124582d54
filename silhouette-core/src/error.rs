//! Error types for the segment engine

use std::path::PathBuf;

/// Errors raised by shape construction, merge, split and rendering
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// Merge called with no shapes, or a shape built from no segments
    #[error("no segments to build a shape from")]
    EmptyInput,

    /// Every merged interval was removed by the noise filter
    #[error("merge produced no surviving segments")]
    DegenerateMerge,

    /// A segment whose start lies below its end
    #[error("invalid segment at column {column}: {y_start} > {y_end}")]
    InvalidSegment {
        column: i32,
        y_start: i32,
        y_end: i32,
    },

    /// A container index or frame that does not exist
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// An animation that would run past the frame limit
    #[error("animation ends at frame {frame}, past the limit of {limit} frames")]
    FrameLimit { frame: u64, limit: usize },

    /// A ratio with a zero denominator and a non-zero numerator
    #[error("zero denominator in {what}")]
    DivisionGuard { what: &'static str },
}

/// Result type for geometry operations
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors raised while loading an engine configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
