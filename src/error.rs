//! Error types for the crime map core.

use thiserror::Error;

/// Errors raised by the data-shaping and interaction layer.
#[derive(Debug, Error)]
pub enum CrimeMapError {
    /// The store has no rows to answer a query
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// No yearly records exist for the requested region
    #[error("No records for region: {0}")]
    RegionNotFound(String),

    /// Two display names would resolve to the same canonical region
    #[error("Display names '{first}' and '{second}' both map to '{canonical}'")]
    NameCollision {
        first: String,
        second: String,
        canonical: String,
    },

    /// A color string is not a `#rrggbb` hex code
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// The no-data color is indistinguishable from a point on the scale
    #[error("No-data color {0} lies on the color scale")]
    NeutralOnScale(String),

    /// Zoom bounds or step cannot form a valid viewport
    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    /// Sort key does not name a column
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Sort direction is neither `asc` nor `desc`
    #[error("Unknown sort direction: {0}")]
    UnknownDirection(String),
}

/// Result type for core operations
pub type CrimeMapResult<T> = Result<T, CrimeMapError>;
