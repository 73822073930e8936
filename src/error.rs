//! Errors produced by the routing core.
use thiserror::Error;

/// Malformed input to the routing core.
///
/// These are raised before any solver work is done and abort the run.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RoutingError {
    /// The road network is malformed (unknown endpoints, non-positive capacities, etc.)
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// An emergency request is malformed or does not fit the graph
    #[error("Invalid commodity: {0}")]
    InvalidCommodity(String),
}

/// Result type for the routing core
pub type RoutingResult<T> = Result<T, RoutingError>;
