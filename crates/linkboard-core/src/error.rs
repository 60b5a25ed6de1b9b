//! Errors for the bookkeeping side of the engine.
//!
//! Geometry itself never fails; it degrades to best-effort results.

use crate::shapes::ShapeId;
use thiserror::Error;

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Shape {0} is not a connector")]
    NotAConnector(ShapeId),
    #[error("Point index {index} out of range for connector {connector} with {len} points")]
    PointIndexOutOfRange {
        connector: ShapeId,
        index: usize,
        len: usize,
    },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for engine operations that can fail.
pub type EngineResult<T> = Result<T, EngineError>;
