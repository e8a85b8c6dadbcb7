//! Error types for the frame solver

use thiserror::Error;

use crate::elements::PointId;

/// Main error type for solver operations
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Cannot construct an orthogonal basis for member axis")]
    DegenerateBasis,

    #[error("Point {0} already exists in model")]
    DuplicatePoint(PointId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for solver operations
pub type SolverResult<T> = Result<T, SolverError>;
