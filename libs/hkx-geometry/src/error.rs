//! # Geometry Errors
//!
//! Error types for record validation and mesh reconstruction.

use thiserror::Error;

/// Errors that can occur while turning a record into a mesh.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    /// A record references a vertex it does not contain.
    #[error("Malformed record '{shape}': {message}")]
    MalformedRecord { shape: String, message: String },

    /// The point set has no three-dimensional hull.
    #[error("Degenerate hull: {message}")]
    DegenerateHull { message: String },
}

impl GeometryError {
    /// Creates a malformed record error.
    pub fn malformed(shape: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            shape: shape.into(),
            message: message.into(),
        }
    }

    /// Creates a degenerate hull error.
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateHull {
            message: message.into(),
        }
    }
}
