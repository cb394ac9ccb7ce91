//! Error types for peel.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`UnwrapError`].
pub type Result<T> = std::result::Result<T, UnwrapError>;

/// Errors that can occur during mesh unwrapping.
#[derive(Error, Debug)]
pub enum UnwrapError {
    /// The mesh has fewer than three vertices.
    #[error("mesh has {count} vertices, need at least 3")]
    TooFewVertices {
        /// The number of vertices supplied.
        count: usize,
    },

    /// The mesh has no triangles.
    #[error("mesh has no triangles")]
    NoTriangles,

    /// A triangle references an invalid vertex index.
    #[error("triangle {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The triangle index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A triangle has duplicate vertex indices.
    #[error("triangle {face} repeats a vertex index")]
    RepeatedVertex {
        /// The triangle index.
        face: usize,
    },

    /// An island has too few unique vertices to parameterize.
    #[error("island has {vertices} usable vertices, need at least 3")]
    DegenerateIsland {
        /// The number of unique vertices in the island.
        vertices: usize,
    },

    /// Every triangle in an island has (near) zero area.
    #[error("island has no triangles with usable area")]
    ZeroAreaIsland,

    /// The sparse solver failed to converge.
    #[error("solver failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading a mesh from a file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl UnwrapError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        UnwrapError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
