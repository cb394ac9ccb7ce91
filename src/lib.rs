//! # Peel
//!
//! Automatic UV unwrapping for triangle meshes.
//!
//! Peel computes per-vertex texture coordinates for a 3D triangle mesh: each
//! connected UV region (island) is a conformal flattening of part of the
//! surface, and islands are packed without overlap into the unit square.
//!
//! ## Pipeline
//!
//! - **Topology**: unique edge set and edge-to-face adjacency
//! - **Seam selection**: BFS spanning forest over the face-dual graph;
//!   non-tree edges become seams
//! - **Island extraction**: connected components after seam cuts
//! - **LSCM**: per-island sparse conformal least-squares solve with two
//!   pinned vertices
//! - **Packing**: shelf packing of island bounding boxes into [0, 1]²
//! - **Metrics**: per-triangle stretch and texture-space coverage
//!
//! ## Quick Start
//!
//! ```no_run
//! use peel::prelude::*;
//!
//! let mesh = peel::io::obj::load("model.obj").unwrap();
//!
//! let result = unwrap_mesh(&mesh, &UnwrapOptions::default()).unwrap();
//! println!("islands: {}", result.num_islands);
//! println!("max stretch: {:.3}", result.max_stretch);
//! println!("coverage: {:.1}%", result.coverage * 100.0);
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use peel::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let triangles = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//!
//! let mesh = TriMesh::from_parts(vertices, triangles).unwrap();
//! let result = unwrap_mesh(&mesh, &UnwrapOptions::default()).unwrap();
//! assert_eq!(result.uvs.len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod io;
pub mod island;
pub mod lscm;
pub mod mesh;
pub mod metrics;
pub mod pack;
pub mod seam;
pub mod topology;
pub mod unwrap;

/// Prelude module for convenient imports.
///
/// ```
/// use peel::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Result, UnwrapError};
    pub use crate::mesh::TriMesh;
    pub use crate::unwrap::{unwrap_mesh, UnwrapOptions, UnwrapResult};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
