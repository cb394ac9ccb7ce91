//! Triangle mesh storage.
//!
//! This module provides [`TriMesh`], a face-vertex triangle mesh with optional
//! per-vertex UV coordinates. The unwrapping pipeline reads vertex positions
//! and triangle indices and produces the UV buffer.
//!
//! # Construction
//!
//! Meshes are built from vertex and triangle lists, which are validated once
//! at construction time:
//!
//! ```
//! use peel::mesh::TriMesh;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let triangles = vec![[0, 1, 2]];
//!
//! let mesh = TriMesh::from_parts(vertices, triangles).unwrap();
//! assert_eq!(mesh.num_vertices(), 3);
//! assert_eq!(mesh.num_triangles(), 1);
//! ```

use nalgebra::{Point2, Point3};

use crate::error::{Result, UnwrapError};

/// A triangle mesh with optional per-vertex UV coordinates.
///
/// Positions are stored in double precision; UV coordinates are stored in
/// single precision, matching the precision at which the pipeline emits them.
/// Once constructed, every triangle is guaranteed to reference three distinct,
/// in-range vertex indices.
#[derive(Debug, Clone)]
pub struct TriMesh {
    vertices: Vec<Point3<f64>>,
    triangles: Vec<[usize; 3]>,
    uvs: Option<Vec<Point2<f32>>>,
}

impl TriMesh {
    /// Build a mesh from vertex positions and triangle index triples.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than three vertices, no triangles,
    /// a triangle references an out-of-range vertex, or a triangle repeats a
    /// vertex index.
    pub fn from_parts(vertices: Vec<Point3<f64>>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(UnwrapError::TooFewVertices {
                count: vertices.len(),
            });
        }
        if triangles.is_empty() {
            return Err(UnwrapError::NoTriangles);
        }

        for (fi, tri) in triangles.iter().enumerate() {
            for &vi in tri {
                if vi >= vertices.len() {
                    return Err(UnwrapError::InvalidVertexIndex {
                        face: fi,
                        vertex: vi,
                    });
                }
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(UnwrapError::RepeatedVertex { face: fi });
            }
        }

        Ok(Self {
            vertices,
            triangles,
            uvs: None,
        })
    }

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn vertex(&self, v: usize) -> Point3<f64> {
        self.vertices[v]
    }

    /// Get the vertex indices of a triangle.
    #[inline]
    pub fn triangle(&self, f: usize) -> [usize; 3] {
        self.triangles[f]
    }

    /// Get all vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Get all triangles.
    #[inline]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Get the per-vertex UV coordinates, if present.
    #[inline]
    pub fn uvs(&self) -> Option<&[Point2<f32>]> {
        self.uvs.as_deref()
    }

    /// Attach per-vertex UV coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the UV count does not match the vertex count.
    pub fn set_uvs(&mut self, uvs: Vec<Point2<f32>>) -> Result<()> {
        if uvs.len() != self.vertices.len() {
            return Err(UnwrapError::invalid_param(
                "uvs",
                uvs.len(),
                "must have one UV per vertex",
            ));
        }
        self.uvs = Some(uvs);
        Ok(())
    }

    /// Compute the axis-aligned bounding box of the vertex positions.
    pub fn bounding_box(&self) -> (Point3<f64>, Point3<f64>) {
        let mut min = self.vertices[0];
        let mut max = self.vertices[0];
        for p in &self.vertices {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        (min, max)
    }
}
