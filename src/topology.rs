//! Mesh topology: unique edges and edge-to-face adjacency.
//!
//! This module derives the undirected edge set of a triangle mesh and, for
//! each edge, the one or two faces adjacent to it. Edges are canonicalized as
//! `(min, max)` vertex pairs and emitted in ascending order, so the edge
//! indices produced here are deterministic for identical inputs.
//!
//! An edge shared by three or more triangles is non-manifold; the first two
//! adjacencies are kept and a warning is logged for each extra one.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use log::warn;

use crate::mesh::TriMesh;

/// Unique edges of a mesh with per-edge face adjacency.
#[derive(Debug, Clone)]
pub struct EdgeTable {
    /// Canonicalized `(min, max)` vertex pairs in ascending order.
    edges: Vec<(usize, usize)>,
    /// For each edge, its adjacent faces. The second face is `None` for
    /// boundary edges.
    edge_faces: Vec<(usize, Option<usize>)>,
}

impl EdgeTable {
    /// Get the number of unique edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the vertex pair of an edge.
    #[inline]
    pub fn edge(&self, e: usize) -> (usize, usize) {
        self.edges[e]
    }

    /// Get the faces adjacent to an edge.
    #[inline]
    pub fn faces(&self, e: usize) -> (usize, Option<usize>) {
        self.edge_faces[e]
    }

    /// Check whether an edge lies on the mesh boundary (one adjacent face).
    #[inline]
    pub fn is_boundary(&self, e: usize) -> bool {
        self.edge_faces[e].1.is_none()
    }

    /// Get the number of boundary edges.
    pub fn num_boundary_edges(&self) -> usize {
        self.edge_faces.iter().filter(|(_, f1)| f1.is_none()).count()
    }

    /// Check whether the mesh is closed (no boundary edges).
    pub fn is_closed(&self) -> bool {
        self.edge_faces.iter().all(|(_, f1)| f1.is_some())
    }

    /// Compute the Euler characteristic V - E + F.
    ///
    /// A closed manifold mesh of genus zero has characteristic 2. Open meshes
    /// and meshes with handles differ; callers treat deviations as a
    /// diagnostic, not an error.
    pub fn euler_characteristic(&self, num_vertices: usize, num_faces: usize) -> i64 {
        num_vertices as i64 - self.edges.len() as i64 + num_faces as i64
    }
}

/// Build the edge table of a mesh.
///
/// Each triangle `(v0, v1, v2)` contributes the canonicalized edges
/// `(v0, v1)`, `(v1, v2)`, `(v2, v0)`. The first face to reference an edge
/// becomes its primary adjacency; the second fills the other slot; any
/// further reference is non-manifold and is dropped with a warning.
pub fn build_topology(mesh: &TriMesh) -> EdgeTable {
    let mut map: BTreeMap<(usize, usize), (usize, Option<usize>)> = BTreeMap::new();

    for (f, tri) in mesh.triangles().iter().enumerate() {
        for k in 0..3 {
            let a = tri[k];
            let b = tri[(k + 1) % 3];
            let key = if a < b { (a, b) } else { (b, a) };
            match map.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert((f, None));
                }
                Entry::Occupied(mut slot) => {
                    let (f0, f1) = slot.get_mut();
                    if f1.is_none() {
                        *f1 = Some(f);
                    } else {
                        warn!(
                            "edge ({}, {}) is shared by more than two triangles; \
                             keeping faces {} and {}, dropping {}",
                            key.0,
                            key.1,
                            f0,
                            f1.unwrap(),
                            f
                        );
                    }
                }
            }
        }
    }

    // BTreeMap iterates keys in ascending order, which fixes the edge indices.
    let mut edges = Vec::with_capacity(map.len());
    let mut edge_faces = Vec::with_capacity(map.len());
    for (edge, faces) in map {
        edges.push(edge);
        edge_faces.push(faces);
    }

    EdgeTable { edges, edge_faces }
}
