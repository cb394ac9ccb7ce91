//! Seam selection over the face-dual graph.
//!
//! The dual graph has one node per face and one edge per interior mesh edge.
//! A BFS spanning forest is grown over it; every interior edge left out of
//! the forest becomes a seam. Cutting along the non-tree edges is what makes
//! each surface component disk-like enough for a two-pin conformal solve.
//!
//! Determinism: dual adjacency lists are sorted by neighbor face id, the BFS
//! uses a FIFO queue, and the forest is restarted from the lowest-index
//! unvisited face, so identical inputs always produce identical seam sets.
//!
//! An optional refinement promotes additional interior edges to seams near
//! vertices with large angular defect (sharp features). It is disabled by
//! default; enabling it changes seam counts and therefore island counts.

use std::collections::VecDeque;
use std::f64::consts::PI;

use nalgebra::Point3;

use crate::mesh::TriMesh;
use crate::topology::EdgeTable;

/// Default angular defect threshold for seam refinement, in degrees.
pub const DEFAULT_ANGLE_THRESHOLD_DEG: f64 = 30.0;

/// Options controlling seam selection.
#[derive(Debug, Clone)]
pub struct SeamOptions {
    /// Promote interior edges near high-defect vertices to seams.
    pub refine: bool,
    /// Angular defect threshold in radians; only used when `refine` is set.
    pub defect_threshold: f64,
}

impl Default for SeamOptions {
    fn default() -> Self {
        Self {
            refine: false,
            defect_threshold: DEFAULT_ANGLE_THRESHOLD_DEG.to_radians(),
        }
    }
}

/// The set of mesh edges designated as seams.
///
/// Seams are always a subset of the interior (two-face) edges.
#[derive(Debug, Clone)]
pub struct SeamSet {
    mask: Vec<bool>,
    count: usize,
}

impl SeamSet {
    /// Check whether an edge is a seam.
    #[inline]
    pub fn contains(&self, e: usize) -> bool {
        self.mask[e]
    }

    /// Get the number of seam edges.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if there are no seams.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterate over seam edge indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(e, &s)| if s { Some(e) } else { None })
    }
}

/// Select seam edges for a mesh.
///
/// Grows a BFS spanning forest over the face-dual graph and marks every
/// interior edge outside the forest as a seam. With `options.refine` set,
/// interior edges incident to a vertex whose angular defect exceeds the
/// threshold are promoted to seams as well, which may split islands along
/// sharp features.
pub fn select_seams(mesh: &TriMesh, topo: &EdgeTable, options: &SeamOptions) -> SeamSet {
    let num_faces = mesh.num_triangles();
    let num_edges = topo.num_edges();

    // Dual adjacency: (neighbor face, connecting edge), sorted by neighbor.
    let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); num_faces];
    for e in 0..num_edges {
        if let (f0, Some(f1)) = topo.faces(e) {
            adjacency[f0].push((f1, e));
            adjacency[f1].push((f0, e));
        }
    }
    for list in &mut adjacency {
        list.sort_unstable();
    }

    // BFS spanning forest, restarted from the lowest-index unvisited face.
    let mut visited = vec![false; num_faces];
    let mut in_tree = vec![false; num_edges];
    let mut queue = VecDeque::new();
    for start in 0..num_faces {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);
        while let Some(face) = queue.pop_front() {
            for &(neighbor, edge) in &adjacency[face] {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    in_tree[edge] = true;
                    queue.push_back(neighbor);
                }
            }
        }
    }

    let mut mask = vec![false; num_edges];
    for e in 0..num_edges {
        if !topo.is_boundary(e) && !in_tree[e] {
            mask[e] = true;
        }
    }

    if options.refine {
        let defects = angular_defects(mesh);
        for e in 0..num_edges {
            if topo.is_boundary(e) || mask[e] {
                continue;
            }
            let (a, b) = topo.edge(e);
            if defects[a].abs() > options.defect_threshold
                || defects[b].abs() > options.defect_threshold
            {
                mask[e] = true;
            }
        }
    }

    let count = mask.iter().filter(|&&s| s).count();
    SeamSet { mask, count }
}

/// Compute the angular defect at every vertex.
///
/// The defect at a vertex is 2π minus the sum of the incident triangle
/// angles: positive at convex corners, near zero on flat regions, negative
/// at saddles. Boundary vertices read as high-defect because their angle sum
/// falls short of a full turn.
pub fn angular_defects(mesh: &TriMesh) -> Vec<f64> {
    let mut angle_sums = vec![0.0; mesh.num_vertices()];
    for tri in mesh.triangles() {
        let p = [mesh.vertex(tri[0]), mesh.vertex(tri[1]), mesh.vertex(tri[2])];
        for k in 0..3 {
            angle_sums[tri[k]] += triangle_angle(&p[k], &p[(k + 1) % 3], &p[(k + 2) % 3]);
        }
    }
    angle_sums.iter().map(|&sum| 2.0 * PI - sum).collect()
}

/// Compute the angle at vertex `a` in triangle (a, b, c).
fn triangle_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let denom = ab.norm() * ac.norm();
    if denom < 1e-20 {
        return 0.0;
    }
    let dot = (ab.dot(&ac) / denom).clamp(-1.0, 1.0);
    dot.acos()
}
