//! Least Squares Conformal Maps (LSCM) parameterization.
//!
//! LSCM computes an angle-preserving flattening of a set of triangles by
//! minimizing the conformal energy, the deviation of the per-triangle
//! 3D-to-UV map from a similarity transform. The minimization is expressed
//! as a sparse linear system over the stacked (u, v) unknowns with two
//! pinned vertices removing the translation, rotation and scale freedom.
//!
//! Each island of the mesh is solved independently; the solver operates on a
//! dense local re-indexing of the island's vertices and returns UVs
//! normalized into the unit square.
//!
//! # References
//!
//! - Lévy, B., Petitjean, S., Ray, N., & Maillot, J. (2002). "Least squares
//!   conformal maps for automatic texture atlas generation." ACM SIGGRAPH.

pub mod sparse;

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use nalgebra::{DVector, Point2, Point3, Vector2};

use crate::error::{Result, UnwrapError};
use crate::mesh::TriMesh;

use self::sparse::CsrMatrix;

/// Penalty weight enforcing the two pinned vertices.
const PIN_WEIGHT: f64 = 1e10;

/// Triangles below this area contribute nothing to the system.
const MIN_AREA: f64 = 1e-10;

/// UV ranges below this floor are treated as degenerate when normalizing.
const RANGE_FLOOR: f64 = 1e-6;

/// Options for the LSCM solver.
#[derive(Debug, Clone)]
pub struct LscmOptions {
    /// Maximum iterations for the BiCGSTAB solver.
    pub max_iterations: usize,

    /// Convergence tolerance for the solver.
    pub tolerance: f64,
}

impl Default for LscmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 4000,
            tolerance: 1e-10,
        }
    }
}

impl LscmOptions {
    /// Set the maximum solver iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }
}

/// UV coordinates for one island in local vertex order.
#[derive(Debug, Clone)]
pub struct IslandChart {
    /// Maps local vertex index to the global vertex index.
    pub local_to_global: Vec<usize>,
    /// UV coordinates per local vertex, normalized into the unit square.
    pub uvs: Vec<Point2<f64>>,
}

/// Compute the LSCM parameterization of one island.
///
/// # Arguments
///
/// * `mesh` - The full mesh
/// * `faces` - Face indices forming the island
/// * `options` - Solver options
///
/// # Errors
///
/// Returns [`UnwrapError::DegenerateIsland`] when the island has fewer than
/// three unique vertices, [`UnwrapError::ZeroAreaIsland`] when every triangle
/// has (near) zero area, and [`UnwrapError::ConvergenceFailed`] when the
/// sparse solve does not converge. Callers are expected to fall back to
/// [`planar_projection`] or [`zero_chart`] rather than abort.
pub fn parameterize_island(
    mesh: &TriMesh,
    faces: &[usize],
    options: &LscmOptions,
) -> Result<IslandChart> {
    let (local_to_global, global_to_local) = build_local_index(mesh, faces);
    let n = local_to_global.len();
    if n < 3 {
        return Err(UnwrapError::DegenerateIsland { vertices: n });
    }

    // Assemble the conformal system, one block of triplets per triangle.
    let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
    let mut contributing = 0usize;
    for &f in faces {
        let tri = mesh.triangle(f);
        let locals = [
            global_to_local[&tri[0]],
            global_to_local[&tri[1]],
            global_to_local[&tri[2]],
        ];
        let points = [
            mesh.vertex(tri[0]),
            mesh.vertex(tri[1]),
            mesh.vertex(tri[2]),
        ];
        if add_triangle_terms(&mut triplets, &locals, &points) {
            contributing += 1;
        }
    }
    if contributing == 0 {
        return Err(UnwrapError::ZeroAreaIsland);
    }

    // Pin two vertices to remove the translation/rotation/scale null space:
    // pin A at (0, 0) and pin B at (1, 0) via large diagonal weights.
    let (pin_a, pin_b) = select_pins(mesh, faces, &local_to_global, &global_to_local);
    for &pin in &[pin_a, pin_b] {
        triplets.push((2 * pin, 2 * pin, PIN_WEIGHT));
        triplets.push((2 * pin + 1, 2 * pin + 1, PIN_WEIGHT));
    }
    let mut rhs = DVector::zeros(2 * n);
    rhs[2 * pin_b] = PIN_WEIGHT;

    let matrix = CsrMatrix::from_triplets(2 * n, 2 * n, triplets);
    let solution = sparse::bicgstab(&matrix, &rhs, options.max_iterations, options.tolerance)?;

    let mut uvs: Vec<Point2<f64>> = (0..n)
        .map(|l| Point2::new(solution[2 * l], solution[2 * l + 1]))
        .collect();
    normalize_unit_square(&mut uvs);

    Ok(IslandChart {
        local_to_global,
        uvs,
    })
}

/// Project an island onto the input xy plane and normalize.
///
/// This is the fallback used when the conformal solve fails; it always
/// produces UVs in the unit square.
pub fn planar_projection(mesh: &TriMesh, faces: &[usize]) -> IslandChart {
    let (local_to_global, _) = build_local_index(mesh, faces);
    let mut uvs: Vec<Point2<f64>> = local_to_global
        .iter()
        .map(|&g| {
            let p = mesh.vertex(g);
            Point2::new(p.x, p.y)
        })
        .collect();
    normalize_unit_square(&mut uvs);

    IslandChart {
        local_to_global,
        uvs,
    }
}

/// Assign (0, 0) to every vertex of an island.
///
/// Used for islands too degenerate to carry any parameterization.
pub fn zero_chart(mesh: &TriMesh, faces: &[usize]) -> IslandChart {
    let (local_to_global, _) = build_local_index(mesh, faces);
    let uvs = vec![Point2::origin(); local_to_global.len()];
    IslandChart {
        local_to_global,
        uvs,
    }
}

/// Build the dense local vertex indexing of an island.
///
/// Vertices are numbered in first-encounter order while walking the faces,
/// which is deterministic for a given face list.
fn build_local_index(mesh: &TriMesh, faces: &[usize]) -> (Vec<usize>, HashMap<usize, usize>) {
    let mut local_to_global = Vec::new();
    let mut global_to_local = HashMap::new();
    for &f in faces {
        for &g in &mesh.triangle(f) {
            if let Entry::Vacant(slot) = global_to_local.entry(g) {
                slot.insert(local_to_global.len());
                local_to_global.push(g);
            }
        }
    }
    (local_to_global, global_to_local)
}

/// Add one triangle's conformal energy terms to the triplet list.
///
/// The triangle is embedded into its own plane with an orthonormal basis;
/// each directed edge (a -> b) with local delta (dx, dy) then couples the
/// (u, v) unknowns of a and b through the rotation-like block scaled by the
/// triangle area, with self terms on a negating the contribution.
///
/// Returns false when the triangle is skipped for having (near) zero area.
fn add_triangle_terms(
    triplets: &mut Vec<(usize, usize, f64)>,
    locals: &[usize; 3],
    points: &[Point3<f64>; 3],
) -> bool {
    let e1 = points[1] - points[0];
    let e2 = points[2] - points[0];

    let cross = e1.cross(&e2);
    if 0.5 * cross.norm() < MIN_AREA {
        return false;
    }

    let normal = cross.normalize();
    let u_axis = e1.normalize();
    let v_axis = normal.cross(&u_axis);

    let q = [
        Point2::new(0.0, 0.0),
        Point2::new(e1.dot(&u_axis), 0.0),
        Point2::new(e2.dot(&u_axis), e2.dot(&v_axis)),
    ];
    let area = 0.5 * (q[1].x * q[2].y - q[1].y * q[2].x).abs();
    if area < MIN_AREA {
        return false;
    }

    for k in 0..3 {
        let la = locals[k];
        let lb = locals[(k + 1) % 3];
        let d: Vector2<f64> = q[(k + 1) % 3] - q[k];
        let (dx, dy) = (d.x, d.y);

        triplets.push((2 * la, 2 * lb, area * dx));
        triplets.push((2 * la, 2 * lb + 1, area * dy));
        triplets.push((2 * la + 1, 2 * lb, area * dy));
        triplets.push((2 * la + 1, 2 * lb + 1, -area * dx));

        triplets.push((2 * la, 2 * la, -area * dx));
        triplets.push((2 * la, 2 * la + 1, -area * dy));
        triplets.push((2 * la + 1, 2 * la, -area * dy));
        triplets.push((2 * la + 1, 2 * la + 1, area * dx));
    }

    true
}

/// Choose the two vertices to pin.
///
/// Preferred are the two island-boundary vertices farthest apart in 3D; a
/// closed island has no boundary, in which case the farthest pair over all
/// island vertices is used. Candidate lists are sorted, so ties resolve
/// deterministically.
fn select_pins(
    mesh: &TriMesh,
    faces: &[usize],
    local_to_global: &[usize],
    global_to_local: &HashMap<usize, usize>,
) -> (usize, usize) {
    let boundary = boundary_vertices(mesh, faces);
    let candidates: Vec<usize> = if boundary.len() >= 2 {
        boundary
    } else {
        let mut all = local_to_global.to_vec();
        all.sort_unstable();
        all
    };

    let mut best = (candidates[0], candidates[1]);
    let mut best_dist = -1.0;
    for (i, &a) in candidates.iter().enumerate() {
        for &b in candidates.iter().skip(i + 1) {
            let dist = (mesh.vertex(b) - mesh.vertex(a)).norm_squared();
            if dist > best_dist {
                best_dist = dist;
                best = (a, b);
            }
        }
    }

    (global_to_local[&best.0], global_to_local[&best.1])
}

/// Find the boundary vertices of an island, sorted ascending.
///
/// An island-boundary edge is one referenced by exactly one of the island's
/// faces; this covers both mesh boundary edges and seam edges.
fn boundary_vertices(mesh: &TriMesh, faces: &[usize]) -> Vec<usize> {
    let mut edge_count: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for &f in faces {
        let tri = mesh.triangle(f);
        for k in 0..3 {
            let a = tri[k];
            let b = tri[(k + 1) % 3];
            let key = if a < b { (a, b) } else { (b, a) };
            *edge_count.entry(key).or_insert(0) += 1;
        }
    }

    let mut boundary = BTreeSet::new();
    for ((a, b), count) in edge_count {
        if count == 1 {
            boundary.insert(a);
            boundary.insert(b);
        }
    }
    boundary.into_iter().collect()
}

/// Rescale UVs into the unit square using per-axis ranges.
///
/// Axes with a range below [`RANGE_FLOOR`] are left unscaled (divided by
/// 1.0) so degenerate islands cannot produce infinities.
pub(crate) fn normalize_unit_square(uvs: &mut [Point2<f64>]) {
    if uvs.is_empty() {
        return;
    }

    let mut min_u = f64::MAX;
    let mut max_u = f64::MIN;
    let mut min_v = f64::MAX;
    let mut max_v = f64::MIN;
    for uv in uvs.iter() {
        min_u = min_u.min(uv.x);
        max_u = max_u.max(uv.x);
        min_v = min_v.min(uv.y);
        max_v = max_v.max(uv.y);
    }

    let mut u_range = max_u - min_u;
    let mut v_range = max_v - min_v;
    if u_range < RANGE_FLOOR {
        u_range = 1.0;
    }
    if v_range < RANGE_FLOOR {
        v_range = 1.0;
    }

    for uv in uvs.iter_mut() {
        uv.x = (uv.x - min_u) / u_range;
        uv.y = (uv.y - min_v) / v_range;
    }
}
