//! Quality metrics for UV parameterizations.
//!
//! Two metrics are reported: per-triangle *stretch*, the ratio of the
//! singular values of the 3D-to-UV Jacobian (1.0 means the triangle's map is
//! a similarity), and *coverage*, the fraction of the unit square actually
//! occupied by UV triangles, measured on a rasterization grid.

use nalgebra::{Point2, Vector3};

use crate::mesh::TriMesh;

/// Side length of the boolean coverage grid.
pub const COVERAGE_RESOLUTION: usize = 1024;

/// UV determinants below this are treated as degenerate.
const MIN_DET: f64 = 1e-10;

/// Singular values below this make the stretch ratio meaningless.
const MIN_SIGMA: f64 = 1e-10;

/// Aggregated quality figures for an unwrapped mesh.
#[derive(Debug, Clone, Copy)]
pub struct QualityMetrics {
    /// Mean stretch over non-degenerate triangles, or 1.0 if none.
    pub avg_stretch: f32,
    /// Maximum stretch over non-degenerate triangles, or 1.0 if none.
    pub max_stretch: f32,
    /// Fraction of the unit square covered by UV triangles.
    pub coverage: f32,
}

/// Compute stretch and coverage for a mesh with per-vertex UVs.
pub fn compute_metrics(mesh: &TriMesh, uvs: &[Point2<f64>]) -> QualityMetrics {
    let (avg_stretch, max_stretch) = stretch(mesh, uvs);
    let coverage = coverage(uvs, mesh.triangles(), COVERAGE_RESOLUTION);
    QualityMetrics {
        avg_stretch: avg_stretch as f32,
        max_stretch: max_stretch as f32,
        coverage: coverage as f32,
    }
}

/// Compute (average, maximum) per-triangle stretch.
///
/// For each triangle the 3x2 Jacobian J mapping UV space to 3D is recovered
/// from the edge vectors; its singular value ratio sigma1/sigma2 is the
/// stretch. Triangles that are degenerate in UV space (tiny determinant) or
/// collapsed in 3D (tiny sigma2) are skipped. Both values are at least 1.0.
pub fn stretch(mesh: &TriMesh, uvs: &[Point2<f64>]) -> (f64, f64) {
    let mut sum = 0.0;
    let mut max = 1.0_f64;
    let mut count = 0usize;

    for tri in mesh.triangles() {
        let p0 = mesh.vertex(tri[0]);
        let p1 = mesh.vertex(tri[1]);
        let p2 = mesh.vertex(tri[2]);
        let dp1 = p1 - p0;
        let dp2 = p2 - p0;

        let duv1 = uvs[tri[1]] - uvs[tri[0]];
        let duv2 = uvs[tri[2]] - uvs[tri[0]];
        let det = duv1.x * duv2.y - duv1.y * duv2.x;
        if det.abs() < MIN_DET {
            continue;
        }

        // J = [dp1 dp2] * [duv1 duv2]^-1, written out by column.
        let inv = 1.0 / det;
        let j1: Vector3<f64> = (dp1 * duv2.y - dp2 * duv1.y) * inv;
        let j2: Vector3<f64> = (dp2 * duv1.x - dp1 * duv2.x) * inv;

        // Singular values from the eigenvalues of J^T J (2x2 symmetric).
        let a = j1.dot(&j1);
        let b = j1.dot(&j2);
        let c = j2.dot(&j2);
        let disc = ((a - c) * (a - c) + 4.0 * b * b).sqrt();
        let sigma1 = (0.5 * (a + c + disc)).max(0.0).sqrt();
        let sigma2 = (0.5 * (a + c - disc)).max(0.0).sqrt();
        if sigma2 <= MIN_SIGMA {
            continue;
        }

        let ratio = sigma1 / sigma2;
        sum += ratio;
        max = max.max(ratio);
        count += 1;
    }

    if count == 0 {
        (1.0, 1.0)
    } else {
        (sum / count as f64, max)
    }
}

/// Compute the fraction of the unit square covered by UV triangles.
///
/// Each triangle is rasterized into a `resolution` x `resolution` boolean
/// grid. The point-in-triangle test uses consistent-sign edge functions in
/// integer arithmetic: vertices are snapped to half-pixel units so pixel
/// centers are exactly representable. Triangles reaching outside the unit
/// square are clipped to the grid bounds.
pub fn coverage(uvs: &[Point2<f64>], triangles: &[[usize; 3]], resolution: usize) -> f64 {
    let res = resolution as i64;
    let mut grid = vec![false; resolution * resolution];

    for tri in triangles {
        // Vertex coordinates in half-pixel units.
        let v: Vec<(i64, i64)> = tri
            .iter()
            .map(|&i| {
                (
                    (uvs[i].x * res as f64 * 2.0).round() as i64,
                    (uvs[i].y * res as f64 * 2.0).round() as i64,
                )
            })
            .collect();

        let doubled_area =
            (v[1].0 - v[0].0) * (v[2].1 - v[0].1) - (v[1].1 - v[0].1) * (v[2].0 - v[0].0);
        if doubled_area == 0 {
            continue;
        }

        let min_x = v.iter().map(|p| p.0).min().unwrap();
        let max_x = v.iter().map(|p| p.0).max().unwrap();
        let min_y = v.iter().map(|p| p.1).min().unwrap();
        let max_y = v.iter().map(|p| p.1).max().unwrap();

        let px_lo = (min_x.div_euclid(2)).max(0);
        let px_hi = (max_x.div_euclid(2)).min(res - 1);
        let py_lo = (min_y.div_euclid(2)).max(0);
        let py_hi = (max_y.div_euclid(2)).min(res - 1);

        for py in py_lo..=py_hi {
            let cy = 2 * py + 1;
            for px in px_lo..=px_hi {
                let cx = 2 * px + 1;
                let e0 = edge_function(v[0], v[1], (cx, cy));
                let e1 = edge_function(v[1], v[2], (cx, cy));
                let e2 = edge_function(v[2], v[0], (cx, cy));
                let inside = (e0 >= 0 && e1 >= 0 && e2 >= 0) || (e0 <= 0 && e1 <= 0 && e2 <= 0);
                if inside {
                    grid[(py * res + px) as usize] = true;
                }
            }
        }
    }

    let set = grid.iter().filter(|&&b| b).count();
    set as f64 / (resolution * resolution) as f64
}

/// Signed twice-area of triangle (a, b, p).
#[inline]
fn edge_function(a: (i64, i64), b: (i64, i64), p: (i64, i64)) -> i64 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}
