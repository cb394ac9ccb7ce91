//! The unwrapping pipeline orchestrator.
//!
//! [`unwrap_mesh`] runs the full pipeline: topology extraction, seam
//! selection, island extraction, per-island LSCM, island packing, and
//! quality metrics. Per-island failures never abort the pipeline; the island
//! falls back to a planar projection (solver failure) or zero UVs
//! (degenerate geometry) and a warning is logged with the island id.
//!
//! The pipeline is a pure function of its inputs. Islands may be solved in
//! parallel, but results are written back in island-id order, so output is
//! identical to the sequential path.

use log::{debug, info, warn};
use nalgebra::Point2;
use rayon::prelude::*;

use crate::error::{Result, UnwrapError};
use crate::island::{extract_islands, IslandMap};
use crate::lscm::{self, IslandChart, LscmOptions};
use crate::mesh::TriMesh;
use crate::metrics;
use crate::pack;
use crate::seam::{select_seams, SeamOptions, DEFAULT_ANGLE_THRESHOLD_DEG};
use crate::topology::build_topology;

/// Options for [`unwrap_mesh`].
#[derive(Debug, Clone)]
pub struct UnwrapOptions {
    /// Angular defect threshold in degrees, used by seam refinement.
    pub angle_threshold: f64,

    /// Promote extra seams near high-curvature vertices. Changes seam and
    /// island counts; disabled by default.
    pub refine_seams: bool,

    /// Islands with fewer faces skip the LSCM solve and receive
    /// planar-projection UVs.
    pub min_island_faces: usize,

    /// Pack islands into the unit square after solving.
    pub pack_islands: bool,

    /// Spacing between packed islands, in [0, 0.1).
    pub island_margin: f64,

    /// Solve islands in parallel. Output is identical either way.
    pub parallel: bool,

    /// Options forwarded to the per-island LSCM solver.
    pub solver: LscmOptions,
}

impl Default for UnwrapOptions {
    fn default() -> Self {
        Self {
            angle_threshold: DEFAULT_ANGLE_THRESHOLD_DEG,
            refine_seams: false,
            min_island_faces: 1,
            pack_islands: true,
            island_margin: pack::DEFAULT_MARGIN,
            parallel: true,
            solver: LscmOptions::default(),
        }
    }
}

impl UnwrapOptions {
    /// Set the angular defect threshold in degrees.
    pub fn with_angle_threshold(mut self, degrees: f64) -> Self {
        self.angle_threshold = degrees;
        self
    }

    /// Enable or disable seam refinement.
    pub fn with_refine_seams(mut self, refine: bool) -> Self {
        self.refine_seams = refine;
        self
    }

    /// Set the minimum island size for an LSCM solve.
    pub fn with_min_island_faces(mut self, faces: usize) -> Self {
        self.min_island_faces = faces;
        self
    }

    /// Enable or disable island packing.
    pub fn with_pack_islands(mut self, pack: bool) -> Self {
        self.pack_islands = pack;
        self
    }

    /// Set the packing margin.
    pub fn with_island_margin(mut self, margin: f64) -> Self {
        self.island_margin = margin;
        self
    }

    /// Enable or disable parallel island solves.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..0.1).contains(&self.island_margin) {
            return Err(UnwrapError::invalid_param(
                "island_margin",
                self.island_margin,
                "must be in [0, 0.1)",
            ));
        }
        if self.min_island_faces < 1 {
            return Err(UnwrapError::invalid_param(
                "min_island_faces",
                self.min_island_faces,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Result of unwrapping a mesh.
#[derive(Debug, Clone)]
pub struct UnwrapResult {
    /// Per-vertex UV coordinates in the unit square.
    pub uvs: Vec<Point2<f32>>,
    /// Number of UV islands.
    pub num_islands: usize,
    /// Island id of every face.
    pub face_island_ids: Vec<usize>,
    /// Mean per-triangle stretch (1.0 = conformal everywhere).
    pub avg_stretch: f32,
    /// Maximum per-triangle stretch.
    pub max_stretch: f32,
    /// Fraction of the unit square covered by UV triangles.
    pub coverage: f32,
}

/// Compute an automatic UV parameterization for a mesh.
///
/// The mesh itself was validated at construction; only the options can be
/// rejected here. Per-island solver failures are downgraded to warnings and
/// handled with documented fallbacks, so once the pipeline starts it always
/// produces a result.
///
/// # Example
///
/// ```
/// use peel::prelude::*;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let mesh = TriMesh::from_parts(vertices, vec![[0, 1, 2]]).unwrap();
///
/// let result = unwrap_mesh(&mesh, &UnwrapOptions::default()).unwrap();
/// assert_eq!(result.num_islands, 1);
/// assert_eq!(result.uvs.len(), 3);
/// ```
pub fn unwrap_mesh(mesh: &TriMesh, options: &UnwrapOptions) -> Result<UnwrapResult> {
    options.validate()?;

    let topo = build_topology(mesh);
    let chi = topo.euler_characteristic(mesh.num_vertices(), mesh.num_triangles());
    if topo.is_closed() && chi != 2 {
        warn!("closed mesh has Euler characteristic {}, expected 2", chi);
    } else {
        debug!(
            "topology: V={} E={} F={} chi={}",
            mesh.num_vertices(),
            topo.num_edges(),
            mesh.num_triangles(),
            chi
        );
    }

    let seam_options = SeamOptions {
        refine: options.refine_seams,
        defect_threshold: options.angle_threshold.to_radians(),
    };
    let seams = select_seams(mesh, &topo, &seam_options);
    debug!("selected {} seam edges", seams.len());

    let islands = extract_islands(&topo, &seams, mesh.num_triangles());
    info!("extracted {} islands", islands.num_islands());

    let charts = solve_islands(mesh, &islands, options);

    // Write charts back in island-id order; on shared seam vertices the
    // highest island id wins, which is what the packer assumes.
    let mut uvs = vec![Point2::new(0.0f64, 0.0); mesh.num_vertices()];
    for chart in &charts {
        for (l, &g) in chart.local_to_global.iter().enumerate() {
            uvs[g] = chart.uvs[l];
        }
    }

    if options.pack_islands {
        pack::pack_islands(&mut uvs, mesh.triangles(), &islands, options.island_margin);
    }

    let quality = metrics::compute_metrics(mesh, &uvs);

    Ok(UnwrapResult {
        uvs: uvs
            .iter()
            .map(|uv| Point2::new(uv.x as f32, uv.y as f32))
            .collect(),
        num_islands: islands.num_islands(),
        face_island_ids: islands.face_island_ids().to_vec(),
        avg_stretch: quality.avg_stretch,
        max_stretch: quality.max_stretch,
        coverage: quality.coverage,
    })
}

/// Solve every island, applying the documented fallbacks on failure.
fn solve_islands(mesh: &TriMesh, islands: &IslandMap, options: &UnwrapOptions) -> Vec<IslandChart> {
    let solve_one = |id: usize| -> IslandChart {
        let faces = islands.faces(id);
        if faces.len() < options.min_island_faces {
            debug!(
                "island {}: {} faces below minimum {}, using planar projection",
                id,
                faces.len(),
                options.min_island_faces
            );
            return lscm::planar_projection(mesh, faces);
        }
        match lscm::parameterize_island(mesh, faces, &options.solver) {
            Ok(chart) => chart,
            Err(err @ (UnwrapError::DegenerateIsland { .. } | UnwrapError::ZeroAreaIsland)) => {
                warn!("island {}: {}; assigning zero UVs", id, err);
                lscm::zero_chart(mesh, faces)
            }
            Err(err) => {
                warn!("island {}: {}; falling back to planar projection", id, err);
                lscm::planar_projection(mesh, faces)
            }
        }
    };

    if options.parallel {
        (0..islands.num_islands())
            .into_par_iter()
            .map(solve_one)
            .collect()
    } else {
        (0..islands.num_islands()).map(solve_one).collect()
    }
}
