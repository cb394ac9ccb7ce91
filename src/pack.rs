//! Packing of UV islands into the unit square.
//!
//! Each island's axis-aligned bounding box is padded by a margin, the boxes
//! are shelf-packed in order of decreasing height, and the whole layout is
//! scaled down uniformly when it spills outside [0, 1]². The procedure is
//! fully deterministic: height ties are broken by island id.

use nalgebra::Point2;

use crate::island::IslandMap;

/// Default spacing between packed islands.
pub const DEFAULT_MARGIN: f64 = 0.02;

#[derive(Debug, Clone, Copy)]
struct IslandBox {
    min_u: f64,
    min_v: f64,
    width: f64,
    height: f64,
    target_x: f64,
    target_y: f64,
}

/// Pack island UVs into the unit square.
///
/// `uvs` is the global per-vertex UV buffer with every island already
/// normalized to [0, 1]² on its own. A vertex shared between islands moves
/// with the highest-id island containing it, mirroring the order in which
/// island charts were written into the buffer. A single island is left
/// untouched; it already fills the unit square.
pub fn pack_islands(
    uvs: &mut [Point2<f64>],
    triangles: &[[usize; 3]],
    islands: &IslandMap,
    margin: f64,
) {
    let num_islands = islands.num_islands();
    if num_islands <= 1 {
        return;
    }

    // Owner of each vertex: last island (in id order) that references it.
    let mut vertex_island = vec![usize::MAX; uvs.len()];
    for id in 0..num_islands {
        for &f in islands.faces(id) {
            for &v in &triangles[f] {
                vertex_island[v] = id;
            }
        }
    }

    // Padded bounding boxes, floored at the margin.
    let mut boxes = vec![
        IslandBox {
            min_u: f64::MAX,
            min_v: f64::MAX,
            width: 0.0,
            height: 0.0,
            target_x: 0.0,
            target_y: 0.0,
        };
        num_islands
    ];
    let mut max_u = vec![f64::MIN; num_islands];
    let mut max_v = vec![f64::MIN; num_islands];
    for (v, uv) in uvs.iter().enumerate() {
        let id = vertex_island[v];
        if id == usize::MAX {
            continue;
        }
        boxes[id].min_u = boxes[id].min_u.min(uv.x);
        boxes[id].min_v = boxes[id].min_v.min(uv.y);
        max_u[id] = max_u[id].max(uv.x);
        max_v[id] = max_v[id].max(uv.y);
    }
    for (id, b) in boxes.iter_mut().enumerate() {
        if b.min_u > max_u[id] {
            // Island with no owned vertices; give it an empty placeholder box.
            b.min_u = 0.0;
            b.min_v = 0.0;
            b.width = margin;
            b.height = margin;
        } else {
            b.width = (max_u[id] - b.min_u + margin).max(margin);
            b.height = (max_v[id] - b.min_v + margin).max(margin);
        }
    }

    // Tallest first; ties by island id for determinism.
    let mut order: Vec<usize> = (0..num_islands).collect();
    order.sort_by(|&i, &j| boxes[j].height.total_cmp(&boxes[i].height).then(i.cmp(&j)));

    // Shelf placement against the unit width.
    let mut x = 0.0;
    let mut y = 0.0;
    let mut shelf_height = boxes[order[0]].height;
    let mut used_width: f64 = 0.0;
    for &id in &order {
        let (w, h) = (boxes[id].width, boxes[id].height);
        if x + w > 1.0 && x > 0.0 {
            y += shelf_height;
            shelf_height = h;
            x = 0.0;
        }
        boxes[id].target_x = x;
        boxes[id].target_y = y;
        x += w;
        used_width = used_width.max(x);
    }
    let used_height = y + shelf_height;

    // Translate each island to its shelf position.
    for (v, uv) in uvs.iter_mut().enumerate() {
        let id = vertex_island[v];
        if id == usize::MAX {
            continue;
        }
        uv.x += boxes[id].target_x - boxes[id].min_u;
        uv.y += boxes[id].target_y - boxes[id].min_v;
    }

    // Scale the whole layout back into the unit square when it overflows.
    let extent = used_width.max(used_height);
    if extent > 1.0 {
        for uv in uvs.iter_mut() {
            uv.x /= extent;
            uv.y /= extent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TriMesh;
    use crate::seam::{select_seams, SeamOptions};
    use crate::topology::build_topology;
    use nalgebra::Point3;

    /// Two disjoint triangles with island UVs written as if each chart had
    /// been normalized and scaled to the given extents.
    fn two_triangle_setup(
        extent0: (f64, f64),
        extent1: (f64, f64),
    ) -> (TriMesh, IslandMap, Vec<Point2<f64>>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(11.0, 0.0, 0.0),
            Point3::new(10.5, 1.0, 0.0),
        ];
        let mesh = TriMesh::from_parts(vertices, vec![[0, 1, 2], [3, 4, 5]]).unwrap();
        let topo = build_topology(&mesh);
        let seams = select_seams(&mesh, &topo, &SeamOptions::default());
        let islands = crate::island::extract_islands(&topo, &seams, mesh.num_triangles());
        assert_eq!(islands.num_islands(), 2);

        let uvs = vec![
            Point2::new(0.0, 0.0),
            Point2::new(extent0.0, 0.0),
            Point2::new(extent0.0 / 2.0, extent0.1),
            Point2::new(0.0, 0.0),
            Point2::new(extent1.0, 0.0),
            Point2::new(extent1.0 / 2.0, extent1.1),
        ];
        (mesh, islands, uvs)
    }

    fn island_bounds(uvs: &[Point2<f64>], verts: &[usize]) -> (f64, f64, f64, f64) {
        let mut min_u = f64::MAX;
        let mut min_v = f64::MAX;
        let mut max_u = f64::MIN;
        let mut max_v = f64::MIN;
        for &v in verts {
            min_u = min_u.min(uvs[v].x);
            min_v = min_v.min(uvs[v].y);
            max_u = max_u.max(uvs[v].x);
            max_v = max_v.max(uvs[v].y);
        }
        (min_u, min_v, max_u, max_v)
    }

    #[test]
    fn test_single_island_untouched() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mesh = TriMesh::from_parts(vertices, vec![[0, 1, 2]]).unwrap();
        let topo = build_topology(&mesh);
        let seams = select_seams(&mesh, &topo, &SeamOptions::default());
        let islands = crate::island::extract_islands(&topo, &seams, 1);

        let mut uvs = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 1.0),
        ];
        let before = uvs.clone();
        pack_islands(&mut uvs, mesh.triangles(), &islands, DEFAULT_MARGIN);
        assert_eq!(uvs, before);
    }

    #[test]
    fn test_two_islands_no_overlap() {
        let (mesh, islands, mut uvs) = two_triangle_setup((1.0, 1.0), (1.0, 1.0));
        pack_islands(&mut uvs, mesh.triangles(), &islands, DEFAULT_MARGIN);

        // Everything stays inside the unit square.
        for uv in &uvs {
            assert!(uv.x >= -1e-9 && uv.x <= 1.0 + 1e-9, "u = {}", uv.x);
            assert!(uv.y >= -1e-9 && uv.y <= 1.0 + 1e-9, "v = {}", uv.y);
        }

        // The two island boxes have disjoint interiors.
        let (a0, b0, c0, d0) = island_bounds(&uvs, &[0, 1, 2]);
        let (a1, b1, c1, d1) = island_bounds(&uvs, &[3, 4, 5]);
        let overlap_u = c0.min(c1) - a0.max(a1);
        let overlap_v = d0.min(d1) - b0.max(b1);
        assert!(
            overlap_u <= 1e-6 || overlap_v <= 1e-6,
            "boxes overlap: {} x {}",
            overlap_u,
            overlap_v
        );
    }

    #[test]
    fn test_taller_island_first() {
        // Extents small enough that no global scaling kicks in.
        let (mesh, islands, mut uvs) = two_triangle_setup((0.3, 0.2), (0.3, 0.4));
        pack_islands(&mut uvs, mesh.triangles(), &islands, DEFAULT_MARGIN);

        // Island 1 is taller, so it is placed first at the origin.
        let (min_u1, min_v1, _, _) = island_bounds(&uvs, &[3, 4, 5]);
        assert!(min_u1.abs() < 1e-12 && min_v1.abs() < 1e-12);

        // Island 0 sits next on the same shelf, margin included in its slot.
        let (min_u0, min_v0, _, _) = island_bounds(&uvs, &[0, 1, 2]);
        assert!((min_u0 - 0.32).abs() < 1e-12);
        assert!(min_v0.abs() < 1e-12);
    }

    #[test]
    fn test_shelf_wrap() {
        // Both islands are too wide to share a shelf.
        let (mesh, islands, mut uvs) = two_triangle_setup((0.9, 0.3), (0.9, 0.3));
        pack_islands(&mut uvs, mesh.triangles(), &islands, DEFAULT_MARGIN);

        let (_, min_v0, _, _) = island_bounds(&uvs, &[0, 1, 2]);
        let (_, min_v1, _, _) = island_bounds(&uvs, &[3, 4, 5]);
        // Equal heights: tie broken by id, island 0 first. Second shelf
        // starts one shelf height (0.32) up.
        assert!(min_v0.abs() < 1e-12);
        assert!((min_v1 - 0.32).abs() < 1e-12);
    }

    #[test]
    fn test_pack_idempotent_when_layout_fits() {
        let (mesh, islands, mut uvs) = two_triangle_setup((0.3, 0.2), (0.3, 0.4));
        pack_islands(&mut uvs, mesh.triangles(), &islands, DEFAULT_MARGIN);
        let packed = uvs.clone();
        pack_islands(&mut uvs, mesh.triangles(), &islands, DEFAULT_MARGIN);

        for (a, b) in uvs.iter().zip(&packed) {
            assert!((a.x - b.x).abs() < 1e-6);
            assert!((a.y - b.y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_determinism() {
        let (mesh, islands, uvs) = two_triangle_setup((1.0, 1.0), (1.0, 1.0));
        let mut a = uvs.clone();
        let mut b = uvs;
        pack_islands(&mut a, mesh.triangles(), &islands, DEFAULT_MARGIN);
        pack_islands(&mut b, mesh.triangles(), &islands, DEFAULT_MARGIN);
        for (ua, ub) in a.iter().zip(&b) {
            assert_eq!(ua.x.to_bits(), ub.x.to_bits());
            assert_eq!(ua.y.to_bits(), ub.y.to_bits());
        }
    }
}
