//! Island extraction: connected components of faces after seam cuts.
//!
//! Two faces belong to the same island when they are connected through
//! interior edges that are not seams. Islands are discovered by flood fill
//! starting from the lowest-index unassigned face, so island ids increase
//! monotonically and are deterministic for identical inputs.

use std::collections::VecDeque;

use crate::seam::SeamSet;
use crate::topology::EdgeTable;

/// Assignment of every face to exactly one island.
#[derive(Debug, Clone)]
pub struct IslandMap {
    face_island_ids: Vec<usize>,
    islands: Vec<Vec<usize>>,
}

impl IslandMap {
    /// Get the number of islands.
    #[inline]
    pub fn num_islands(&self) -> usize {
        self.islands.len()
    }

    /// Get the island id of a face.
    #[inline]
    pub fn island_id(&self, face: usize) -> usize {
        self.face_island_ids[face]
    }

    /// Get the island id of every face.
    #[inline]
    pub fn face_island_ids(&self) -> &[usize] {
        &self.face_island_ids
    }

    /// Get the faces of an island, in ascending face order.
    #[inline]
    pub fn faces(&self, island: usize) -> &[usize] {
        &self.islands[island]
    }
}

/// Extract islands from the face adjacency restricted to non-seam edges.
pub fn extract_islands(topo: &EdgeTable, seams: &SeamSet, num_faces: usize) -> IslandMap {
    // Face adjacency through interior, non-seam edges only.
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); num_faces];
    for e in 0..topo.num_edges() {
        if seams.contains(e) {
            continue;
        }
        if let (f0, Some(f1)) = topo.faces(e) {
            adjacency[f0].push(f1);
            adjacency[f1].push(f0);
        }
    }
    for list in &mut adjacency {
        list.sort_unstable();
    }

    let mut face_island_ids = vec![usize::MAX; num_faces];
    let mut num_islands = 0;
    let mut queue = VecDeque::new();
    for start in 0..num_faces {
        if face_island_ids[start] != usize::MAX {
            continue;
        }
        let id = num_islands;
        num_islands += 1;
        face_island_ids[start] = id;
        queue.push_back(start);
        while let Some(face) = queue.pop_front() {
            for &neighbor in &adjacency[face] {
                if face_island_ids[neighbor] == usize::MAX {
                    face_island_ids[neighbor] = id;
                    queue.push_back(neighbor);
                }
            }
        }
    }

    // Group faces per island in ascending face order.
    let mut islands = vec![Vec::new(); num_islands];
    for (face, &id) in face_island_ids.iter().enumerate() {
        islands[id].push(face);
    }

    IslandMap {
        face_island_ids,
        islands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TriMesh;
    use crate::seam::{select_seams, SeamOptions};
    use crate::topology::build_topology;
    use nalgebra::Point3;

    fn cube() -> TriMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let triangles = vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ];
        TriMesh::from_parts(vertices, triangles).unwrap()
    }

    #[test]
    fn test_connected_mesh_single_island() {
        // Non-tree seams never disconnect the spanning tree, so a connected
        // mesh yields exactly one island.
        let mesh = cube();
        let topo = build_topology(&mesh);
        let seams = select_seams(&mesh, &topo, &SeamOptions::default());
        let islands = extract_islands(&topo, &seams, mesh.num_triangles());

        assert_eq!(islands.num_islands(), 1);
        assert_eq!(islands.faces(0).len(), 12);
        for f in 0..mesh.num_triangles() {
            assert_eq!(islands.island_id(f), 0);
        }
    }

    #[test]
    fn test_disconnected_components() {
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
        let islands = extract_islands(&topo, &seams, mesh.num_triangles());

        assert_eq!(islands.num_islands(), 2);
        assert_eq!(islands.island_id(0), 0);
        assert_eq!(islands.island_id(1), 1);
    }

    #[test]
    fn test_all_seams_isolate_faces() {
        // With every interior edge cut, each face becomes its own island.
        let mesh = cube();
        let topo = build_topology(&mesh);
        let options = SeamOptions {
            refine: true,
            ..Default::default()
        };
        let seams = select_seams(&mesh, &topo, &options);
        assert_eq!(seams.len(), 18);

        let islands = extract_islands(&topo, &seams, mesh.num_triangles());
        assert_eq!(islands.num_islands(), 12);
        for id in 0..12 {
            assert_eq!(islands.faces(id), &[id]);
        }
    }

    #[test]
    fn test_islands_partition_faces() {
        let mesh = cube();
        let topo = build_topology(&mesh);
        let seams = select_seams(&mesh, &topo, &SeamOptions::default());
        let islands = extract_islands(&topo, &seams, mesh.num_triangles());

        let total: usize = (0..islands.num_islands())
            .map(|id| islands.faces(id).len())
            .sum();
        assert_eq!(total, mesh.num_triangles());
        for &id in islands.face_island_ids() {
            assert!(id < islands.num_islands());
        }
    }
}
