//! Wavefront OBJ format support.
//!
//! Loads and saves triangle meshes with optional per-vertex UV coordinates.
//! Vertex and texture indices in `f` records are 1-based; a face with an
//! out-of-range index is skipped with a per-face diagnostic. UVs are stored
//! per vertex, so a file whose `vt` count differs from its `v` count gets a
//! warning and the UVs are discarded.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::warn;
use nalgebra::{Point2, Point3};

use crate::error::{Result, UnwrapError};
use crate::mesh::TriMesh;

/// Load a mesh from an OBJ file.
///
/// Polygonal faces are fan-triangulated. Faces with out-of-range or repeated
/// vertex indices are skipped with a warning naming the offending face.
///
/// # Example
///
/// ```no_run
/// use peel::io::obj;
///
/// let mesh = obj::load("model.obj").unwrap();
/// println!("{} vertices", mesh.num_vertices());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriMesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut tex_coords: Vec<Point2<f32>> = Vec::new();
    let mut triangles: Vec<[usize; 3]> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                if let Some(p) = parse_floats3(&mut tokens) {
                    positions.push(Point3::new(p[0], p[1], p[2]));
                } else {
                    warn!("{}:{}: malformed vertex line", path.display(), line_no + 1);
                }
            }
            Some("vt") => {
                if let Some(uv) = parse_floats2(&mut tokens) {
                    tex_coords.push(Point2::new(uv[0] as f32, uv[1] as f32));
                } else {
                    warn!(
                        "{}:{}: malformed texture coordinate line",
                        path.display(),
                        line_no + 1
                    );
                }
            }
            Some("f") => {
                let mut corners: Vec<usize> = Vec::new();
                let mut valid = true;
                for token in tokens {
                    match parse_face_corner(token, positions.len(), tex_coords.len()) {
                        Some(v) => corners.push(v),
                        None => {
                            warn!(
                                "{}:{}: face references an out-of-range index ({}); \
                                 skipping face",
                                path.display(),
                                line_no + 1,
                                token
                            );
                            valid = false;
                            break;
                        }
                    }
                }
                if !valid || corners.len() < 3 {
                    continue;
                }
                // Fan triangulation for polygons.
                for i in 1..corners.len() - 1 {
                    let tri = [corners[0], corners[i], corners[i + 1]];
                    if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                        warn!(
                            "{}:{}: face repeats a vertex index; skipping triangle",
                            path.display(),
                            line_no + 1
                        );
                        continue;
                    }
                    triangles.push(tri);
                }
            }
            _ => {}
        }
    }

    if positions.is_empty() || triangles.is_empty() {
        return Err(UnwrapError::LoadError {
            path: path.to_path_buf(),
            message: "no usable vertices or faces".to_string(),
        });
    }

    let uvs = if tex_coords.is_empty() {
        None
    } else if tex_coords.len() != positions.len() {
        warn!(
            "{}: {} texture coordinates for {} vertices; UVs discarded",
            path.display(),
            tex_coords.len(),
            positions.len()
        );
        None
    } else {
        Some(tex_coords)
    };

    let mut mesh = TriMesh::from_parts(positions, triangles)?;
    if let Some(uvs) = uvs {
        mesh.set_uvs(uvs)?;
    }
    Ok(mesh)
}

/// Save a mesh to an OBJ file.
///
/// When the mesh carries UVs, `vt` records are written and faces reference
/// them (`f a/a b/b c/c`); otherwise plain `f a b c` records are produced.
pub fn save<P: AsRef<Path>>(mesh: &TriMesh, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "# Generated by peel")?;
    for p in mesh.vertices() {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    if let Some(uvs) = mesh.uvs() {
        for uv in uvs {
            writeln!(writer, "vt {} {}", uv.x, uv.y)?;
        }
    }
    for tri in mesh.triangles() {
        let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        if mesh.uvs().is_some() {
            writeln!(writer, "f {}/{} {}/{} {}/{}", a, a, b, b, c, c)?;
        } else {
            writeln!(writer, "f {} {} {}", a, b, c)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Parse one `f` corner token (`a`, `a/t`, `a//n`, or `a/t/n`).
///
/// Returns the zero-based vertex index, or `None` when the vertex or texture
/// index is malformed or out of range.
fn parse_face_corner(token: &str, num_vertices: usize, num_tex: usize) -> Option<usize> {
    let mut parts = token.split('/');
    let v: usize = parts.next()?.parse().ok()?;
    if v < 1 || v > num_vertices {
        return None;
    }
    // Validate the texture index when present; it is not stored per corner.
    if let Some(t) = parts.next() {
        if !t.is_empty() {
            let t: usize = t.parse().ok()?;
            if t < 1 || t > num_tex {
                return None;
            }
        }
    }
    Some(v - 1)
}

fn parse_floats3(tokens: &mut dyn Iterator<Item = &str>) -> Option<[f64; 3]> {
    let x = tokens.next()?.parse().ok()?;
    let y = tokens.next()?.parse().ok()?;
    let z = tokens.next()?.parse().ok()?;
    Some([x, y, z])
}

fn parse_floats2(tokens: &mut dyn Iterator<Item = &str>) -> Option<[f64; 2]> {
    let u = tokens.next()?.parse().ok()?;
    let v = tokens.next()?.parse().ok()?;
    Some([u, v])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_plain_faces() {
        let path = write_temp(
            "peel_obj_plain.obj",
            "v 0 0 0\nv 1 0 0\nv 0.5 1 0\nf 1 2 3\n",
        );
        let mesh = load(&path).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(mesh.triangle(0), [0, 1, 2]);
        assert!(mesh.uvs().is_none());
    }

    #[test]
    fn test_load_with_uvs() {
        let path = write_temp(
            "peel_obj_uvs.obj",
            "v 0 0 0\nv 1 0 0\nv 0.5 1 0\n\
             vt 0 0\nvt 1 0\nvt 0.5 1\n\
             f 1/1 2/2 3/3\n",
        );
        let mesh = load(&path).unwrap();
        let uvs = mesh.uvs().unwrap();
        assert_eq!(uvs.len(), 3);
        assert_eq!(uvs[2], Point2::new(0.5, 1.0));
    }

    #[test]
    fn test_load_uv_count_mismatch_discards() {
        let path = write_temp(
            "peel_obj_mismatch.obj",
            "v 0 0 0\nv 1 0 0\nv 0.5 1 0\nvt 0 0\nf 1/1 2/1 3/1\n",
        );
        let mesh = load(&path).unwrap();
        assert!(mesh.uvs().is_none());
    }

    #[test]
    fn test_load_skips_out_of_range_face() {
        let path = write_temp(
            "peel_obj_range.obj",
            "v 0 0 0\nv 1 0 0\nv 0.5 1 0\nv 0.5 -1 0\nf 1 2 9\nf 1 2 4\n",
        );
        let mesh = load(&path).unwrap();
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(mesh.triangle(0), [0, 1, 3]);
    }

    #[test]
    fn test_load_fan_triangulates_quads() {
        let path = write_temp(
            "peel_obj_quad.obj",
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n",
        );
        let mesh = load(&path).unwrap();
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.triangle(0), [0, 1, 2]);
        assert_eq!(mesh.triangle(1), [0, 2, 3]);
    }

    #[test]
    fn test_load_empty_fails() {
        let path = write_temp("peel_obj_empty.obj", "# nothing here\n");
        let result = load(&path);
        assert!(matches!(result, Err(UnwrapError::LoadError { .. })));
    }

    #[test]
    fn test_save_round_trip() {
        let mut mesh = TriMesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();
        mesh.set_uvs(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 1.0),
        ])
        .unwrap();

        let path = std::env::temp_dir().join("peel_obj_roundtrip.obj");
        save(&mesh, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.num_vertices(), 3);
        assert_eq!(loaded.num_triangles(), 1);
        let uvs = loaded.uvs().unwrap();
        assert!((uvs[1].x - 1.0).abs() < 1e-6);
        assert!((uvs[2].y - 1.0).abs() < 1e-6);
    }
}
