//! Mesh file I/O.
//!
//! The unwrapping core is a pure in-memory transform; file handling lives
//! here, at the edge of the crate. Wavefront OBJ is the supported format,
//! with optional per-vertex UV coordinates on both load and save.
//!
//! ```no_run
//! use peel::io::obj;
//!
//! let mesh = obj::load("model.obj").unwrap();
//! obj::save(&mesh, "output.obj").unwrap();
//! ```

pub mod obj;
