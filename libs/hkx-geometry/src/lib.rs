//! # HKX Geometry
//!
//! Geometry side of the collision import pipeline: the typed record the
//! converter emits, the mesh buffer handed to the host, and the two pure
//! transformations between them.
//!
//! ## Architecture
//!
//! ```text
//! GeometryRecord → reconstruct::build (axis remap) → MeshBuffer
//!     → hull::refine → MeshBuffer
//! ```
//!
//! Both stages are deterministic and free of shared state, so they run on
//! whichever worker thread decoded the record.
//!
//! ## Usage
//!
//! ```rust
//! use hkx_geometry::{build, refine, GeometryRecord, Vertex};
//!
//! let corners: Vec<Vertex> = [0.0, 1.0]
//!     .iter()
//!     .flat_map(|&x| [0.0, 1.0].into_iter().map(move |y| (x, y)))
//!     .flat_map(|(x, y)| [0.0, 1.0].into_iter().map(move |z| Vertex::new(x, y, z)))
//!     .collect();
//! let record = GeometryRecord::new("hkpBoxShape", corners, vec![], vec![]);
//!
//! let mesh = refine(build(&record)?, &record.shape_name);
//! assert_eq!(mesh.vertex_count(), 8);
//! assert_eq!(mesh.face_count(), 12);
//! # Ok::<(), hkx_geometry::GeometryError>(())
//! ```

pub mod error;
pub mod hull;
pub mod mesh;
pub mod reconstruct;
pub mod record;

pub use error::GeometryError;
pub use hull::{convex_hull, refine};
pub use mesh::MeshBuffer;
pub use reconstruct::{build, inverse_remap_axes, remap_axes};
pub use record::{GeometryRecord, Vertex};
