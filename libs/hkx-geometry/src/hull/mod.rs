//! # Hull Refinement
//!
//! Shape kinds stored as a convex point cloud (see
//! [`config::constants::HULL_SHAPE_KINDS`]) arrive without faces. Their
//! topology is derived here with QuickHull; every other kind passes through
//! untouched.
//!
//! ## Algorithm Overview
//!
//! 1. Find extreme points to form initial simplex (tetrahedron)
//! 2. For each face, find the farthest point outside
//! 3. Create new faces from that point to the horizon edges
//! 4. Repeat until no points remain outside

mod quickhull;


pub use quickhull::convex_hull;

use crate::mesh::MeshBuffer;
use config::constants::is_hull_kind;

/// Replaces the topology of hull-kind shapes with their convex hull.
///
/// For any other `shape_name` the buffer is returned unchanged. Hull
/// vertices keep their exact positions; interior points are dropped.
///
/// A point cloud with no 3-D hull (fewer than four points, or all of them
/// coplanar) keeps its reconstructed topology and a warning is logged.
///
/// # Example
///
/// ```rust
/// use hkx_geometry::{refine, MeshBuffer};
///
/// let mesh = MeshBuffer::new();
/// assert_eq!(refine(mesh.clone(), "hkpBvCompressedMeshShape"), mesh);
/// ```
pub fn refine(buffer: MeshBuffer, shape_name: &str) -> MeshBuffer {
    if !is_hull_kind(shape_name) {
        return buffer;
    }

    match convex_hull(buffer.positions()) {
        Ok(hull) => {
            log::debug!(
                "{shape_name}: hull of {} points has {} vertices, {} faces",
                buffer.vertex_count(),
                hull.vertex_count(),
                hull.face_count()
            );
            hull
        }
        Err(err) => {
            log::warn!("{shape_name}: keeping reconstructed topology, {err}");
            buffer
        }
    }
}
