//! # Mesh Reconstruction
//!
//! Turns a [`GeometryRecord`] into a [`MeshBuffer`] in host axes.
//!
//! The asset format is Y-up; the host is Z-up with the opposite handedness
//! on the depth axis, so every vertex goes through `(x, y, z) -> (x, -z, y)`.

use crate::error::GeometryError;
use crate::mesh::MeshBuffer;
use crate::record::GeometryRecord;
use glam::DVec3;

/// Maps a point from asset axes to host axes.
///
/// # Example
///
/// ```rust
/// use hkx_geometry::{inverse_remap_axes, remap_axes};
/// use glam::DVec3;
///
/// let p = DVec3::new(1.0, 2.0, 3.0);
/// assert_eq!(remap_axes(p), DVec3::new(1.0, -3.0, 2.0));
/// assert_eq!(inverse_remap_axes(remap_axes(p)), p);
/// ```
#[inline]
pub fn remap_axes(p: DVec3) -> DVec3 {
    DVec3::new(p.x, -p.z, p.y)
}

/// Maps a point from host axes back to asset axes.
#[inline]
pub fn inverse_remap_axes(p: DVec3) -> DVec3 {
    DVec3::new(p.x, p.z, -p.y)
}

/// Builds the host mesh for one record.
///
/// Positions are remapped, edges and primitives are copied as-is. An index
/// that does not name a vertex fails the whole record; nothing is dropped.
///
/// # Errors
///
/// [`GeometryError::MalformedRecord`] if any edge or primitive index is out
/// of range.
pub fn build(record: &GeometryRecord) -> Result<MeshBuffer, GeometryError> {
    record.validate()?;

    let mut mesh = MeshBuffer::with_capacity(
        record.vertices.len(),
        record.edges.len(),
        record.primitives.len(),
    );

    for &v in &record.vertices {
        mesh.add_vertex(remap_axes(v.into()));
    }
    for &[a, b] in &record.edges {
        mesh.add_edge(a, b);
    }
    for face in &record.primitives {
        mesh.add_face(face.clone());
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Vertex;

    fn quad_record() -> GeometryRecord {
        GeometryRecord::new(
            "hkpBvCompressedMeshShape",
            vec![
                Vertex::new(0.0, 0.0, 0.0),
                Vertex::new(4.0, 0.0, 0.0),
                Vertex::new(4.0, 0.0, 2.0),
                Vertex::new(0.0, 1.5, 2.0),
            ],
            vec![[0, 2]],
            vec![vec![0, 1, 2, 3]],
        )
    }

    #[test]
    fn test_build_remaps_every_vertex() {
        let record = quad_record();
        let mesh = build(&record).unwrap();
        let expected: Vec<DVec3> = record
            .vertices
            .iter()
            .map(|v| DVec3::new(v.x, -v.z, v.y))
            .collect();
        assert_eq!(mesh.positions(), expected.as_slice());
    }

    #[test]
    fn test_build_copies_topology() {
        let mesh = build(&quad_record()).unwrap();
        assert_eq!(mesh.edges(), &[[0, 2]]);
        assert_eq!(mesh.faces(), &[vec![0, 1, 2, 3]]);
        assert!(mesh.validate());
    }

    #[test]
    fn test_build_is_deterministic() {
        let record = quad_record();
        assert_eq!(build(&record).unwrap(), build(&record).unwrap());
    }

    #[test]
    fn test_build_rejects_out_of_range_edge() {
        let mut record = quad_record();
        record.edges.push([1, 4]);
        let err = build(&record).unwrap_err();
        assert!(matches!(err, GeometryError::MalformedRecord { .. }));
    }

    #[test]
    fn test_inverse_remap_round_trip() {
        for p in [
            DVec3::new(-5000.0, 12.5, -4000.0),
            DVec3::new(0.1, -0.2, 0.3),
            DVec3::ZERO,
        ] {
            assert_eq!(inverse_remap_axes(remap_axes(p)), p);
        }
    }
}
