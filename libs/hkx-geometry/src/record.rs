//! # Geometry Records
//!
//! Typed form of one shape decoded by the converter. Field names follow the
//! converter's output document (`Name`, `Vertices`, `Edges`, `Primitives`),
//! so a record deserializes straight from it.

use crate::error::GeometryError;
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A vertex as written by the converter, in the asset's own axes.
///
/// # Example
///
/// ```rust
/// use hkx_geometry::Vertex;
///
/// let v: Vertex = serde_json::from_str(r#"{"X":1.0,"Y":2.0,"Z":3.0}"#).unwrap();
/// assert_eq!(v, Vertex::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Z")]
    pub z: f64,
}

impl Vertex {
    /// Creates a vertex from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<Vertex> for DVec3 {
    fn from(v: Vertex) -> Self {
        DVec3::new(v.x, v.y, v.z)
    }
}

/// One decoded shape: its kind name plus vertex, edge and face lists.
///
/// Edges and primitives index into `vertices`. Records coming out of the
/// converter are checked with [`GeometryRecord::validate`] before anything
/// else sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    /// Shape kind, e.g. `hkpBoxShape`.
    #[serde(rename = "Name")]
    pub shape_name: String,
    /// Vertex positions in the asset's coordinate system.
    #[serde(rename = "Vertices")]
    pub vertices: Vec<Vertex>,
    /// Loose edges as vertex index pairs.
    #[serde(rename = "Edges")]
    pub edges: Vec<[u32; 2]>,
    /// Faces as ordered vertex index lists.
    #[serde(rename = "Primitives")]
    pub primitives: Vec<Vec<u32>>,
}

impl GeometryRecord {
    /// Creates a record. No validation happens here.
    pub fn new(
        shape_name: impl Into<String>,
        vertices: Vec<Vertex>,
        edges: Vec<[u32; 2]>,
        primitives: Vec<Vec<u32>>,
    ) -> Self {
        Self {
            shape_name: shape_name.into(),
            vertices,
            edges,
            primitives,
        }
    }

    /// Checks that every edge and primitive index names an existing vertex.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hkx_geometry::{GeometryRecord, Vertex};
    ///
    /// let vertices = vec![Vertex::new(0.0, 0.0, 0.0)];
    /// let record = GeometryRecord::new("hkpTriangleShape", vertices, vec![[0, 1]], vec![]);
    /// assert!(record.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), GeometryError> {
        let count = self.vertices.len();

        for (i, edge) in self.edges.iter().enumerate() {
            if let Some(&bad) = edge.iter().find(|&&idx| idx as usize >= count) {
                let message = format!(
                    "edge {i} references vertex {bad} but the record has {count} vertices"
                );
                return Err(GeometryError::malformed(&self.shape_name, message));
            }
        }

        for (i, face) in self.primitives.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&idx| idx as usize >= count) {
                let message = format!(
                    "primitive {i} references vertex {bad} but the record has {count} vertices"
                );
                return Err(GeometryError::malformed(&self.shape_name, message));
            }
        }

        Ok(())
    }

    /// Returns the vertex count.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}
