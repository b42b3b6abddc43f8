//! # Mesh Buffer
//!
//! Host-facing mesh representation: positions plus edge and face topology.

use glam::DVec3;
use std::collections::BTreeSet;

/// A polygon mesh ready to hand to the host scene.
///
/// Faces are ordered index lists of any arity, matching what the converter
/// emits. Positions stay f64 from decode through hull refinement.
///
/// # Example
///
/// ```rust
/// use hkx_geometry::MeshBuffer;
/// use glam::DVec3;
///
/// let mut mesh = MeshBuffer::new();
/// mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
/// mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
/// mesh.add_vertex(DVec3::new(0.0, 1.0, 0.0));
/// mesh.add_face(vec![0, 1, 2]);
/// assert!(mesh.validate());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    /// Vertex positions in host axes
    positions: Vec<DVec3>,
    /// Loose edges
    edges: Vec<[u32; 2]>,
    /// Faces (ordered vertex indices)
    faces: Vec<Vec<u32>>,
}

impl MeshBuffer {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, edge_count: usize, face_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count),
            edges: Vec::with_capacity(edge_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of loose edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns true if the mesh has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        index
    }

    /// Adds a loose edge by vertex indices.
    pub fn add_edge(&mut self, a: u32, b: u32) {
        self.edges.push([a, b]);
    }

    /// Adds a face by vertex indices.
    pub fn add_face(&mut self, indices: Vec<u32>) {
        self.faces.push(indices);
    }

    /// Adds a triangle by vertex indices.
    pub fn add_triangle(&mut self, v0: u32, v1: u32, v2: u32) {
        self.faces.push(vec![v0, v1, v2]);
    }

    #[inline]
    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    #[inline]
    pub fn edges(&self) -> &[[u32; 2]] {
        &self.edges
    }

    #[inline]
    pub fn faces(&self) -> &[Vec<u32>] {
        &self.faces
    }

    /// Replaces the loose edges with the undirected boundary edges of every
    /// face, sorted and deduplicated.
    pub fn derive_edges_from_faces(&mut self) {
        let mut unique: BTreeSet<[u32; 2]> = BTreeSet::new();
        for face in &self.faces {
            for (i, &a) in face.iter().enumerate() {
                let b = face[(i + 1) % face.len()];
                if a != b {
                    unique.insert([a.min(b), a.max(b)]);
                }
            }
        }
        self.edges = unique.into_iter().collect();
    }

    /// Computes the axis-aligned bounding box.
    ///
    /// Returns (min, max) corners of the bounding box.
    pub fn bounding_box(&self) -> (DVec3, DVec3) {
        if self.positions.is_empty() {
            return (DVec3::ZERO, DVec3::ZERO);
        }

        let mut min = self.positions[0];
        let mut max = self.positions[0];

        for v in &self.positions[1..] {
            min = min.min(*v);
            max = max.max(*v);
        }

        (min, max)
    }

    /// Validates the mesh for correctness.
    ///
    /// Checks:
    /// - All edge and face indices are valid
    /// - No face has fewer than three corners
    ///
    /// Returns true if valid.
    pub fn validate(&self) -> bool {
        let vertex_count = self.positions.len() as u32;

        let edges_ok = self
            .edges
            .iter()
            .all(|e| e[0] < vertex_count && e[1] < vertex_count);
        let faces_ok = self
            .faces
            .iter()
            .all(|f| f.len() >= 3 && f.iter().all(|&i| i < vertex_count));

        edges_ok && faces_ok
    }
}
