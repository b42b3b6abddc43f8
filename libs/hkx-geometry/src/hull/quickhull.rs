//! # QuickHull Algorithm
//!
//! 3D convex hull computation using the QuickHull algorithm.
//! Based on the original algorithm by Barber, Dobkin, and Huhdanpaa.
//!
//! ## Algorithm Steps
//!
//! 1. Find 6 extreme points (min/max on each axis)
//! 2. Build initial tetrahedron from 4 non-coplanar points
//! 3. Assign remaining points to faces they're outside of
//! 4. For each face with outside points:
//!    a. Find farthest point
//!    b. Find horizon edges (boundary of visible faces)
//!    c. Create new faces from horizon to farthest point
//!    d. Reassign outside points to new faces
//! 5. Repeat until no faces have outside points

use crate::error::GeometryError;
use crate::mesh::MeshBuffer;
use config::constants::hull_tolerance;
use glam::DVec3;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Computes the convex hull of a set of 3D points.
///
/// The result keeps hull vertices in their input order with unchanged
/// positions, has triangle faces wound outward, and edges derived from
/// those faces.
///
/// # Errors
///
/// [`GeometryError::DegenerateHull`] for fewer than four distinct points or
/// a collinear/coplanar set.
///
/// # Example
///
/// ```rust
/// use hkx_geometry::convex_hull;
/// use glam::DVec3;
///
/// let points = vec![
///     DVec3::new(0.0, 0.0, 0.0),
///     DVec3::new(1.0, 0.0, 0.0),
///     DVec3::new(0.0, 1.0, 0.0),
///     DVec3::new(0.0, 0.0, 1.0),
/// ];
/// let hull = convex_hull(&points).unwrap();
/// assert_eq!(hull.face_count(), 4);
/// ```
pub fn convex_hull(points: &[DVec3]) -> Result<MeshBuffer, GeometryError> {
    if points.len() < 4 {
        return Err(GeometryError::degenerate(format!(
            "convex hull requires at least 4 points, got {}",
            points.len()
        )));
    }

    let extent = points
        .iter()
        .map(|p| p.abs().max_element())
        .fold(0.0_f64, f64::max);
    let tolerance = hull_tolerance(extent);

    let unique_points = remove_duplicates(points, tolerance);
    if unique_points.len() < 4 {
        return Err(GeometryError::degenerate(
            "convex hull requires at least 4 distinct points",
        ));
    }

    let (faces, interior) = build_initial_simplex(&unique_points, tolerance)?;
    let faces = quickhull_iterate(faces, interior, &unique_points, tolerance);

    Ok(faces_to_mesh(&faces, &unique_points))
}

/// A face of the convex hull (triangle).
#[derive(Debug, Clone)]
struct HullFace {
    /// Indices of the three vertices
    vertices: [usize; 3],
    /// Outward-pointing normal
    normal: DVec3,
    /// Distance from origin along normal
    distance: f64,
    /// Points outside this face (indices into points array)
    outside_points: Vec<usize>,
}

impl HullFace {
    fn new(v0: usize, v1: usize, v2: usize, points: &[DVec3]) -> Self {
        let p0 = points[v0];
        let normal = (points[v1] - p0).cross(points[v2] - p0).normalize_or_zero();
        Self {
            vertices: [v0, v1, v2],
            normal,
            distance: normal.dot(p0),
            outside_points: Vec::new(),
        }
    }

    /// Creates a face wound so its normal points away from `interior`.
    fn outward(v0: usize, v1: usize, v2: usize, interior: DVec3, points: &[DVec3]) -> Self {
        let face = Self::new(v0, v1, v2, points);
        if face.signed_distance(interior) > 0.0 {
            Self::new(v0, v2, v1, points)
        } else {
            face
        }
    }

    fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.distance
    }

    fn is_outside(&self, point: DVec3, tolerance: f64) -> bool {
        self.signed_distance(point) > tolerance
    }

    fn farthest_point(&self, points: &[DVec3]) -> Option<usize> {
        self.outside_points
            .iter()
            .max_by(|&&a, &&b| {
                let da = self.signed_distance(points[a]);
                let db = self.signed_distance(points[b]);
                da.total_cmp(&db)
            })
            .copied()
    }
}

/// Removes points within `tolerance` of an earlier point, keeping order.
fn remove_duplicates(points: &[DVec3], tolerance: f64) -> Vec<DVec3> {
    let mut unique: Vec<DVec3> = Vec::with_capacity(points.len());
    for p in points {
        if !unique.iter().any(|u| u.distance(*p) <= tolerance) {
            unique.push(*p);
        }
    }
    unique
}

/// Builds the initial tetrahedron and returns it with a point strictly
/// inside it. The hull only grows, so that point stays interior.
fn build_initial_simplex(
    points: &[DVec3],
    tolerance: f64,
) -> Result<(Vec<HullFace>, DVec3), GeometryError> {
    let mut extremes = [0usize; 6];
    for (i, p) in points.iter().enumerate() {
        if p.x < points[extremes[0]].x {
            extremes[0] = i;
        }
        if p.x > points[extremes[1]].x {
            extremes[1] = i;
        }
        if p.y < points[extremes[2]].y {
            extremes[2] = i;
        }
        if p.y > points[extremes[3]].y {
            extremes[3] = i;
        }
        if p.z < points[extremes[4]].z {
            extremes[4] = i;
        }
        if p.z > points[extremes[5]].z {
            extremes[5] = i;
        }
    }

    let (p0, p1) = find_farthest_pair(&extremes, points);
    if points[p0].distance(points[p1]) <= tolerance {
        return Err(GeometryError::degenerate("all points coincide"));
    }
    let p2 = find_farthest_from_line(p0, p1, points, tolerance)?;
    let p3 = find_farthest_from_plane(p0, p1, p2, points, tolerance)?;

    let interior = (points[p0] + points[p1] + points[p2] + points[p3]) / 4.0;
    let mut faces = vec![
        HullFace::outward(p0, p1, p2, interior, points),
        HullFace::outward(p0, p2, p3, interior, points),
        HullFace::outward(p0, p3, p1, interior, points),
        HullFace::outward(p1, p3, p2, interior, points),
    ];

    let used = [p0, p1, p2, p3];
    let remaining: Vec<usize> = (0..points.len()).filter(|i| !used.contains(i)).collect();
    assign_outside(&mut faces, &remaining, points, tolerance);

    Ok((faces, interior))
}

/// Finds the pair of points with maximum distance.
fn find_farthest_pair(indices: &[usize], points: &[DVec3]) -> (usize, usize) {
    let mut max_dist = -1.0;
    let mut best = (indices[0], indices[1]);

    for (i, &a) in indices.iter().enumerate() {
        for &b in indices.iter().skip(i + 1) {
            let dist = points[a].distance_squared(points[b]);
            if dist > max_dist {
                max_dist = dist;
                best = (a, b);
            }
        }
    }
    best
}

fn find_farthest_from_line(
    p0: usize,
    p1: usize,
    points: &[DVec3],
    tolerance: f64,
) -> Result<usize, GeometryError> {
    let line_dir = (points[p1] - points[p0]).normalize();
    let mut max_dist = tolerance;
    let mut best = None;

    for (i, p) in points.iter().enumerate() {
        if i == p0 || i == p1 {
            continue;
        }
        let v = *p - points[p0];
        let dist = (v - v.dot(line_dir) * line_dir).length();
        if dist > max_dist {
            max_dist = dist;
            best = Some(i);
        }
    }

    best.ok_or_else(|| GeometryError::degenerate("all points are collinear"))
}

fn find_farthest_from_plane(
    p0: usize,
    p1: usize,
    p2: usize,
    points: &[DVec3],
    tolerance: f64,
) -> Result<usize, GeometryError> {
    let normal = (points[p1] - points[p0])
        .cross(points[p2] - points[p0])
        .normalize();

    let mut max_dist = tolerance;
    let mut best = None;

    for (i, p) in points.iter().enumerate() {
        if i == p0 || i == p1 || i == p2 {
            continue;
        }
        let dist = normal.dot(*p - points[p0]).abs();
        if dist > max_dist {
            max_dist = dist;
            best = Some(i);
        }
    }

    best.ok_or_else(|| GeometryError::degenerate("all points are coplanar"))
}

/// Hands each point to the first face it lies outside of. Points outside
/// no face are interior and are dropped.
fn assign_outside(faces: &mut [HullFace], candidates: &[usize], points: &[DVec3], tolerance: f64) {
    for &idx in candidates {
        let point = points[idx];
        if let Some(face) = faces.iter_mut().find(|f| f.is_outside(point, tolerance)) {
            face.outside_points.push(idx);
        }
    }
}

/// Main QuickHull iteration.
///
/// Every pass removes its farthest point from all outside lists, so the loop
/// ends after at most `points.len()` passes.
fn quickhull_iterate(
    mut faces: Vec<HullFace>,
    interior: DVec3,
    points: &[DVec3],
    tolerance: f64,
) -> Vec<HullFace> {
    while let Some(face_idx) = faces.iter().position(|f| !f.outside_points.is_empty()) {
        let Some(farthest) = faces[face_idx].farthest_point(points) else {
            break;
        };
        let apex = points[farthest];

        let visible: Vec<usize> = faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_outside(apex, tolerance))
            .map(|(i, _)| i)
            .collect();

        let horizon = find_horizon_edges(&faces, &visible);

        let mut reassign: Vec<usize> = Vec::new();
        for &idx in &visible {
            reassign.extend(&faces[idx].outside_points);
        }
        reassign.retain(|&p| p != farthest);

        // Descending order keeps the remaining indices valid for swap_remove.
        let mut visible_sorted = visible;
        visible_sorted.sort_unstable_by(|a, b| b.cmp(a));
        for idx in visible_sorted {
            faces.swap_remove(idx);
        }

        for (e0, e1) in horizon {
            faces.push(HullFace::outward(e0, e1, farthest, interior, points));
        }

        assign_outside(&mut faces, &reassign, points, tolerance);
    }

    faces
}

/// Edges of the visible region that border exactly one visible face.
fn find_horizon_edges(faces: &[HullFace], visible: &[usize]) -> Vec<(usize, usize)> {
    let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();

    for &idx in visible {
        let v = faces[idx].vertices;
        for (a, b) in [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])] {
            *edge_count.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }

    let mut horizon = Vec::new();
    for &idx in visible {
        let v = faces[idx].vertices;
        for (a, b) in [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])] {
            if edge_count[&(a.min(b), a.max(b))] == 1 {
                horizon.push((a, b));
            }
        }
    }

    horizon
}

/// Converts hull faces to a mesh holding only the hull vertices.
fn faces_to_mesh(faces: &[HullFace], points: &[DVec3]) -> MeshBuffer {
    let used: HashSet<usize> = faces.iter().flat_map(|f| f.vertices).collect();

    // BTreeMap keeps hull vertices in input order.
    let mut vertex_map: BTreeMap<usize, u32> = used.into_iter().map(|v| (v, 0)).collect();
    let mut mesh = MeshBuffer::with_capacity(vertex_map.len(), 0, faces.len());
    for (&v, slot) in vertex_map.iter_mut() {
        *slot = mesh.add_vertex(points[v]);
    }

    for face in faces {
        let [a, b, c] = face.vertices.map(|v| vertex_map[&v]);
        mesh.add_triangle(a, b, c);
    }
    mesh.derive_edges_from_faces();

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convex_hull_tetrahedron() {
        let points = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.5, 1.0, 0.0),
            DVec3::new(0.5, 0.5, 1.0),
        ];
        let mesh = convex_hull(&points).unwrap();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(mesh.edge_count(), 6);
    }

    #[test]
    fn test_convex_hull_with_interior_points() {
        let mut points = Vec::new();
        for x in [0.0, 1.0] {
            for y in [0.0, 1.0] {
                for z in [0.0, 1.0] {
                    points.push(DVec3::new(x, y, z));
                }
            }
        }
        points.insert(3, DVec3::new(0.5, 0.5, 0.5));

        let mesh = convex_hull(&points).unwrap();

        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 12);
        assert!(!mesh.positions().contains(&DVec3::splat(0.5)));
    }

    #[test]
    fn test_convex_hull_too_few_points() {
        let points = vec![DVec3::ZERO, DVec3::X, DVec3::Y];
        assert!(convex_hull(&points).is_err());
    }

    #[test]
    fn test_convex_hull_duplicates_only() {
        let points = vec![DVec3::ONE; 6];
        let err = convex_hull(&points).unwrap_err();
        assert!(matches!(err, GeometryError::DegenerateHull { .. }));
    }

    #[test]
    fn test_convex_hull_collinear() {
        let points: Vec<DVec3> = (0..5).map(|i| DVec3::X * i as f64).collect();
        assert_eq!(
            convex_hull(&points).unwrap_err(),
            GeometryError::degenerate("all points are collinear")
        );
    }

    #[test]
    fn test_convex_hull_coplanar() {
        let points = vec![DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::new(1.0, 1.0, 0.0)];
        assert_eq!(
            convex_hull(&points).unwrap_err(),
            GeometryError::degenerate("all points are coplanar")
        );
    }
}
