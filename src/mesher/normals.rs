//! Face planes and smoothed vertex normals.

use crate::mesher::geometry::{Face, Vertex};
use crate::types::{plane_from_points, vec3_approx_eq};
use glam::Vec3;
use std::collections::HashMap;

/// Source of normals shared between separately built meshes.
///
/// Lets meshes that meet along a seam blend their normals as if they had
/// been built together.
pub trait SharedSmoothing {
    /// Whether shared normals should be blended in at all.
    fn are_meshes_smoothed(&self) -> bool;

    /// Normal contribution for a position in the given smoothing group.
    fn shared_vertex_normal(&self, position: Vec3, smoothing_group: u32) -> Vec3;
}

/// A [`SharedSmoothing`] implementation backed by a hash map.
///
/// Positions are quantized to `cell_size` so that coincident vertices from
/// different meshes land on the same key.
#[derive(Debug, Clone)]
pub struct SharedNormalTable {
    cell_size: f32,
    normals: HashMap<([i32; 3], u32), Vec3>,
}

impl SharedNormalTable {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            normals: HashMap::new(),
        }
    }

    fn key(&self, position: Vec3, smoothing_group: u32) -> ([i32; 3], u32) {
        let cell = (position / self.cell_size).round();
        ([cell.x as i32, cell.y as i32, cell.z as i32], smoothing_group)
    }

    /// Accumulate a normal contribution.
    pub fn add(&mut self, position: Vec3, smoothing_group: u32, normal: Vec3) {
        let key = self.key(position, smoothing_group);
        *self.normals.entry(key).or_insert(Vec3::ZERO) += normal;
    }

    /// Accumulate the plane normals of a set of faces at each of their corners.
    pub fn add_faces<'a>(&mut self, faces: impl IntoIterator<Item = &'a Face>) {
        for face in faces {
            for corner in &face.verts {
                self.add(corner.position, face.smoothing_group, face.normal);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.normals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }
}

impl SharedSmoothing for SharedNormalTable {
    fn are_meshes_smoothed(&self) -> bool {
        !self.normals.is_empty()
    }

    fn shared_vertex_normal(&self, position: Vec3, smoothing_group: u32) -> Vec3 {
        self.normals
            .get(&self.key(position, smoothing_group))
            .copied()
            .unwrap_or(Vec3::ZERO)
    }
}

/// Recompute every face plane from its resolved vertices.
pub fn compute_face_normals(faces: &mut [Face], vertices: &[Vertex]) {
    for face in faces {
        face.compute_plane_from(vertices);
    }
}

/// Smooth vertex normals.
///
/// Face normals are summed into each corner's shading representative, the
/// optional shared contribution is added to representatives, and the
/// normalized result is copied back to every vertex sharing it.
pub fn compute_vertex_normals(
    vertices: &mut [Vertex],
    faces: &[Face],
    shared: Option<&dyn SharedSmoothing>,
) {
    for vertex in vertices.iter_mut() {
        vertex.normal = Vec3::ZERO;
    }

    for face in faces {
        for &index in &face.vert_indices {
            let shade = vertices[index as usize].shade_index as usize;
            vertices[shade].normal += face.normal;
        }
    }

    if let Some(shared) = shared.filter(|s| s.are_meshes_smoothed()) {
        for (i, vertex) in vertices.iter_mut().enumerate() {
            if vertex.shade_index as usize == i {
                vertex.normal +=
                    shared.shared_vertex_normal(vertex.position, vertex.shared_smoothing_group);
            }
        }
    }

    for i in 0..vertices.len() {
        let shade = vertices[i].shade_index as usize;
        if shade == i {
            vertices[i].normal = vertices[i].normal.normalize_or_zero();
        }
    }
    for i in 0..vertices.len() {
        let shade = vertices[i].shade_index as usize;
        if shade != i {
            vertices[i].normal = vertices[shade].normal;
        }
    }
}

/// Count faces whose stored plane normal disagrees with the normal of the
/// triangle their indices describe.
pub fn verify_face_normals(faces: &[Face], vertices: &[Vertex], tolerance: f32) -> usize {
    faces
        .iter()
        .filter(|face| {
            let [a, b, c] = face.vert_indices.map(|i| vertices[i as usize].position);
            let (normal, _) = plane_from_points(a, b, c);
            !vec3_approx_eq(normal, face.normal, tolerance)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vertex(position: Vec3, shade_index: u32) -> Vertex {
        let mut v = Vertex::new(position);
        v.shade_index = shade_index;
        v
    }

    fn face(indices: [u32; 3], vertices: &[Vertex]) -> Face {
        let mut face = Face::new(indices.map(|i| vertices[i as usize]));
        face.vert_indices = indices;
        face.compute_plane_from(vertices);
        face
    }

    /// Two triangles folded 90 degrees along the shared edge 1-2.
    fn folded() -> (Vec<Vertex>, Vec<Face>) {
        let vertices = vec![
            vertex(Vec3::new(0.0, 0.0, 0.0), 0),
            vertex(Vec3::new(1.0, 0.0, 0.0), 1),
            vertex(Vec3::new(1.0, 1.0, 0.0), 2),
            vertex(Vec3::new(1.0, 1.0, 0.0), 2),
            vertex(Vec3::new(1.0, 0.0, 0.0), 1),
            vertex(Vec3::new(1.0, 0.0, -1.0), 5),
        ];
        let faces = vec![face([0, 1, 2], &vertices), face([3, 4, 5], &vertices)];
        (vertices, faces)
    }

    #[test]
    fn test_face_normals() {
        let (vertices, mut faces) = folded();
        faces[0].normal = Vec3::ZERO;
        compute_face_normals(&mut faces, &vertices);
        assert_relative_eq!(faces[0].normal.z, 1.0);
        assert_relative_eq!(faces[1].normal.x, 1.0);
    }

    #[test]
    fn test_shared_vertices_blend() {
        let (mut vertices, faces) = folded();
        compute_vertex_normals(&mut vertices, &faces, None);

        let blended = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert_relative_eq!(vertices[1].normal.x, blended.x, epsilon = 1e-6);
        assert_relative_eq!(vertices[1].normal.z, blended.z, epsilon = 1e-6);
        // Vertex 4 shades through vertex 1
        assert_eq!(vertices[4].normal, vertices[1].normal);
        // Unshared corners keep their face's normal
        assert_relative_eq!(vertices[0].normal.z, 1.0);
        assert_relative_eq!(vertices[5].normal.x, 1.0);
    }

    #[test]
    fn test_shared_smoothing_contribution() {
        let (mut vertices, faces) = folded();
        let mut table = SharedNormalTable::new(0.001);
        table.add(Vec3::new(0.0, 0.0, 0.0), 0, Vec3::new(0.0, 1.0, 0.0) * 3.0);
        compute_vertex_normals(&mut vertices, &faces, Some(&table));

        let expected = Vec3::new(0.0, 3.0, 1.0).normalize();
        assert_relative_eq!(vertices[0].normal.y, expected.y, epsilon = 1e-6);
        assert_relative_eq!(vertices[0].normal.z, expected.z, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_table_is_not_smoothed() {
        let table = SharedNormalTable::new(0.01);
        assert!(!table.are_meshes_smoothed());
        assert!(table.is_empty());
        assert_eq!(table.shared_vertex_normal(Vec3::ONE, 1), Vec3::ZERO);
    }

    #[test]
    fn test_table_quantizes_positions() {
        let mut table = SharedNormalTable::new(0.01);
        table.add(Vec3::new(1.0, 2.0, 3.0), 4, Vec3::X);
        table.add(Vec3::new(1.001, 2.0, 3.0), 4, Vec3::Y);
        table.add(Vec3::new(1.0, 2.0, 3.0), 8, Vec3::Z);
        assert_eq!(table.len(), 2);
        assert_eq!(table.shared_vertex_normal(Vec3::new(1.0, 2.0, 3.0), 4), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_verify_detects_flipped_face() {
        let (vertices, mut faces) = folded();
        assert_eq!(verify_face_normals(&faces, &vertices, 1e-3), 0);

        faces[1].vert_indices = [3, 5, 4];
        assert_eq!(verify_face_normals(&faces, &vertices, 1e-3), 1);
    }
}
