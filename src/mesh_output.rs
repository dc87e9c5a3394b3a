//! Canonical mesh output types.
//!
//! [`MeshOutput`] is the renderer-agnostic view of a built mesh. Vertex
//! attributes are stored in structure-of-arrays layout with zero-copy byte
//! accessors for GPU upload; faces are available both as a triangle list and
//! as the triangle strips the builder produced.

use crate::export::obj::{export_obj, ObjExport};
use crate::error::Result;
use crate::mesher::{MeshBuilder, MeshStats};
use crate::types::{BoundingBox, BoundingSphere};
use serde::Serialize;
use std::mem;

/// A run of consecutive triangles sharing one material key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaterialGroup {
    /// Texture index on the ordering channel; `None` for untextured faces.
    pub material: Option<u32>,
    /// Offset of the group's first index in [`MeshOutput::indices`].
    pub first_index: usize,
    pub index_count: usize,
}

impl MaterialGroup {
    pub fn triangle_count(&self) -> usize {
        self.index_count / 3
    }
}

/// A built mesh ready for upload or export.
#[derive(Debug, Clone, Serialize)]
pub struct MeshOutput {
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals (unit length when computed by the builder).
    pub normals: Vec<[f32; 3]>,
    /// Pass 0, stage 0 texture coordinates.
    pub uvs: Vec<[f32; 2]>,
    /// Pass 0 diffuse color with alpha.
    pub colors: Vec<[f32; 4]>,
    /// Triangle indices (three per triangle), in strip order.
    pub indices: Vec<u32>,
    /// Strip index sequences, ready for strip-topology draws.
    pub strips: Vec<Vec<u32>>,
    /// Material runs over `indices`, in sort order.
    pub groups: Vec<MaterialGroup>,
    pub bounds: BoundingBox,
    pub sphere: BoundingSphere,
    pub stats: MeshStats,
}

impl MeshOutput {
    /// Collect the results of a processed builder.
    ///
    /// # Panics
    ///
    /// Panics if `builder` has not been built.
    pub fn from_builder(builder: &MeshBuilder) -> Self {
        let vertices = builder.vertices();
        let faces = builder.faces();
        let channel = builder.config().ordering_channel();

        let mut indices = Vec::with_capacity(faces.len() * 3);
        let mut groups: Vec<MaterialGroup> = Vec::new();
        for face in faces {
            let material = channel.key(face);
            match groups.last_mut() {
                Some(group) if group.material == material => group.index_count += 3,
                _ => groups.push(MaterialGroup {
                    material,
                    first_index: indices.len(),
                    index_count: 3,
                }),
            }
            indices.extend_from_slice(&face.vert_indices);
        }

        let origin = [0.0; 3];
        Self {
            positions: vertices.iter().map(|v| v.position.to_array()).collect(),
            normals: vertices.iter().map(|v| v.normal.to_array()).collect(),
            uvs: vertices
                .iter()
                .map(|v| v.passes[0].tex_coords[0].to_array())
                .collect(),
            colors: vertices
                .iter()
                .map(|v| v.passes[0].diffuse_color.extend(v.passes[0].alpha).to_array())
                .collect(),
            indices,
            strips: builder.strips().iter().map(|s| s.indices.clone()).collect(),
            groups,
            bounds: builder
                .compute_bounding_box()
                .unwrap_or(BoundingBox::new(origin, origin)),
            sphere: builder
                .compute_bounding_sphere()
                .unwrap_or(BoundingSphere::new(origin, 0.0)),
            stats: builder.mesh_stats().clone(),
        }
    }

    /// Returns `true` if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Total number of indices across all strips.
    pub fn strip_index_count(&self) -> usize {
        self.strips.iter().map(Vec::len).sum()
    }

    /// Raw bytes of the positions array. Zero-allocation view.
    pub fn positions_bytes(&self) -> &[u8] {
        cast_slice(&self.positions)
    }

    /// Raw bytes of the normals array. Zero-allocation view.
    pub fn normals_bytes(&self) -> &[u8] {
        cast_slice(&self.normals)
    }

    /// Raw bytes of the UVs array. Zero-allocation view.
    pub fn uvs_bytes(&self) -> &[u8] {
        cast_slice(&self.uvs)
    }

    /// Raw bytes of the colors array. Zero-allocation view.
    pub fn colors_bytes(&self) -> &[u8] {
        cast_slice(&self.colors)
    }

    /// Raw bytes of the indices array. Zero-allocation view.
    pub fn indices_bytes(&self) -> &[u8] {
        cast_slice(&self.indices)
    }

    /// Export to OBJ format.
    pub fn to_obj(&self, name: &str) -> Result<ObjExport> {
        export_obj(self, name)
    }
}

/// Cast a slice of `T` to a byte slice without allocation.
fn cast_slice<T: Copy>(slice: &[T]) -> &[u8] {
    let ptr = slice.as_ptr() as *const u8;
    let len = mem::size_of_val(slice);
    // SAFETY: [f32; N] and u32 are plain-old-data types with no padding.
    unsafe { std::slice::from_raw_parts(ptr, len) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::{BuilderConfig, Face, Vertex};
    use glam::{Vec2, Vec3};

    fn corner(x: f32, y: f32) -> Vertex {
        Vertex::new(Vec3::new(x, y, 0.0)).with_uv(0, 0, Vec2::new(x, y))
    }

    fn build(textures: &[u32]) -> MeshBuilder {
        let mut builder = MeshBuilder::new(BuilderConfig::default()).unwrap();
        for (i, &texture) in textures.iter().enumerate() {
            let x = i as f32;
            let (a, b, c, d) = (corner(x, 0.0), corner(x + 1.0, 0.0), corner(x + 1.0, 1.0), corner(x, 1.0));
            builder.add_face(Face::new([a, b, c]).with_texture(0, 0, texture));
            builder.add_face(Face::new([a, c, d]).with_texture(0, 0, texture));
        }
        builder.build_mesh(true);
        builder
    }

    #[test]
    fn test_quad_output() {
        let output = MeshOutput::from_builder(&build(&[0]));

        assert_eq!(output.vertex_count(), 4);
        assert_eq!(output.triangle_count(), 2);
        assert_eq!(output.strips.len(), 1);
        assert_eq!(output.strip_index_count(), 4);
        assert_eq!(output.groups, vec![MaterialGroup { material: Some(0), first_index: 0, index_count: 6 }]);
        assert_eq!(output.colors[0], [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(output.bounds, BoundingBox::new([0.0, 0.0, 0.0], [1.0, 1.0, 0.0]));
        assert!(output.sphere.radius > 0.7);
        assert_eq!(output.stats.strip_count, 1);
    }

    #[test]
    fn test_material_groups_follow_sort_order() {
        let output = MeshOutput::from_builder(&build(&[2, 1, 2, 0]));

        let materials: Vec<Option<u32>> = output.groups.iter().map(|g| g.material).collect();
        assert_eq!(materials, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(output.groups[2].triangle_count(), 4);
        let covered: usize = output.groups.iter().map(|g| g.index_count).sum();
        assert_eq!(covered, output.indices.len());
        for pair in output.groups.windows(2) {
            assert_eq!(pair[0].first_index + pair[0].index_count, pair[1].first_index);
        }
    }

    #[test]
    fn test_bytes_zero_alloc() {
        let output = MeshOutput::from_builder(&build(&[0]));

        assert_eq!(output.positions_bytes().len(), 4 * 12);
        assert_eq!(output.normals_bytes().len(), 4 * 12);
        assert_eq!(output.uvs_bytes().len(), 4 * 8);
        assert_eq!(output.colors_bytes().len(), 4 * 16);
        assert_eq!(output.indices_bytes().len(), 6 * 4);
        assert_eq!(&output.positions_bytes()[12..16], &1.0f32.to_ne_bytes());
    }

    #[test]
    fn test_empty_output() {
        let mut builder = MeshBuilder::new(BuilderConfig::default()).unwrap();
        builder.build_mesh(true);
        let output = MeshOutput::from_builder(&builder);

        assert!(output.is_empty());
        assert!(output.groups.is_empty());
        assert_eq!(output.sphere.radius, 0.0);
    }

    #[test]
    fn test_serializes_to_json() {
        let output = MeshOutput::from_builder(&build(&[0]));
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["stats"]["strip_count"], 1);
        assert_eq!(json["indices"].as_array().unwrap().len(), 6);
    }

    #[test]
    #[should_panic(expected = "has not been built")]
    fn test_unbuilt_builder_panics() {
        let builder = MeshBuilder::new(BuilderConfig::default()).unwrap();
        MeshOutput::from_builder(&builder);
    }
}
