//! Vertex and face records fed to and produced by the [`MeshBuilder`](super::MeshBuilder).

use crate::types::plane_from_points;
use glam::{Vec2, Vec3};

/// Maximum number of rendering passes.
pub const MAX_PASSES: usize = 4;
/// Maximum number of texture stages per pass.
pub const MAX_STAGES: usize = 2;

/// Per-pass vertex attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexPass {
    /// Texture coordinates, one per stage.
    pub tex_coords: [Vec2; MAX_STAGES],
    /// Diffuse color (RGB).
    pub diffuse_color: Vec3,
    /// Specular color (RGB).
    pub specular_color: Vec3,
    /// Diffuse illumination (pre-lit color, RGB).
    pub diffuse_illumination: Vec3,
    pub alpha: f32,
    /// Index of the vertex material used in this pass.
    pub vertex_material_index: Option<u32>,
}

impl Default for VertexPass {
    fn default() -> Self {
        Self {
            tex_coords: [Vec2::ZERO; MAX_STAGES],
            diffuse_color: Vec3::ONE,
            specular_color: Vec3::ZERO,
            diffuse_illumination: Vec3::ZERO,
            alpha: 1.0,
            vertex_material_index: None,
        }
    }
}

/// A mesh vertex.
///
/// Until the mesh is built, vertices live as face corners. After the build
/// they are unique and carry their slot in [`unique_index`](Self::unique_index).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// Smoothing group bitset.
    pub smoothing_group: u32,
    /// Material id; vertices with different ids never merge or share normals.
    pub material_id: u32,
    pub bone_index: u32,
    pub passes: [VertexPass; MAX_PASSES],

    pub(crate) unique_index: Option<u32>,
    pub(crate) shade_index: u32,
    pub(crate) shared_smoothing_group: u32,
    /// Next vertex in the same dedup hash bucket.
    pub(crate) next_hash: Option<u32>,
}

impl Vertex {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }

    pub fn with_material_id(mut self, material_id: u32) -> Self {
        self.material_id = material_id;
        self
    }

    pub fn with_bone(mut self, bone_index: u32) -> Self {
        self.bone_index = bone_index;
        self
    }

    /// Set the texture coordinate of one pass/stage.
    pub fn with_uv(mut self, pass: usize, stage: usize, uv: Vec2) -> Self {
        self.passes[pass].tex_coords[stage] = uv;
        self
    }

    pub fn with_vertex_material(mut self, pass: usize, index: u32) -> Self {
        self.passes[pass].vertex_material_index = Some(index);
        self
    }

    /// Slot of this vertex in the deduplicated array; `None` before the build.
    pub fn unique_index(&self) -> Option<u32> {
        self.unique_index
    }

    /// Unique vertex whose accumulated normal this vertex shares.
    pub fn shade_index(&self) -> u32 {
        self.shade_index
    }

    /// Intersection of the smoothing groups of every vertex sharing this
    /// vertex's shading representative.
    pub fn shared_smoothing_group(&self) -> u32 {
        self.shared_smoothing_group
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            smoothing_group: 0,
            material_id: 0,
            bone_index: 0,
            passes: [VertexPass::default(); MAX_PASSES],
            unique_index: None,
            shade_index: 0,
            shared_smoothing_group: 0,
            next_hash: None,
        }
    }
}

/// A triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Corner attributes as submitted.
    pub verts: [Vertex; 3],
    /// Indices into the deduplicated vertex array, valid after the build.
    pub vert_indices: [u32; 3],
    pub normal: Vec3,
    /// Signed plane distance from the origin.
    pub dist: f32,
    pub smoothing_group: u32,
    /// Texture index per pass and stage.
    pub texture_index: [[Option<u32>; MAX_STAGES]; MAX_PASSES],
    /// Shader index per pass.
    pub shader_index: [Option<u32>; MAX_PASSES],
    /// Insertion order of this face in the builder.
    pub add_index: u32,
}

impl Face {
    pub fn new(verts: [Vertex; 3]) -> Self {
        Self {
            verts,
            vert_indices: [0; 3],
            normal: Vec3::ZERO,
            dist: 0.0,
            smoothing_group: 0,
            texture_index: [[None; MAX_STAGES]; MAX_PASSES],
            shader_index: [None; MAX_PASSES],
            add_index: 0,
        }
    }

    pub fn with_smoothing_group(mut self, smoothing_group: u32) -> Self {
        self.smoothing_group = smoothing_group;
        self
    }

    pub fn with_texture(mut self, pass: usize, stage: usize, texture: u32) -> Self {
        self.texture_index[pass][stage] = Some(texture);
        self
    }

    pub fn with_shader(mut self, pass: usize, shader: u32) -> Self {
        self.shader_index[pass] = Some(shader);
        self
    }

    /// True when two or more resolved vertex indices coincide.
    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.vert_indices;
        a == b || b == c || c == a
    }

    /// Recompute the plane from the corner positions.
    pub fn compute_plane(&mut self) {
        let (normal, dist) = plane_from_points(
            self.verts[0].position,
            self.verts[1].position,
            self.verts[2].position,
        );
        self.normal = normal;
        self.dist = dist;
    }

    /// Recompute the plane from resolved vertex indices.
    pub(crate) fn compute_plane_from(&mut self, vertices: &[Vertex]) {
        let [a, b, c] = self.vert_indices.map(|i| vertices[i as usize].position);
        let (normal, dist) = plane_from_points(a, b, c);
        self.normal = normal;
        self.dist = dist;
    }
}
