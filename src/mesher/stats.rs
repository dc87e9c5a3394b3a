//! Aggregate mesh statistics.

use crate::mesher::geometry::{Face, Vertex, MAX_PASSES, MAX_STAGES};
use crate::mesher::strip::StripStats;
use glam::Vec3;
use serde::Serialize;

/// Which attributes a built mesh actually uses, plus build counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeshStats {
    /// Some face references a texture on this pass/stage.
    pub has_texture: [[bool; MAX_STAGES]; MAX_PASSES],
    /// Some face references a shader on this pass.
    pub has_shader: [bool; MAX_PASSES],
    /// Some vertex references a vertex material on this pass.
    pub has_vertex_material: [bool; MAX_PASSES],
    /// Faces use more than one texture on this pass/stage.
    pub has_per_poly_texture: [[bool; MAX_STAGES]; MAX_PASSES],
    /// Faces use more than one shader on this pass.
    pub has_per_poly_shader: [bool; MAX_PASSES],
    /// Vertices use more than one vertex material on this pass.
    pub has_per_vertex_material: [bool; MAX_PASSES],
    pub has_diffuse_color: [bool; MAX_PASSES],
    pub has_specular_color: [bool; MAX_PASSES],
    pub has_diffuse_illumination: [bool; MAX_PASSES],
    pub has_tex_coords: [[bool; MAX_STAGES]; MAX_PASSES],

    /// Vertices that failed to merge only because their UVs differed.
    pub uv_split_count: usize,
    pub degenerate_faces_removed: usize,
    pub duplicate_faces_removed: usize,
    /// Faces whose stored normal disagreed with their final triangle.
    pub normal_mismatches: usize,

    pub strip_count: usize,
    pub max_strip_length: usize,
    pub avg_strip_length: f32,
}

impl MeshStats {
    /// Compute the attribute flags for the first `pass_count` passes.
    pub fn compute(faces: &[Face], vertices: &[Vertex], pass_count: usize) -> Self {
        let mut stats = Self::default();

        for pass in 0..pass_count {
            for stage in 0..MAX_STAGES {
                let (any, varies) = usage(faces.iter().map(|f| f.texture_index[pass][stage]));
                stats.has_texture[pass][stage] = any;
                stats.has_per_poly_texture[pass][stage] = varies;
                stats.has_tex_coords[pass][stage] = any;
            }

            let (any, varies) = usage(faces.iter().map(|f| f.shader_index[pass]));
            stats.has_shader[pass] = any;
            stats.has_per_poly_shader[pass] = varies;

            let (any, varies) =
                usage(vertices.iter().map(|v| v.passes[pass].vertex_material_index));
            stats.has_vertex_material[pass] = any;
            stats.has_per_vertex_material[pass] = varies;

            let layer = vertices.iter().map(|v| &v.passes[pass]);
            stats.has_diffuse_color[pass] = layer.clone().any(|p| p.diffuse_color != Vec3::ONE);
            stats.has_specular_color[pass] = layer.clone().any(|p| p.specular_color != Vec3::ZERO);
            stats.has_diffuse_illumination[pass] =
                layer.clone().any(|p| p.diffuse_illumination != Vec3::ZERO);
        }

        stats
    }

    pub(crate) fn apply_strip_stats(&mut self, strips: &StripStats) {
        self.strip_count = strips.strip_count;
        self.max_strip_length = strips.max_strip_length;
        self.avg_strip_length = strips.avg_strip_length;
    }
}

/// Whether any value is set, and whether the values differ from each other.
fn usage(values: impl Iterator<Item = Option<u32>>) -> (bool, bool) {
    let mut first = None;
    let mut any = false;
    let mut varies = false;
    for value in values {
        any |= value.is_some();
        match first {
            None => first = Some(value),
            Some(f) if f != value => varies = true,
            _ => {}
        }
    }
    (any, varies)
}
