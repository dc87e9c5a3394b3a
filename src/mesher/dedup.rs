//! Vertex welding.
//!
//! Corners are hashed into a fixed 64x64 grid over the mesh's x/y extent.
//! Each bucket is an intrusive list threaded through the vertices' `next_hash` links,
//! so linking a vertex never allocates.

use crate::mesher::geometry::{Vertex, MAX_STAGES};
use crate::types::{approx_eq, vec2_approx_eq, vec3_approx_eq};
use glam::Vec3;

const HASH_TABLE_SIZE: usize = 4096;
/// Highest cell coordinate per axis (64 cells).
const HASH_CELL_MAX: f32 = 63.0;

/// Outcome of comparing a submitted vertex with an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexMatch {
    Full,
    /// Everything matched except the texture coordinates.
    UvOnly,
    None,
}

/// Collapses equivalent vertices and groups coincident ones for shading.
pub struct VertexDeduplicator {
    vertices: Vec<Vertex>,
    hash_table: Vec<Option<u32>>,
    min: Vec3,
    extent: Vec3,
    center: Vec3,
    pass_count: usize,
    match_normals: bool,
    epsilon: f32,
    uv_splits: usize,
}

impl VertexDeduplicator {
    /// Create an empty deduplicator.
    ///
    /// With `match_normals` set, incoming normals are part of the full match
    /// and smoothing groups are ignored; otherwise the reverse holds, since
    /// normals will be recomputed from smoothing groups.
    pub fn new(capacity: usize, pass_count: usize, match_normals: bool, epsilon: f32) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            hash_table: vec![None; HASH_TABLE_SIZE],
            min: Vec3::ZERO,
            extent: Vec3::ZERO,
            center: Vec3::ZERO,
            pass_count,
            match_normals,
            epsilon,
            uv_splits: 0,
        }
    }

    /// Set the region the spatial hash is spread over.
    pub fn set_bounds(&mut self, min: Vec3, max: Vec3) {
        self.min = min;
        self.extent = max - min;
        self.center = (min + max) * 0.5;
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Number of new vertices created only because their UVs differed.
    pub fn uv_splits(&self) -> usize {
        self.uv_splits
    }

    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }

    /// Submit a corner and return the unique index it resolves to.
    pub fn submit(&mut self, vertex: &Vertex) -> u32 {
        let mut shade_index = None;
        let mut uv_split = false;

        for hash in self.neighborhood(vertex.position) {
            let mut cursor = self.hash_table[hash];
            while let Some(index) = cursor {
                let candidate = &self.vertices[index as usize];

                if shade_index.is_none() && self.shading_match(vertex, candidate) {
                    shade_index = Some(candidate.shade_index);
                }

                match self.full_match(vertex, candidate) {
                    VertexMatch::Full => return index,
                    VertexMatch::UvOnly => uv_split = true,
                    VertexMatch::None => {}
                }

                cursor = candidate.next_hash;
            }
        }

        if uv_split {
            self.uv_splits += 1;
        }

        let index = self.vertices.len() as u32;
        let hash = self.hash(vertex.position);

        let mut new_vertex = *vertex;
        new_vertex.unique_index = Some(index);
        new_vertex.shade_index = shade_index.unwrap_or(index);
        new_vertex.shared_smoothing_group = vertex.smoothing_group;
        new_vertex.next_hash = self.hash_table[hash];

        if let Some(shade) = shade_index {
            self.vertices[shade as usize].shared_smoothing_group &= vertex.smoothing_group;
        }

        self.hash_table[hash] = Some(index);
        self.vertices.push(new_vertex);
        index
    }

    /// Copy each shading representative's shared smoothing group to the
    /// vertices that share it. Only valid once every vertex has been submitted.
    pub fn propagate_shared_smoothing_groups(&mut self) {
        for i in 0..self.vertices.len() {
            let shade = self.vertices[i].shade_index as usize;
            if shade != i {
                self.vertices[i].shared_smoothing_group = self.vertices[shade].shared_smoothing_group;
            }
        }
    }

    fn cell(&self, value: f32, axis: usize) -> i32 {
        let extent = self.extent[axis];
        if extent > 0.0 {
            ((value - self.min[axis]) / extent * HASH_CELL_MAX).floor() as i32
        } else {
            (value - self.center[axis]).floor() as i32
        }
    }

    fn bucket(x: i32, y: i32) -> usize {
        (((y & 63) << 6) | (x & 63)) as usize
    }

    fn hash(&self, position: Vec3) -> usize {
        Self::bucket(self.cell(position.x, 0), self.cell(position.y, 1))
    }

    /// Wrapped cell coordinates in `lo..=hi` as a 64-bit set.
    fn axis_mask(lo: i32, hi: i32) -> u64 {
        if i64::from(hi) - i64::from(lo) >= HASH_CELL_MAX as i64 {
            return u64::MAX;
        }
        (lo..=hi).fold(0, |mask, cell| mask | 1 << (cell & 63))
    }

    /// Distinct buckets covering the epsilon box around `position`.
    fn neighborhood(&self, position: Vec3) -> Vec<usize> {
        let xs = Self::axis_mask(
            self.cell(position.x - self.epsilon, 0),
            self.cell(position.x + self.epsilon, 0),
        );
        let ys = Self::axis_mask(
            self.cell(position.y - self.epsilon, 1),
            self.cell(position.y + self.epsilon, 1),
        );

        let mut buckets = Vec::with_capacity((xs.count_ones() * ys.count_ones()) as usize);
        for x in (0..64).filter(|x| xs & (1 << x) != 0) {
            for y in (0..64).filter(|y| ys & (1 << y) != 0) {
                buckets.push(Self::bucket(x, y));
            }
        }
        buckets
    }

    fn shading_match(&self, a: &Vertex, b: &Vertex) -> bool {
        smoothing_compatible(a.smoothing_group, b.smoothing_group)
            && a.material_id == b.material_id
            && vec3_approx_eq(a.position, b.position, self.epsilon)
    }

    fn full_match(&self, a: &Vertex, b: &Vertex) -> VertexMatch {
        let eps = self.epsilon;

        if a.material_id != b.material_id || a.bone_index != b.bone_index {
            return VertexMatch::None;
        }
        if !vec3_approx_eq(a.position, b.position, eps) {
            return VertexMatch::None;
        }
        if self.match_normals {
            if !vec3_approx_eq(a.normal, b.normal, eps) {
                return VertexMatch::None;
            }
        } else if !smoothing_compatible(a.smoothing_group, b.smoothing_group) {
            return VertexMatch::None;
        }

        let passes = a.passes.iter().zip(&b.passes).take(self.pass_count);
        for (pa, pb) in passes.clone() {
            if !vec3_approx_eq(pa.diffuse_color, pb.diffuse_color, eps)
                || !vec3_approx_eq(pa.specular_color, pb.specular_color, eps)
                || !vec3_approx_eq(pa.diffuse_illumination, pb.diffuse_illumination, eps)
                || !approx_eq(pa.alpha, pb.alpha, eps)
                || pa.vertex_material_index != pb.vertex_material_index
            {
                return VertexMatch::None;
            }
        }

        for (pa, pb) in passes {
            for stage in 0..MAX_STAGES {
                if !vec2_approx_eq(pa.tex_coords[stage], pb.tex_coords[stage], eps) {
                    return VertexMatch::UvOnly;
                }
            }
        }

        VertexMatch::Full
    }
}

/// Smoothing groups are compatible when they share a bit or are identical
/// (so two ungrouped vertices also count as compatible).
pub(crate) fn smoothing_compatible(a: u32, b: u32) -> bool {
    (a & b) != 0 || a == b
}
