//! Material ordering of faces and bone/material ordering of vertices.

use crate::mesher::geometry::{Face, Vertex};

/// Channel whose texture index orders faces and separates strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderingChannel {
    pub pass: usize,
    pub stage: usize,
}

impl OrderingChannel {
    pub fn new(pass: usize, stage: usize) -> Self {
        Self { pass, stage }
    }

    /// Material key of a face on this channel.
    #[inline]
    pub fn key(&self, face: &Face) -> Option<u32> {
        face.texture_index[self.pass][self.stage]
    }
}

/// Stable sort of faces by their material key; untextured faces come first.
pub fn sort_faces_by_material(faces: &mut [Face], channel: OrderingChannel) {
    faces.sort_by_key(|face| channel.key(face));
}

/// Reorder vertices by bone index, then by pass-0 vertex material, and rewrite
/// face indices and shading links to match.
pub fn sort_vertices(vertices: Vec<Vertex>, faces: &mut [Face]) -> Vec<Vertex> {
    let mut order: Vec<usize> = (0..vertices.len()).collect();
    order.sort_by_key(|&i| {
        let v = &vertices[i];
        (v.bone_index, v.passes[0].vertex_material_index)
    });

    let mut remap = vec![0u32; vertices.len()];
    for (new_index, &old_index) in order.iter().enumerate() {
        remap[old_index] = new_index as u32;
    }

    let sorted = order
        .iter()
        .enumerate()
        .map(|(new_index, &old_index)| {
            let mut vertex = vertices[old_index];
            vertex.unique_index = Some(new_index as u32);
            vertex.shade_index = remap[vertex.shade_index as usize];
            vertex.next_hash = None;
            vertex
        })
        .collect();

    for face in faces {
        face.vert_indices = face.vert_indices.map(|i| remap[i as usize]);
    }

    sorted
}
