//! Triangle strip generation.
//!
//! Faces are linked through a winged-edge table: every undirected edge records
//! the (at most two) faces of the same material on either side of it. Strips
//! are then grown greedily from a start face, always continuing across the
//! trailing edge, until every face has been placed exactly once.

use crate::mesher::geometry::Face;
use crate::mesher::sort::OrderingChannel;
use serde::Serialize;

const EDGE_HASH_SIZE: usize = 512;

/// An undirected edge and the faces on either side of it.
#[derive(Debug, Clone)]
struct WingedEdge {
    /// Vertex indices, low first.
    verts: [u32; 2],
    material: Option<u32>,
    faces: [Option<u32>; 2],
    /// Next edge in the same hash bucket.
    next: Option<u32>,
}

impl WingedEdge {
    /// The face across this edge from `face`.
    fn other(&self, face: u32) -> Option<u32> {
        match self.faces {
            [Some(a), b] if a == face => b,
            [a, Some(b)] if b == face => a,
            _ => None,
        }
    }
}

/// Arena of winged edges with chained hash buckets.
struct EdgeTable {
    heads: Vec<Option<u32>>,
    edges: Vec<WingedEdge>,
}

impl EdgeTable {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            heads: vec![None; EDGE_HASH_SIZE],
            edges: Vec::with_capacity(capacity),
        }
    }

    /// Record that `face` owns the edge `a`-`b`; returns the edge slot.
    fn add(&mut self, a: u32, b: u32, material: Option<u32>, face: u32) -> u32 {
        let verts = [a.min(b), a.max(b)];
        let bucket = edge_hash(verts, material);

        let mut cursor = self.heads[bucket];
        while let Some(index) = cursor {
            let edge = &mut self.edges[index as usize];
            if edge.verts == verts && edge.material == material && edge.faces[1].is_none() {
                edge.faces[1] = Some(face);
                return index;
            }
            cursor = edge.next;
        }

        let index = self.edges.len() as u32;
        self.edges.push(WingedEdge {
            verts,
            material,
            faces: [Some(face), None],
            next: self.heads[bucket],
        });
        self.heads[bucket] = Some(index);
        index
    }
}

fn edge_hash(verts: [u32; 2], material: Option<u32>) -> usize {
    let material = material.unwrap_or(u32::MAX);
    let mixed = verts[0].wrapping_mul(0x9E37_79B9)
        ^ verts[1].wrapping_mul(0x85EB_CA6B)
        ^ material.wrapping_mul(0xC2B2_AE35);
    mixed as usize % EDGE_HASH_SIZE
}

/// One triangle strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Strip {
    /// Material key shared by every face of the strip.
    pub material: Option<u32>,
    /// Vertex indices in strip order; triangle `k` uses `indices[k..k + 3]`,
    /// with the first two swapped on odd `k`.
    pub indices: Vec<u32>,
    /// Position of the strip's first face in the reordered face array.
    pub first_face: usize,
}

impl Strip {
    pub fn face_count(&self) -> usize {
        self.indices.len().saturating_sub(2)
    }

    /// The strip expanded back into triangles with their original winding.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.windows(3).enumerate().map(|(k, w)| {
            if k % 2 == 0 {
                [w[0], w[1], w[2]]
            } else {
                [w[1], w[0], w[2]]
            }
        })
    }
}

/// Strip statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StripStats {
    pub strip_count: usize,
    /// Longest strip, in faces.
    pub max_strip_length: usize,
    /// Average strip length, in faces.
    pub avg_strip_length: f32,
}

/// Output of [`build_strips`].
#[derive(Debug, Clone)]
pub struct StripResult {
    /// Faces in strip traversal order.
    pub faces: Vec<Face>,
    pub strips: Vec<Strip>,
    pub stats: StripStats,
}

/// Greedy strip builder state.
struct StripBuilder<'a> {
    faces: &'a [Face],
    channel: OrderingChannel,
    edges: EdgeTable,
    /// Edge slots of each face; edge `i` joins corners `i` and `i + 1`.
    face_edges: Vec<[u32; 3]>,
    placed: Vec<bool>,
    vertex_time_stamp: Vec<u32>,
    /// Number of distinct vertices placed so far.
    time: u32,
}

impl<'a> StripBuilder<'a> {
    fn new(faces: &'a [Face], vertex_count: usize, channel: OrderingChannel) -> Self {
        let mut edges = EdgeTable::with_capacity(faces.len() * 3 / 2 + 1);
        let face_edges = faces
            .iter()
            .enumerate()
            .map(|(f, face)| {
                let material = channel.key(face);
                let v = face.vert_indices;
                [0, 1, 2].map(|i| edges.add(v[i], v[(i + 1) % 3], material, f as u32))
            })
            .collect();

        Self {
            faces,
            channel,
            edges,
            face_edges,
            placed: vec![false; faces.len()],
            vertex_time_stamp: vec![0; vertex_count],
            time: 0,
        }
    }

    fn neighbor(&self, face: usize, edge: usize) -> Option<usize> {
        let slot = self.face_edges[face][edge] as usize;
        self.edges.edges[slot].other(face as u32).map(|f| f as usize)
    }

    fn place(&mut self, face: usize) {
        self.placed[face] = true;
        for &v in &self.faces[face].vert_indices {
            let stamp = &mut self.vertex_time_stamp[v as usize];
            if *stamp == 0 {
                self.time += 1;
                *stamp = self.time;
            }
        }
    }

    /// Lower is better: penalizes edges bordering placed faces and vertices
    /// that have not been touched recently.
    fn start_cost(&self, face: usize) -> u64 {
        let mut cost = 0u64;
        for edge in 0..3 {
            if self.neighbor(face, edge).is_some_and(|n| self.placed[n]) {
                cost += u64::from(self.time) + 1;
            }
        }
        for &v in &self.faces[face].vert_indices {
            cost += u64::from(self.time - self.vertex_time_stamp[v as usize]);
        }
        cost
    }

    /// Pick the next start face, preferring the previous strip's material.
    fn select_start(&self, from: usize, material: Option<u32>) -> Option<usize> {
        for same_material_only in [true, false] {
            let mut best: Option<(usize, u64)> = None;
            for face in from..self.faces.len() {
                if self.placed[face] {
                    continue;
                }
                if same_material_only && self.channel.key(&self.faces[face]) != material {
                    continue;
                }
                let cost = self.start_cost(face);
                if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                    best = Some((face, cost));
                }
            }
            if let Some((face, _)) = best {
                return Some(face);
            }
        }
        None
    }

    /// Whether `face` can continue a strip whose triangle `k` spans `a`, `b`
    /// and the new vertex without changing its winding.
    fn continues_winding(&self, face: usize, a: u32, b: u32, k: usize) -> bool {
        let (first, second) = if k % 2 == 0 { (a, b) } else { (b, a) };
        let v = self.faces[face].vert_indices;
        (0..3).any(|j| v[j] == first && v[(j + 1) % 3] == second)
    }

    /// Unplaced face across `face`'s edge `a`-`b` that keeps the winding for triangle `k`.
    fn next_face(&self, face: usize, a: u32, b: u32, k: usize) -> Option<usize> {
        let verts = [a.min(b), a.max(b)];
        (0..3)
            .filter(|&edge| self.edges.edges[self.face_edges[face][edge] as usize].verts == verts)
            .filter_map(|edge| self.neighbor(face, edge))
            .find(|&n| !self.placed[n] && self.continues_winding(n, a, b, k))
    }

    /// Grow a strip from `start`, returning its vertex sequence and the
    /// faces it covers in order.
    fn grow(&mut self, start: usize) -> (Vec<u32>, Vec<usize>) {
        let v = self.faces[start].vert_indices;

        // Rotate so an edge with a usable neighbour trails the first triangle
        let seed = (0..3)
            .find(|&i| {
                self.neighbor(start, i).is_some_and(|n| {
                    !self.placed[n] && n != start && self.continues_winding(n, v[i], v[(i + 1) % 3], 1)
                })
            })
            .map_or(v, |i| [v[(i + 2) % 3], v[i], v[(i + 1) % 3]]);

        self.place(start);
        let mut indices = seed.to_vec();
        let mut covered = vec![start];
        let mut current = start;

        loop {
            let len = indices.len();
            let k = len - 2;
            let (a, b) = (indices[len - 2], indices[len - 1]);
            let Some(next) = self.next_face(current, a, b, k) else {
                break;
            };

            let third = self.faces[next]
                .vert_indices
                .into_iter()
                .find(|&x| x != a && x != b);
            let Some(third) = third else {
                break;
            };

            self.place(next);
            indices.push(third);
            covered.push(next);
            current = next;
        }

        (indices, covered)
    }
}

/// Reorder faces into triangle strips.
///
/// `faces` must be free of degenerate triangles and sorted by the channel's
/// material key. Faces keep their metadata; only their corner order is
/// rotated to match the strip, which never changes their winding.
pub fn build_strips(faces: Vec<Face>, vertex_count: usize, channel: OrderingChannel) -> StripResult {
    let mut builder = StripBuilder::new(&faces, vertex_count, channel);
    let mut strips = Vec::new();
    let mut pre_map = Vec::with_capacity(faces.len());
    let mut ordered_indices = Vec::with_capacity(faces.len());

    let mut material = faces.first().and_then(|f| channel.key(f));
    let mut first_unplaced = 0;

    loop {
        while first_unplaced < faces.len() && builder.placed[first_unplaced] {
            first_unplaced += 1;
        }
        let Some(start) = builder.select_start(first_unplaced, material) else {
            break;
        };
        material = channel.key(&faces[start]);

        let (indices, covered) = builder.grow(start);
        let strip = Strip {
            material,
            indices,
            first_face: pre_map.len(),
        };
        ordered_indices.extend(strip.triangles());
        pre_map.extend(covered);
        strips.push(strip);
    }

    let reordered: Vec<Face> = pre_map
        .iter()
        .zip(ordered_indices)
        .map(|(&original, indices)| {
            let mut face = faces[original].clone();
            debug_assert!(same_winding(face.vert_indices, indices));
            face.vert_indices = indices;
            face
        })
        .collect();

    for strip in &strips {
        let range = strip.first_face..strip.first_face + strip.face_count();
        debug_assert!(reordered[range].iter().all(|f| channel.key(f) == strip.material));
    }

    let stats = strip_stats(&strips);
    log::debug!(
        "Built {} strips over {} faces (max {}, avg {:.2})",
        stats.strip_count,
        reordered.len(),
        stats.max_strip_length,
        stats.avg_strip_length
    );

    StripResult {
        faces: reordered,
        strips,
        stats,
    }
}

fn strip_stats(strips: &[Strip]) -> StripStats {
    let mut stats = StripStats::default();
    for strip in strips {
        let length = strip.face_count();
        stats.strip_count += 1;
        stats.max_strip_length = stats.max_strip_length.max(length);
        stats.avg_strip_length += (length as f32 - stats.avg_strip_length) / stats.strip_count as f32;
    }
    stats
}

/// Whether two index triples describe the same triangle with the same winding.
fn same_winding(a: [u32; 3], b: [u32; 3]) -> bool {
    (0..3).any(|r| a == [b[r], b[(r + 1) % 3], b[(r + 2) % 3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::geometry::Vertex;
    use std::collections::HashSet;

    fn face(indices: [u32; 3], material: u32) -> Face {
        let mut face = Face::new([Vertex::default(); 3]);
        face.vert_indices = indices;
        face.texture_index[0][0] = Some(material);
        face
    }

    /// Two-triangles-per-cell grid with consistent counter-clockwise winding.
    fn grid(cells: u32, material_of: impl Fn(u32, u32) -> u32) -> (Vec<Face>, usize) {
        let row = cells + 1;
        let mut faces = Vec::new();
        for y in 0..cells {
            for x in 0..cells {
                let a = y * row + x;
                let b = a + 1;
                let c = a + row + 1;
                let d = a + row;
                let m = material_of(x, y);
                faces.push(face([a, b, c], m));
                faces.push(face([a, c, d], m));
            }
        }
        faces.sort_by_key(|f| f.texture_index[0][0]);
        (faces, (row * row) as usize)
    }

    fn check_cover(input: &[Face], result: &StripResult) {
        assert_eq!(result.faces.len(), input.len());

        let expected: HashSet<[u32; 3]> = input.iter().map(|f| canonical(f.vert_indices)).collect();
        let produced: HashSet<[u32; 3]> = result.faces.iter().map(|f| canonical(f.vert_indices)).collect();
        assert_eq!(expected, produced);

        let from_strips: Vec<[u32; 3]> = result.strips.iter().flat_map(|s| s.triangles()).collect();
        let reordered: Vec<[u32; 3]> = result.faces.iter().map(|f| f.vert_indices).collect();
        assert_eq!(from_strips, reordered);
    }

    fn canonical(v: [u32; 3]) -> [u32; 3] {
        (0..3)
            .map(|r| [v[r], v[(r + 1) % 3], v[(r + 2) % 3]])
            .min()
            .unwrap()
    }

    #[test]
    fn test_single_face() {
        let faces = vec![face([0, 1, 2], 0)];
        let result = build_strips(faces.clone(), 3, OrderingChannel::default());
        assert_eq!(result.strips.len(), 1);
        assert_eq!(result.strips[0].indices, vec![0, 1, 2]);
        assert_eq!(result.stats.max_strip_length, 1);
        check_cover(&faces, &result);
    }

    #[test]
    fn test_quad_is_one_strip() {
        let faces = vec![face([0, 1, 2], 0), face([0, 2, 3], 0)];
        let result = build_strips(faces.clone(), 4, OrderingChannel::default());
        assert_eq!(result.stats.strip_count, 1);
        assert_eq!(result.stats.max_strip_length, 2);
        assert_eq!(result.strips[0].indices.len(), 4);
        assert_eq!(result.stats.avg_strip_length, 2.0);
        check_cover(&faces, &result);
    }

    #[test]
    fn test_materials_are_not_mixed() {
        let faces = vec![face([0, 1, 2], 0), face([0, 2, 3], 1)];
        let result = build_strips(faces.clone(), 4, OrderingChannel::default());
        assert_eq!(result.stats.strip_count, 2);
        assert_eq!(result.strips[0].material, Some(0));
        assert_eq!(result.strips[1].material, Some(1));
        check_cover(&faces, &result);
    }

    #[test]
    fn test_inconsistent_winding_breaks_strip() {
        // Second face runs the shared edge 0-2 in the same direction
        let faces = vec![face([0, 1, 2], 0), face([0, 3, 2], 0)];
        let result = build_strips(faces.clone(), 4, OrderingChannel::default());
        assert_eq!(result.stats.strip_count, 2);
        check_cover(&faces, &result);
    }

    #[test]
    fn test_grid_cover_and_winding() {
        let (faces, vertex_count) = grid(6, |_, _| 0);
        let result = build_strips(faces.clone(), vertex_count, OrderingChannel::default());
        check_cover(&faces, &result);
        assert!(result.stats.max_strip_length > 2);
        assert!(result.stats.strip_count < faces.len());
    }

    #[test]
    fn test_grid_with_material_patches() {
        let (faces, vertex_count) = grid(5, |x, y| (x / 2 + y / 3) % 3);
        let result = build_strips(faces.clone(), vertex_count, OrderingChannel::default());
        check_cover(&faces, &result);
        for strip in &result.strips {
            let range = strip.first_face..strip.first_face + strip.face_count();
            assert!(result.faces[range]
                .iter()
                .all(|f| f.texture_index[0][0] == strip.material));
        }
    }

    #[test]
    fn test_fan_around_shared_vertex() {
        // Six faces sharing vertex 0, consistently wound
        let faces: Vec<Face> = (1..=6).map(|i| face([0, i, i % 6 + 1], 0)).collect();
        let result = build_strips(faces.clone(), 7, OrderingChannel::default());
        check_cover(&faces, &result);
    }

    #[test]
    fn test_edge_shared_by_three_faces() {
        let faces = vec![face([0, 1, 2], 0), face([1, 0, 3], 0), face([1, 0, 4], 0)];
        let result = build_strips(faces.clone(), 5, OrderingChannel::default());
        check_cover(&faces, &result);
    }

    #[test]
    fn test_metadata_follows_faces() {
        let mut faces = vec![face([0, 1, 2], 0), face([0, 2, 3], 0)];
        faces[0].add_index = 10;
        faces[0].smoothing_group = 4;
        faces[1].add_index = 11;
        faces[1].shader_index[0] = Some(9);
        let result = build_strips(faces, 4, OrderingChannel::default());
        for f in &result.faces {
            match f.add_index {
                10 => assert_eq!(f.smoothing_group, 4),
                11 => assert_eq!(f.shader_index[0], Some(9)),
                other => panic!("unexpected face {}", other),
            }
        }
    }

    fn builder_after_first(faces: &[Face], vertex_count: usize) -> StripBuilder<'_> {
        let mut builder = StripBuilder::new(faces, vertex_count, OrderingChannel::default());
        builder.place(0);
        builder
    }

    #[test]
    fn test_start_prefers_recent_vertices() {
        let faces = vec![face([0, 1, 2], 0), face([3, 4, 5], 0), face([2, 6, 7], 0)];
        let builder = builder_after_first(&faces, 8);
        assert_eq!(builder.time, 3);
        assert_eq!(builder.start_cost(1), 9);
        assert_eq!(builder.start_cost(2), 6);
        assert_eq!(builder.select_start(1, Some(0)), Some(2));
    }

    #[test]
    fn test_start_defers_face_bordering_placed() {
        let faces = vec![face([0, 1, 2], 0), face([1, 0, 3], 0), face([4, 5, 6], 0)];
        let builder = builder_after_first(&faces, 7);
        // One placed neighbour costs time + 1 on top of staleness 1 + 2 + 3
        assert_eq!(builder.start_cost(1), 4 + 6);
        assert_eq!(builder.start_cost(2), 9);
        assert_eq!(builder.select_start(1, Some(0)), Some(2));
    }

    #[test]
    fn test_start_ties_keep_first() {
        let faces = vec![face([0, 1, 2], 0), face([3, 4, 5], 0), face([6, 7, 8], 0)];
        let fresh = StripBuilder::new(&faces, 9, OrderingChannel::default());
        assert_eq!(fresh.start_cost(2), 0);
        assert_eq!(fresh.select_start(0, Some(0)), Some(0));

        let builder = builder_after_first(&faces, 9);
        assert_eq!(builder.start_cost(1), builder.start_cost(2));
        assert_eq!(builder.select_start(1, Some(0)), Some(1));
    }

    #[test]
    fn test_start_material_preference_and_fallback() {
        let faces = vec![face([0, 1, 2], 0), face([2, 3, 4], 1), face([5, 6, 7], 0)];
        let mut builder = builder_after_first(&faces, 8);
        assert!(builder.start_cost(1) < builder.start_cost(2));

        // Same material wins over a cheaper face of another one
        assert_eq!(builder.select_start(1, Some(0)), Some(2));
        // Unknown material falls through to the cheapest face overall
        assert_eq!(builder.select_start(1, Some(7)), Some(1));

        // Material 0 used up
        builder.place(2);
        assert_eq!(builder.select_start(1, Some(0)), Some(1));
        builder.place(1);
        assert_eq!(builder.select_start(1, Some(1)), None);
    }

    #[test]
    fn test_strip_start_order() {
        let mut faces = vec![face([0, 1, 2], 0), face([3, 4, 5], 0), face([2, 6, 7], 0)];
        for (i, f) in faces.iter_mut().enumerate() {
            f.add_index = i as u32;
        }
        let result = build_strips(faces.clone(), 8, OrderingChannel::default());
        check_cover(&faces, &result);

        let order: Vec<u32> = result.faces.iter().map(|f| f.add_index).collect();
        assert_eq!(order, vec![0, 2, 1]);
        let starts: Vec<usize> = result.strips.iter().map(|s| s.first_face).collect();
        assert_eq!(starts, vec![0, 1, 2]);
    }

    #[test]
    fn test_strip_triangles_alternate() {
        let strip = Strip {
            material: None,
            indices: vec![0, 1, 2, 3, 4],
            first_face: 0,
        };
        let triangles: Vec<[u32; 3]> = strip.triangles().collect();
        assert_eq!(triangles, vec![[0, 1, 2], [2, 1, 3], [2, 3, 4]]);
        assert_eq!(strip.face_count(), 3);
    }

    #[test]
    fn test_empty_input() {
        let result = build_strips(Vec::new(), 0, OrderingChannel::default());
        assert!(result.faces.is_empty());
        assert!(result.strips.is_empty());
        assert_eq!(result.stats, StripStats::default());
    }
}
