//! Removal of degenerate and duplicated faces.

use crate::mesher::geometry::Face;

const FACE_HASH_BITS: u32 = 10;
const FACE_HASH_SIZE: usize = 1 << FACE_HASH_BITS;
/// 2^32 / golden ratio.
const GOLDEN_RATIO_32: u32 = 0x9E37_79B9;

/// Counts reported by [`remove_degenerate_faces`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceFilterReport {
    pub degenerate: usize,
    pub duplicate: usize,
}

/// Set of index triples with chained buckets stored in parallel arrays.
struct FaceSet {
    heads: Vec<Option<u32>>,
    next: Vec<Option<u32>>,
    keys: Vec<[u32; 3]>,
}

impl FaceSet {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            heads: vec![None; FACE_HASH_SIZE],
            next: Vec::with_capacity(capacity),
            keys: Vec::with_capacity(capacity),
        }
    }

    /// Insert a triple; returns `false` if an equal triple is already present.
    fn insert(&mut self, indices: [u32; 3]) -> bool {
        let key = canonical_rotation(indices);
        let bucket = face_hash(indices);

        let mut cursor = self.heads[bucket];
        while let Some(entry) = cursor {
            if self.keys[entry as usize] == key {
                return false;
            }
            cursor = self.next[entry as usize];
        }

        let entry = self.keys.len() as u32;
        self.keys.push(key);
        self.next.push(self.heads[bucket]);
        self.heads[bucket] = Some(entry);
        true
    }
}

/// Bucket of a face, independent of corner order.
fn face_hash(indices: [u32; 3]) -> usize {
    let mut sorted = indices;
    sorted.sort_unstable();
    let key = sorted[0]
        .wrapping_mul(31)
        .wrapping_add(sorted[1])
        .wrapping_mul(31)
        .wrapping_add(sorted[2]);
    (key.wrapping_mul(GOLDEN_RATIO_32) >> (32 - FACE_HASH_BITS)) as usize
}

/// Rotate the triple so its smallest index comes first, keeping the winding.
fn canonical_rotation([a, b, c]: [u32; 3]) -> [u32; 3] {
    if a <= b && a <= c {
        [a, b, c]
    } else if b <= a && b <= c {
        [b, c, a]
    } else {
        [c, a, b]
    }
}

/// Drop faces whose resolved indices are not pairwise distinct, and all but the
/// first copy of faces with the same indices in the same winding.
///
/// Returns a fresh, exactly sized face array.
pub fn remove_degenerate_faces(faces: Vec<Face>) -> (Vec<Face>, FaceFilterReport) {
    let mut report = FaceFilterReport::default();
    let mut seen = FaceSet::with_capacity(faces.len());
    let mut kept = Vec::with_capacity(faces.len());

    for face in faces {
        if face.is_degenerate() {
            report.degenerate += 1;
        } else if !seen.insert(face.vert_indices) {
            report.duplicate += 1;
        } else {
            kept.push(face);
        }
    }

    kept.shrink_to_fit();
    (kept, report)
}
