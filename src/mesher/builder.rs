//! The mesh builder state machine.

use crate::error::{MesherError, Result};
use crate::mesher::dedup::VertexDeduplicator;
use crate::mesher::degenerate::remove_degenerate_faces;
use crate::mesher::geometry::{Face, Vertex, MAX_STAGES};
use crate::mesher::normals::{
    compute_face_normals, compute_vertex_normals, verify_face_normals, SharedSmoothing,
};
use crate::mesher::sort::{sort_faces_by_material, sort_vertices, OrderingChannel};
use crate::mesher::stats::MeshStats;
use crate::mesher::strip::{build_strips, Strip};
use crate::mesher::BuilderConfig;
use crate::types::{BoundingBox, BoundingSphere};
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    AcceptingInput,
    Processed,
}

/// Collects faces and turns them into an optimized, strip-ordered mesh.
///
/// A builder starts out accepting faces. [`build_mesh`](Self::build_mesh)
/// runs the whole pipeline once and moves it to the processed state, after
/// which only the read accessors may be used.
///
/// # Panics
///
/// Every public method panics when called in the wrong state, and the
/// indexed accessors panic on out-of-range indices.
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    config: BuilderConfig,
    channel: OrderingChannel,
    state: BuildState,
    faces: Vec<Face>,
    vertices: Vec<Vertex>,
    strips: Vec<Strip>,
    stats: MeshStats,
}

impl MeshBuilder {
    /// Create an empty builder after validating `config`.
    pub fn new(config: BuilderConfig) -> Result<Self> {
        config.validate()?;
        let mut faces = Vec::new();
        faces.try_reserve_exact(config.face_count_guess).map_err(|e| {
            MesherError::InvalidConfig(format!(
                "face count guess {} cannot be allocated: {}",
                config.face_count_guess, e
            ))
        })?;
        Ok(Self {
            channel: config.ordering_channel(),
            state: BuildState::AcceptingInput,
            faces,
            vertices: Vec::new(),
            strips: Vec::new(),
            stats: MeshStats::default(),
            config,
        })
    }

    /// Discard everything and start accepting faces again.
    pub fn reset(&mut self, config: BuilderConfig) -> Result<()> {
        *self = Self::new(config)?;
        Ok(())
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn is_processed(&self) -> bool {
        self.state == BuildState::Processed
    }

    fn expect_input(&self) {
        assert!(
            self.state == BuildState::AcceptingInput,
            "mesh builder has already been built"
        );
    }

    fn expect_processed(&self) {
        assert!(
            self.state == BuildState::Processed,
            "mesh builder has not been built yet"
        );
    }

    /// Append a face and return its insertion index.
    ///
    /// The face's plane is computed from its corners and its smoothing group
    /// is copied onto each corner.
    pub fn add_face(&mut self, mut face: Face) -> usize {
        self.expect_input();

        if self.faces.len() == self.faces.capacity()
            && self.faces.try_reserve_exact(self.config.face_count_growth_rate).is_err()
        {
            self.faces.reserve(1);
        }

        let index = self.faces.len();
        face.compute_plane();
        for corner in &mut face.verts {
            corner.smoothing_group = face.smoothing_group;
        }
        face.add_index = index as u32;
        self.faces.push(face);
        index
    }

    /// Select the (pass, stage) texture index that orders faces and bounds strips.
    pub fn set_polygon_ordering_channel(&mut self, pass: usize, stage: usize) {
        self.expect_input();
        assert!(
            pass < self.config.pass_count,
            "ordering pass {} out of range (pass count {})",
            pass,
            self.config.pass_count
        );
        assert!(stage < MAX_STAGES, "ordering stage {} out of range", stage);

        self.config.ordering_pass = pass;
        self.config.ordering_stage = stage;
        self.channel = OrderingChannel::new(pass, stage);
    }

    /// Run the optimize pipeline.
    pub fn build_mesh(&mut self, compute_normals: bool) {
        self.build_mesh_with_smoothing(compute_normals, None);
    }

    /// Run the optimize pipeline, blending normals with `shared` when it
    /// reports smoothed meshes.
    pub fn build_mesh_with_smoothing(
        &mut self,
        compute_normals: bool,
        shared: Option<&dyn SharedSmoothing>,
    ) {
        self.expect_input();
        let mut faces = std::mem::take(&mut self.faces);
        let input_faces = faces.len();

        let (min, max) = BoundingBox::from_points(corner_positions(&faces))
            .map(|bounds| (bounds.min_vec(), bounds.max_vec()))
            .unwrap_or((Vec3::ZERO, Vec3::ZERO));

        let mut dedup = VertexDeduplicator::new(
            input_faces * 3,
            self.config.pass_count,
            !compute_normals,
            self.config.epsilon,
        );
        dedup.set_bounds(min, max);
        for face in &mut faces {
            face.vert_indices = face.verts.map(|corner| dedup.submit(&corner));
        }
        dedup.propagate_shared_smoothing_groups();
        let uv_splits = dedup.uv_splits();
        let mut vertices = dedup.into_vertices();
        log::debug!(
            "Welded {} corners into {} vertices ({} UV splits)",
            input_faces * 3,
            vertices.len(),
            uv_splits
        );

        let (mut faces, report) = remove_degenerate_faces(faces);
        log::debug!(
            "Removed {} degenerate and {} duplicate faces",
            report.degenerate,
            report.duplicate
        );

        compute_face_normals(&mut faces, &vertices);
        if compute_normals {
            compute_vertex_normals(&mut vertices, &faces, shared);
        }

        let mut stats = MeshStats::compute(&faces, &vertices, self.config.pass_count);
        stats.uv_split_count = uv_splits;
        stats.degenerate_faces_removed = report.degenerate;
        stats.duplicate_faces_removed = report.duplicate;

        sort_faces_by_material(&mut faces, self.channel);
        let vertices = sort_vertices(vertices, &mut faces);

        let result = build_strips(faces, vertices.len(), self.channel);
        stats.apply_strip_stats(&result.stats);

        stats.normal_mismatches =
            verify_face_normals(&result.faces, &vertices, self.config.normal_tolerance);
        if stats.normal_mismatches > 0 {
            log::warn!(
                "{} of {} faces disagree with their plane normal after optimization",
                stats.normal_mismatches,
                result.faces.len()
            );
        }

        self.faces = result.faces;
        self.vertices = vertices;
        self.strips = result.strips;
        self.stats = stats;
        self.state = BuildState::Processed;
    }

    pub fn vertex(&self, index: usize) -> &Vertex {
        self.expect_processed();
        assert!(index < self.vertices.len(), "vertex index {} out of range", index);
        &self.vertices[index]
    }

    pub fn face(&self, index: usize) -> &Face {
        self.expect_processed();
        assert!(index < self.faces.len(), "face index {} out of range", index);
        &self.faces[index]
    }

    pub fn vertex_count(&self) -> usize {
        self.expect_processed();
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.expect_processed();
        self.faces.len()
    }

    pub fn vertices(&self) -> &[Vertex] {
        self.expect_processed();
        &self.vertices
    }

    /// Faces in strip order.
    pub fn faces(&self) -> &[Face] {
        self.expect_processed();
        &self.faces
    }

    pub fn strips(&self) -> &[Strip] {
        self.expect_processed();
        &self.strips
    }

    pub fn mesh_stats(&self) -> &MeshStats {
        self.expect_processed();
        &self.stats
    }

    /// Axis-aligned box over the current vertices: the raw face corners
    /// before the build, the unique vertices after it. `None` when empty.
    pub fn compute_bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.current_positions().into_iter())
    }

    /// Approximate bounding sphere over the same vertices as
    /// [`compute_bounding_box`](Self::compute_bounding_box).
    pub fn compute_bounding_sphere(&self) -> Option<BoundingSphere> {
        BoundingSphere::from_points(&self.current_positions())
    }

    fn current_positions(&self) -> Vec<Vec3> {
        match self.state {
            BuildState::AcceptingInput => corner_positions(&self.faces).collect(),
            BuildState::Processed => self.vertices.iter().map(|v| v.position).collect(),
        }
    }
}

fn corner_positions(faces: &[Face]) -> impl Iterator<Item = Vec3> + '_ {
    faces
        .iter()
        .flat_map(|face| face.verts.iter().map(|corner| corner.position))
}
