//! JSON mesh descriptions.
//!
//! A description lists faces with their corners and per-pass attributes.
//! Every field except corner positions is optional:
//!
//! ```json
//! {
//!   "pass_count": 1,
//!   "faces": [
//!     {
//!       "smoothing_group": 1,
//!       "passes": [{ "textures": [0, null] }],
//!       "corners": [
//!         { "position": [0, 0, 0], "passes": [{ "uvs": [[0, 0]] }] },
//!         { "position": [1, 0, 0], "passes": [{ "uvs": [[1, 0]] }] },
//!         { "position": [0, 1, 0], "passes": [{ "uvs": [[0, 1]] }] }
//!       ]
//!     }
//!   ]
//! }
//! ```

use crate::error::{MesherError, Result};
use crate::mesher::{BuilderConfig, Face, MeshBuilder, Vertex, MAX_PASSES, MAX_STAGES};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A complete mesh to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDescription {
    #[serde(default = "default_pass_count")]
    pub pass_count: usize,
    /// Ordering channel as `[pass, stage]`; defaults to `[0, 0]`.
    #[serde(default)]
    pub ordering: Option<[usize; 2]>,
    pub faces: Vec<FaceDescription>,
}

/// One triangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDescription {
    pub corners: [CornerDescription; 3],
    #[serde(default)]
    pub smoothing_group: u32,
    /// Texture and shader indices, one entry per pass.
    #[serde(default)]
    pub passes: Vec<FacePassDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacePassDescription {
    #[serde(default)]
    pub textures: [Option<u32>; MAX_STAGES],
    #[serde(default)]
    pub shader: Option<u32>,
}

/// One face corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerDescription {
    pub position: [f32; 3],
    #[serde(default)]
    pub normal: Option<[f32; 3]>,
    #[serde(default)]
    pub material_id: u32,
    #[serde(default)]
    pub bone: u32,
    #[serde(default)]
    pub passes: Vec<CornerPassDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerPassDescription {
    /// Texture coordinates, one per stage.
    #[serde(default)]
    pub uvs: Vec<[f32; 2]>,
    #[serde(default = "default_diffuse")]
    pub diffuse: [f32; 3],
    #[serde(default)]
    pub specular: [f32; 3],
    #[serde(default)]
    pub illumination: [f32; 3],
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default)]
    pub vertex_material: Option<u32>,
}

fn default_pass_count() -> usize {
    1
}

fn default_diffuse() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_alpha() -> f32 {
    1.0
}

/// Load a mesh description from a JSON file.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<MeshDescription> {
    let json = std::fs::read_to_string(path)?;
    load_from_str(&json)
}

/// Parse a mesh description from JSON text.
pub fn load_from_str(json: &str) -> Result<MeshDescription> {
    Ok(serde_json::from_str(json)?)
}

impl MeshDescription {
    /// Builder configuration implied by this description.
    pub fn config(&self) -> BuilderConfig {
        let [pass, stage] = self.ordering.unwrap_or([0, 0]);
        BuilderConfig::default()
            .with_pass_count(self.pass_count)
            .with_face_count_guess(self.faces.len().max(1))
            .with_ordering_channel(pass, stage)
    }

    /// Validate the description and add every face to a fresh builder.
    pub fn into_builder(self) -> Result<MeshBuilder> {
        let config = self.config();
        self.into_builder_with(config)
    }

    /// Like [`into_builder`](Self::into_builder) with an explicit configuration.
    pub fn into_builder_with(self, config: BuilderConfig) -> Result<MeshBuilder> {
        let pass_count = config.pass_count;
        let mut builder = MeshBuilder::new(config)?;
        for (index, face) in self.faces.iter().enumerate() {
            builder.add_face(face.to_face(index, pass_count)?);
        }
        log::debug!("Loaded {} faces into builder", self.faces.len());
        Ok(builder)
    }
}

impl FaceDescription {
    fn to_face(&self, index: usize, pass_count: usize) -> Result<Face> {
        if self.passes.len() > pass_count {
            return Err(MesherError::InvalidInput(format!(
                "face {} has {} passes, mesh uses {}",
                index,
                self.passes.len(),
                pass_count
            )));
        }

        let mut corners = [Vertex::default(); 3];
        for (corner, description) in corners.iter_mut().zip(&self.corners) {
            *corner = description
                .to_vertex(pass_count)
                .map_err(|reason| MesherError::InvalidInput(format!("face {}: {}", index, reason)))?;
        }

        let mut face = Face::new(corners).with_smoothing_group(self.smoothing_group);
        for (pass, description) in self.passes.iter().enumerate() {
            face.texture_index[pass] = description.textures;
            face.shader_index[pass] = description.shader;
        }
        Ok(face)
    }
}

impl CornerDescription {
    fn to_vertex(&self, pass_count: usize) -> std::result::Result<Vertex, String> {
        let position = Vec3::from_array(self.position);
        if !position.is_finite() {
            return Err(format!("non-finite corner position {:?}", self.position));
        }
        if self.passes.len() > pass_count.min(MAX_PASSES) {
            return Err(format!(
                "corner has {} passes, mesh uses {}",
                self.passes.len(),
                pass_count
            ));
        }

        let mut vertex = Vertex::new(position)
            .with_material_id(self.material_id)
            .with_bone(self.bone);
        if let Some(normal) = self.normal {
            vertex = vertex.with_normal(Vec3::from_array(normal));
        }

        for (layer, description) in vertex.passes.iter_mut().zip(&self.passes) {
            if description.uvs.len() > MAX_STAGES {
                return Err(format!(
                    "corner has {} texture stages, at most {} are supported",
                    description.uvs.len(),
                    MAX_STAGES
                ));
            }
            for (slot, uv) in layer.tex_coords.iter_mut().zip(&description.uvs) {
                *slot = Vec2::from_array(*uv);
            }
            layer.diffuse_color = Vec3::from_array(description.diffuse);
            layer.specular_color = Vec3::from_array(description.specular);
            layer.diffuse_illumination = Vec3::from_array(description.illumination);
            layer.alpha = description.alpha;
            layer.vertex_material_index = description.vertex_material;
        }
        Ok(vertex)
    }
}
