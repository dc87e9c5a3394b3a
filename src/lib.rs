//! # Static Mesher
//!
//! A Rust library for building render-ready static triangle meshes.
//!
//! ## Overview
//!
//! Faces are added to a [`MeshBuilder`] with full per-corner attributes.
//! Building the mesh welds equivalent corners into shared vertices, removes
//! degenerate and duplicate faces, computes plane and smoothed vertex normals,
//! sorts faces by material and vertices by bone, and reorders the faces into
//! triangle strips that never cross a material boundary.
//!
//! ## Quick Start
//!
//! ```
//! use glam::Vec3;
//! use static_mesher::{BuilderConfig, Face, MeshBuilder, MeshOutput, Vertex};
//!
//! let mut builder = MeshBuilder::new(BuilderConfig::default())?;
//! let [a, b, c, d] = [
//!     Vec3::new(0.0, 0.0, 0.0),
//!     Vec3::new(1.0, 0.0, 0.0),
//!     Vec3::new(1.0, 1.0, 0.0),
//!     Vec3::new(0.0, 1.0, 0.0),
//! ]
//! .map(Vertex::new);
//! builder.add_face(Face::new([a, b, c]));
//! builder.add_face(Face::new([a, c, d]));
//!
//! builder.build_mesh(true);
//! assert_eq!(builder.vertex_count(), 4);
//! assert_eq!(builder.strips().len(), 1);
//!
//! let output = MeshOutput::from_builder(&builder);
//! let obj = output.to_obj("quad")?;
//! # Ok::<(), static_mesher::MesherError>(())
//! ```
//!
//! ## Loading descriptions
//!
//! Meshes can also be described in JSON, see [`input`]:
//!
//! ```ignore
//! let description = static_mesher::load_mesh_description("mesh.json")?;
//! let mut builder = description.into_builder()?;
//! builder.build_mesh(true);
//! ```

pub mod error;
pub mod types;
pub mod mesher;
pub mod input;
pub mod mesh_output;
pub mod export;

// Re-export main types for convenience
pub use error::{MesherError, Result};
pub use types::{BoundingBox, BoundingSphere};
pub use mesher::{
    BuilderConfig, Face, MeshBuilder, MeshStats, OrderingChannel, SharedNormalTable,
    SharedSmoothing, Strip, Vertex, VertexPass, MAX_PASSES, MAX_STAGES,
};
pub use input::MeshDescription;
pub use mesh_output::{MaterialGroup, MeshOutput};
pub use export::obj::{export_obj, ObjExport};

/// Load a mesh description from a JSON file.
pub fn load_mesh_description<P: AsRef<std::path::Path>>(path: P) -> Result<MeshDescription> {
    input::load_from_path(path)
}
