//! Error types for the static mesher.

use thiserror::Error;

/// Result type alias using MesherError.
pub type Result<T> = std::result::Result<T, MesherError>;

/// Main error type for mesh building operations.
///
/// Misuse of a live [`MeshBuilder`](crate::MeshBuilder) (reading before a build,
/// writing after one, out-of-range channel or index arguments) is a caller bug
/// and panics instead of producing one of these.
#[derive(Error, Debug)]
pub enum MesherError {
    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Builder configuration outside its legal ranges.
    #[error("Invalid builder configuration: {0}")]
    InvalidConfig(String),

    /// Mesh description that cannot be turned into faces.
    #[error("Invalid mesh input: {0}")]
    InvalidInput(String),

    /// Failed to export mesh.
    #[error("Export error: {0}")]
    Export(String),
}
