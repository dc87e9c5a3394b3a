//! Static mesh building.
//!
//! Faces go into a [`MeshBuilder`]; one call to
//! [`MeshBuilder::build_mesh`] welds their corners, drops degenerate and
//! duplicate faces, computes normals, sorts by material and reorders the
//! result into triangle strips.

pub mod builder;
pub mod dedup;
pub mod degenerate;
pub mod geometry;
pub mod normals;
pub mod sort;
pub mod stats;
pub mod strip;

pub use builder::MeshBuilder;
pub use geometry::{Face, Vertex, VertexPass, MAX_PASSES, MAX_STAGES};
pub use normals::{SharedNormalTable, SharedSmoothing};
pub use sort::OrderingChannel;
pub use stats::MeshStats;
pub use strip::{Strip, StripStats};

use crate::error::{MesherError, Result};
use crate::types::EPSILON;
use serde::{Deserialize, Serialize};

/// Mesh builder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Number of rendering passes in use (1 to [`MAX_PASSES`]).
    pub pass_count: usize,
    /// Initial face capacity.
    pub face_count_guess: usize,
    /// Faces added to the capacity whenever it runs out.
    pub face_count_growth_rate: usize,
    /// Pass whose texture index orders faces and bounds strips.
    pub ordering_pass: usize,
    /// Stage whose texture index orders faces and bounds strips.
    pub ordering_stage: usize,
    /// Tolerance for vertex welding.
    pub epsilon: f32,
    /// Tolerance for the post-build face normal check.
    pub normal_tolerance: f32,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            pass_count: 1,
            face_count_guess: 256,
            face_count_growth_rate: 64,
            ordering_pass: 0,
            ordering_stage: 0,
            epsilon: EPSILON,
            normal_tolerance: 1e-3,
        }
    }
}

impl BuilderConfig {
    pub fn with_pass_count(mut self, pass_count: usize) -> Self {
        self.pass_count = pass_count;
        self
    }

    pub fn with_face_count_guess(mut self, guess: usize) -> Self {
        self.face_count_guess = guess;
        self
    }

    pub fn with_face_count_growth_rate(mut self, rate: usize) -> Self {
        self.face_count_growth_rate = rate;
        self
    }

    pub fn with_ordering_channel(mut self, pass: usize, stage: usize) -> Self {
        self.ordering_pass = pass;
        self.ordering_stage = stage;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_normal_tolerance(mut self, tolerance: f32) -> Self {
        self.normal_tolerance = tolerance;
        self
    }

    pub fn ordering_channel(&self) -> OrderingChannel {
        OrderingChannel::new(self.ordering_pass, self.ordering_stage)
    }

    /// Check every field against its legal range.
    pub fn validate(&self) -> Result<()> {
        if self.pass_count == 0 || self.pass_count > MAX_PASSES {
            return Err(MesherError::InvalidConfig(format!(
                "pass count {} must be between 1 and {}",
                self.pass_count, MAX_PASSES
            )));
        }
        if self.ordering_pass >= self.pass_count || self.ordering_stage >= MAX_STAGES {
            return Err(MesherError::InvalidConfig(format!(
                "ordering channel ({}, {}) outside {} passes x {} stages",
                self.ordering_pass, self.ordering_stage, self.pass_count, MAX_STAGES
            )));
        }
        if self.face_count_growth_rate == 0 {
            return Err(MesherError::InvalidConfig(
                "face count growth rate must be positive".to_string(),
            ));
        }
        let valid_tolerance = |t: f32| t.is_finite() && t >= 0.0;
        if !valid_tolerance(self.epsilon) || !valid_tolerance(self.normal_tolerance) {
            return Err(MesherError::InvalidConfig(
                "tolerances must be non-negative numbers".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BuilderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pass_count, 1);
        assert_eq!(config.face_count_guess, 256);
        assert_eq!(config.face_count_growth_rate, 64);
        assert_eq!(config.ordering_channel(), OrderingChannel::default());
    }

    #[test]
    fn test_invalid_pass_count() {
        assert!(BuilderConfig::default().with_pass_count(0).validate().is_err());
        assert!(BuilderConfig::default().with_pass_count(5).validate().is_err());
        assert!(BuilderConfig::default().with_pass_count(4).validate().is_ok());
    }

    #[test]
    fn test_invalid_ordering_channel() {
        let config = BuilderConfig::default().with_ordering_channel(1, 0);
        assert!(matches!(config.validate(), Err(MesherError::InvalidConfig(_))));
        let config = BuilderConfig::default().with_ordering_channel(0, 2);
        assert!(config.validate().is_err());
        let config = BuilderConfig::default().with_pass_count(2).with_ordering_channel(1, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_growth_and_tolerance() {
        assert!(BuilderConfig::default().with_face_count_growth_rate(0).validate().is_err());
        assert!(BuilderConfig::default().with_epsilon(-1.0).validate().is_err());
        assert!(BuilderConfig::default().with_normal_tolerance(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        assert!(MeshBuilder::new(BuilderConfig::default().with_pass_count(9)).is_err());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: BuilderConfig = serde_json::from_str(r#"{"pass_count": 2}"#).unwrap();
        assert_eq!(config.pass_count, 2);
        assert_eq!(config.face_count_growth_rate, 64);
    }

    #[test]
    fn test_huge_face_count_guess_from_json() {
        let config: BuilderConfig =
            serde_json::from_str(r#"{"face_count_guess": 18446744073709551615}"#).unwrap();
        assert!(matches!(MeshBuilder::new(config), Err(MesherError::InvalidConfig(_))));
    }
}
