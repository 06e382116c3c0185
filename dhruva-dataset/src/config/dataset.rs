//! Top-level DatasetConfig.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::PolicyConfig;

use super::error::ConfigLoadError;
use super::sections::{
    InputSection, LoopMarker, OutputSection, RegistrationSection, ReviewSection,
};

/// Full generator configuration loaded from TOML
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DatasetConfig {
    #[serde(default)]
    pub output: OutputSection,

    #[serde(default)]
    pub input: InputSection,

    #[serde(default)]
    pub registration: RegistrationSection,

    #[serde(default)]
    pub review: ReviewSection,

    /// Failure handling per error kind
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Loop signals by scan index
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loop_markers: Vec<LoopMarker>,
}

impl DatasetConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigLoadError::Io(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigLoadError> {
        basic_toml::from_str(contents).map_err(|e| ConfigLoadError::Parse(e.to_string()))
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String, ConfigLoadError> {
        basic_toml::to_string(self).map_err(|e| ConfigLoadError::Parse(e.to_string()))
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.input.keep_one_out_of == 0 {
            return Err(ConfigLoadError::Invalid(
                "input.keep_one_out_of must be at least 1".to_string(),
            ));
        }
        if self.output.suffix_width == 0 {
            return Err(ConfigLoadError::Invalid(
                "output.suffix_width must be at least 1".to_string(),
            ));
        }
        let perturbation = self.review.perturbation_rad;
        if perturbation.is_nan() || perturbation <= 0.0 {
            return Err(ConfigLoadError::Invalid(format!(
                "review.perturbation_rad must be positive, got {}",
                perturbation
            )));
        }
        if !(0.0..1.0).contains(&self.registration.outlier_ratio) {
            return Err(ConfigLoadError::Invalid(format!(
                "registration.outlier_ratio must be in [0, 1), got {}",
                self.registration.outlier_ratio
            )));
        }
        Ok(())
    }
}
