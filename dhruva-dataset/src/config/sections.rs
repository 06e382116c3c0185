//! Configuration sections.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::algorithms::matching::IcpConfig;
use crate::engine::LoopSignal;

use super::defaults;

/// Where results are written.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputSection {
    /// Directory for clouds, odometry records and merged clouds
    #[serde(default = "defaults::output_directory")]
    pub directory: PathBuf,

    /// Zero padding of the scan index in file names
    #[serde(default = "defaults::suffix_width")]
    pub suffix_width: usize,

    /// Write `scan_NNNN_merged.ply` after every registration
    #[serde(default)]
    pub save_merged_clouds: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: defaults::output_directory(),
            suffix_width: defaults::suffix_width(),
            save_merged_clouds: false,
        }
    }
}

/// How the sensor log is consumed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputSection {
    /// Recorded bag to read (overridable from the command line)
    #[serde(default)]
    pub bag: Option<PathBuf>,

    /// Keep one point cloud out of every k
    #[serde(default = "defaults::keep_one_out_of")]
    pub keep_one_out_of: usize,

    /// Compute poses; when false only clouds are exported
    #[serde(default = "defaults::enabled")]
    pub odometry_output: bool,
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            bag: None,
            keep_one_out_of: defaults::keep_one_out_of(),
            odometry_output: true,
        }
    }
}

/// Registration engine selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationMethod {
    /// Bundled point-to-point ICP
    #[default]
    Icp,
    /// Return the raw-odometry guess unchanged
    Passthrough,
}

/// Registration engine settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrationSection {
    #[serde(default)]
    pub method: RegistrationMethod,

    /// Opaque profile identifier carried by the engine
    #[serde(default = "defaults::profile")]
    pub profile: String,

    #[serde(default = "defaults::max_iterations")]
    pub max_iterations: u32,

    /// Convergence threshold for translation (meters)
    #[serde(default = "defaults::translation_epsilon")]
    pub translation_epsilon: f64,

    /// Convergence threshold for rotation (radians)
    #[serde(default = "defaults::rotation_epsilon")]
    pub rotation_epsilon: f64,

    /// Maximum correspondence distance (meters)
    #[serde(default = "defaults::max_correspondence_distance")]
    pub max_correspondence_distance: f64,

    #[serde(default = "defaults::min_correspondences")]
    pub min_correspondences: usize,

    /// Fraction of worst correspondences rejected per iteration
    #[serde(default = "defaults::outlier_ratio")]
    pub outlier_ratio: f64,

    /// MSE accepted when the iteration limit is hit (m²)
    #[serde(default = "defaults::acceptable_mse")]
    pub acceptable_mse: f64,
}

impl Default for RegistrationSection {
    fn default() -> Self {
        Self {
            method: RegistrationMethod::Icp,
            profile: defaults::profile(),
            max_iterations: defaults::max_iterations(),
            translation_epsilon: defaults::translation_epsilon(),
            rotation_epsilon: defaults::rotation_epsilon(),
            max_correspondence_distance: defaults::max_correspondence_distance(),
            min_correspondences: defaults::min_correspondences(),
            outlier_ratio: defaults::outlier_ratio(),
            acceptable_mse: defaults::acceptable_mse(),
        }
    }
}

impl RegistrationSection {
    /// Convert to IcpConfig
    pub fn to_icp_config(&self) -> IcpConfig {
        IcpConfig {
            max_iterations: self.max_iterations,
            translation_epsilon: self.translation_epsilon,
            rotation_epsilon: self.rotation_epsilon,
            max_correspondence_distance: self.max_correspondence_distance,
            min_correspondences: self.min_correspondences,
            outlier_ratio: self.outlier_ratio,
            acceptable_mse: self.acceptable_mse,
        }
    }
}

/// Human review settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewSection {
    /// Ask for confirmation after every registration
    #[serde(default)]
    pub required: bool,

    /// Rotation about Z added to the guess per rejection (radians)
    #[serde(default = "defaults::perturbation_rad")]
    pub perturbation_rad: f64,

    /// Viewer launched on each merged cloud, e.g. `paraview`
    #[serde(default)]
    pub viewer_command: Option<String>,
}

impl Default for ReviewSection {
    fn default() -> Self {
        Self {
            required: false,
            perturbation_rad: defaults::perturbation_rad(),
            viewer_command: None,
        }
    }
}

/// A loop signal raised just before the given scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopMarker {
    pub scan_index: usize,
    pub kind: LoopSignal,
}
