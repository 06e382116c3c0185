//! Default values for serde `default = "..."` attributes.

use std::path::PathBuf;

pub fn output_directory() -> PathBuf {
    PathBuf::from("dataset")
}

pub fn suffix_width() -> usize {
    4
}

pub fn keep_one_out_of() -> usize {
    1
}

pub fn enabled() -> bool {
    true
}

pub fn max_iterations() -> u32 {
    50
}

pub fn translation_epsilon() -> f64 {
    0.001
}

pub fn rotation_epsilon() -> f64 {
    0.001
}

pub fn max_correspondence_distance() -> f64 {
    0.5
}

pub fn min_correspondences() -> usize {
    10
}

pub fn outlier_ratio() -> f64 {
    0.1
}

pub fn acceptable_mse() -> f64 {
    0.01
}

pub fn profile() -> String {
    "default".to_string()
}

pub fn perturbation_rad() -> f64 {
    crate::engine::DEFAULT_PERTURBATION_RAD
}
