//! Core foundation layer.
//!
//! This is the bottom layer of the dataset stack with no internal dependencies.
//! All other layers depend on core.
//!
//! # Contents
//!
//! - [`types`]: Core data types (rigid transforms, point clouds, odometry records)
//! - [`math`]: Mathematical primitives (angle normalization)

pub mod math;
pub mod types;
