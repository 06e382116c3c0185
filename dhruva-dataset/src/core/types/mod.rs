//! Core data types for dataset generation.
//!
//! - [`RigidTransform`]: 3D rotation + translation and the pose algebra
//! - [`Point3D`], [`PointCloud3D`]: scan geometry
//! - [`Stamped<T>`]: sequence number + timestamp wrapper for log records
//! - [`OdometryRecord`]: six-scalar persisted pose

mod cloud;
mod odometry;
mod stamped;
mod transform;

pub use cloud::{Point3D, PointCloud3D};
pub use odometry::{ODOMETRY_TAG, OdometryRecord, RecordParseError};
pub use stamped::Stamped;
pub use transform::{
    RigidTransform, TRANSFORM_EPSILON, compose, decompose, difference, positional_distance,
};
