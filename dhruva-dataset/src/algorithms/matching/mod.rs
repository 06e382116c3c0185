//! Point cloud registration.
//!
//! Registration estimates the rigid transform that aligns a *target* cloud
//! (the scan being added) onto a *reference* cloud (an earlier scan), starting
//! from an initial guess. The pose pipeline only depends on the
//! [`RegistrationEngine`] trait; which algorithm sits behind it is a
//! deployment choice.
//!
//! # Engines
//!
//! - [`PointToPointIcp`]: k-d tree accelerated point-to-point ICP
//! - [`PassthroughEngine`]: returns the initial guess unchanged (raw odometry)
//!
//! # Example
//!
//! ```ignore
//! use dhruva_dataset::algorithms::matching::{IcpConfig, PointToPointIcp, RegistrationEngine};
//!
//! let icp = PointToPointIcp::new(IcpConfig::default());
//! let refined = icp.register(&reference, &current, &initial_guess)?;
//! ```

mod icp;
#[cfg(test)]
pub(crate) mod test_utils;

pub use icp::{IcpConfig, PointToPointIcp};

use thiserror::Error;

use crate::core::types::{PointCloud3D, RigidTransform};

/// Errors reported by a registration engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    #[error("registration did not converge after {iterations} iterations (mse {mse:.6})")]
    NotConverged { iterations: u32, mse: f64 },

    #[error("only {found} correspondences found, {required} required")]
    InsufficientCorrespondences { found: usize, required: usize },

    #[error("cannot register an empty point cloud")]
    EmptyCloud,

    #[error("registration engine failure: {0}")]
    Internal(String),
}

/// Trait for point cloud registration engines.
pub trait RegistrationEngine {
    /// Align `target` onto `reference`.
    ///
    /// # Arguments
    ///
    /// * `reference` - The cloud that stays fixed
    /// * `target` - The cloud being aligned
    /// * `initial_guess` - Starting transform estimate
    ///
    /// # Returns
    ///
    /// The refined transform. Engines never retry on their own; a failure is
    /// reported once and the caller decides what to do with it.
    fn register(
        &self,
        reference: &PointCloud3D,
        target: &PointCloud3D,
        initial_guess: &RigidTransform,
    ) -> Result<RigidTransform, RegistrationError>;

    /// Opaque identifier of the parameter profile this engine runs with.
    fn profile(&self) -> &str {
        "default"
    }
}

impl<E: RegistrationEngine + ?Sized> RegistrationEngine for Box<E> {
    fn register(
        &self,
        reference: &PointCloud3D,
        target: &PointCloud3D,
        initial_guess: &RigidTransform,
    ) -> Result<RigidTransform, RegistrationError> {
        (**self).register(reference, target, initial_guess)
    }

    fn profile(&self) -> &str {
        (**self).profile()
    }
}

/// Engine that trusts the raw odometry: returns the initial guess as is.
#[derive(Debug, Clone, Default)]
pub struct PassthroughEngine;

impl RegistrationEngine for PassthroughEngine {
    fn register(
        &self,
        _reference: &PointCloud3D,
        _target: &PointCloud3D,
        initial_guess: &RigidTransform,
    ) -> Result<RigidTransform, RegistrationError> {
        Ok(*initial_guess)
    }

    fn profile(&self) -> &str {
        "passthrough"
    }
}
