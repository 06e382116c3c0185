//! Sensor processing layer.
//!
//! Handles the raw cloud stream before it reaches the pose pipeline.
//!
//! # Contents
//!
//! - [`decimation`]: keep-one-out-of-k cloud selection and scan indexing

pub mod decimation;

pub use decimation::Decimator;
