//! Algorithms layer.
//!
//! # Contents
//!
//! - [`matching`]: point cloud registration (engine trait, ICP)

pub mod matching;
