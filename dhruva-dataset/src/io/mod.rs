//! I/O layer.
//!
//! Everything that touches the filesystem lives here.
//!
//! # Contents
//!
//! - [`bag`]: sensor log recording and playback
//! - [`checkpoint`]: per-scan odometry records (resume support)
//! - [`cloud_store`]: per-scan point cloud storage
//! - [`ply`]: merged cloud export for review

pub mod bag;
pub mod checkpoint;
pub mod cloud_store;
pub mod ply;

pub use checkpoint::{CheckpointError, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
pub use cloud_store::{CloudStore, CloudStoreError, FileCloudStore, MemoryCloudStore};
pub use ply::MergedCloudWriter;
