//! Per-scan odometry checkpoints.
//!
//! Every committed scan leaves one record file in the output directory:
//!
//! ```text
//! <output>/scan_0042_info.dat
//!     Odometry: 1.25 -0.5 0 0 0 0.7853981633974483
//! ```
//!
//! Records are write-once. A later run that reaches an index with an
//! existing record loads it instead of recomputing it, which is how an
//! interrupted run resumes.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{OdometryRecord, RecordParseError, RigidTransform};

/// Errors from checkpoint storage.
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("no odometry record for scan {0}")]
    NotFound(usize),

    #[error("malformed odometry record {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: RecordParseError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Storage for one corrected pose per scan index.
pub trait CheckpointStore {
    /// Whether a record exists for `index`.
    fn has(&self, index: usize) -> bool;

    /// Load the record for `index`.
    fn load(&self, index: usize) -> Result<OdometryRecord>;

    /// Persist `transform` for `index`.
    ///
    /// Returns `Ok(false)` without touching storage if a record already
    /// exists: the first write wins.
    fn save(&mut self, index: usize, transform: &RigidTransform) -> Result<bool>;
}

/// File naming shared by the on-disk stores: `scan_0042<suffix>`.
pub fn scan_file_name(index: usize, suffix_width: usize, suffix: &str) -> String {
    format!("scan_{:0width$}{}", index, suffix, width = suffix_width)
}

/// One `scan_NNNN_info.dat` text file per record.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    directory: PathBuf,
    suffix_width: usize,
}

impl FileCheckpointStore {
    /// Open a store rooted at `directory`, creating it if needed.
    pub fn new(directory: impl AsRef<Path>, suffix_width: usize) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).map_err(|source| CheckpointError::Io {
            path: directory.clone(),
            source,
        })?;
        Ok(Self {
            directory,
            suffix_width,
        })
    }

    /// Path of the record file for `index`.
    pub fn record_path(&self, index: usize) -> PathBuf {
        self.directory
            .join(scan_file_name(index, self.suffix_width, "_info.dat"))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn has(&self, index: usize) -> bool {
        self.record_path(index).is_file()
    }

    fn load(&self, index: usize) -> Result<OdometryRecord> {
        let path = self.record_path(index);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound(index));
            }
            Err(source) => return Err(CheckpointError::Io { path, source }),
        };
        OdometryRecord::parse(&text).map_err(|source| CheckpointError::Malformed { path, source })
    }

    fn save(&mut self, index: usize, transform: &RigidTransform) -> Result<bool> {
        let path = self.record_path(index);
        if path.exists() {
            log::warn!("Odometry record {} already exists, keeping it", path.display());
            return Ok(false);
        }

        let record = OdometryRecord::from_transform(transform);
        let tmp_path = path.with_extension("dat.tmp");
        let io_err = |source| CheckpointError::Io {
            path: tmp_path.clone(),
            source,
        };

        let mut file = File::create(&tmp_path).map_err(io_err)?;
        writeln!(file, "{}", record.to_line()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&tmp_path, &path).map_err(|source| CheckpointError::Io {
            path: path.clone(),
            source,
        })?;

        log::debug!("Wrote {}", path.display());
        Ok(true)
    }
}

/// In-memory store, for dry runs that must not touch the output directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    records: BTreeMap<usize, OdometryRecord>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn has(&self, index: usize) -> bool {
        self.records.contains_key(&index)
    }

    fn load(&self, index: usize) -> Result<OdometryRecord> {
        self.records
            .get(&index)
            .copied()
            .ok_or(CheckpointError::NotFound(index))
    }

    fn save(&mut self, index: usize, transform: &RigidTransform) -> Result<bool> {
        if self.records.contains_key(&index) {
            return Ok(false);
        }
        self.records
            .insert(index, OdometryRecord::from_transform(transform));
        Ok(true)
    }
}
