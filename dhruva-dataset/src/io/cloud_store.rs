//! Storage for the per-scan point clouds.
//!
//! Clouds are saved as they are indexed so that a later reanchor can reload
//! the cloud of any earlier scan as its registration reference.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::checkpoint::scan_file_name;
use crate::core::types::PointCloud3D;

/// Errors from cloud storage.
#[derive(Error, Debug)]
pub enum CloudStoreError {
    #[error("no stored cloud for scan {0}")]
    NotFound(usize),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode cloud {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: postcard::Error,
    },

    #[error("cannot encode cloud: {0}")]
    Encode(#[from] postcard::Error),
}

pub type Result<T> = std::result::Result<T, CloudStoreError>;

/// Storage for scan clouds, keyed by scan index.
pub trait CloudStore {
    /// Save `cloud` for `index` and return where it lives.
    ///
    /// An existing cloud for the same index is kept as is.
    fn save_cloud(&mut self, index: usize, cloud: &PointCloud3D) -> Result<PathBuf>;

    /// Load the cloud saved for `index`.
    fn load_cloud(&self, index: usize) -> Result<PointCloud3D>;

    fn has_cloud(&self, index: usize) -> bool;
}

/// One postcard-encoded `scan_NNNN.cloud` file per scan.
#[derive(Debug, Clone)]
pub struct FileCloudStore {
    directory: PathBuf,
    suffix_width: usize,
}

impl FileCloudStore {
    /// Open a store rooted at `directory`, creating it if needed.
    pub fn new(directory: impl AsRef<Path>, suffix_width: usize) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).map_err(|source| CloudStoreError::Io {
            path: directory.clone(),
            source,
        })?;
        Ok(Self {
            directory,
            suffix_width,
        })
    }

    pub fn cloud_path(&self, index: usize) -> PathBuf {
        self.directory
            .join(scan_file_name(index, self.suffix_width, ".cloud"))
    }
}

impl CloudStore for FileCloudStore {
    fn save_cloud(&mut self, index: usize, cloud: &PointCloud3D) -> Result<PathBuf> {
        let path = self.cloud_path(index);
        if path.exists() {
            log::debug!("Cloud {} already saved", path.display());
            return Ok(path);
        }

        let bytes = postcard::to_allocvec(cloud)?;
        let tmp_path = path.with_extension("cloud.tmp");
        fs::write(&tmp_path, &bytes).map_err(|source| CloudStoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| CloudStoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn load_cloud(&self, index: usize) -> Result<PointCloud3D> {
        let path = self.cloud_path(index);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CloudStoreError::NotFound(index));
            }
            Err(source) => return Err(CloudStoreError::Io { path, source }),
        };
        postcard::from_bytes(&bytes).map_err(|source| CloudStoreError::Decode { path, source })
    }

    fn has_cloud(&self, index: usize) -> bool {
        self.cloud_path(index).is_file()
    }
}

/// In-memory cloud store, for dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryCloudStore {
    clouds: BTreeMap<usize, PointCloud3D>,
}

impl MemoryCloudStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CloudStore for MemoryCloudStore {
    fn save_cloud(&mut self, index: usize, cloud: &PointCloud3D) -> Result<PathBuf> {
        self.clouds.entry(index).or_insert_with(|| cloud.clone());
        Ok(PathBuf::from(scan_file_name(index, 4, ".cloud")))
    }

    fn load_cloud(&self, index: usize) -> Result<PointCloud3D> {
        self.clouds
            .get(&index)
            .cloned()
            .ok_or(CloudStoreError::NotFound(index))
    }

    fn has_cloud(&self, index: usize) -> bool {
        self.clouds.contains_key(&index)
    }
}
