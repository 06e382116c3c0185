//! ASCII PLY export of merged clouds for visual review.
//!
//! After each registration attempt the reference cloud and the aligned
//! current cloud are written into one colored file so a viewer can show how
//! well they overlap.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::checkpoint::scan_file_name;
use crate::core::types::{PointCloud3D, RigidTransform};

/// Color for the reference cloud.
pub const REFERENCE_COLOR: [u8; 3] = [200, 200, 200];

/// Color for the aligned current cloud.
pub const CURRENT_COLOR: [u8; 3] = [230, 60, 40];

/// Write colored clouds into a single ASCII PLY file.
pub fn write_ply(path: &Path, layers: &[(&PointCloud3D, [u8; 3])]) -> std::io::Result<()> {
    let vertex_count: usize = layers.iter().map(|(cloud, _)| cloud.len()).sum();
    let mut w = BufWriter::new(File::create(path)?);

    writeln!(w, "ply")?;
    writeln!(w, "format ascii 1.0")?;
    writeln!(w, "element vertex {}", vertex_count)?;
    writeln!(w, "property float x")?;
    writeln!(w, "property float y")?;
    writeln!(w, "property float z")?;
    writeln!(w, "property uchar red")?;
    writeln!(w, "property uchar green")?;
    writeln!(w, "property uchar blue")?;
    writeln!(w, "end_header")?;

    for (cloud, [r, g, b]) in layers {
        for p in cloud.iter() {
            writeln!(w, "{} {} {} {} {} {}", p.x, p.y, p.z, r, g, b)?;
        }
    }
    w.flush()
}

/// Writes `scan_NNNN_merged.ply` files into an output directory.
#[derive(Debug, Clone)]
pub struct MergedCloudWriter {
    directory: PathBuf,
    suffix_width: usize,
}

impl MergedCloudWriter {
    pub fn new(directory: impl AsRef<Path>, suffix_width: usize) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            suffix_width,
        }
    }

    pub fn merged_path(&self, index: usize) -> PathBuf {
        self.directory
            .join(scan_file_name(index, self.suffix_width, "_merged.ply"))
    }

    /// Write the reference cloud plus `current` moved by `transform`.
    ///
    /// Overwrites any earlier attempt for the same index.
    pub fn write(
        &self,
        index: usize,
        reference: &PointCloud3D,
        current: &PointCloud3D,
        transform: &RigidTransform,
    ) -> std::io::Result<PathBuf> {
        let path = self.merged_path(index);
        let aligned = current.transform(transform);
        write_ply(
            &path,
            &[(reference, REFERENCE_COLOR), (&aligned, CURRENT_COLOR)],
        )?;
        log::debug!("Merged cloud written to {}", path.display());
        Ok(path)
    }
}
