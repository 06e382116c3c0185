//! Bag file recorder for capturing sensor data.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::{BAG_MAGIC, BAG_VERSION, BagHeader, BagInfo, BagMessage, HEADER_SIZE, PoseSample};
use crate::core::types::{PointCloud3D, Stamped};

/// Error type for bag recording operations.
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] postcard::Error),
}

pub type Result<T> = std::result::Result<T, RecorderError>;

/// Bag file recorder.
///
/// Records sensor messages to a binary bag file using Postcard serialization.
/// The file format uses length-prefixed messages for efficient streaming.
///
/// # Example
///
/// ```ignore
/// use dhruva_dataset::io::bag::{BagRecorder, PoseSample};
///
/// let mut recorder = BagRecorder::create("recording.bag")?;
/// recorder.record_pose(&PoseSample::identity(), 1_000_000)?;
/// recorder.record_cloud(&cloud, 1_000_500)?;
///
/// let info = recorder.finish()?;
/// println!("Recorded {} messages", info.message_count);
/// ```
pub struct BagRecorder {
    writer: BufWriter<File>,
    path: PathBuf,
    message_count: u64,
    pose_count: u64,
    cloud_count: u64,
    next_seq: u64,
    start_time_us: Option<u64>,
    end_time_us: u64,
}

impl BagRecorder {
    /// Create a new bag recorder writing to the specified path.
    ///
    /// The file is created immediately and the header space is reserved.
    /// Call `finish()` to write the final header and close the file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);

        // Reserve space for header
        writer.write_all(&[0u8; HEADER_SIZE])?;

        Ok(Self {
            writer,
            path,
            message_count: 0,
            pose_count: 0,
            cloud_count: 0,
            next_seq: 0,
            start_time_us: None,
            end_time_us: 0,
        })
    }

    /// Record a raw pose sample with the next sequence number.
    pub fn record_pose(&mut self, sample: &PoseSample, timestamp_us: u64) -> Result<()> {
        let msg = BagMessage::PoseSample(Stamped::new(*sample, self.next_seq, timestamp_us));
        self.record_message(&msg)
    }

    /// Record a point cloud with the next sequence number.
    pub fn record_cloud(&mut self, cloud: &PointCloud3D, timestamp_us: u64) -> Result<()> {
        let msg = BagMessage::PointCloud(Stamped::new(cloud.clone(), self.next_seq, timestamp_us));
        self.record_message(&msg)
    }

    /// Record a message with its own sequence number.
    pub(crate) fn record_message(&mut self, msg: &BagMessage) -> Result<()> {
        let timestamp = msg.timestamp_us();
        if self.start_time_us.is_none() {
            self.start_time_us = Some(timestamp);
        }
        self.end_time_us = timestamp;

        let bytes = postcard::to_allocvec(msg)?;

        // Length prefix (4 bytes, little-endian) + payload
        let len = bytes.len() as u32;
        self.writer.write_all(&len.to_le_bytes())?;
        self.writer.write_all(&bytes)?;

        match msg {
            BagMessage::PoseSample(_) => self.pose_count += 1,
            BagMessage::PointCloud(_) => self.cloud_count += 1,
        }
        self.message_count += 1;
        self.next_seq = msg.seq() + 1;
        Ok(())
    }

    fn duration_us(&self) -> u64 {
        self.end_time_us
            .saturating_sub(self.start_time_us.unwrap_or(0))
    }

    /// Finalize and close the bag file.
    ///
    /// Writes the header with final statistics and returns file info.
    pub fn finish(mut self) -> Result<BagInfo> {
        self.writer.flush()?;
        let file_size = self.writer.stream_position()?;

        self.writer.seek(SeekFrom::Start(0))?;

        let header = BagHeader {
            magic: BAG_MAGIC,
            version: BAG_VERSION,
            flags: 0,
            start_time_us: self.start_time_us.unwrap_or(0),
            end_time_us: self.end_time_us,
            message_count: self.message_count,
            pose_count: self.pose_count,
            cloud_count: self.cloud_count,
            reserved: [0; 4],
        };

        // Pad to HEADER_SIZE
        let header_bytes = postcard::to_allocvec(&header)?;
        let mut header_buffer = [0u8; HEADER_SIZE];
        let copy_len = header_bytes.len().min(HEADER_SIZE);
        header_buffer[..copy_len].copy_from_slice(&header_bytes[..copy_len]);
        self.writer.write_all(&header_buffer)?;
        self.writer.flush()?;

        let duration_us = self.duration_us();

        Ok(BagInfo {
            path: self.path,
            duration_us,
            message_count: self.message_count,
            file_size_bytes: file_size,
            pose_count: self.pose_count,
            cloud_count: self.cloud_count,
        })
    }
}
