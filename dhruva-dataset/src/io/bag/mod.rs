//! Bag file recording and playback.
//!
//! Bags are the sensor log the dataset generator consumes: an ordered
//! stream of raw pose samples and point clouds, each tagged with a
//! monotonically increasing sequence number.
//!
//! # File Format
//!
//! Bag files use a simple binary format with Postcard serialization:
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Header (64 bytes)                                │
//! │ - Magic: "DBAG" (4 bytes)                        │
//! │ - Version: u16                                   │
//! │ - Flags: u16                                     │
//! │ - Start time: u64 (microseconds)                 │
//! │ - End time: u64 (microseconds)                   │
//! │ - Message count: u64                             │
//! │ - Pose sample count: u64                         │
//! │ - Point cloud count: u64                         │
//! │ - Reserved: 4 bytes                              │
//! ├──────────────────────────────────────────────────┤
//! │ Message Stream                                   │
//! │ [len:u32][postcard payload]...                   │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Header integers are postcard varints, so the encoded header is padded
//! with zeros up to the fixed 64 bytes.
//!
//! # Example: Playback
//!
//! ```ignore
//! use dhruva_dataset::io::bag::BagPlayer;
//!
//! let player = BagPlayer::open("recording.bag")?;
//! for msg in player {
//!     println!("Message at {} us", msg?.timestamp_us());
//! }
//! ```

mod player;
mod recorder;
mod types;

pub use player::{BagPlayer, PlayerError};
pub use recorder::{BagRecorder, RecorderError};
pub use types::{
    BAG_MAGIC, BAG_VERSION, BagHeader, BagInfo, BagMessage, HEADER_SIZE, MAX_MESSAGE_BYTES,
    PoseSample,
};

#[cfg(test)]
mod test_fixtures;

#[cfg(test)]
pub use test_fixtures::{BagTestFixture, synthetic_room};
