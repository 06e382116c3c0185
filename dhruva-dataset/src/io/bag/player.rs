//! Bag file player for replaying recorded sensor data.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use thiserror::Error;

use super::types::{BagHeader, BagMessage, HEADER_SIZE, MAX_MESSAGE_BYTES};

/// Error type for bag playback operations.
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] postcard::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, PlayerError>;

/// Bag file player.
///
/// Reads messages in file order, as fast as the caller pulls them, and
/// checks that sequence numbers strictly increase.
///
/// # Example
///
/// ```ignore
/// use dhruva_dataset::io::bag::BagPlayer;
///
/// let mut player = BagPlayer::open("recording.bag")?;
/// while let Some(msg) = player.next_message()? {
///     println!("#{} at {} us", msg.seq(), msg.timestamp_us());
/// }
/// ```
pub struct BagPlayer {
    reader: BufReader<File>,
    header: BagHeader,
    messages_read: u64,
    last_seq: Option<u64>,
}

impl BagPlayer {
    /// Open a bag file for playback.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut header_buffer = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header_buffer)?;

        let header: BagHeader = postcard::from_bytes(&header_buffer).map_err(|e| {
            PlayerError::InvalidFormat(format!("Failed to parse header: {}", e))
        })?;

        if !header.is_valid() {
            return Err(PlayerError::InvalidFormat(
                "Invalid bag file magic bytes".to_string(),
            ));
        }

        Ok(Self {
            reader,
            header,
            messages_read: 0,
            last_seq: None,
        })
    }

    /// Get the bag file header.
    pub fn header(&self) -> &BagHeader {
        &self.header
    }

    /// Get total duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.header.duration_secs()
    }

    /// Get total message count.
    pub fn message_count(&self) -> u64 {
        self.header.message_count
    }

    /// Get number of messages read so far.
    pub fn messages_read(&self) -> u64 {
        self.messages_read
    }

    /// Read the next message.
    ///
    /// Returns `None` when end of file is reached.
    pub fn next_message(&mut self) -> Result<Option<BagMessage>> {
        // Length prefix (4 bytes, little-endian)
        let mut len_bytes = [0u8; 4];
        match self.reader.read_exact(&mut len_bytes) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let len = u32::from_le_bytes(len_bytes) as usize;
        if len > MAX_MESSAGE_BYTES {
            return Err(PlayerError::InvalidFormat(format!(
                "Message too large: {} bytes",
                len
            )));
        }

        let mut payload = vec![0u8; len];
        self.reader.read_exact(&mut payload)?;
        let msg: BagMessage = postcard::from_bytes(&payload)?;

        if let Some(last) = self.last_seq {
            if msg.seq() <= last {
                return Err(PlayerError::InvalidFormat(format!(
                    "Sequence number {} after {}",
                    msg.seq(),
                    last
                )));
            }
        }
        self.last_seq = Some(msg.seq());
        self.messages_read += 1;

        Ok(Some(msg))
    }

    /// Reset to beginning of file.
    pub fn rewind(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        self.messages_read = 0;
        self.last_seq = None;
        Ok(())
    }
}

/// Iterator implementation for convenient `for msg in player { }` syntax.
impl Iterator for BagPlayer {
    type Item = Result<BagMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_message().transpose()
    }
}
