//! # LPS Frame Synchronizer
//!
//! Finds frame boundaries in the continuously arriving serial byte stream.
//!
//! The synchronizer keeps a cursor across calls, so a frame may be split
//! over any number of reads and a single read may carry several frames.
//! Bytes outside a frame are dropped until the next start marker, which is
//! how the stream resynchronizes after corruption.

use tracing::warn;

use super::crc::crc8;
use super::protocol::{Frame, LPS_HEADER_SIZE, LPS_MAX_FRAME_SIZE, LPS_START_MARKER};

/// Frame buffer capacity, rounded up from the largest possible frame
const FRAME_BUFFER_CAPACITY: usize = 260;

const _: () = assert!(FRAME_BUFFER_CAPACITY >= LPS_MAX_FRAME_SIZE);

/// Position of the cursor within the current candidate frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Scanning for the start marker
    Seek,
    /// Next byte is the payload size field
    Size,
    /// Copying address, event and payload
    Fill,
    /// Next byte is the checksum
    Check,
}

/// Counters kept by the synchronizer since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Frames that passed the checksum
    pub frames: u64,

    /// Frames dropped on checksum mismatch
    pub crc_errors: u64,

    /// Bytes discarded while looking for a start marker
    pub skipped_bytes: u64,
}

/// Streaming frame synchronizer
pub struct FrameSynchronizer {
    buffer: [u8; FRAME_BUFFER_CAPACITY],
    /// Bytes accumulated into the current candidate frame
    index: usize,
    /// Frame length (without checksum) once the size byte is known
    expected_size: usize,
    stats: SyncStats,
}

impl std::fmt::Debug for FrameSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSynchronizer")
            .field("state", &self.state())
            .field("index", &self.index)
            .field("expected_size", &self.expected_size)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Default for FrameSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSynchronizer {
    /// Create a synchronizer in the `Seek` state
    pub fn new() -> Self {
        Self {
            buffer: [0u8; FRAME_BUFFER_CAPACITY],
            index: 0,
            expected_size: 0,
            stats: SyncStats::default(),
        }
    }

    /// Feed newly received bytes
    ///
    /// Returns an iterator yielding every checksum-valid frame completed by
    /// `data`. The whole chunk is consumed only when the iterator is run to
    /// the end; bytes left unvisited when it is dropped are lost.
    ///
    /// # Examples
    ///
    /// ```
    /// use locus_lps::lps::encoder::encode_raw_accel_frame;
    /// use locus_lps::lps::framer::FrameSynchronizer;
    ///
    /// let wire = encode_raw_accel_frame(3, [1, 2, 3]);
    /// let mut sync = FrameSynchronizer::new();
    ///
    /// let (head, tail) = wire.split_at(5);
    /// assert_eq!(sync.feed(head).count(), 0);
    ///
    /// let frames: Vec<_> = sync.feed(tail).collect();
    /// assert_eq!(frames.len(), 1);
    /// assert_eq!(frames[0].address(), 3);
    /// ```
    #[must_use = "frames are only produced while the iterator is consumed"]
    pub fn feed<'a>(&'a mut self, data: &'a [u8]) -> Frames<'a> {
        Frames {
            sync: self,
            data,
            pos: 0,
        }
    }

    /// Drop any partial frame and return to `Seek`
    pub fn reset(&mut self) {
        self.index = 0;
        self.expected_size = 0;
    }

    /// Current cursor state
    pub fn state(&self) -> SyncState {
        match self.index {
            0 => SyncState::Seek,
            1 => SyncState::Size,
            i if i < self.expected_size => SyncState::Fill,
            _ => SyncState::Check,
        }
    }

    /// Counters since creation
    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Advance the state machine over `data[*pos..]` until a frame is
    /// emitted or the input is exhausted.
    fn advance(&mut self, data: &[u8], pos: &mut usize) -> Option<Frame> {
        while *pos < data.len() {
            match self.state() {
                SyncState::Seek => {
                    if data[*pos] == LPS_START_MARKER {
                        self.buffer[0] = LPS_START_MARKER;
                        self.index = 1;
                    } else {
                        self.stats.skipped_bytes += 1;
                    }
                    *pos += 1;
                }
                SyncState::Size => {
                    let size = data[*pos];
                    self.buffer[1] = size;
                    self.expected_size = size as usize + LPS_HEADER_SIZE;
                    self.index = 2;
                    *pos += 1;
                }
                SyncState::Fill => {
                    let block_len = (self.expected_size - self.index).min(data.len() - *pos);
                    self.buffer[self.index..self.index + block_len]
                        .copy_from_slice(&data[*pos..*pos + block_len]);
                    self.index += block_len;
                    *pos += block_len;
                }
                SyncState::Check => {
                    let received_crc = data[*pos];
                    *pos += 1;

                    let size = self.expected_size;
                    self.reset();

                    let calculated_crc = crc8(&self.buffer[1..size]);
                    if calculated_crc == received_crc {
                        self.stats.frames += 1;
                        return Some(Frame::from_validated(self.buffer[..size].to_vec()));
                    }

                    self.stats.crc_errors += 1;
                    warn!(
                        "CRC error: address {}, size {} (expected 0x{:02X}, got 0x{:02X})",
                        self.buffer[2], size, calculated_crc, received_crc
                    );
                }
            }
        }

        None
    }
}

/// Iterator over the frames completed by one chunk of input
///
/// Created by [`FrameSynchronizer::feed`].
#[derive(Debug)]
pub struct Frames<'a> {
    sync: &'a mut FrameSynchronizer,
    data: &'a [u8],
    pos: usize,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.sync.advance(self.data, &mut self.pos)
    }
}
