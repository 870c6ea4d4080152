//! # WAV Container Parsing
//!
//! Reduces a caller-supplied RIFF/WAVE file to the raw PCM payload of its
//! `data` chunk so it can be posted as an `audio/l16` body.
//!
//! ## Container Layout:
//! ```text
//! offset 0   "RIFF"
//! offset 4   u32 LE  total file size minus 8
//! offset 8   "WAVE"
//! offset 12  sub-chunks: { id: 4 bytes, size: u32 LE, payload: size bytes }
//! ```
//! The first sub-chunk is `fmt `, which puts the channel count at offset 22,
//! the sample rate at 24 and bits-per-sample at 34. Real recordings often
//! carry `LIST`, `fact` or an extended `fmt ` before `data`, so the payload is
//! located by walking the chunk list rather than assuming a 44-byte header.

use crate::error::{ConversationError, ConversationResult};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::Cursor;

pub const NOT_A_WAV_MESSAGE: &str = "Data is not a WAV file";
pub const UNSUPPORTED_WAV_MESSAGE: &str = "WAV data is not mono 16-bit data at 16k sample rate";
pub const MISSING_DATA_MESSAGE: &str = "Cannot find data segment in WAV file";
pub const TRUNCATED_HEADER_MESSAGE: &str = "WAV header is truncated";

/// Offset of the first sub-chunk, right after "RIFF", size and "WAVE".
const FIRST_CHUNK_OFFSET: usize = 12;

/// Bytes needed to read every `fmt ` field we check.
const FORMAT_HEADER_LEN: usize = 36;

const CHUNK_HEADER_LEN: usize = 8;

/// Format fields read from the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Read the format fields at their fixed offsets.
    ///
    /// Returns `None` when the buffer is too short to hold them.
    pub fn read(data: &[u8]) -> Option<Self> {
        if data.len() < FORMAT_HEADER_LEN {
            return None;
        }

        let mut cursor = Cursor::new(data);
        cursor.set_position(22);
        let channels = cursor.read_u16::<LittleEndian>().ok()?;
        let sample_rate = cursor.read_u32::<LittleEndian>().ok()?;
        cursor.set_position(34);
        let bits_per_sample = cursor.read_u16::<LittleEndian>().ok()?;

        Some(Self {
            channels,
            sample_rate,
            bits_per_sample,
        })
    }

    /// Only mono 16-bit audio at 16kHz is accepted by the recognizer.
    pub fn is_supported(&self) -> bool {
        self.channels == super::ASR_CHANNELS
            && self.sample_rate == super::ASR_SAMPLE_RATE
            && self.bits_per_sample == super::ASR_BITS_PER_SAMPLE
    }
}

/// Validate a WAV file and return the payload of its `data` chunk.
///
/// ## Validation Steps:
/// 1. **Magic**: the first four bytes must be `RIFF`
/// 2. **Format**: mono, 16kHz, 16 bits per sample
/// 3. **Chunk scan**: starting at offset 12, skip `8 + size` bytes per chunk
///    until a `data` chunk is found, giving up once the scan offset passes the
///    file size declared at offset 4
///
/// The returned slice runs from the first payload byte to the end of `data`.
///
/// ## Errors:
/// Each failure mode carries its own message and is reported as
/// `ConversationError::InvalidWav`.
pub fn parse_wav(data: &[u8]) -> ConversationResult<&[u8]> {
    if data.get(0..4) != Some(b"RIFF".as_slice()) {
        return Err(invalid(NOT_A_WAV_MESSAGE));
    }

    let format = WavFormat::read(data).ok_or_else(|| invalid(TRUNCATED_HEADER_MESSAGE))?;
    if !format.is_supported() {
        return Err(invalid(UNSUPPORTED_WAV_MESSAGE));
    }

    let file_size = LittleEndian::read_u32(&data[4..8]) as usize;
    let mut offset = FIRST_CHUNK_OFFSET;

    loop {
        let header = offset
            .checked_add(CHUNK_HEADER_LEN)
            .and_then(|end| data.get(offset..end))
            .ok_or_else(|| invalid(MISSING_DATA_MESSAGE))?;

        if &header[0..4] == b"data" {
            return Ok(&data[offset + CHUNK_HEADER_LEN..]);
        }

        if offset > file_size {
            return Err(invalid(MISSING_DATA_MESSAGE));
        }

        let chunk_size = LittleEndian::read_u32(&header[4..8]) as usize;
        offset = offset
            .saturating_add(CHUNK_HEADER_LEN)
            .saturating_add(chunk_size);
    }
}

fn invalid(message: &str) -> ConversationError {
    ConversationError::InvalidWav(message.to_string())
}
