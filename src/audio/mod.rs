//! # Audio Framing Module
//!
//! Turns caller audio into the raw PCM bodies the conversation service accepts.
//!
//! ## Key Components:
//! - **Audio Buffer**: Accumulates float samples from a progressive capture
//!   into 16-bit little-endian PCM bytes
//! - **WAV Parser**: Validates a RIFF/WAVE container and extracts the payload
//!   of its `data` chunk
//!
//! ## Audio Format Requirements:
//! - **Sample Rate**: 16kHz (16,000 Hz)
//! - **Bit Depth**: 16-bit PCM
//! - **Channels**: Mono (1 channel)
//! - **Encoding**: Little-endian signed integers

pub mod buffer; // Progressive capture accumulator
pub mod wav; // RIFF/WAVE container parsing

pub use buffer::AudioBuffer;
pub use wav::{parse_wav, WavFormat};

/// Sample rate the speech recognizer expects, exposed so callers can
/// configure their capture pipeline.
pub const ASR_SAMPLE_RATE: u32 = 16000;

/// Channel count the speech recognizer expects (mono).
pub const ASR_CHANNELS: u16 = 1;

/// Bits per sample on the wire.
pub const ASR_BITS_PER_SAMPLE: u16 = 16;

/// Content type for raw PCM request bodies.
pub const PCM_CONTENT_TYPE: &str = "audio/l16; rate=16000";
