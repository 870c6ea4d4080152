//! # Audio Buffer Management
//!
//! Accumulates audio for a progressive (chunked) capture. The service does not
//! stream recognition yet, so every chunk is held here and sent as one raw PCM
//! body when the capture stops.
//!
//! ## Lifecycle:
//! 1. **start**: buffer reset to empty when a capture begins
//! 2. **add_samples**: each chunk appended in arrival order
//! 3. **drain**: accumulated bytes read for transmission
//! 4. **flush**: buffer emptied once its contents have been taken
//!
//! The buffer is not shared between threads. It lives inside the session and
//! is driven from the same serialized call stream as every other operation.

use byteorder::{LittleEndian, WriteBytesExt};

/// Append-only accumulator of 16-bit little-endian PCM bytes.
///
/// ## Rust Concepts:
/// - **Vec<u8>**: growable byte storage, already in wire order
/// - **&mut self**: mutation requires exclusive access, so two producers can't
///   interleave chunks without the compiler noticing
#[derive(Debug, Default, Clone)]
pub struct AudioBuffer {
    /// PCM bytes in arrival order
    bytes: Vec<u8>,
}

impl AudioBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the buffer for a new capture. Idempotent.
    pub fn start(&mut self) {
        self.bytes.clear();
    }

    /// Append one chunk of mono 32-bit float samples.
    ///
    /// ## Conversion:
    /// Scales from float range [-1.0, 1.0] to 16-bit integer range
    /// [-32768, 32767], clamping anything outside, and writes each sample as
    /// two little-endian bytes. Empty chunks are accepted and change nothing.
    pub fn add_samples(&mut self, samples: &[f32]) {
        self.bytes.reserve(samples.len() * 2);
        for &sample in samples {
            // Writing into a Vec cannot fail
            let _ = self.bytes.write_i16::<LittleEndian>(float_to_pcm(sample));
        }
    }

    /// Accumulated PCM bytes in arrival order.
    ///
    /// Does not clear the buffer; call [`flush`](Self::flush) once the bytes
    /// have been handed off.
    pub fn drain(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Empty the buffer. Safe to call when already empty.
    pub fn flush(&mut self) {
        self.bytes.clear();
    }

    /// Number of accumulated samples.
    pub fn len(&self) -> usize {
        self.bytes.len() / 2
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Duration of the accumulated audio in seconds.
    ///
    /// ## Calculation:
    /// Duration = number_of_samples / sample_rate
    pub fn duration_seconds(&self) -> f64 {
        self.len() as f64 / super::ASR_SAMPLE_RATE as f64
    }
}

/// Convert a float sample to 16-bit PCM.
pub fn float_to_pcm(sample: f32) -> i16 {
    let scaled = sample * 32768.0;
    scaled.clamp(-32768.0, 32767.0) as i16
}
