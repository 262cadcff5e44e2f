//! Audio file decoding for replay
//!
//! The file-picker collaborator hands us a raw byte buffer plus its declared
//! MIME type. The whole file is decoded up front into a flat mono buffer at
//! the wire rate; chunking for the scheduler is lazy.

use std::io::Cursor;

use hound::{SampleFormat as WavSampleFormat, WavReader};

use super::resample::{downmix_to_mono, resample};
use super::SampleBlock;

/// MIME types accepted for replay. Anything else is rejected before any
/// frame is produced.
const WAV_MIME_TYPES: &[&str] = &["audio/wav", "audio/x-wav", "audio/wave", "audio/vnd.wave"];

#[derive(Debug, Clone)]
pub enum DecodeError {
    UnsupportedFormat(String),
    Malformed(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::UnsupportedFormat(mime) => {
                write!(f, "Unsupported audio format: {}", mime)
            }
            DecodeError::Malformed(e) => write!(f, "Failed to decode audio file: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode an entire audio file into mono f32 samples at `target_rate`.
pub fn decode_audio(bytes: &[u8], mime: &str, target_rate: u32) -> Result<Vec<f32>, DecodeError> {
    if !WAV_MIME_TYPES.contains(&mime) {
        return Err(DecodeError::UnsupportedFormat(mime.to_string()));
    }

    let mut reader =
        WavReader::new(Cursor::new(bytes)).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        WavSampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| DecodeError::Malformed(e.to_string()))?,
        WavSampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(|e| DecodeError::Malformed(e.to_string()))?
        }
    };

    log::debug!(
        "Decoded {} interleaved samples ({} Hz, {} channels, {}-bit)",
        interleaved.len(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );

    let mono = downmix_to_mono(&interleaved, spec.channels);
    Ok(resample(&mono, spec.sample_rate, target_rate))
}

/// Lazily slice a decoded buffer into fixed-size blocks for the scheduler.
/// The final block carries whatever remains.
pub fn chunk_blocks(
    samples: &[f32],
    chunk_size: usize,
    sample_rate: u32,
) -> impl Iterator<Item = SampleBlock> + '_ {
    samples
        .chunks(chunk_size)
        .map(move |chunk| SampleBlock::new(chunk.to_vec(), sample_rate))
}
