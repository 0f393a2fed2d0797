//! Audio decode seam.
//!
//! The analysis pipeline needs deterministic stereo float samples; where they
//! come from is behind [`AudioDecoder`]. The built-in [`WavDecoder`] covers
//! WAV files via hound; other containers can be plugged in by the caller.

use std::path::Path;

use tracing::debug;

use crate::LoadError;

/// Decoded stereo audio. Mono sources are duplicated to both channels
/// before this struct is built.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Left channel samples, in [-1, 1].
    pub left: Vec<f32>,
    /// Right channel samples, same length as `left`.
    pub right: Vec<f32>,
    /// Sample rate the channels are expressed at.
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// True when the decode produced no samples.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Decodes an audio file to stereo float samples.
///
/// `target_sample_rate` is advisory: a decoder may return the file's native
/// rate instead, and reports the actual rate in [`DecodedAudio`]. The
/// spectral axes are derived from the actual rate, so analysis stays
/// consistent either way.
pub trait AudioDecoder {
    /// Decode `path` into stereo samples.
    fn decode(&self, path: &Path, target_sample_rate: u32) -> Result<DecodedAudio, LoadError>;
}

/// WAV decoder backed by hound. Returns the file's native sample rate.
#[derive(Debug, Default)]
pub struct WavDecoder;

impl AudioDecoder for WavDecoder {
    fn decode(&self, path: &Path, _target_sample_rate: u32) -> Result<DecodedAudio, LoadError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        if interleaved.is_empty() {
            return Err(LoadError::EmptyAudio);
        }

        let channels = spec.channels.max(1) as usize;
        let frames = interleaved.len() / channels;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for frame in interleaved.chunks_exact(channels) {
            left.push(frame[0]);
            // Mono files are duplicated to both channels; extra channels
            // beyond the first two are ignored.
            right.push(if channels > 1 { frame[1] } else { frame[0] });
        }

        debug!(
            path = %path.display(),
            sample_rate = spec.sample_rate,
            channels,
            frames,
            "decoded WAV"
        );

        Ok(DecodedAudio {
            left,
            right,
            sample_rate: spec.sample_rate,
        })
    }
}
