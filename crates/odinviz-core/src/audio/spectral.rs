//! Precomputed stereo STFT of a backing track.
//!
//! Built once at load time, immutable afterward. Columns are time frames,
//! rows are FFT bin-center frequencies; both channels share the same shape
//! and axes.

use std::path::Path;

use num_complex::Complex;
use rustfft::FftPlanner;
use tracing::{debug, info};

use super::decode::{AudioDecoder, DecodedAudio};
use crate::LoadError;

/// STFT parameters.
#[derive(Debug, Clone, Copy)]
pub struct StftConfig {
    /// Window size in samples (power of two).
    pub window_size: usize,
    /// Hop length in samples.
    pub hop_length: usize,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            hop_length: 512,
        }
    }
}

/// Magnitude spectra of both channels plus the time/frequency axes.
///
/// Storage is frame-major: the bins of one time frame are contiguous, so a
/// band summation over one column is a slice scan.
#[derive(Debug, Clone)]
pub struct SpectralStore {
    magnitude_left: Vec<f32>,
    magnitude_right: Vec<f32>,
    time_frames: Vec<f64>,
    frequency_bins: Vec<f32>,
    num_bins: usize,
    sample_rate: u32,
}

impl SpectralStore {
    /// Decode `path` and analyze it in one step.
    pub fn load(
        path: &Path,
        decoder: &dyn AudioDecoder,
        config: StftConfig,
        target_sample_rate: u32,
    ) -> Result<Self, LoadError> {
        let audio = decoder.decode(path, target_sample_rate)?;
        let store = Self::analyze(&audio, config)?;
        info!(
            path = %path.display(),
            frames = store.num_frames(),
            bins = store.num_bins(),
            "audio analysis complete"
        );
        Ok(store)
    }

    /// Compute the stereo STFT of already-decoded audio.
    pub fn analyze(audio: &DecodedAudio, config: StftConfig) -> Result<Self, LoadError> {
        if audio.is_empty() {
            return Err(LoadError::EmptyAudio);
        }

        let window_size = config.window_size;
        let hop = config.hop_length.max(1);
        let num_bins = window_size / 2 + 1;

        // Hann window
        let window: Vec<f32> = (0..window_size)
            .map(|i| {
                let t = i as f32 / (window_size - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(window_size);
        let mut scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        // Frames are centered: frame i covers samples around i * hop, with
        // zero padding at both signal edges.
        let num_frames = audio.len() / hop + 1;
        let pad = window_size / 2;

        let mut run_channel = |samples: &[f32]| -> Vec<f32> {
            let mut magnitudes = Vec::with_capacity(num_frames * num_bins);
            let mut buffer = vec![Complex::new(0.0, 0.0); window_size];
            for frame in 0..num_frames {
                let start = (frame * hop) as i64 - pad as i64;
                for (i, slot) in buffer.iter_mut().enumerate() {
                    let src = start + i as i64;
                    let sample = if src >= 0 && (src as usize) < samples.len() {
                        let s = samples[src as usize];
                        if s.is_finite() {
                            s
                        } else {
                            0.0
                        }
                    } else {
                        0.0
                    };
                    *slot = Complex::new(sample * window[i], 0.0);
                }
                fft.process_with_scratch(&mut buffer, &mut scratch);
                magnitudes.extend(buffer[..num_bins].iter().map(|c| c.norm()));
            }
            magnitudes
        };

        let magnitude_left = run_channel(&audio.left);
        let magnitude_right = run_channel(&audio.right);

        let time_frames: Vec<f64> = (0..num_frames)
            .map(|i| (i * hop) as f64 / audio.sample_rate as f64)
            .collect();
        let frequency_bins: Vec<f32> = (0..num_bins)
            .map(|k| k as f32 * audio.sample_rate as f32 / window_size as f32)
            .collect();

        debug!(
            num_frames,
            num_bins,
            sample_rate = audio.sample_rate,
            "stereo STFT computed"
        );

        Ok(Self {
            magnitude_left,
            magnitude_right,
            time_frames,
            frequency_bins,
            num_bins,
            sample_rate: audio.sample_rate,
        })
    }

    /// Number of time frames (columns).
    pub fn num_frames(&self) -> usize {
        self.time_frames.len()
    }

    /// Number of frequency bins (rows).
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Frame timestamps in seconds, strictly ascending.
    pub fn time_frames(&self) -> &[f64] {
        &self.time_frames
    }

    /// Bin-center frequencies in Hz, strictly ascending.
    pub fn frequency_bins(&self) -> &[f32] {
        &self.frequency_bins
    }

    /// Sample rate the axes were derived from.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Index of the first frame at or after `time`, clamped to the last
    /// frame. Times past the end of the track read the final column.
    pub fn frame_index_at(&self, time: f64) -> usize {
        let idx = self.time_frames.partition_point(|&t| t < time);
        idx.min(self.time_frames.len() - 1)
    }

    /// Left-channel magnitudes of one frame.
    pub fn column_left(&self, frame: usize) -> &[f32] {
        let start = frame * self.num_bins;
        &self.magnitude_left[start..start + self.num_bins]
    }

    /// Right-channel magnitudes of one frame.
    pub fn column_right(&self, frame: usize) -> &[f32] {
        let start = frame * self.num_bins;
        &self.magnitude_right[start..start + self.num_bins]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_audio(freq_left: f32, freq_right: f32, seconds: f32) -> DecodedAudio {
        let sample_rate = 44_100;
        let count = (sample_rate as f32 * seconds) as usize;
        let tone = |freq: f32| -> Vec<f32> {
            (0..count)
                .map(|i| {
                    (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * 0.5
                })
                .collect()
        };
        DecodedAudio {
            left: tone(freq_left),
            right: tone(freq_right),
            sample_rate,
        }
    }

    #[test]
    fn test_axes_shape_and_ordering() {
        let store = SpectralStore::analyze(&sine_audio(440.0, 440.0, 0.5), StftConfig::default())
            .unwrap();

        assert_eq!(store.num_bins(), 1025);
        assert!(store.num_frames() > 0);
        assert!(store
            .time_frames()
            .windows(2)
            .all(|w| w[1] > w[0]));
        assert!(store
            .frequency_bins()
            .windows(2)
            .all(|w| w[1] > w[0]));
        assert_eq!(store.column_left(0).len(), store.num_bins());
    }

    #[test]
    fn test_energy_lands_in_tone_bin() {
        let store = SpectralStore::analyze(&sine_audio(440.0, 440.0, 0.5), StftConfig::default())
            .unwrap();

        let frame = store.num_frames() / 2;
        let column = store.column_left(frame);
        let peak_bin = column
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        let peak_hz = store.frequency_bins()[peak_bin];
        assert!(
            (peak_hz - 440.0).abs() < 50.0,
            "peak at {peak_hz} Hz, expected near 440"
        );
    }

    #[test]
    fn test_frame_lookup_clamps_past_end() {
        let store = SpectralStore::analyze(&sine_audio(440.0, 440.0, 0.25), StftConfig::default())
            .unwrap();
        assert_eq!(store.frame_index_at(1e9), store.num_frames() - 1);
        assert_eq!(store.frame_index_at(-1.0), 0);
    }

    #[test]
    fn test_empty_audio_rejected() {
        let audio = DecodedAudio {
            left: vec![],
            right: vec![],
            sample_rate: 44_100,
        };
        assert!(matches!(
            SpectralStore::analyze(&audio, StftConfig::default()),
            Err(LoadError::EmptyAudio)
        ));
    }

    #[test]
    fn test_nonfinite_samples_sanitized() {
        let mut audio = sine_audio(440.0, 440.0, 0.1);
        audio.left[100] = f32::NAN;
        audio.right[200] = f32::INFINITY;
        let store = SpectralStore::analyze(&audio, StftConfig::default()).unwrap();
        for frame in 0..store.num_frames() {
            assert!(store.column_left(frame).iter().all(|m| m.is_finite()));
            assert!(store.column_right(frame).iter().all(|m| m.is_finite()));
        }
    }
}
