//! Per-band energy and stereo-pan extraction.
//!
//! Energy and pan are logically independent signals, but they read the same
//! spectral column through the same bin mask, so one analyzer computes both
//! in a single pass per tick.
//!
//! Smoothing constants are tuned for a ~60 Hz tick rate; a different tick
//! rate needs rescaled constants to keep the same perceptual timing.

use tracing::trace;

use super::spectral::SpectralStore;
use crate::config::{ElementKind, FrequencyBand};

/// Attack rate of the energy smoother.
const ENERGY_ATTACK: f32 = 0.15;
/// Per-tick energy decay when a band has no bins in range.
const ENERGY_DECAY: f32 = 0.85;
/// Attack rate of the pan smoother.
const PAN_ATTACK: f32 = 0.2;
/// Per-tick pan decay toward center on silence or an empty mask.
const PAN_DECAY: f32 = 0.9;
/// Total amplitude below which a band is considered silent for panning.
const SILENCE_FLOOR: f32 = 0.001;

/// Smoothed analysis state of one band.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandState {
    /// Exponentially smoothed band energy in [0, 1].
    pub energy_level: f32,
    /// Exponentially smoothed stereo pan in [-1, 1]; -1 is hard left.
    pub pan_level: f32,
}

struct Band {
    band: FrequencyBand,
    /// Bin index range `[lo, hi)` covered by the band, or `None` when no
    /// bin falls inside it (e.g. a band entirely above Nyquist).
    bins: Option<(usize, usize)>,
    state: BandState,
}

/// Extracts smoothed energy and pan per band from a [`SpectralStore`].
pub struct BandAnalyzer {
    bands: Vec<Band>,
}

impl BandAnalyzer {
    /// Build an analyzer for `bands` against the axes of `store`.
    ///
    /// Bin masks are resolved once here; the store is immutable so they
    /// stay valid for its lifetime.
    pub fn new(bands: &[FrequencyBand], store: &SpectralStore) -> Self {
        let freqs = store.frequency_bins();
        let bands = bands
            .iter()
            .map(|&band| {
                let lo = freqs.partition_point(|&f| f < band.min_hz);
                let hi = freqs.partition_point(|&f| f <= band.max_hz);
                Band {
                    band,
                    bins: (lo < hi).then_some((lo, hi)),
                    state: BandState::default(),
                }
            })
            .collect();
        Self { bands }
    }

    /// Advance all band states to the spectral column at `time`.
    ///
    /// Call once per tick. Total function: out-of-range times clamp to the
    /// last frame, empty masks and silence decay instead of failing.
    pub fn update(&mut self, store: &SpectralStore, time: f64) {
        let frame = store.frame_index_at(time);
        let left = store.column_left(frame);
        let right = store.column_right(frame);

        for band in &mut self.bands {
            let Some((lo, hi)) = band.bins else {
                band.state.energy_level *= ENERGY_DECAY;
                band.state.pan_level *= PAN_DECAY;
                continue;
            };

            let left_amp: f32 = left[lo..hi].iter().sum();
            let right_amp: f32 = right[lo..hi].iter().sum();
            let total = left_amp + right_amp;

            let raw = ((1.0 + total / band.band.bandwidth()).ln() / 10.0).min(1.0);
            band.state.energy_level += (raw - band.state.energy_level) * ENERGY_ATTACK;

            if total > SILENCE_FLOOR {
                let raw_pan = ((right_amp - left_amp) / total).clamp(-1.0, 1.0);
                band.state.pan_level += (raw_pan - band.state.pan_level) * PAN_ATTACK;
            } else {
                band.state.pan_level *= PAN_DECAY;
            }
        }

        trace!(frame, "band analysis updated");
    }

    /// Smoothed energy of an element's band, 0 when the element is not
    /// configured.
    pub fn energy(&self, kind: ElementKind) -> f32 {
        self.find(kind).map(|b| b.state.energy_level).unwrap_or(0.0)
    }

    /// Smoothed pan of an element's band, 0 when the element is not
    /// configured.
    pub fn pan(&self, kind: ElementKind) -> f32 {
        self.find(kind).map(|b| b.state.pan_level).unwrap_or(0.0)
    }

    /// Zero all smoothing accumulators (session restart).
    pub fn reset(&mut self) {
        for band in &mut self.bands {
            band.state = BandState::default();
        }
    }

    fn find(&self, kind: ElementKind) -> Option<&Band> {
        self.bands.iter().find(|b| b.band.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode::DecodedAudio;
    use crate::audio::spectral::StftConfig;
    use crate::config::ElementRegistry;

    fn store_from(left: Vec<f32>, right: Vec<f32>) -> SpectralStore {
        let audio = DecodedAudio {
            left,
            right,
            sample_rate: 44_100,
        };
        SpectralStore::analyze(&audio, StftConfig::default()).unwrap()
    }

    fn tone(freq: f32, amplitude: f32, count: usize) -> Vec<f32> {
        (0..count)
            .map(|i| {
                (2.0 * std::f32::consts::PI * freq * i as f32 / 44_100.0).sin() * amplitude
            })
            .collect()
    }

    #[test]
    fn test_empty_mask_decays_exactly() {
        let store = store_from(tone(440.0, 0.5, 8192), tone(440.0, 0.5, 8192));
        let band = FrequencyBand {
            kind: ElementKind::Water,
            min_hz: 30_000.0,
            max_hz: 40_000.0,
        };
        let mut analyzer = BandAnalyzer::new(&[band], &store);
        analyzer.bands[0].state = BandState {
            energy_level: 0.8,
            pan_level: 0.5,
        };

        analyzer.update(&store, 0.05);
        assert!((analyzer.energy(ElementKind::Water) - 0.8 * 0.85).abs() < 1e-6);
        assert!((analyzer.pan(ElementKind::Water) - 0.5 * 0.9).abs() < 1e-6);

        analyzer.update(&store, 0.05);
        assert!((analyzer.energy(ElementKind::Water) - 0.8 * 0.85 * 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_energy_rises_on_in_band_tone() {
        let store = store_from(tone(440.0, 0.5, 16384), tone(440.0, 0.5, 16384));
        let band = FrequencyBand {
            kind: ElementKind::Wind,
            min_hz: 250.0,
            max_hz: 1000.0,
        };
        let mut analyzer = BandAnalyzer::new(&[band], &store);

        for _ in 0..10 {
            analyzer.update(&store, 0.1);
        }
        let energy = analyzer.energy(ElementKind::Wind);
        assert!(energy > 0.0 && energy <= 1.0, "energy was {energy}");
    }

    #[test]
    fn test_pan_tracks_left_heavy_signal() {
        // Signal only in the left channel: pan must go negative.
        let store = store_from(tone(440.0, 0.5, 16384), vec![0.0; 16384]);
        let band = FrequencyBand {
            kind: ElementKind::Wind,
            min_hz: 250.0,
            max_hz: 1000.0,
        };
        let mut analyzer = BandAnalyzer::new(&[band], &store);

        for _ in 0..20 {
            analyzer.update(&store, 0.1);
        }
        let pan = analyzer.pan(ElementKind::Wind);
        assert!(pan < -0.5, "pan was {pan}");
        assert!(pan >= -1.0);
    }

    #[test]
    fn test_silence_decays_pan_without_dividing() {
        let store = store_from(vec![0.0; 8192], vec![0.0; 8192]);
        let band = FrequencyBand {
            kind: ElementKind::Fire,
            min_hz: 1000.0,
            max_hz: 4000.0,
        };
        let mut analyzer = BandAnalyzer::new(&[band], &store);
        analyzer.bands[0].state.pan_level = -0.6;

        analyzer.update(&store, 0.0);
        let pan = analyzer.pan(ElementKind::Fire);
        assert!((pan - (-0.6 * 0.9)).abs() < 1e-6);
        assert!(pan.is_finite());
    }

    #[test]
    fn test_time_past_end_uses_last_frame() {
        let store = store_from(tone(440.0, 0.5, 8192), tone(440.0, 0.5, 8192));
        let mut analyzer = BandAnalyzer::new(&ElementRegistry::standard().bands(), &store);
        // Must not panic or produce non-finite output.
        analyzer.update(&store, 1e9);
        for kind in ElementKind::ALL {
            assert!(analyzer.energy(kind).is_finite());
            assert!(analyzer.pan(kind).is_finite());
        }
    }
}
