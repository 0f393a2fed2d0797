//! Audio analysis subsystem.
//!
//! A backing track is decoded once, transformed into an immutable
//! [`SpectralStore`], and then sampled every tick by the [`BandAnalyzer`]
//! for per-element energy and stereo pan.

mod bands;
mod decode;
mod spectral;

pub use bands::{BandAnalyzer, BandState};
pub use decode::{AudioDecoder, DecodedAudio, WavDecoder};
pub use spectral::{SpectralStore, StftConfig};
