//! OdinViz Core - audio/MIDI reactivity pipeline
//!
//! This crate contains the signal side of the visualizer:
//! - Offline stereo STFT of the backing track ([`audio::SpectralStore`])
//! - Per-band energy and stereo-pan extraction ([`audio::BandAnalyzer`])
//! - Time-ordered MIDI note schedule ([`midi::EventSchedule`])
//! - Per-channel activity tracking ([`midi::ChannelActivityTracker`])
//! - The hub/satellite force and compounding model ([`reactivity`])
//!
//! Rendering, particle visuals, and playback transport are consumers of the
//! state computed here; they live outside this crate.

#![warn(missing_docs)]

pub use glam::Vec2;
use thiserror::Error;

pub mod audio;
pub mod config;
pub mod emission;
pub mod entity;
pub mod midi;
pub mod reactivity;
pub mod session;

// --- Re-exports grouped by category ---

// Configuration
pub use config::{
    ElementConfig, ElementKind, ElementRegistry, EmitterKind, FrequencyBand, VizConfig,
    ELEMENT_COUNT,
};

// Audio analysis
pub use audio::{AudioDecoder, BandAnalyzer, BandState, DecodedAudio, SpectralStore, WavDecoder};

// MIDI
pub use midi::{ChannelActivityTracker, ChannelState, EventSchedule, MidiEvent, MidiEventKind};

// Reactivity
pub use emission::EmitterState;
pub use entity::{ConnectionState, HubState, ParticleSink, SatelliteState};
pub use reactivity::ReactivityAggregator;
pub use session::{Emission, Session, TickOutput};

/// Errors raised while building a session's inputs.
///
/// Loading is the only fallible phase: once a [`SpectralStore`] and an
/// [`EventSchedule`] exist, every per-tick operation is total.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File missing or unreadable.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV container or sample format error.
    #[error("WAV decode error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio file decoded to zero samples.
    #[error("audio file decoded to zero samples")]
    EmptyAudio,

    /// Standard MIDI File structure error.
    #[error("MIDI parse error: {0}")]
    MidiParse(String),

    /// MIDI file contained no note events.
    #[error("MIDI file contains no note events")]
    EmptyMidi,
}
