//! One loaded track plus the full per-tick pipeline.
//!
//! A [`Session`] owns every piece of live state: the immutable spectral and
//! MIDI inputs, the analyzers, and the hub/satellite network. The transport
//! stays outside; callers feed in the playback clock each tick.

use std::path::Path;

use rand::RngExt;
use tracing::{debug, info};

use crate::audio::{BandAnalyzer, SpectralStore, StftConfig, WavDecoder};
use crate::config::{ElementKind, ElementRegistry, VizConfig, ELEMENT_COUNT};
use crate::emission::{pan_split, EmitterState};
use crate::entity::{ConnectionState, HubState, SatelliteState};
use crate::midi::{ChannelActivityTracker, ChannelState, EventSchedule, NoteListener};
use crate::reactivity::ReactivityAggregator;
use crate::LoadError;

/// One particle release decided this tick.
#[derive(Debug, Clone, Copy)]
pub struct Emission {
    /// Satellite that emitted.
    pub kind: ElementKind,
    /// `(left, right)` weight split from the band's pan.
    pub weights: (f32, f32),
}

/// Everything a renderer needs to know about one tick.
#[derive(Debug, Default)]
pub struct TickOutput {
    /// MIDI events drained this tick.
    pub events_processed: usize,
    /// Particle releases rolled this tick.
    pub emissions: Vec<Emission>,
    /// Colors of the sink contents when a hub burst fired, drained.
    pub burst: Option<Vec<[f32; 3]>>,
}

/// Routes drained note events into the satellite network.
struct NetworkListener<'a> {
    satellites: &'a mut [SatelliteState; ELEMENT_COUNT],
    connections: &'a mut [ConnectionState; ELEMENT_COUNT],
}

impl NoteListener for NetworkListener<'_> {
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        if let Some(kind) = ElementKind::from_channel(channel) {
            self.satellites[kind.index()].note_on(note, velocity);
        }
    }

    fn note_off(&mut self, channel: u8, note: u8) {
        if let Some(kind) = ElementKind::from_channel(channel) {
            self.satellites[kind.index()].note_off(note);
        }
    }

    fn connection_trigger(&mut self, channel: u8, intensity: f32) {
        if let Some(kind) = ElementKind::from_channel(channel) {
            self.connections[kind.index()].trigger(intensity);
        }
    }
}

/// A loaded track with its full live state.
pub struct Session {
    config: VizConfig,
    store: SpectralStore,
    schedule: EventSchedule,
    analyzer: BandAnalyzer,
    tracker: ChannelActivityTracker,
    aggregator: ReactivityAggregator,
    hub: HubState,
    satellites: [SatelliteState; ELEMENT_COUNT],
    connections: [ConnectionState; ELEMENT_COUNT],
    emitters: [EmitterState; ELEMENT_COUNT],
    audio_level: f32,
    background_intensity: f32,
}

impl Session {
    /// Load a WAV backing track and a MIDI arrangement.
    pub fn load(audio_path: &Path, midi_path: &Path, config: VizConfig) -> Result<Self, LoadError> {
        let stft = StftConfig {
            window_size: config.fft_window_size,
            hop_length: config.fft_hop_length,
        };
        let store = SpectralStore::load(audio_path, &WavDecoder, stft, config.sample_rate)?;
        let schedule = EventSchedule::load(midi_path)?;
        info!(
            audio = %audio_path.display(),
            midi = %midi_path.display(),
            "session loaded"
        );
        Ok(Self::from_parts(store, schedule, config))
    }

    /// Assemble a session from already-built inputs (tests, live capture).
    pub fn from_parts(store: SpectralStore, schedule: EventSchedule, config: VizConfig) -> Self {
        let registry = ElementRegistry::standard();
        let analyzer = BandAnalyzer::new(&registry.bands(), &store);
        let aggregator = ReactivityAggregator::new(&registry, &config);
        let center = config.center();

        let mut rng = rand::rng();
        let elements = registry.elements();
        let satellites = std::array::from_fn(|i| {
            let position = elements[i].world_position(center, config.satellite_distance);
            SatelliteState::new(&elements[i], position)
        });
        let connections = std::array::from_fn(|i| {
            ConnectionState::new(ElementKind::ALL[i], rng.random_range(0.4..1.0))
        });
        let emitters = std::array::from_fn(|i| EmitterState::new(elements[i].emitter));

        Self {
            config,
            store,
            schedule,
            analyzer,
            tracker: ChannelActivityTracker::new(),
            aggregator,
            hub: HubState::new(center),
            satellites,
            connections,
            emitters,
            audio_level: 0.0,
            background_intensity: 0.0,
        }
    }

    /// Advance the whole pipeline to the playback time `now`.
    ///
    /// Strict order: drain MIDI, refresh band analysis, aggregate into hub
    /// targets, then ease the entities. Call once per tick while playing.
    pub fn tick(&mut self, now: f64, dt: f32) -> TickOutput {
        let mut output = TickOutput::default();

        // 1. Drain MIDI events, routing them into the network.
        let Session {
            tracker,
            schedule,
            satellites,
            connections,
            ..
        } = self;
        let mut listener = NetworkListener {
            satellites,
            connections,
        };
        output.events_processed = tracker.advance(schedule, now, &mut listener);

        // 2. Band energy and pan for the same clock.
        self.analyzer.update(&self.store, now);

        // 3. Aggregate the elemental channels into hub and edge targets.
        let channels: [ChannelState; ELEMENT_COUNT] =
            std::array::from_fn(|i| *self.tracker.channel(i as u8));
        self.aggregator
            .update(&channels, &mut self.hub, &mut self.connections);

        // 4. Global levels from total channel activity.
        let total = self.tracker.total_activity();
        let level_target = (total * 0.8).min(1.0);
        self.audio_level += (level_target - self.audio_level) * 0.1;
        self.background_intensity = (total * 0.1).min(0.3);

        // 5. Ease the entities and roll emissions.
        let mut rng = rand::rng();
        for kind in ElementKind::ALL {
            let i = kind.index();
            let energy = self.analyzer.energy(kind);

            self.satellites[i].update(dt, energy);
            self.connections[i]
                .update(dt, self.hub.activity, self.satellites[i].activity);

            // Only satellites with held notes emit; an idle element stays
            // quiet no matter the band energy.
            if self.tracker.channel(i as u8).is_active() {
                self.emitters[i].update(dt);
                let probability = self.emitters[i].probability(energy);
                if probability > 0.0 && rng.random_range(0.0..1.0) < probability {
                    self.emitters[i].mark_emitted();
                    // Travel time is a rendering concern; the emitted particle
                    // counts toward the sink immediately.
                    self.hub.sink.absorb(self.satellites[i].color);
                    output.emissions.push(Emission {
                        kind,
                        weights: pan_split(self.analyzer.pan(kind)),
                    });
                }
            }
        }

        if self.hub.update(dt, self.audio_level) {
            let colors = self.hub.sink.drain();
            debug!(particles = colors.len(), "hub burst");
            output.burst = Some(colors);
        }

        output
    }

    /// Reset every live accumulator for a restart from t=0.
    ///
    /// One call resets the event cursor, the smoothers, and the network
    /// together; resetting pieces separately leaves stale state behind.
    pub fn restart(&mut self) {
        self.tracker.reset();
        self.analyzer.reset();
        self.hub.reset();
        for satellite in &mut self.satellites {
            satellite.reset();
        }
        for connection in &mut self.connections {
            connection.reset();
        }
        for emitter in &mut self.emitters {
            emitter.reset();
        }
        self.audio_level = 0.0;
        self.background_intensity = 0.0;
        info!("session restarted");
    }

    /// Seconds covered by the longer of the two inputs.
    pub fn duration(&self) -> f64 {
        let audio_end = self.store.time_frames().last().copied().unwrap_or(0.0);
        audio_end.max(self.schedule.duration())
    }

    /// Static tuning for this session.
    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    /// The precomputed spectral input.
    pub fn store(&self) -> &SpectralStore {
        &self.store
    }

    /// The loaded note schedule.
    pub fn schedule(&self) -> &EventSchedule {
        &self.schedule
    }

    /// The band analyzer's current smoothed state.
    pub fn analyzer(&self) -> &BandAnalyzer {
        &self.analyzer
    }

    /// Per-channel MIDI activity.
    pub fn tracker(&self) -> &ChannelActivityTracker {
        &self.tracker
    }

    /// The hub entity.
    pub fn hub(&self) -> &HubState {
        &self.hub
    }

    /// The four satellites in element order.
    pub fn satellites(&self) -> &[SatelliteState; ELEMENT_COUNT] {
        &self.satellites
    }

    /// The four hub-satellite edges in element order.
    pub fn connections(&self) -> &[ConnectionState; ELEMENT_COUNT] {
        &self.connections
    }

    /// Smoothed overall audio level in [0, 1].
    pub fn audio_level(&self) -> f32 {
        self.audio_level
    }

    /// Background glow intensity in [0, 0.3].
    pub fn background_intensity(&self) -> f32 {
        self.background_intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DecodedAudio;
    use crate::midi::{MidiEvent, MidiEventKind};

    fn quiet_store() -> SpectralStore {
        let audio = DecodedAudio {
            left: vec![0.0; 44_100],
            right: vec![0.0; 44_100],
            sample_rate: 44_100,
        };
        SpectralStore::analyze(&audio, StftConfig::default()).unwrap()
    }

    fn one_note_schedule() -> EventSchedule {
        EventSchedule::from_events(vec![
            MidiEvent {
                time_seconds: 0.0,
                kind: MidiEventKind::NoteOn,
                channel: 0,
                note: 60,
                velocity: 100,
            },
            MidiEvent {
                time_seconds: 1.0,
                kind: MidiEventKind::NoteOff,
                channel: 0,
                note: 60,
                velocity: 0,
            },
        ])
    }

    #[test]
    fn test_tick_routes_notes_into_network() {
        let mut session = Session::from_parts(
            quiet_store(),
            one_note_schedule(),
            VizConfig::default(),
        );

        let output = session.tick(0.5, 1.0 / 60.0);
        assert_eq!(output.events_processed, 1);

        let earth = &session.satellites()[0];
        assert_eq!(earth.held_notes(), 1);
        assert!(session.hub().target_size > session.hub().base_size);
        assert!(session.connections()[0].pulse_strength > 0.0);
        assert!(session.audio_level() > 0.0);
    }

    #[test]
    fn test_tick_is_total_past_track_end() {
        let mut session = Session::from_parts(
            quiet_store(),
            one_note_schedule(),
            VizConfig::default(),
        );

        for i in 0..10 {
            session.tick(100.0 + i as f64, 1.0 / 60.0);
        }
        assert!(session.hub().size.is_finite());
        assert!(session.audio_level().is_finite());
    }

    #[test]
    fn test_restart_replays_from_zero() {
        let mut session = Session::from_parts(
            quiet_store(),
            one_note_schedule(),
            VizConfig::default(),
        );

        session.tick(2.0, 1.0 / 60.0);
        assert_eq!(session.satellites()[0].held_notes(), 0);

        session.restart();
        assert_eq!(session.tracker().total_activity(), 0.0);
        assert_eq!(session.audio_level(), 0.0);
        assert_eq!(session.hub().size, session.hub().base_size);

        // The note-on at t=0 replays.
        let output = session.tick(0.5, 1.0 / 60.0);
        assert_eq!(output.events_processed, 1);
        assert_eq!(session.satellites()[0].held_notes(), 1);
    }

    #[test]
    fn test_idle_satellites_never_emit() {
        // One note far beyond the simulated window: every channel stays
        // idle, so no satellite may roll an emission or feed the sink.
        let schedule = EventSchedule::from_events(vec![MidiEvent {
            time_seconds: 1000.0,
            kind: MidiEventKind::NoteOn,
            channel: 0,
            note: 60,
            velocity: 100,
        }]);
        let mut session =
            Session::from_parts(quiet_store(), schedule, VizConfig::default());

        let mut emissions = 0;
        let mut now = 0.0;
        for _ in 0..600 {
            now += 1.0 / 60.0;
            emissions += session.tick(now, 1.0 / 60.0).emissions.len();
        }
        assert_eq!(emissions, 0);
        assert!(session.hub().sink.is_empty());
    }

    #[test]
    fn test_duration_covers_both_inputs() {
        let session = Session::from_parts(
            quiet_store(),
            one_note_schedule(),
            VizConfig::default(),
        );
        assert!(session.duration() >= 1.0);
    }
}
