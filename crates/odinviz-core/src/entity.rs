//! Numeric state machines for the hub, satellites, and connecting edges.
//!
//! Everything here stops at numbers a renderer reads each tick: sizes,
//! colors, positions, edge strengths. Drawing, jitter presentation, and
//! particle trajectories live outside the core.

use std::collections::BTreeSet;

use glam::Vec2;

use crate::config::{ElementConfig, ElementKind};

/// Hub resting size in pixels.
pub const HUB_BASE_SIZE: f32 = 45.0;
/// Hub resting color (purple).
pub const HUB_BASE_COLOR: [f32; 3] = [120.0, 80.0, 180.0];
/// Satellite resting size in pixels.
pub const SATELLITE_BASE_SIZE: f32 = 55.0;
/// Particles the hub sink can hold before refusing more.
pub const SINK_CAPACITY: usize = 500;

/// Accumulation buffer for particles absorbed by the hub.
///
/// Holds only the data the 3D explosion needs (one color per particle);
/// the burst itself is rendered externally from what [`drain`] returns.
///
/// [`drain`]: ParticleSink::drain
#[derive(Debug, Clone)]
pub struct ParticleSink {
    colors: Vec<[f32; 3]>,
    capacity: usize,
}

impl Default for ParticleSink {
    fn default() -> Self {
        Self {
            colors: Vec::new(),
            capacity: SINK_CAPACITY,
        }
    }
}

impl ParticleSink {
    /// Store one absorbed particle. Returns false when the sink is full.
    pub fn absorb(&mut self, color: [f32; 3]) -> bool {
        if self.colors.len() < self.capacity {
            self.colors.push(color);
            true
        } else {
            false
        }
    }

    /// Empty the sink, yielding the stored colors for the burst.
    pub fn drain(&mut self) -> Vec<[f32; 3]> {
        std::mem::take(&mut self.colors)
    }

    /// Number of particles currently held.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// True when nothing has been absorbed.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// The central hub entity.
///
/// The aggregator writes the `target_*` fields; [`update`] eases the live
/// values toward them and reports when a contraction burst should fire.
///
/// [`update`]: HubState::update
#[derive(Debug, Clone)]
pub struct HubState {
    /// Resting center position (window center).
    pub original_position: Vec2,
    /// Current base position, moved around by elemental forces.
    pub position: Vec2,
    /// Resting size.
    pub base_size: f32,
    /// Smoothed live size.
    pub size: f32,
    /// Size the hub is easing toward.
    pub target_size: f32,
    /// Resting color.
    pub base_color: [f32; 3],
    /// Smoothed live color.
    pub color: [f32; 3],
    /// Color the hub is easing toward.
    pub target_color: [f32; 3],
    /// Aggregate excitement in [0, 1].
    pub activity: f32,
    /// Smoothed overall audio level.
    pub audio_smoothed: f32,
    /// Absorbed-particle buffer.
    pub sink: ParticleSink,
    was_large: bool,
}

impl HubState {
    /// Hub at rest at `center`.
    pub fn new(center: Vec2) -> Self {
        Self {
            original_position: center,
            position: center,
            base_size: HUB_BASE_SIZE,
            size: HUB_BASE_SIZE,
            target_size: HUB_BASE_SIZE,
            base_color: HUB_BASE_COLOR,
            color: HUB_BASE_COLOR,
            target_color: HUB_BASE_COLOR,
            activity: 0.0,
            audio_smoothed: 0.0,
            sink: ParticleSink::default(),
            was_large: false,
        }
    }

    /// Ease live values toward their targets.
    ///
    /// Returns true when the hub is contracting out of its enlarged state
    /// with particles in the sink: the signal for the explosion burst. The
    /// caller drains the sink; until it does, the signal repeats.
    pub fn update(&mut self, dt: f32, audio_level: f32) -> bool {
        self.audio_smoothed += (audio_level - self.audio_smoothed) * dt * 8.0;

        self.size += (self.target_size - self.size) * dt * 8.0;
        self.size = self.size.clamp(20.0, 120.0);

        let is_large = self.size > self.base_size * 1.5;
        if self.was_large && !is_large && !self.sink.is_empty() {
            return true;
        }
        self.was_large = is_large;

        for i in 0..3 {
            self.color[i] += (self.target_color[i] - self.color[i]) * dt * 5.0;
            self.color[i] = self.color[i].clamp(0.0, 255.0);
        }

        self.activity = (self.activity * 0.92).clamp(0.0, 1.0);
        false
    }

    /// Move the hub's base position (elemental forces push it around).
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Return to the resting state; targets, position, and sink included.
    pub fn reset(&mut self) {
        *self = Self::new(self.original_position);
    }
}

/// One satellite element entity.
#[derive(Debug, Clone)]
pub struct SatelliteState {
    /// Which element this satellite is.
    pub kind: ElementKind,
    /// Resting world position.
    pub original_position: Vec2,
    /// Resting size.
    pub base_size: f32,
    /// Smoothed live size.
    pub size: f32,
    /// Size the satellite is easing toward.
    pub target_size: f32,
    /// Resting color from the element config.
    pub base_color: [f32; 3],
    /// Current color, blended from the active notes' gradient entries.
    pub color: [f32; 3],
    /// MIDI-driven excitement in [0, 1].
    pub activity: f32,
    /// Max of MIDI activity and boosted band energy, fed to the shape.
    pub audio_intensity: f32,
    /// Smoothed version of `audio_intensity`.
    pub audio_smoothed: f32,
    active_notes: BTreeSet<u8>,
    note_gradient: [[f32; 3]; 12],
}

impl SatelliteState {
    /// Satellite at rest at its configured position.
    pub fn new(config: &ElementConfig, position: Vec2) -> Self {
        Self {
            kind: config.kind,
            original_position: position,
            base_size: SATELLITE_BASE_SIZE,
            size: SATELLITE_BASE_SIZE,
            target_size: SATELLITE_BASE_SIZE,
            base_color: config.base_color,
            color: config.base_color,
            activity: 0.0,
            audio_intensity: 0.0,
            audio_smoothed: 0.0,
            active_notes: BTreeSet::new(),
            note_gradient: config.note_gradient,
        }
    }

    /// React to a note starting on this satellite's channel.
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        self.active_notes.insert(note);
        let intensity = (f32::from(velocity) / 127.0).min(1.0);
        self.target_size = self.base_size + intensity * 25.0;
        self.activity = (self.activity + intensity * 0.8).min(1.0);
    }

    /// React to a note ending; the last release resets the size target.
    pub fn note_off(&mut self, note: u8) {
        self.active_notes.remove(&note);
        if self.active_notes.is_empty() {
            self.target_size = self.base_size;
        }
    }

    /// Ease live values toward their targets.
    ///
    /// `band_energy` is the satellite's own band level, passed in explicitly
    /// each tick rather than read through a back-reference.
    pub fn update(&mut self, dt: f32, band_energy: f32) {
        self.audio_intensity = self.activity.max(band_energy * 1.5);
        self.audio_smoothed += (self.audio_intensity - self.audio_smoothed) * dt * 6.0;

        self.color = self.blended_note_color();

        self.size += (self.target_size - self.size) * dt * 8.0;
        self.size = self.size.clamp(15.0, 60.0);

        self.activity = (self.activity * 0.92).clamp(0.0, 1.0);
        if !self.active_notes.is_empty() {
            self.activity = (self.active_notes.len() as f32 * 0.3).min(1.0);
        }
    }

    /// Number of notes currently held on this satellite.
    pub fn held_notes(&self) -> usize {
        self.active_notes.len()
    }

    /// Return to the resting state.
    pub fn reset(&mut self) {
        self.size = self.base_size;
        self.target_size = self.base_size;
        self.color = self.base_color;
        self.activity = 0.0;
        self.audio_intensity = 0.0;
        self.audio_smoothed = 0.0;
        self.active_notes.clear();
    }

    fn blended_note_color(&self) -> [f32; 3] {
        if self.active_notes.is_empty() {
            return self.base_color;
        }
        let mut blended = [0.0f32; 3];
        for &note in &self.active_notes {
            let entry = self.note_gradient[(note % 12) as usize];
            for i in 0..3 {
                blended[i] += entry[i];
            }
        }
        let count = self.active_notes.len() as f32;
        blended.map(|c| c / count)
    }
}

/// An edge between the hub and one satellite.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    /// Satellite endpoint.
    pub kind: ElementKind,
    /// Smoothed edge strength in [0, 1].
    pub strength: f32,
    /// Strength target.
    pub target_strength: f32,
    /// Short-lived pulse level from note impulses, decays every tick.
    pub pulse_strength: f32,
    /// Smoothed pull toward the hub in [0, 1].
    pub pull: f32,
    /// Pull target set by the aggregator.
    pub target_pull: f32,
    harmonic_sensitivity: f32,
}

impl ConnectionState {
    /// New edge to `kind` with a given impulse sensitivity (drawn once from
    /// U(0.4, 1.0) at network construction).
    pub fn new(kind: ElementKind, harmonic_sensitivity: f32) -> Self {
        Self {
            kind,
            strength: 0.3,
            target_strength: 0.3,
            pulse_strength: 0.0,
            pull: 0.0,
            target_pull: 0.0,
            harmonic_sensitivity,
        }
    }

    /// Ease strength and pull; feed back the endpoints' combined activity.
    pub fn update(&mut self, dt: f32, hub_activity: f32, satellite_activity: f32) {
        self.strength += (self.target_strength - self.strength) * dt * 4.0;
        self.pulse_strength = (self.pulse_strength * 0.88).max(0.0);
        self.pull += (self.target_pull - self.pull) * dt * 6.0;

        let combined = (hub_activity + satellite_activity) / 2.0;
        if combined > 0.1 {
            self.pulse_strength = (self.pulse_strength + combined * 0.6).min(1.0);
            self.target_strength = (0.3 + combined * 0.7).min(1.0);
        }
    }

    /// A note impulse traveling along the edge.
    pub fn trigger(&mut self, intensity: f32) {
        self.pulse_strength =
            (self.pulse_strength + intensity * self.harmonic_sensitivity).min(1.0);
        self.target_strength = (0.4 + intensity * 0.6).min(1.0);
    }

    /// Set the pull target, clamped to [0, 1].
    pub fn set_pull(&mut self, pull: f32) {
        self.target_pull = pull.clamp(0.0, 1.0);
    }

    /// Return to the resting state.
    pub fn reset(&mut self) {
        let sensitivity = self.harmonic_sensitivity;
        *self = Self::new(self.kind, sensitivity);
    }
}
