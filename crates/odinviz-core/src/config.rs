//! Element and analysis configuration.
//!
//! The four elements are fixed at compile time (they map 1:1 onto MIDI
//! channels 0-3 and onto the frequency bands of the audio analysis), but all
//! tuning lives in an explicit [`ElementRegistry`] built once at startup and
//! passed by reference into the components that need it. There is no global
//! registry.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// The closed set of satellite elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Bottom satellite, MIDI channel 0, low band.
    Earth,
    /// Right satellite, MIDI channel 1, low-mid band.
    Wind,
    /// Top satellite, MIDI channel 2, high-mid band.
    Fire,
    /// Left satellite, MIDI channel 3, high band.
    Water,
}

/// Number of elements (and of elemental MIDI channels).
pub const ELEMENT_COUNT: usize = 4;

impl ElementKind {
    /// All elements, in channel order.
    pub const ALL: [ElementKind; ELEMENT_COUNT] = [
        ElementKind::Earth,
        ElementKind::Wind,
        ElementKind::Fire,
        ElementKind::Water,
    ];

    /// Stable index, equal to the element's MIDI channel.
    pub fn index(self) -> usize {
        match self {
            ElementKind::Earth => 0,
            ElementKind::Wind => 1,
            ElementKind::Fire => 2,
            ElementKind::Water => 3,
        }
    }

    /// Element bound to a MIDI channel, if the channel is elemental (0-3).
    pub fn from_channel(channel: u8) -> Option<ElementKind> {
        ElementKind::ALL.get(channel as usize).copied()
    }
}

/// How a satellite releases particles toward the hub.
///
/// A closed variant set rather than an open hierarchy; per-kind behavior is
/// a table lookup in the emission policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmitterKind {
    /// Paired left/right emitters, weighted by stereo pan (Earth, Fire).
    Directional,
    /// Emitters offset above/below the satellite (Wind).
    Radial,
    /// Continuous droplet stream gated by a fixed interval (Water).
    Stream,
}

/// A named frequency range analyzed independently of the others.
///
/// Bounds are inclusive on both ends; bands may overlap by configuration
/// even though the standard set is disjoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrequencyBand {
    /// Element this band drives.
    pub kind: ElementKind,
    /// Lower bound in Hz.
    pub min_hz: f32,
    /// Upper bound in Hz.
    pub max_hz: f32,
}

impl FrequencyBand {
    /// Band width in Hz.
    pub fn bandwidth(&self) -> f32 {
        self.max_hz - self.min_hz
    }
}

/// Full static configuration for one element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementConfig {
    /// Which element this is.
    pub kind: ElementKind,
    /// MIDI channel bound to this element.
    pub channel: u8,
    /// Resting RGB color.
    pub base_color: [f32; 3],
    /// Unit offset of the satellite from the hub (scaled by satellite distance).
    pub position_offset: Vec2,
    /// Frequency band driving this element's audio reactivity.
    pub band: FrequencyBand,
    /// Particle emission style.
    pub emitter: EmitterKind,
    /// 12-step color gradient indexed by `note % 12`.
    pub note_gradient: [[f32; 3]; 12],
}

impl ElementConfig {
    /// Color for a specific MIDI note.
    pub fn note_color(&self, note: u8) -> [f32; 3] {
        self.note_gradient[(note % 12) as usize]
    }

    /// World position of this satellite given the hub center.
    pub fn world_position(&self, center: Vec2, satellite_distance: f32) -> Vec2 {
        center + self.position_offset * satellite_distance
    }
}

/// Immutable registry of all element configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementRegistry {
    elements: Vec<ElementConfig>,
}

impl ElementRegistry {
    /// The standard Earth/Wind/Fire/Water setup.
    pub fn standard() -> Self {
        let defs: [(ElementKind, [f32; 3], Vec2, (f32, f32), EmitterKind); ELEMENT_COUNT] = [
            (
                ElementKind::Earth,
                [139.0, 69.0, 19.0],
                Vec2::new(0.0, 1.0),
                (20.0, 250.0),
                EmitterKind::Directional,
            ),
            (
                ElementKind::Wind,
                [135.0, 206.0, 235.0],
                Vec2::new(1.0, 0.0),
                (250.0, 1000.0),
                EmitterKind::Radial,
            ),
            (
                ElementKind::Fire,
                [220.0, 20.0, 20.0],
                Vec2::new(0.0, -1.0),
                (1000.0, 4000.0),
                EmitterKind::Directional,
            ),
            (
                ElementKind::Water,
                [0.0, 191.0, 255.0],
                Vec2::new(-1.0, 0.0),
                (4000.0, 22050.0),
                EmitterKind::Stream,
            ),
        ];

        let elements = defs
            .into_iter()
            .map(|(kind, base_color, position_offset, (min_hz, max_hz), emitter)| ElementConfig {
                kind,
                channel: kind.index() as u8,
                base_color,
                position_offset,
                band: FrequencyBand { kind, min_hz, max_hz },
                emitter,
                note_gradient: note_gradient(kind),
            })
            .collect();

        Self { elements }
    }

    /// All configured elements, in channel order.
    pub fn elements(&self) -> &[ElementConfig] {
        &self.elements
    }

    /// Configuration for one element.
    pub fn element(&self, kind: ElementKind) -> &ElementConfig {
        &self.elements[kind.index()]
    }

    /// Configuration for a MIDI channel, if the channel is elemental.
    pub fn by_channel(&self, channel: u8) -> Option<&ElementConfig> {
        ElementKind::from_channel(channel).map(|kind| self.element(kind))
    }

    /// The frequency bands of all elements, in channel order.
    pub fn bands(&self) -> Vec<FrequencyBand> {
        self.elements.iter().map(|e| e.band).collect()
    }
}

/// Tick-rate independent tuning for the whole visualization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizConfig {
    /// Logical window width in pixels (hub clamp bounds).
    pub window_width: f32,
    /// Logical window height in pixels.
    pub window_height: f32,
    /// Distance from the hub center to each satellite.
    pub satellite_distance: f32,
    /// Minimum distance the hub keeps from every window edge.
    pub max_displacement: f32,
    /// Preferred decode sample rate in Hz.
    pub sample_rate: u32,
    /// STFT window size in samples.
    pub fft_window_size: usize,
    /// STFT hop length in samples.
    pub fft_hop_length: usize,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            window_width: 1400.0,
            window_height: 900.0,
            satellite_distance: 250.0,
            max_displacement: 50.0,
            sample_rate: 44_100,
            fft_window_size: 2048,
            fft_hop_length: 512,
        }
    }
}

impl VizConfig {
    /// Center of the window; the hub's resting position.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.window_width / 2.0, self.window_height / 2.0)
    }
}

fn note_gradient(kind: ElementKind) -> [[f32; 3]; 12] {
    let table: [[u16; 3]; 12] = match kind {
        ElementKind::Earth => [
            [139, 69, 19],
            [150, 75, 20],
            [160, 80, 25],
            [170, 85, 30],
            [180, 90, 35],
            [190, 85, 25],
            [200, 80, 15],
            [210, 75, 10],
            [220, 70, 5],
            [200, 65, 15],
            [180, 60, 25],
            [160, 55, 35],
        ],
        ElementKind::Wind => [
            [135, 206, 235],
            [120, 200, 230],
            [105, 195, 225],
            [90, 190, 220],
            [75, 185, 215],
            [85, 180, 210],
            [95, 175, 205],
            [105, 170, 200],
            [115, 165, 195],
            [125, 160, 190],
            [135, 155, 185],
            [145, 150, 180],
        ],
        ElementKind::Fire => [
            [180, 0, 0],
            [200, 10, 0],
            [220, 20, 0],
            [240, 30, 0],
            [255, 40, 0],
            [255, 60, 0],
            [255, 80, 0],
            [255, 100, 0],
            [255, 120, 0],
            [255, 140, 10],
            [255, 160, 20],
            [255, 180, 30],
        ],
        ElementKind::Water => [
            [0, 191, 255],
            [10, 185, 250],
            [20, 180, 245],
            [30, 175, 240],
            [40, 170, 235],
            [35, 165, 230],
            [30, 160, 225],
            [25, 155, 220],
            [20, 150, 215],
            [15, 145, 210],
            [10, 140, 205],
            [5, 135, 200],
        ],
    };
    table.map(|rgb| rgb.map(|c| c as f32))
}
