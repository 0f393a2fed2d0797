//! Per-satellite emission policy.
//!
//! Decides each tick whether a satellite should release particles and how
//! the release splits across its paired emitters. The particles themselves
//! are a rendering concern; this module only produces the decision inputs.

use crate::config::EmitterKind;

/// Stream emitters drip on a fixed interval instead of a dice roll.
const STREAM_INTERVAL: f32 = 0.06;

/// Pan beyond which one side of a directional pair dominates.
const PAN_THRESHOLD: f32 = 0.1;

/// Per-kind emission probability for one tick.
///
/// Directional and radial emitters roll against an energy-scaled chance;
/// stream emitters always fire when their interval gate is open.
pub fn emission_probability(kind: EmitterKind, energy_level: f32) -> f32 {
    match kind {
        EmitterKind::Directional | EmitterKind::Radial => {
            (0.1 + energy_level * 0.4).clamp(0.0, 1.0)
        }
        EmitterKind::Stream => 1.0,
    }
}

/// Weight split between the left and right emitter of a pair, from the
/// band's smoothed pan. Returns `(left, right)` summing to 1.
pub fn pan_split(pan_level: f32) -> (f32, f32) {
    if pan_level < -PAN_THRESHOLD {
        (0.9, 0.1)
    } else if pan_level > PAN_THRESHOLD {
        (0.1, 0.9)
    } else {
        (0.5, 0.5)
    }
}

/// Cooldown-gated emission state for one satellite.
#[derive(Debug, Clone)]
pub struct EmitterState {
    /// Emission style, fixed per element.
    pub kind: EmitterKind,
    cooldown: f32,
}

impl EmitterState {
    /// Fresh emitter with the gate open.
    pub fn new(kind: EmitterKind) -> Self {
        Self {
            kind,
            cooldown: 0.0,
        }
    }

    /// Advance the interval gate.
    pub fn update(&mut self, dt: f32) {
        self.cooldown -= dt;
    }

    /// True when the gate is open. Non-stream kinds are never gated.
    pub fn can_emit(&self) -> bool {
        match self.kind {
            EmitterKind::Stream => self.cooldown <= 0.0,
            _ => true,
        }
    }

    /// Record an emission, re-arming the interval gate for stream kinds.
    pub fn mark_emitted(&mut self) {
        if self.kind == EmitterKind::Stream {
            self.cooldown = STREAM_INTERVAL;
        }
    }

    /// Probability of emitting this tick given the band energy, zero while
    /// the gate is closed.
    pub fn probability(&self, energy_level: f32) -> f32 {
        if self.can_emit() {
            emission_probability(self.kind, energy_level)
        } else {
            0.0
        }
    }

    /// Re-open the gate (session restart).
    pub fn reset(&mut self) {
        self.cooldown = 0.0;
    }
}
