//! Hub reactivity aggregation.
//!
//! Folds the elemental channels' MIDI activity into one compound excitement
//! figure and writes the hub's targets (size, color, position) plus the
//! per-connection pull and pulse signals. Runs once per tick, strictly after
//! the activity tracker and band analyzer have advanced to the same clock.

use glam::Vec2;

use crate::config::{ElementRegistry, VizConfig, ELEMENT_COUNT};
use crate::entity::{ConnectionState, HubState};
use crate::midi::ChannelState;

/// Pixels of hub growth per unit of compound activity.
const SIZE_GAIN: f32 = 50.0;

/// Radial push on the hub per unit of channel activity.
const FORCE_GAIN: f32 = 8.0;

/// Nonlinear amplification for simultaneously active channels.
///
/// One channel alone is unamplified; every additional concurrent channel
/// multiplies the summed activity, rewarding dense arrangements.
pub fn compound_multiplier(active_channels: usize) -> f32 {
    match active_channels {
        1 => 1.0,
        2 => 2.5,
        3 => 4.0,
        4 => 6.0,
        _ => 1.0,
    }
}

struct SatelliteAnchor {
    position: Vec2,
    base_color: [f32; 3],
}

/// Writes hub and connection targets from the elemental channels' state.
pub struct ReactivityAggregator {
    window: Vec2,
    max_displacement: f32,
    hub_center: Vec2,
    anchors: [SatelliteAnchor; ELEMENT_COUNT],
}

impl ReactivityAggregator {
    /// Build from the element layout; anchor positions are the satellites'
    /// resting positions, independent of any later displacement.
    pub fn new(registry: &ElementRegistry, config: &VizConfig) -> Self {
        let hub_center = config.center();
        let elements = registry.elements();
        let anchors = std::array::from_fn(|i| SatelliteAnchor {
            position: elements[i].world_position(hub_center, config.satellite_distance),
            base_color: elements[i].base_color,
        });
        Self {
            window: Vec2::new(config.window_width, config.window_height),
            max_displacement: config.max_displacement,
            hub_center,
            anchors,
        }
    }

    /// Aggregate one tick.
    ///
    /// `channels` holds the four elemental channels in element order. A
    /// channel counts as active while it has held notes; released channels
    /// contribute nothing even though their activity is still decaying.
    pub fn update(
        &self,
        channels: &[ChannelState; ELEMENT_COUNT],
        hub: &mut HubState,
        connections: &mut [ConnectionState],
    ) {
        let mut sustained = 0.0f32;
        let mut color_acc = [0.0f32; 3];
        let mut force = Vec2::ZERO;
        let mut active = 0usize;

        for (anchor, state) in self.anchors.iter().zip(channels) {
            if !state.is_active() {
                continue;
            }
            active += 1;
            sustained += state.activity;
            for i in 0..3 {
                color_acc[i] += anchor.base_color[i] * state.activity;
            }
            let direction = (self.hub_center - anchor.position).normalize_or_zero();
            force += direction * state.activity * FORCE_GAIN;
        }

        if active == 0 {
            hub.target_size = hub.base_size;
            hub.target_color = hub.base_color;
            hub.activity *= 0.85;
            hub.set_position(self.hub_center);
            for connection in connections.iter_mut() {
                connection.set_pull(0.0);
            }
            return;
        }

        let compound = sustained * compound_multiplier(active);

        // Ratchet: the size target never shrinks while notes are held.
        let target_size = hub.base_size + compound * SIZE_GAIN;
        if target_size > hub.target_size {
            hub.target_size = target_size;
        }

        hub.activity = (compound * 1.2).min(1.0);
        hub.set_position(self.clamp_to_window(self.hub_center + force));

        let blend = (active as f32 * 0.15).min(0.6);
        // Per-element mean of the activity-weighted colors: a half-active
        // element contributes a half-dark color, not a dimmed average.
        let average = color_acc.map(|c| c / active as f32);
        for i in 0..3 {
            hub.target_color[i] =
                (hub.base_color[i] * (1.0 - blend) + average[i] * blend).clamp(0.0, 255.0);
        }

        let pull = (compound * 0.8).min(1.0);
        let pulse = (compound * (0.6 + active as f32 * 0.2)).min(1.0);
        for connection in connections.iter_mut() {
            connection.set_pull(pull);
            connection.trigger(pulse);
        }
    }

    fn clamp_to_window(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            position
                .x
                .clamp(self.max_displacement, self.window.x - self.max_displacement),
            position
                .y
                .clamp(self.max_displacement, self.window.y - self.max_displacement),
        )
    }
}
