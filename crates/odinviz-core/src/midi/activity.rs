//! Per-channel activity tracking driven by the event schedule.
//!
//! The tracker is a step function over the schedule: it owns a forward-only
//! cursor and drains every event up to the playback clock, accumulating a
//! decaying activity level per channel. Activity holds steady while any note
//! on the channel is held (the sustain behavior), and decays multiplicatively
//! otherwise.

use tracing::trace;

use super::schedule::EventSchedule;

/// Per-tick activity decay applied to channels with no held notes.
const ACTIVITY_DECAY: f32 = 0.95;

/// Number of MIDI channels.
const CHANNEL_COUNT: usize = 16;

/// Receives drained note events.
///
/// The tracker forwards every event it consumes so that satellites and
/// connections can react; passing the listener in explicitly keeps them
/// decoupled from the scheduling side.
pub trait NoteListener {
    /// A note started on `channel`.
    fn note_on(&mut self, _channel: u8, _note: u8, _velocity: u8) {}
    /// A note ended on `channel` (NoteOff or velocity-0 NoteOn).
    fn note_off(&mut self, _channel: u8, _note: u8) {}
    /// A note-on impulse for any connection touching `channel`.
    fn connection_trigger(&mut self, _channel: u8, _intensity: f32) {}
}

/// Listener that ignores everything.
#[derive(Debug, Default)]
pub struct NullListener;

impl NoteListener for NullListener {}

/// Live state of one MIDI channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelState {
    /// Decaying accumulator in [0, 1].
    pub activity: f32,
    /// Number of notes currently held on this channel.
    pub held_note_count: u32,
}

impl ChannelState {
    /// True while any note is held.
    pub fn is_active(&self) -> bool {
        self.held_note_count > 0
    }
}

/// Consumes schedule events up to a time cursor and tracks channel activity.
#[derive(Debug, Default)]
pub struct ChannelActivityTracker {
    channels: [ChannelState; CHANNEL_COUNT],
    cursor: usize,
    last_time: f64,
}

impl ChannelActivityTracker {
    /// Fresh tracker with all channels idle and the cursor at the start.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all events with `time_seconds <= up_to_time` and decay idle
    /// channels. Returns the number of events processed.
    ///
    /// The cursor only moves forward; calling again with the same time and
    /// no new events is a no-op (decay runs only when the clock advanced).
    pub fn advance(
        &mut self,
        schedule: &EventSchedule,
        up_to_time: f64,
        listener: &mut dyn NoteListener,
    ) -> usize {
        let events = schedule.events();
        let mut processed = 0;

        while self.cursor < events.len() && events[self.cursor].time_seconds <= up_to_time {
            let event = events[self.cursor];
            let channel = event.channel.min(15);
            let state = &mut self.channels[channel as usize];

            if event.is_release() {
                state.held_note_count = state.held_note_count.saturating_sub(1);
                listener.note_off(channel, event.note);
            } else {
                let intensity = f32::from(event.velocity) / 127.0;
                state.activity = (state.activity + intensity).min(1.0);
                state.held_note_count += 1;
                listener.note_on(channel, event.note, event.velocity);
                listener.connection_trigger(channel, intensity);
            }

            self.cursor += 1;
            processed += 1;
        }

        if up_to_time > self.last_time {
            for state in &mut self.channels {
                if !state.is_active() {
                    state.activity = (state.activity * ACTIVITY_DECAY).max(0.0);
                }
            }
            self.last_time = up_to_time;
        }

        if processed > 0 {
            trace!(processed, up_to_time, "drained MIDI events");
        }
        processed
    }

    /// State of one channel. Out-of-range channels read as channel 15.
    pub fn channel(&self, channel: u8) -> &ChannelState {
        &self.channels[channel.min(15) as usize]
    }

    /// Activity of one channel.
    pub fn activity(&self, channel: u8) -> f32 {
        self.channel(channel).activity
    }

    /// Sum of all channel activities.
    pub fn total_activity(&self) -> f32 {
        self.channels.iter().map(|c| c.activity).sum()
    }

    /// Return the cursor to the start and clear all channel state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
