//! MIDI event schedule and channel activity tracking.

mod activity;
mod schedule;

pub use activity::{ChannelActivityTracker, ChannelState, NoteListener, NullListener};
pub use schedule::EventSchedule;

use serde::{Deserialize, Serialize};

/// Note event kinds retained from the MIDI file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MidiEventKind {
    /// Key pressed. A NoteOn with velocity 0 is kept as-is in the schedule
    /// and treated as a release by consumers.
    NoteOn,
    /// Key released.
    NoteOff,
}

/// One time-stamped note event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MidiEvent {
    /// Absolute time in seconds from the start of the file.
    pub time_seconds: f64,
    /// NoteOn or NoteOff.
    pub kind: MidiEventKind,
    /// MIDI channel, 0-15.
    pub channel: u8,
    /// Note number, 0-127.
    pub note: u8,
    /// Velocity, 0-127; meaningful for NoteOn only.
    pub velocity: u8,
}

impl MidiEvent {
    /// True for NoteOff and for the velocity-0 NoteOn convention.
    pub fn is_release(&self) -> bool {
        match self.kind {
            MidiEventKind::NoteOff => true,
            MidiEventKind::NoteOn => self.velocity == 0,
        }
    }
}
