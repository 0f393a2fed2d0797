//! Standard MIDI File loading into a time-ordered note schedule.

use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use tracing::{debug, info};

use super::{MidiEvent, MidiEventKind};
use crate::LoadError;

/// Default tempo: 120 BPM in microseconds per beat.
const DEFAULT_TEMPO: f64 = 500_000.0;

/// An immutable, time-sorted list of note events from one MIDI file.
#[derive(Debug, Clone, Default)]
pub struct EventSchedule {
    events: Vec<MidiEvent>,
}

impl EventSchedule {
    /// Parse a Standard MIDI File into a schedule.
    ///
    /// Delta times accumulate to absolute ticks per track; ticks convert to
    /// seconds using the most recently seen tempo meta-event (persisting
    /// across tracks in file order, starting at 120 BPM). Only note on/off
    /// events are retained; the merge across tracks is a stable sort, so
    /// simultaneous events keep their file order.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let data = std::fs::read(path)?;
        let smf = Smf::parse(&data).map_err(|e| LoadError::MidiParse(e.to_string()))?;

        // Seconds per tick for SMPTE files is fixed; for metrical files it
        // follows the running tempo.
        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) => Some(tpb.as_int() as f64),
            Timing::Timecode(..) => None,
        };
        let timecode_seconds_per_tick = match smf.header.timing {
            Timing::Timecode(fps, subframe) => {
                Some(1.0 / (fps.as_f32() as f64 * subframe as f64))
            }
            Timing::Metrical(_) => None,
        };

        let mut tempo = DEFAULT_TEMPO;
        let mut events = Vec::new();

        for (track_index, track) in smf.tracks.iter().enumerate() {
            let mut ticks: u64 = 0;
            for event in track {
                ticks += u64::from(event.delta.as_int());
                match event.kind {
                    TrackEventKind::Midi { channel, message } => {
                        let (kind, note, velocity) = match message {
                            MidiMessage::NoteOn { key, vel } => {
                                (MidiEventKind::NoteOn, key.as_int(), vel.as_int())
                            }
                            MidiMessage::NoteOff { key, vel } => {
                                (MidiEventKind::NoteOff, key.as_int(), vel.as_int())
                            }
                            _ => continue,
                        };
                        let time_seconds = match (ticks_per_beat, timecode_seconds_per_tick) {
                            (Some(tpb), _) => ticks as f64 * (tempo / 1_000_000.0) / tpb,
                            (None, Some(spt)) => ticks as f64 * spt,
                            (None, None) => unreachable!("timing is one of the two forms"),
                        };
                        events.push(MidiEvent {
                            time_seconds,
                            kind,
                            // midly guarantees 0-15, this is the documented clamp
                            channel: channel.as_int().min(15),
                            note,
                            velocity,
                        });
                    }
                    TrackEventKind::Meta(MetaMessage::Tempo(us_per_beat)) => {
                        tempo = us_per_beat.as_int() as f64;
                    }
                    _ => {}
                }
            }
            debug!(track_index, total = events.len(), "scanned MIDI track");
        }

        if events.is_empty() {
            return Err(LoadError::EmptyMidi);
        }

        events.sort_by(|a, b| a.time_seconds.total_cmp(&b.time_seconds));

        info!(
            path = %path.display(),
            events = events.len(),
            duration = events.last().map(|e| e.time_seconds).unwrap_or(0.0),
            "loaded MIDI schedule"
        );

        Ok(Self { events })
    }

    /// Build a schedule directly from events (tests, live capture).
    /// Events are stably sorted by time.
    pub fn from_events(mut events: Vec<MidiEvent>) -> Self {
        events.sort_by(|a, b| a.time_seconds.total_cmp(&b.time_seconds));
        Self { events }
    }

    /// All events, ascending by time.
    pub fn events(&self) -> &[MidiEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when the schedule holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Timestamp of the final event, 0 for an empty schedule.
    pub fn duration(&self) -> f64 {
        self.events.last().map(|e| e.time_seconds).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn var_len(mut value: u32) -> Vec<u8> {
        let mut buf = vec![(value & 0x7f) as u8];
        value >>= 7;
        while value > 0 {
            buf.push(0x80 | (value & 0x7f) as u8);
            value >>= 7;
        }
        buf.reverse();
        buf
    }

    fn write_smf(path: &Path, tracks: &[Vec<u8>]) {
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(b"MThd").unwrap();
        file.write_all(&6u32.to_be_bytes()).unwrap();
        file.write_all(&1u16.to_be_bytes()).unwrap(); // format 1
        file.write_all(&(tracks.len() as u16).to_be_bytes()).unwrap();
        file.write_all(&480u16.to_be_bytes()).unwrap(); // ticks per beat
        for track in tracks {
            let mut body = track.clone();
            body.extend_from_slice(&[0x00, 0xff, 0x2f, 0x00]); // end of track
            file.write_all(b"MTrk").unwrap();
            file.write_all(&(body.len() as u32).to_be_bytes()).unwrap();
            file.write_all(&body).unwrap();
        }
    }

    fn note_on(delta: u32, channel: u8, note: u8, velocity: u8) -> Vec<u8> {
        let mut bytes = var_len(delta);
        bytes.extend_from_slice(&[0x90 | channel, note, velocity]);
        bytes
    }

    fn note_off(delta: u32, channel: u8, note: u8) -> Vec<u8> {
        let mut bytes = var_len(delta);
        bytes.extend_from_slice(&[0x80 | channel, note, 0x00]);
        bytes
    }

    fn set_tempo(delta: u32, us_per_beat: u32) -> Vec<u8> {
        let mut bytes = var_len(delta);
        bytes.extend_from_slice(&[0xff, 0x51, 0x03]);
        bytes.extend_from_slice(&us_per_beat.to_be_bytes()[1..]);
        bytes
    }

    #[test]
    fn test_default_tempo_tick_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basic.mid");
        let mut track = note_on(0, 0, 60, 100);
        track.extend(note_off(480, 0, 60));
        write_smf(&path, &[track]);

        let schedule = EventSchedule::load(&path).unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.events()[0].time_seconds, 0.0);
        // 480 ticks at 480 tpb and 500000 us/beat = exactly one beat = 0.5 s
        assert!((schedule.events()[1].time_seconds - 0.5).abs() < 1e-9);
        assert_eq!(schedule.events()[1].kind, MidiEventKind::NoteOff);
    }

    #[test]
    fn test_tempo_change_applies_to_later_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tempo.mid");
        let mut track = set_tempo(0, 250_000); // 240 BPM
        track.extend(note_on(480, 1, 64, 90));
        write_smf(&path, &[track]);

        let schedule = EventSchedule::load(&path).unwrap();
        assert_eq!(schedule.len(), 1);
        assert!((schedule.events()[0].time_seconds - 0.25).abs() < 1e-9);
        assert_eq!(schedule.events()[0].channel, 1);
    }

    #[test]
    fn test_tracks_merge_with_stable_tie_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.mid");
        let track_a = note_on(0, 0, 60, 100);
        let track_b = note_on(0, 1, 62, 100);
        write_smf(&path, &[track_a, track_b]);

        let schedule = EventSchedule::load(&path).unwrap();
        assert_eq!(schedule.len(), 2);
        // Same timestamp: file order must survive the sort.
        assert_eq!(schedule.events()[0].channel, 0);
        assert_eq!(schedule.events()[1].channel, 1);
    }

    #[test]
    fn test_velocity_zero_note_on_retained() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vel0.mid");
        let mut track = note_on(0, 0, 60, 100);
        track.extend(note_on(120, 0, 60, 0));
        write_smf(&path, &[track]);

        let schedule = EventSchedule::load(&path).unwrap();
        let release = schedule.events()[1];
        assert_eq!(release.kind, MidiEventKind::NoteOn);
        assert_eq!(release.velocity, 0);
        assert!(release.is_release());
    }

    #[test]
    fn test_no_note_events_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.mid");
        write_smf(&path, &[set_tempo(0, 400_000)]);

        assert!(matches!(
            EventSchedule::load(&path),
            Err(LoadError::EmptyMidi)
        ));
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(matches!(
            EventSchedule::load(Path::new("/nonexistent/odin.mid")),
            Err(LoadError::Io(_))
        ));
    }
}
