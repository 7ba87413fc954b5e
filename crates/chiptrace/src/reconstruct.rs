//! Turns consecutive frame snapshots into tracker events.

use std::fmt;

use chiptrace_chips::{ChannelDecode, FrameSnapshot, PitchReference, cents_between, note_name};
use serde::{Deserialize, Serialize};

/// Discrete change on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// A (new) note starts.
    NoteOn(u8),
    /// The sounding note stops.
    NoteOff,
    /// Volume moved while the pitch held.
    VolumeChange(u8),
    /// Pitch moved by less than a semitone (slide, vibrato, detune).
    PitchChange(i16),
}

/// Tracker cell notation: `C-4`, `OFF`, `V12`, `P+25`.
impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::NoteOn(note) => f.write_str(&note_name(*note)),
            EventKind::NoteOff => f.write_str("OFF"),
            EventKind::VolumeChange(volume) => write!(f, "V{volume:02}"),
            EventKind::PitchChange(cents) => write!(f, "P{cents:+}"),
        }
    }
}

/// An [`EventKind`] placed at a frame and channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackerEvent {
    /// Frame index (row).
    pub frame: usize,
    /// Chip channel.
    pub channel: usize,
    /// What happened.
    pub kind: EventKind,
}

/// Classify the change of one channel between two frames.
///
/// At most one event is produced: a note start beats a volume change.
pub fn channel_event(
    prev: &ChannelDecode,
    now: &ChannelDecode,
    pitch: &PitchReference,
) -> Option<EventKind> {
    let was_audible = prev.is_audible();
    let audible = now.is_audible();

    if !audible {
        return was_audible.then_some(EventKind::NoteOff);
    }

    // Audible implies a frequency.
    let freq = now.frequency_hz?;
    let note = pitch.note_for(freq);

    if !was_audible {
        return Some(EventKind::NoteOn(note));
    }

    if prev.frequency_hz != now.frequency_hz {
        let prev_freq = prev.frequency_hz?;
        if pitch.note_for(prev_freq) != note {
            return Some(EventKind::NoteOn(note));
        }
        let cents = cents_between(prev_freq, freq);
        if cents != 0 {
            return Some(EventKind::PitchChange(cents));
        }
    }

    (prev.volume != now.volume).then_some(EventKind::VolumeChange(now.volume))
}

/// Events of every channel between `prev` and `next`, tagged with `next`'s frame.
pub fn events_between(
    prev: &FrameSnapshot,
    next: &FrameSnapshot,
    pitch: &PitchReference,
) -> Vec<TrackerEvent> {
    let channels = next.config().family.channel_count();
    (0..channels)
        .filter_map(|channel| {
            let before = prev.decode_channel(channel).ok()?;
            let after = next.decode_channel(channel).ok()?;
            channel_event(&before, &after, pitch).map(|kind| TrackerEvent {
                frame: next.frame(),
                channel,
                kind,
            })
        })
        .collect()
}

/// Diff a run of snapshots. The first one is compared against `baseline`
/// (normally the silent power-on state).
pub fn reconstruct(
    baseline: &FrameSnapshot,
    snapshots: &[FrameSnapshot],
    pitch: &PitchReference,
) -> Vec<TrackerEvent> {
    let mut events = Vec::new();
    let mut prev = baseline;
    for snapshot in snapshots {
        events.extend(events_between(prev, snapshot, pitch));
        prev = snapshot;
    }
    events
}
