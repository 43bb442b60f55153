use crate::prelude::*;

/// A track event placed on the global timeline of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    /// Milliseconds from the start of the file
    pub timestamp: f64,
    /// Index of the track the event came from
    pub track: usize,
    /// Ticks elapsed since the previously emitted event, over all tracks
    pub ticks_to_event: u32,
    /// The event itself
    pub event: TrackEvent,
}

#[doc = r#"
An iterator returned from [`MidiFile::into_events`].

Merges all tracks into one stream ordered by time. At each step the track whose next
event is closest wins, the lowest track index breaking ties. Ticks are converted to
milliseconds with the tempo in effect when the event is emitted, so a `setTempo` event
only affects the events that follow it, whichever track they live in.
"#]
pub struct TimedEventIterator {
    ticks_per_beat: u16,
    bpm: f64,
    timestamp: f64,
    len_remaining: usize,
    tracks: Vec<TrackCursor>,
}

struct TrackCursor {
    next: Option<TrackEvent>,
    rest: std::vec::IntoIter<TrackEvent>,
    ticks_to_next_event: Option<u32>,
}

impl TrackCursor {
    fn new(track: Track) -> Self {
        let mut rest = track.into_events().into_iter();
        let next = rest.next();
        Self {
            ticks_to_next_event: next.as_ref().map(TrackEvent::delta_time),
            next,
            rest,
        }
    }

    fn take(&mut self) -> Option<TrackEvent> {
        let event = self.next.take()?;
        self.next = self.rest.next();
        self.ticks_to_next_event = self.next.as_ref().map(TrackEvent::delta_time);
        Some(event)
    }
}

impl TimedEventIterator {
    pub(super) fn new(file: MidiFile) -> Self {
        let ticks_per_beat = file.header().ticks_per_beat();
        let tracks: Vec<_> = file.into_tracks().into_iter().map(TrackCursor::new).collect();
        let len_remaining = tracks
            .iter()
            .map(|t| t.next.is_some() as usize + t.rest.len())
            .sum();
        Self {
            ticks_per_beat,
            bpm: Tempo::default().bpm(),
            timestamp: 0.,
            len_remaining,
            tracks,
        }
    }

    /// The tempo in beats per minute for the next emitted event
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    fn ticks_to_millis(&self, ticks: u32) -> f64 {
        if ticks == 0 {
            return 0.;
        }
        let beats = ticks as f64 / self.ticks_per_beat as f64;
        let beats_per_second = self.bpm / 60.;
        beats / beats_per_second * 1000.
    }
}

impl Iterator for TimedEventIterator {
    type Item = TimedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let (track, ticks_to_event) = self
            .tracks
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.ticks_to_next_event.map(|ticks| (i, ticks)))
            .min_by_key(|&(_, ticks)| ticks)?;

        let event = self.tracks[track].take()?;
        for (i, other) in self.tracks.iter_mut().enumerate() {
            if i == track {
                continue;
            }
            if let Some(ticks) = other.ticks_to_next_event.as_mut() {
                *ticks -= ticks_to_event;
            }
        }

        self.timestamp += self.ticks_to_millis(ticks_to_event);
        if let Some(tempo) = event.tempo() {
            self.bpm = tempo.bpm();
            tracing::trace!(bpm = self.bpm, timestamp = self.timestamp, "tempo change");
        }
        self.len_remaining -= 1;

        Some(TimedEvent {
            timestamp: self.timestamp,
            track,
            ticks_to_event,
            event,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len_remaining, Some(self.len_remaining))
    }
}

impl ExactSizeIterator for TimedEventIterator {}

#[cfg(test)]
fn note_on_event(delta_ticks: u32, note: u8, velocity: u8, channel: u8) -> TrackEvent {
    TrackEvent::new(
        delta_ticks,
        TrackEventKind::Channel {
            channel,
            message: ChannelMessage::NoteOn { note, velocity },
        },
    )
}

#[cfg(test)]
fn note_off_event(delta_ticks: u32, note: u8, channel: u8) -> TrackEvent {
    TrackEvent::new(
        delta_ticks,
        TrackEventKind::Channel {
            channel,
            message: ChannelMessage::NoteOff { note, velocity: 0 },
        },
    )
}

#[cfg(test)]
fn tempo_event(delta_ticks: u32, micros_per_beat: u32) -> TrackEvent {
    TrackEvent::new(
        delta_ticks,
        TrackEventKind::Meta(MetaEvent::SetTempo(Tempo::new(micros_per_beat))),
    )
}

#[cfg(test)]
fn file(ticks_per_beat: u16, tracks: Vec<Vec<TrackEvent>>) -> MidiFile {
    let header = MidiFileHeader::new(1, tracks.len() as u16, ticks_per_beat);
    MidiFile::new(header, tracks.into_iter().map(Track::new).collect())
}

#[cfg(test)]
fn timestamps(file: MidiFile) -> Vec<(f64, usize)> {
    file.into_events().map(|e| (e.timestamp, e.track)).collect()
}

#[test]
fn test_empty_file_yields_nothing() {
    let mut iter = file(480, vec![]).into_events();
    assert_eq!(iter.len(), 0);
    assert_eq!(iter.next(), None);
}

#[test]
fn test_single_track_default_tempo() {
    let events = vec![
        note_on_event(0, 60, 100, 0),
        note_off_event(480, 60, 0),
        note_on_event(240, 62, 80, 0),
    ];
    assert_eq!(
        timestamps(file(480, vec![events])),
        vec![(0., 0), (500., 0), (750., 0)]
    );
}

#[test]
fn test_tracks_are_merged_in_time_order() {
    let track1 = vec![note_on_event(0, 60, 100, 0), note_off_event(480, 60, 0)];
    let track2 = vec![note_on_event(240, 36, 80, 1), note_off_event(480, 36, 1)];
    assert_eq!(
        timestamps(file(480, vec![track1, track2])),
        vec![(0., 0), (250., 1), (500., 0), (750., 1)]
    );
}

#[test]
fn test_ties_go_to_the_lowest_track() {
    let track1 = vec![note_on_event(10, 60, 100, 0)];
    let track2 = vec![note_on_event(10, 61, 100, 1)];
    let track3 = vec![note_on_event(5, 62, 100, 2), note_on_event(5, 63, 100, 2)];
    let merged: Vec<_> = file(480, vec![track1, track2, track3])
        .into_events()
        .map(|e| e.track)
        .collect();
    assert_eq!(merged, vec![2, 0, 1, 2]);
}

#[test]
fn test_tempo_change_only_affects_later_events() {
    let track = vec![
        note_on_event(0, 60, 100, 0),
        note_off_event(480, 60, 0),
        tempo_event(0, 1_000_000),
        note_on_event(480, 62, 100, 0),
    ];
    assert_eq!(
        timestamps(file(480, vec![track])),
        vec![(0., 0), (500., 0), (500., 0), (1500., 0)]
    );
}

#[test]
fn test_tempo_change_is_global_across_tracks() {
    let conductor = vec![tempo_event(480, 250_000)];
    let melody = vec![note_on_event(480, 60, 100, 1), note_off_event(480, 60, 1)];
    let events: Vec<_> = file(480, vec![conductor, melody]).into_events().collect();
    assert_eq!(events[0].timestamp, 500.);
    assert_eq!(events[0].track, 0);
    assert_eq!(events[1].timestamp, 500.);
    assert_eq!(events[1].ticks_to_event, 0);
    // 480 ticks at 240 BPM
    assert_eq!(events[2].timestamp, 750.);
}
