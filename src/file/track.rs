use crate::prelude::*;

/// The events of one `MTrk` chunk, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    events: Vec<TrackEvent>,
}

impl Track {
    /// Create a track from its events
    pub fn new(events: Vec<TrackEvent>) -> Self {
        Self { events }
    }

    /// Decodes every event of a track chunk.
    ///
    /// Running status never carries over from one track to the next.
    pub(crate) fn read(chunk: &RawChunk<'_>) -> ReadResult<Self> {
        let mut reader = Reader::from_byte_slice(chunk.data());
        let mut running_status = None;
        let mut events = Vec::new();
        while !reader.eof() {
            let event = TrackEvent::read(&mut reader, &mut running_status)
                .map_err(|e| e.offset_by(chunk.offset()))?;
            events.push(event);
        }
        Ok(Self { events })
    }

    /// The events of this track
    pub fn events(&self) -> &[TrackEvent] {
        &self.events
    }

    /// Consumes the track, returning its events
    pub fn into_events(self) -> Vec<TrackEvent> {
        self.events
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if the track has no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
