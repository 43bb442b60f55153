use crate::prelude::*;

/// One event of a track: a delta time plus what happens.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEvent {
    delta_time: u32,
    kind: TrackEventKind,
}

/// What a [`TrackEvent`] does.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackEventKind {
    /// `FF`: information for the sequencer
    Meta(MetaEvent),
    /// `F0`: a system exclusive message, without the leading `F0`
    SysEx(Vec<u8>),
    /// `F7`: a continuation packet of a divided system exclusive message
    DividedSysEx(Vec<u8>),
    /// `8n` through `En`
    Channel {
        /// Channel 0-15
        channel: u8,
        /// The decoded message
        message: ChannelMessage,
    },
}

impl TrackEvent {
    /// Create a new track event
    pub const fn new(delta_time: u32, kind: TrackEventKind) -> Self {
        Self { delta_time, kind }
    }

    /// Reads the next event of a track.
    ///
    /// `running_status` is the last channel status byte seen in this track. A channel event
    /// whose first byte has its top bit clear reuses it, and that byte becomes the first
    /// data parameter. Meta and system exclusive events leave it untouched.
    pub(crate) fn read(reader: &mut Reader<'_>, running_status: &mut Option<u8>) -> ReadResult<Self> {
        let delta_time = reader.read_varlen()?;
        let status = reader.read_u8()?;

        let kind = match status {
            0xFF => TrackEventKind::Meta(MetaEvent::read(reader)?),
            0xF0 => TrackEventKind::SysEx(reader.read_varlen_slice()?.to_vec()),
            0xF7 => TrackEventKind::DividedSysEx(reader.read_varlen_slice()?.to_vec()),
            0x00..=0x7F => {
                let Some(running) = *running_status else {
                    return Err(inv_data(reader, ParseError::RunningStatus));
                };
                channel_event(reader, running, status)?
            }
            0x80..=0xEF => {
                *running_status = Some(status);
                let param1 = reader.read_u8()?;
                channel_event(reader, status, param1)?
            }
            _ => return Err(inv_data(reader, ParseError::Status(status))),
        };
        Ok(Self { delta_time, kind })
    }

    /// Ticks since the previous event of the same track
    pub const fn delta_time(&self) -> u32 {
        self.delta_time
    }

    /// What the event does
    pub const fn kind(&self) -> &TrackEventKind {
        &self.kind
    }

    /// Consumes the event, returning its kind
    pub fn into_kind(self) -> TrackEventKind {
        self.kind
    }

    /// The tempo this event sets, if it is a `setTempo` meta event
    pub fn tempo(&self) -> Option<Tempo> {
        match &self.kind {
            TrackEventKind::Meta(MetaEvent::SetTempo(tempo)) => Some(*tempo),
            _ => None,
        }
    }

    /// Lower camel case name of the event's subtype (`noteOn`, `setTempo`, `sysEx`, ...)
    pub const fn subtype(&self) -> &'static str {
        match &self.kind {
            TrackEventKind::Meta(meta) => meta.name(),
            TrackEventKind::SysEx(_) => "sysEx",
            TrackEventKind::DividedSysEx(_) => "dividedSysEx",
            TrackEventKind::Channel { message, .. } => message.name(),
        }
    }
}

/// Reads the rest of a channel event whose status byte and first data byte are known.
fn channel_event(reader: &mut Reader<'_>, status: u8, param1: u8) -> ReadResult<TrackEventKind> {
    let event_type = ChannelEventType::try_from(status >> 4)
        .map_err(|_| inv_data(reader, ParseError::Status(status)))?;
    let param2 = if event_type.has_second_param() {
        reader.read_u8()?
    } else {
        0
    };
    Ok(TrackEventKind::Channel {
        channel: status & 0x0F,
        message: ChannelMessage::from_params(event_type, param1, param2),
    })
}

#[cfg(test)]
fn read_all(bytes: &[u8]) -> ReadResult<Vec<TrackEvent>> {
    let mut reader = Reader::from_byte_slice(bytes);
    let mut running_status = None;
    let mut events = Vec::new();
    while !reader.eof() {
        events.push(TrackEvent::read(&mut reader, &mut running_status)?);
    }
    Ok(events)
}

#[cfg(test)]
fn channel(delta_time: u32, channel: u8, message: ChannelMessage) -> TrackEvent {
    TrackEvent::new(delta_time, TrackEventKind::Channel { channel, message })
}

#[test]
fn running_status_matches_explicit_status() {
    use pretty_assertions::assert_eq;
    let explicit = read_all(&[0x00, 0x91, 0x3C, 0x50, 0x10, 0x91, 0x40, 0x50]).unwrap();
    let running = read_all(&[0x00, 0x91, 0x3C, 0x50, 0x10, 0x40, 0x50]).unwrap();
    assert_eq!(explicit, running);
    assert_eq!(
        running,
        vec![
            channel(0, 1, ChannelMessage::NoteOn { note: 0x3C, velocity: 0x50 }),
            channel(0x10, 1, ChannelMessage::NoteOn { note: 0x40, velocity: 0x50 }),
        ]
    );
}

#[test]
fn running_status_survives_meta_events() {
    let events = read_all(&[
        0x00, 0xC2, 0x05, // program change
        0x00, 0xFF, 0x01, 0x01, b'x', // text
        0x00, 0x07, // program change, running status
    ])
    .unwrap();
    assert_eq!(events[2], channel(0, 2, ChannelMessage::ProgramChange { program: 7 }));
}

#[test]
fn running_status_requires_a_previous_status() {
    let err = read_all(&[0x00, 0x3C, 0x50]).unwrap_err();
    assert_eq!(err.parse_error(), Some(&ParseError::RunningStatus));
}

#[test]
fn decodes_sysex_events() {
    let events = read_all(&[0x00, 0xF0, 0x03, 0x43, 0x12, 0xF7, 0x00, 0xF7, 0x01, 0xF7]).unwrap();
    assert_eq!(events[0].kind(), &TrackEventKind::SysEx(vec![0x43, 0x12, 0xF7]));
    assert_eq!(events[1].kind(), &TrackEventKind::DividedSysEx(vec![0xF7]));
    assert_eq!(events[0].subtype(), "sysEx");
}

#[test]
fn system_common_status_is_rejected() {
    let err = read_all(&[0x00, 0xF2, 0x00, 0x00]).unwrap_err();
    assert_eq!(err.parse_error(), Some(&ParseError::Status(0xF2)));
}

#[test]
fn every_channel_status_byte_decodes() {
    for status in 0x80..=0xEFu8 {
        let events = read_all(&[0x00, status, 0x40, 0x7F, 0x00, 0x41, 0x7F]).unwrap_or_else(|e| {
            panic!("{status:#04x}: {e}");
        });
        assert!(
            events.iter().all(|e| matches!(
                e.kind(),
                TrackEventKind::Channel { channel, .. } if *channel == status & 0x0F
            )),
            "{status:#04x}"
        );
    }
}
