#![doc = r#"
Channel events: the musical data of a track.

```text
|1sss cccc| |0ppp pppp| |0qqq qqqq|
  status     param 1     param 2 (not for program change / channel aftertouch)
```
`sss` selects the event type and `cccc` the channel (0-15).
"#]

use num_enum::TryFromPrimitive;

/// The high nibble of a channel status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ChannelEventType {
    /// `0x8n`
    NoteOff = 0x8,
    /// `0x9n`
    NoteOn = 0x9,
    /// `0xAn`, polyphonic key pressure
    NoteAftertouch = 0xA,
    /// `0xBn`, control change
    Controller = 0xB,
    /// `0xCn`
    ProgramChange = 0xC,
    /// `0xDn`, channel pressure
    ChannelAftertouch = 0xD,
    /// `0xEn`
    PitchBend = 0xE,
}

impl ChannelEventType {
    /// True for the event types carrying a second data byte
    pub const fn has_second_param(&self) -> bool {
        !matches!(self, Self::ProgramChange | Self::ChannelAftertouch)
    }
}

/// A decoded channel event, without its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMessage {
    /// Release a note
    NoteOff {
        /// Key number
        note: u8,
        /// Release velocity
        velocity: u8,
    },
    /// Press a note. Never carries a velocity of 0, those are decoded as `NoteOff`.
    NoteOn {
        /// Key number
        note: u8,
        /// Strike velocity
        velocity: u8,
    },
    /// Pressure change on a held note
    NoteAftertouch {
        /// Key number
        note: u8,
        /// New pressure
        amount: u8,
    },
    /// A controller moved
    Controller {
        /// Controller number
        controller: u8,
        /// New value
        value: u8,
    },
    /// Instrument change
    ProgramChange {
        /// Program number
        program: u8,
    },
    /// Pressure change for the whole channel
    ChannelAftertouch {
        /// New pressure
        amount: u8,
    },
    /// Pitch wheel moved
    PitchBend {
        /// 14-bit value, `0x2000` is centered
        value: u16,
    },
}

impl ChannelMessage {
    /// Builds a message from its type and already read data bytes.
    ///
    /// `param2` is ignored by event types that only carry one data byte.
    pub const fn from_params(kind: ChannelEventType, param1: u8, param2: u8) -> Self {
        match kind {
            ChannelEventType::NoteOff => Self::NoteOff {
                note: param1,
                velocity: param2,
            },
            ChannelEventType::NoteOn if param2 == 0 => Self::NoteOff {
                note: param1,
                velocity: 0,
            },
            ChannelEventType::NoteOn => Self::NoteOn {
                note: param1,
                velocity: param2,
            },
            ChannelEventType::NoteAftertouch => Self::NoteAftertouch {
                note: param1,
                amount: param2,
            },
            ChannelEventType::Controller => Self::Controller {
                controller: param1,
                value: param2,
            },
            ChannelEventType::ProgramChange => Self::ProgramChange { program: param1 },
            ChannelEventType::ChannelAftertouch => Self::ChannelAftertouch { amount: param1 },
            ChannelEventType::PitchBend => Self::PitchBend {
                value: (param1 as u16 & 0x7F) | ((param2 as u16 & 0x7F) << 7),
            },
        }
    }

    /// Lower camel case name of the event's subtype
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NoteOff { .. } => "noteOff",
            Self::NoteOn { .. } => "noteOn",
            Self::NoteAftertouch { .. } => "noteAftertouch",
            Self::Controller { .. } => "controller",
            Self::ProgramChange { .. } => "programChange",
            Self::ChannelAftertouch { .. } => "channelAftertouch",
            Self::PitchBend { .. } => "pitchBend",
        }
    }
}

#[test]
fn note_on_without_velocity_is_note_off() {
    assert_eq!(
        ChannelMessage::from_params(ChannelEventType::NoteOn, 60, 0),
        ChannelMessage::NoteOff {
            note: 60,
            velocity: 0
        }
    );
    assert_eq!(
        ChannelMessage::from_params(ChannelEventType::NoteOn, 60, 1),
        ChannelMessage::NoteOn {
            note: 60,
            velocity: 1
        }
    );
}

#[test]
fn pitch_bend_combines_both_data_bytes() {
    assert_eq!(
        ChannelMessage::from_params(ChannelEventType::PitchBend, 0x00, 0x40),
        ChannelMessage::PitchBend { value: 0x2000 }
    );
    assert_eq!(
        ChannelMessage::from_params(ChannelEventType::PitchBend, 0x7F, 0x7F),
        ChannelMessage::PitchBend { value: 0x3FFF }
    );
}
