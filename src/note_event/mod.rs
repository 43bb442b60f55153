#![doc = r#"
Note events: the unit the timeline stores and the player dispatches.

A [`NoteEvent`] has a fixed set of known fields plus an open map of extra fields that
applications may attach. Extra fields travel untouched through every timeline operation
and can be matched by callback and removal [`Pattern`]s like any known field.

# Example
```rust
# use midi_replay::prelude::*;
let event = NoteEvent::note_on(0, 60, 0., 100).with_field("hand", "left");

assert!(Pattern::new().with("note", 60).matches(&event));
assert!(Pattern::new().with("hand", "left").with("type", "noteOn").matches(&event));
assert!(!Pattern::new().with("hand", "right").matches(&event));
```
"#]

mod field;
pub use field::*;

mod format;
pub use format::*;

mod pattern;
pub use pattern::*;

use crate::prelude::*;
use std::{borrow::Cow, collections::BTreeMap, fmt};

/// Whether a note starts or stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventType {
    /// `noteOn`
    #[cfg_attr(feature = "serde", serde(rename = "noteOn"))]
    NoteOn,
    /// `noteOff`
    #[cfg_attr(feature = "serde", serde(rename = "noteOff"))]
    NoteOff,
}

impl EventType {
    /// The name used in event records and callback names
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoteOn => "noteOn",
            Self::NoteOff => "noteOff",
        }
    }

    /// Parses `noteOn` / `noteOff`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "noteOn" => Some(Self::NoteOn),
            "noteOff" => Some(Self::NoteOff),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A note starting or stopping at a point in time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteEvent {
    /// MIDI channel, 0-15
    pub channel: u8,
    /// Key number, possibly shifted outside 0-127 by a load's note shift
    pub note: i32,
    /// Milliseconds from the start of the timeline
    pub timestamp: f64,
    /// Index of the track the event was decoded from
    pub track: usize,
    /// Start or stop
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: EventType,
    /// Velocity, 0-127
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub velocity: Option<u8>,
    /// Milliseconds until the matching `noteOff`; only set on `noteOn` events
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub length: Option<f64>,
    /// Application defined fields
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub extra: BTreeMap<String, FieldValue>,
}

/// Names of the fields every [`NoteEvent`] has.
pub const KNOWN_FIELDS: [&str; 7] = [
    "channel",
    "note",
    "timestamp",
    "track",
    "type",
    "velocity",
    "length",
];

impl NoteEvent {
    /// Create an event with no velocity, length or extra fields
    pub fn new(kind: EventType, channel: u8, note: i32, timestamp: f64) -> Self {
        Self {
            channel,
            note,
            timestamp,
            track: 0,
            kind,
            velocity: None,
            length: None,
            extra: BTreeMap::new(),
        }
    }

    /// Create a `noteOn` event
    pub fn note_on(channel: u8, note: i32, timestamp: f64, velocity: u8) -> Self {
        Self::new(EventType::NoteOn, channel, note, timestamp).with_velocity(velocity)
    }

    /// Create a `noteOff` event
    pub fn note_off(channel: u8, note: i32, timestamp: f64) -> Self {
        Self::new(EventType::NoteOff, channel, note, timestamp)
    }

    /// Sets the velocity
    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// Sets the track
    pub fn with_track(mut self, track: usize) -> Self {
        self.track = track;
        self
    }

    /// Sets the length
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    /// Attaches an application defined field.
    ///
    /// Known field names are not stored in the extra map; use the struct fields for those.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let name = name.into();
        if !KNOWN_FIELDS.contains(&name.as_str()) {
            self.extra.insert(name, value.into());
        }
        self
    }

    /// True for `noteOn` events
    pub fn is_note_on(&self) -> bool {
        self.kind == EventType::NoteOn
    }

    /// True for `noteOff` events
    pub fn is_note_off(&self) -> bool {
        self.kind == EventType::NoteOff
    }

    /// Structural access to any field, known or extra, by name.
    ///
    /// Optional known fields that are unset (`velocity`, `length`) are reported as absent.
    pub fn get(&self, field: &str) -> Option<Cow<'_, FieldValue>> {
        let known = match field {
            "channel" => FieldValue::from(self.channel),
            "note" => FieldValue::from(self.note),
            "timestamp" => FieldValue::from(self.timestamp),
            "track" => FieldValue::from(self.track),
            "type" => FieldValue::from(self.kind.as_str()),
            "velocity" => FieldValue::from(self.velocity?),
            "length" => FieldValue::from(self.length?),
            _ => return self.extra.get(field).map(Cow::Borrowed),
        };
        Some(Cow::Owned(known))
    }

    /// Checks the invariants the timeline relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.timestamp.is_finite() {
            return Err(ValidationError::Timestamp(self.timestamp));
        }
        Ok(())
    }

    /// Builds an event from a loose record of named values.
    ///
    /// `timestamp`, `type` and `note` are required. `channel`, `track`, `velocity` and
    /// `length` are optional; every other entry becomes an extra field.
    pub fn from_fields<I, K>(fields: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        let mut extra: BTreeMap<String, FieldValue> = fields
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();

        let timestamp = extra
            .remove("timestamp")
            .ok_or(ValidationError::MissingField("timestamp"))?
            .as_f64()
            .ok_or(ValidationError::FieldType {
                field: "timestamp",
                expected: "a number",
            })?;
        let kind = extra
            .remove("type")
            .ok_or(ValidationError::MissingField("type"))?;
        let kind = kind
            .as_str()
            .and_then(EventType::from_name)
            .ok_or(ValidationError::FieldType {
                field: "type",
                expected: "\"noteOn\" or \"noteOff\"",
            })?;
        let note = extra
            .remove("note")
            .ok_or(ValidationError::MissingField("note"))?
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or(ValidationError::FieldType {
                field: "note",
                expected: "an integer",
            })?;

        let channel = take_int(&mut extra, "channel", "an integer 0-15")?.unwrap_or(0);
        let track = take_int(&mut extra, "track", "a non-negative integer")?.unwrap_or(0);
        let velocity = take_int(&mut extra, "velocity", "an integer 0-127")?;
        let length = match extra.remove("length") {
            Some(value) => Some(value.as_f64().ok_or(ValidationError::FieldType {
                field: "length",
                expected: "a number",
            })?),
            None => None,
        };

        let event = Self {
            channel,
            note,
            timestamp,
            track,
            kind,
            velocity,
            length,
            extra,
        };
        event.validate()?;
        Ok(event)
    }
}

fn take_int<T: TryFrom<i64>>(
    fields: &mut BTreeMap<String, FieldValue>,
    field: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ValidationError> {
    let Some(value) = fields.remove(field) else {
        return Ok(None);
    };
    value
        .as_i64()
        .and_then(|v| T::try_from(v).ok())
        .map(Some)
        .ok_or(ValidationError::FieldType { field, expected })
}

#[test]
fn get_reads_known_and_extra_fields() {
    let event = NoteEvent::note_on(3, 60, 12.5, 90).with_field("finger", 2);
    assert_eq!(event.get("channel").as_deref(), Some(&FieldValue::Int(3)));
    assert_eq!(event.get("timestamp").as_deref(), Some(&FieldValue::Float(12.5)));
    assert_eq!(event.get("type").as_deref(), Some(&FieldValue::from("noteOn")));
    assert_eq!(event.get("finger").as_deref(), Some(&FieldValue::Int(2)));
    assert_eq!(event.get("length"), None);
    assert_eq!(event.get("missing"), None);
}

#[test]
fn from_fields_requires_timestamp_type_and_note() {
    let missing_type = NoteEvent::from_fields([
        ("timestamp", FieldValue::from(10.)),
        ("note", FieldValue::from(60)),
    ]);
    assert_eq!(missing_type, Err(ValidationError::MissingField("type")));

    let missing_note = NoteEvent::from_fields([
        ("timestamp", FieldValue::from(10.)),
        ("type", FieldValue::from("noteOff")),
    ]);
    assert_eq!(missing_note, Err(ValidationError::MissingField("note")));

    let event = NoteEvent::from_fields([
        ("timestamp", FieldValue::from(10)),
        ("type", FieldValue::from("noteOn")),
        ("note", FieldValue::from(64)),
        ("velocity", FieldValue::from(100)),
        ("color", FieldValue::from("red")),
    ])
    .unwrap();
    assert_eq!(
        event,
        NoteEvent::note_on(0, 64, 10., 100).with_field("color", "red")
    );
}

#[test]
fn from_fields_rejects_bad_types() {
    let err = NoteEvent::from_fields([
        ("timestamp", FieldValue::from(10.)),
        ("type", FieldValue::from("controller")),
        ("note", FieldValue::from(60)),
    ])
    .unwrap_err();
    assert!(matches!(err, ValidationError::FieldType { field: "type", .. }));

    let err = NoteEvent::from_fields([
        ("timestamp", FieldValue::from(f64::NAN)),
        ("type", FieldValue::from("noteOn")),
        ("note", FieldValue::from(60)),
    ])
    .unwrap_err();
    assert!(matches!(err, ValidationError::Timestamp(_)));
}
