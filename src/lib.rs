#![doc = r#"
# midi_replay

Decode Standard MIDI Files into note events and replay them in real time.

The pipeline runs from raw bytes to callbacks:

1. [`Reader`](reader::Reader) walks the bytes of a file.
2. [`MidiFile::parse`](file::MidiFile::parse) decodes the header and every track.
3. [`MidiFile::into_events`](file::MidiFile::into_events) merges the tracks into one stream
   timestamped in milliseconds, following tempo changes.
4. [`format_events`](note_event::format_events) keeps the notes and works out their lengths.
5. A [`Timeline`](timeline::Timeline) stores them, split at the play cursor.
6. A [`Player`](player::Player) dispatches them to callbacks as play time passes.

## Example
```rust
use midi_replay::prelude::*;

// One track, 480 ticks per beat: middle C for one beat at the default 120 BPM
let bytes = [
    b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0,
    b'M', b'T', b'r', b'k', 0, 0, 0, 13,
    0x00, 0x90, 60, 80,
    0x83, 0x60, 0x80, 60, 0,
    0x00, 0xFF, 0x2F, 0x00,
];
let notes = MidiFile::parse(&bytes).unwrap().into_note_events();
assert_eq!(notes[0].length, Some(500.));
assert_eq!(notes[1].timestamp, 500.);

let mut player = Player::with_clock(ManualClock::new());
player.load_bytes(&bytes).unwrap();
player.play();
assert_eq!(player.run(), Poll::Finished);
```
"#]
#![warn(missing_docs)]

mod config;
pub mod error;
pub mod file;
pub mod note_event;
pub mod player;
pub mod reader;
pub mod timeline;

pub use config::PlayerConfig;
pub use error::*;

#[allow(missing_docs)]
pub mod prelude {
    pub use crate::{
        config::PlayerConfig,
        error::{Error, ParseError, ValidationError},
        file::*,
        note_event::*,
        player::*,
        reader::{ReadResult, Reader, ReaderError, ReaderErrorKind},
        timeline::*,
    };

    pub(crate) use crate::reader::inv_data;
}
