#![doc = r#"
SMPTE Offset - the starting time of a track in SMPTE time code.

Files using metrical timing may still carry this meta event. It is decoded for completeness
but never shifts event timestamps.
"#]

/// The frame rates a SMPTE offset may be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmpteFps {
    /// 24 frames per second
    TwentyFour,
    /// 25 frames per second
    TwentyFive,
    /// 29.97 frames per second (30000/1001), drop frame
    TwentyNine,
    /// 30 frames per second
    Thirty,
}

impl SmpteFps {
    /// The nominal frame rate as it is usually written (29.97 is reported as 29)
    pub const fn as_u8(&self) -> u8 {
        match self {
            Self::TwentyFour => 24,
            Self::TwentyFive => 25,
            Self::TwentyNine => 29,
            Self::Thirty => 30,
        }
    }

    /// The precise frame rate
    pub const fn as_f64(&self) -> f64 {
        match self {
            Self::TwentyFour => 24.,
            Self::TwentyFive => 25.,
            Self::TwentyNine => DROP_FRAME,
            Self::Thirty => 30.,
        }
    }
}

const DROP_FRAME: f64 = 30_000. / 1001.;

/// A track's starting position in SMPTE time code.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct SmpteOffset {
    /// The frame rate the offset is expressed in
    pub fps: SmpteFps,
    /// Hour component, the low 5 bits of the first byte
    pub hour: u8,
    /// Minute component
    pub minute: u8,
    /// Second component
    pub second: u8,
    /// Frame number within the second
    pub frame: u8,
    /// Hundredths of a frame
    pub subframe: u8,
}

impl SmpteOffset {
    /// Decodes the 5 byte payload of the meta event.
    ///
    /// - Byte 0: `0rrhhhhh` where `rr` is the frame rate and `hhhhh` the hour
    /// - Byte 1: minutes
    /// - Byte 2: seconds
    /// - Byte 3: frames
    /// - Byte 4: fractional frames in 100ths
    ///
    /// Component ranges are not checked.
    pub const fn from_bytes(data: [u8; 5]) -> Self {
        let fps = match (data[0] >> 5) & 0b11 {
            0 => SmpteFps::TwentyFour,
            1 => SmpteFps::TwentyFive,
            2 => SmpteFps::TwentyNine,
            _ => SmpteFps::Thirty,
        };
        Self {
            fps,
            hour: data[0] & 0b0001_1111,
            minute: data[1],
            second: data[2],
            frame: data[3],
            subframe: data[4],
        }
    }

    /// The offset in milliseconds.
    pub fn as_millis(&self) -> f64 {
        let whole_seconds =
            self.hour as f64 * 3600. + self.minute as f64 * 60. + self.second as f64;
        let frames = self.frame as f64 + self.subframe as f64 / 100.;
        whole_seconds * 1000. + frames * 1000. / self.fps.as_f64()
    }
}

#[test]
fn parse_smpte_offset() {
    use pretty_assertions::assert_eq;
    // the bytes after 00 FF 54 05
    let offset = SmpteOffset::from_bytes([0x41, 0x17, 0x2D, 0x0C, 0x22]);

    assert_eq!(offset.fps, SmpteFps::TwentyNine);
    assert_eq!(offset.hour, 1);
    assert_eq!(offset.minute, 23);
    assert_eq!(offset.second, 45);
    assert_eq!(offset.frame, 12);
    assert_eq!(offset.subframe, 34);
}

#[test]
fn smpte_offset_millis() {
    let offset = SmpteOffset::from_bytes([0x20, 0x00, 0x01, 0x05, 0x00]);
    assert_eq!(offset.fps, SmpteFps::TwentyFive);
    assert_eq!(offset.as_millis(), 1200.);
}
