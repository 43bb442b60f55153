/// Microseconds per beat used before any `setTempo` event (120 BPM)
pub const DEFAULT_MICROS_PER_BEAT: u32 = 500_000;

/// The payload of a `setTempo` meta event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tempo {
    micros_per_beat: u32,
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(DEFAULT_MICROS_PER_BEAT)
    }
}

impl Tempo {
    /// Create a tempo from microseconds per beat
    pub const fn new(micros_per_beat: u32) -> Self {
        Self { micros_per_beat }
    }

    /// Decodes the 24-bit big-endian value stored in the file
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    /// Microseconds per beat (quarter note)
    pub const fn micros_per_beat(&self) -> u32 {
        self.micros_per_beat
    }

    /// Beats per minute
    pub fn bpm(&self) -> f64 {
        60_000_000. / self.micros_per_beat as f64
    }
}

#[test]
fn tempo_bpm() {
    assert_eq!(Tempo::default().bpm(), 120.);
    assert_eq!(Tempo::from_bytes([0x0F, 0x42, 0x40]).micros_per_beat(), 1_000_000);
    assert_eq!(Tempo::from_bytes([0x0F, 0x42, 0x40]).bpm(), 60.);
}
