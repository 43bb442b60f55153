use crate::prelude::*;

/// Settings a [`Player`] starts with.
///
/// ```rust
/// # use midi_replay::prelude::*;
/// let config = PlayerConfig {
///     speed: 2.,
///     ..Default::default()
/// };
/// let player = Player::with_config(config).unwrap();
/// assert_eq!(player.speed(), 2.);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerConfig {
    /// Playback rate multiplier, must be positive
    pub speed: f64,
    /// Added to every key when loading a file
    pub note_shift: i32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 1.,
            note_shift: 0,
        }
    }
}

impl PlayerConfig {
    /// Checks the settings, failing like [`Player::set_speed`] would
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_speed(self.speed)
    }
}

pub(crate) fn validate_speed(speed: f64) -> Result<(), ValidationError> {
    if speed.is_finite() && speed > 0. {
        Ok(())
    } else {
        Err(ValidationError::Speed(speed))
    }
}

pub(crate) fn validate_seek(ms: f64) -> Result<(), ValidationError> {
    if ms.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::Seek(ms))
    }
}

#[test]
fn rejects_non_positive_speeds() {
    for speed in [0., -1., f64::NAN, f64::INFINITY] {
        let config = PlayerConfig {
            speed,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
    assert_eq!(PlayerConfig::default().validate(), Ok(()));
}
