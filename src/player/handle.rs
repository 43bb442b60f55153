use crate::{
    config::{validate_seek, validate_speed},
    prelude::*,
};
use crossbeam_channel::Sender;

/// A request queued for the player by a [`PlayHandle`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlayCommand {
    /// [`Player::play`]
    Play,
    /// [`Player::pause`]
    Pause,
    /// [`Player::stop`]
    Stop,
    /// [`Player::reset`]
    Reset,
    /// [`Player::seek`]
    Seek(f64),
    /// [`Player::set_speed`]
    SetSpeed(f64),
    /// [`Player::add_event`]
    AddEvent(NoteEvent),
    /// [`Player::remove_events`]
    RemoveEvents(Pattern),
    /// [`Player::reverse`]
    Reverse,
    /// [`Player::emit`] with a name
    Emit(String),
    /// [`Player::emit_event`]
    EmitEvent(NoteEvent),
}

#[doc = r#"
Controls a [`Player`] from callbacks or from other threads.

Every call queues a [`PlayCommand`]. The player applies queued commands in order at the
start of each [`Player::poll`] and right after each batch of callbacks, so a callback can
pause, seek, or restart the player it was called from.

Arguments are validated here, so a bad speed, seek target or event is reported to the caller and never
reaches the player. Commands sent after the player was dropped are discarded.
"#]
#[derive(Debug, Clone)]
pub struct PlayHandle {
    cmd: Sender<PlayCommand>,
}

impl PlayHandle {
    pub(crate) fn new(cmd: Sender<PlayCommand>) -> Self {
        Self { cmd }
    }

    fn send(&self, command: PlayCommand) {
        let _ = self.cmd.send(command);
    }

    /// Queues [`Player::play`]
    pub fn play(&self) {
        self.send(PlayCommand::Play);
    }

    /// Queues [`Player::pause`]
    pub fn pause(&self) {
        self.send(PlayCommand::Pause);
    }

    /// Queues [`Player::stop`]
    pub fn stop(&self) {
        self.send(PlayCommand::Stop);
    }

    /// Queues [`Player::reset`]
    pub fn reset(&self) {
        self.send(PlayCommand::Reset);
    }

    /// Queues [`Player::seek`] after checking `ms` is finite
    pub fn seek(&self, ms: f64) -> Result<(), ValidationError> {
        validate_seek(ms)?;
        self.send(PlayCommand::Seek(ms));
        Ok(())
    }

    /// Queues [`Player::set_speed`] after checking `speed` is positive
    pub fn set_speed(&self, speed: f64) -> Result<(), ValidationError> {
        validate_speed(speed)?;
        self.send(PlayCommand::SetSpeed(speed));
        Ok(())
    }

    /// Queues [`Player::add_event`] after validating `event`
    pub fn add_event(&self, event: NoteEvent) -> Result<(), ValidationError> {
        event.validate()?;
        self.send(PlayCommand::AddEvent(event));
        Ok(())
    }

    /// Queues [`Player::remove_events`]
    pub fn remove_events(&self, pattern: Pattern) {
        self.send(PlayCommand::RemoveEvents(pattern));
    }

    /// Queues [`Player::reverse`]
    pub fn reverse(&self) {
        self.send(PlayCommand::Reverse);
    }

    /// Queues [`Player::emit`]
    pub fn emit(&self, name: impl Into<String>) {
        self.send(PlayCommand::Emit(name.into()));
    }

    /// Queues [`Player::emit_event`]
    pub fn emit_event(&self, event: NoteEvent) {
        self.send(PlayCommand::EmitEvent(event));
    }
}

#[test]
fn validates_before_queueing() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let handle = PlayHandle::new(tx);
    assert_eq!(handle.set_speed(0.), Err(ValidationError::Speed(0.)));
    assert!(handle.add_event(NoteEvent::note_on(0, 60, f64::NAN, 1)).is_err());
    assert_eq!(handle.seek(f64::INFINITY), Err(ValidationError::Seek(f64::INFINITY)));
    handle.set_speed(1.5).unwrap();
    handle.seek(10.).unwrap();
    assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![
        PlayCommand::SetSpeed(1.5),
        PlayCommand::Seek(10.)
    ]);
}
