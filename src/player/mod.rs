#![doc = r#"
Real-time playback of a [`Timeline`].

A [`Player`] owns a timeline, a [`Clock`] and a list of callbacks. While playing, play time
runs at `speed` times the clock, and every pending event is handed to the matching
callbacks once play time reaches its timestamp.

The player never spawns threads. [`Player::poll`] performs one step of the dispatch loop
and tells the caller how long to wait before the next step; [`Player::run`] waits on the
player's clock between steps and wakes early when a [`PlayHandle`] queues a command, so a
pause from another thread freezes play time when it is made. Callbacks receive a [`PlayHandle`] through which they
can pause, seek, or restart playback; those requests are applied as soon as the callbacks
return, in the order they were made.

# Example
```rust
# use midi_replay::prelude::*;
# use std::{cell::RefCell, rc::Rc};
let clock = ManualClock::new();
let mut player = Player::with_clock(clock.clone());
player
    .load_events(vec![
        NoteEvent::note_on(0, 60, 0., 100),
        NoteEvent::note_off(0, 60, 500.),
    ])
    .unwrap();

let heard = Rc::new(RefCell::new(Vec::new()));
let log = heard.clone();
player.on("noteOn", move |trigger, _| {
    if let Some(event) = trigger.event() {
        log.borrow_mut().push(event.note);
    }
});

player.play();
assert_eq!(player.run(), Poll::Finished);
assert_eq!(*heard.borrow(), vec![60]);
assert_eq!(clock.now_ms(), 500.);
```
"#]

mod callback;
pub use callback::*;

mod clock;
pub use clock::*;

mod handle;
pub use handle::*;

use crate::{
    config::{validate_seek, validate_speed},
    prelude::*,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use crossbeam_channel::Receiver;

/// Events due within this many milliseconds are dispatched instead of waited for.
const DUE_EPSILON_MS: f64 = 1e-6;

/// Outcome of one [`Player::poll`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Poll {
    /// The player is paused; nothing will happen until it plays again
    Idle,
    /// Poll again after this many clock milliseconds
    Wait(f64),
    /// Every event was dispatched and the player paused itself
    Finished,
}

/// Plays a timeline of note events against a clock.
#[derive(Debug)]
pub struct Player<C: Clock = SystemClock> {
    timeline: Timeline,
    clock: C,
    config: PlayerConfig,
    current_time: f64,
    speed: f64,
    playing: bool,
    starting_time: f64,
    callbacks: CallbackRegistry,
    handle: PlayHandle,
    commands: Receiver<PlayCommand>,
    applying_commands: bool,
}

impl Player<SystemClock> {
    /// A paused, empty player on the system clock
    pub fn new() -> Self {
        Self::build(SystemClock::new(), PlayerConfig::default())
    }

    /// A paused, empty player on the system clock with custom settings
    pub fn with_config(config: PlayerConfig) -> Result<Self, ValidationError> {
        Self::with_clock_and_config(SystemClock::new(), config)
    }
}

impl Default for Player<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Player<C> {
    /// A paused, empty player on `clock`
    pub fn with_clock(clock: C) -> Self {
        Self::build(clock, PlayerConfig::default())
    }

    /// A paused, empty player on `clock` with custom settings
    pub fn with_clock_and_config(clock: C, config: PlayerConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self::build(clock, config))
    }

    fn build(clock: C, config: PlayerConfig) -> Self {
        let (cmd, commands) = crossbeam_channel::unbounded();
        Self {
            timeline: Timeline::new(),
            starting_time: clock.now_ms(),
            clock,
            config,
            current_time: 0.,
            speed: config.speed,
            playing: false,
            callbacks: CallbackRegistry::default(),
            handle: PlayHandle::new(cmd),
            commands,
            applying_commands: false,
        }
    }

    /// Decodes a Standard MIDI File and loads its notes, shifted by the configured note shift.
    ///
    /// On failure nothing changes. Returns the loaded events.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<Vec<NoteEvent>, ReaderError> {
        self.load_bytes_shifted(bytes, self.config.note_shift)
    }

    /// Decodes a Standard MIDI File and loads its notes, adding `note_shift` to every key.
    pub fn load_bytes_shifted(
        &mut self,
        bytes: &[u8],
        note_shift: i32,
    ) -> Result<Vec<NoteEvent>, ReaderError> {
        let file = MidiFile::parse(bytes)?;
        let notes = format_events_shifted(file.into_events(), note_shift);
        self.replace_events(notes, 0);
        Ok(self.timeline.all())
    }

    /// Like [`load_bytes`](Self::load_bytes), from base64 text of the file.
    pub fn load_base64(&mut self, text: &str) -> crate::Result<Vec<NoteEvent>> {
        self.load_base64_shifted(text, self.config.note_shift)
    }

    /// Like [`load_bytes_shifted`](Self::load_bytes_shifted), from base64 text of the file.
    pub fn load_base64_shifted(
        &mut self,
        text: &str,
        note_shift: i32,
    ) -> crate::Result<Vec<NoteEvent>> {
        let bytes = STANDARD.decode(text.trim())?;
        Ok(self.load_bytes_shifted(&bytes, note_shift)?)
    }

    /// Loads already formatted events, shifted by the configured note shift.
    ///
    /// Every event is validated first; on failure nothing changes.
    pub fn load_events(&mut self, events: Vec<NoteEvent>) -> Result<Vec<NoteEvent>, ValidationError> {
        self.load_events_shifted(events, self.config.note_shift)
    }

    /// Loads already formatted events, adding `note_shift` to every key.
    pub fn load_events_shifted(
        &mut self,
        events: Vec<NoteEvent>,
        note_shift: i32,
    ) -> Result<Vec<NoteEvent>, ValidationError> {
        events.iter().try_for_each(NoteEvent::validate)?;
        self.replace_events(events, note_shift);
        Ok(self.timeline.all())
    }

    fn replace_events(&mut self, events: Vec<NoteEvent>, note_shift: i32) {
        self.timeline.load(events, note_shift);
        tracing::debug!(
            events = self.timeline.len(),
            duration = self.timeline.duration(),
            "loaded events"
        );
        self.seek_to(0.);
    }

    /// Starts or resumes playback from the current time. Does nothing if already playing.
    pub fn play(&mut self) {
        if self.playing {
            return;
        }
        self.starting_time = self.clock.now_ms() - self.current_time / self.speed;
        self.playing = true;
        tracing::debug!(at = self.current_time, speed = self.speed, "play");
        self.fire(&Trigger::Named(Lifecycle::Play.name()));
        self.apply_commands();
    }

    /// Freezes play time. Does nothing if not playing.
    pub fn pause(&mut self) {
        if !self.playing {
            return;
        }
        self.current_time = self.current_time();
        self.playing = false;
        tracing::debug!(at = self.current_time, "pause");
        self.fire(&Trigger::Named(Lifecycle::Pause.name()));
        self.apply_commands();
    }

    /// Pauses and rewinds to 0.
    pub fn stop(&mut self) {
        self.pause();
        self.seek_to(0.);
        tracing::debug!("stop");
        self.fire(&Trigger::Named(Lifecycle::Stop.name()));
        self.apply_commands();
    }

    /// Stops and removes every event.
    pub fn reset(&mut self) {
        self.stop();
        self.remove_events(&Pattern::new());
    }

    /// Moves play time to `ms`. Events at or after `ms` are pending afterwards.
    pub fn seek(&mut self, ms: f64) -> Result<(), ValidationError> {
        validate_seek(ms)?;
        self.seek_to(ms);
        Ok(())
    }

    fn seek_to(&mut self, ms: f64) {
        self.timeline.seek(ms);
        self.current_time = ms;
        self.starting_time = self.clock.now_ms() - ms / self.speed;
        tracing::debug!(to = ms, "seek");
    }

    /// Sets the playback rate multiplier. Takes effect on the next time read.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), ValidationError> {
        validate_speed(speed)?;
        self.speed = speed;
        tracing::debug!(speed, "speed changed");
        Ok(())
    }

    /// Play time in milliseconds
    pub fn current_time(&self) -> f64 {
        if self.playing {
            (self.clock.now_ms() - self.starting_time) * self.speed
        } else {
            self.current_time
        }
    }

    /// The playback rate multiplier
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// True while playing
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Timestamp of the last event
    pub fn duration(&self) -> f64 {
        self.timeline.duration()
    }

    /// The settings the player was created with
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// The underlying timeline
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// A copy of every event, in order
    pub fn all_events(&self) -> Vec<NoteEvent> {
        self.timeline.all()
    }

    /// A copy of the events with `start <= timestamp <= end`
    pub fn events_in_range(&self, start: f64, end: f64) -> Vec<NoteEvent> {
        self.timeline.range(start, end)
    }

    /// The events of the next `ms` milliseconds of play time, the current time included
    pub fn events_ahead_by(&self, ms: f64) -> Vec<NoteEvent> {
        let now = self.current_time();
        self.timeline.range(now, now + ms)
    }

    /// The events of the last `ms` milliseconds of play time, the current time included
    pub fn events_behind_by(&self, ms: f64) -> Vec<NoteEvent> {
        let now = self.current_time();
        self.timeline.range(now - ms, now)
    }

    /// Inserts one event in timestamp order.
    ///
    /// An event not after the current time counts as already played.
    pub fn add_event(&mut self, event: NoteEvent) -> Result<(), ValidationError> {
        event.validate()?;
        let now = self.current_time();
        self.timeline.insert(event, now);
        Ok(())
    }

    /// Removes every event matched by `pattern`, returning how many were removed
    pub fn remove_events(&mut self, pattern: &Pattern) -> usize {
        let removed = self.timeline.remove_matching(pattern);
        tracing::debug!(removed, "removed events");
        removed
    }

    /// Reverses the timeline (see [`Timeline::reverse`]), keeping the current play time.
    pub fn reverse(&mut self) {
        let now = self.current_time();
        self.timeline.reverse();
        self.seek_to(now);
    }

    /// Registers `handler` for `target`, returning an id for [`off`](Self::off).
    ///
    /// `target` is a name (`"play"`, `"noteOn"`, a [`Lifecycle`], a custom name) or a
    /// [`Pattern`] that dispatched events must match.
    pub fn on(
        &mut self,
        target: impl Into<CallbackTarget>,
        handler: impl FnMut(&Trigger<'_>, &PlayHandle) + 'static,
    ) -> CallbackId {
        self.callbacks.add(target.into(), Box::new(handler))
    }

    /// Unregisters a callback, returning false if it was not registered
    pub fn off(&mut self, id: CallbackId) -> bool {
        self.callbacks.remove(id)
    }

    /// Unregisters every callback
    pub fn off_all(&mut self) {
        self.callbacks.clear();
    }

    /// Fires the callbacks registered for `name`, returning how many ran
    pub fn emit(&mut self, name: &str) -> usize {
        let fired = self.fire(&Trigger::Named(name));
        self.apply_commands();
        fired
    }

    /// Fires the callbacks matching `event` as if it had been dispatched, returning how
    /// many ran. The timeline is untouched.
    pub fn emit_event(&mut self, event: &NoteEvent) -> usize {
        let fired = self.fire(&Trigger::Event(event));
        self.apply_commands();
        fired
    }

    /// A handle queueing commands for this player
    pub fn handle(&self) -> PlayHandle {
        self.handle.clone()
    }

    /// Runs the dispatch loop until it has to wait.
    ///
    /// Applies queued commands, then dispatches every pending event that is due, earliest
    /// first. Once the last event is dispatched the player pauses itself and fires
    /// `finish`; if a callback restarts playback with events pending, dispatching goes on.
    pub fn poll(&mut self) -> Poll {
        self.apply_commands();
        loop {
            if !self.playing {
                return Poll::Idle;
            }
            let Some(next) = self.timeline.next_pending() else {
                self.pause();
                tracing::debug!("finished");
                self.fire(&Trigger::Named(Lifecycle::Finish.name()));
                self.apply_commands();
                if self.playing && self.timeline.next_pending().is_some() {
                    continue;
                }
                return Poll::Finished;
            };

            let wait = (next.timestamp - self.current_time()) / self.speed;
            if wait > DUE_EPSILON_MS {
                return Poll::Wait(wait);
            }

            let event = next.clone();
            tracing::trace!(
                timestamp = event.timestamp,
                note = event.note,
                kind = event.kind.as_str(),
                "dispatching event"
            );
            self.fire(&Trigger::Event(&event));
            self.timeline.advance();
            self.apply_commands();
        }
    }

    /// Drives [`poll`](Self::poll) to completion, waiting on the player's clock in between.
    /// Returns as soon as the player is paused or finished.
    ///
    /// A command queued through a [`PlayHandle`] during a wait ends the wait and is applied
    /// right away.
    pub fn run(&mut self) -> Poll {
        loop {
            match self.poll() {
                Poll::Wait(ms) => {
                    if let Some(command) = self.clock.wait_ms(ms, &self.commands) {
                        self.apply(command);
                    }
                }
                done => return done,
            }
        }
    }

    fn fire(&mut self, trigger: &Trigger<'_>) -> usize {
        self.callbacks.trigger(trigger, &self.handle)
    }

    fn apply_commands(&mut self) {
        if self.applying_commands {
            return;
        }
        self.applying_commands = true;
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }
        self.applying_commands = false;
    }

    fn apply(&mut self, command: PlayCommand) {
        tracing::trace!(?command, "applying command");
        match command {
            PlayCommand::Play => self.play(),
            PlayCommand::Pause => self.pause(),
            PlayCommand::Stop => self.stop(),
            PlayCommand::Reset => self.reset(),
            PlayCommand::Seek(ms) => {
                if let Err(e) = self.seek(ms) {
                    tracing::warn!(%e, "dropping queued seek");
                }
            }
            PlayCommand::SetSpeed(speed) => {
                if let Err(e) = self.set_speed(speed) {
                    tracing::warn!(%e, "dropping queued speed change");
                }
            }
            PlayCommand::AddEvent(event) => {
                if let Err(e) = self.add_event(event) {
                    tracing::warn!(%e, "dropping queued event");
                }
            }
            PlayCommand::RemoveEvents(pattern) => {
                self.remove_events(&pattern);
            }
            PlayCommand::Reverse => self.reverse(),
            PlayCommand::Emit(name) => {
                self.emit(&name);
            }
            PlayCommand::EmitEvent(event) => {
                self.emit_event(&event);
            }
        }
    }
}

#[cfg(test)]
fn two_notes(clock: &ManualClock) -> Player<ManualClock> {
    let mut player = Player::with_clock(clock.clone());
    player
        .load_events(vec![
            NoteEvent::note_on(0, 60, 0., 100).with_length(500.),
            NoteEvent::note_off(0, 60, 500.),
        ])
        .unwrap();
    player
}

#[test]
fn time_follows_the_clock_at_speed() {
    let clock = ManualClock::new();
    let mut player = two_notes(&clock);
    player.play();
    clock.advance(100.);
    assert_eq!(player.current_time(), 100.);

    player.set_speed(2.).unwrap();
    assert_eq!(player.current_time(), 200.);

    player.pause();
    clock.advance(1000.);
    assert_eq!(player.current_time(), 200.);

    player.play();
    clock.advance(50.);
    assert_eq!(player.current_time(), 300.);
}

#[test]
fn seek_reanchors_play_time() {
    let clock = ManualClock::new();
    let mut player = two_notes(&clock);
    player.set_speed(2.).unwrap();
    player.play();
    clock.advance(10.);
    player.seek(400.).unwrap();
    assert_eq!(player.current_time(), 400.);
    clock.advance(25.);
    assert_eq!(player.current_time(), 450.);
    assert_eq!(player.timeline().played().len(), 1);
}

#[test]
fn poll_waits_for_the_next_event() {
    let clock = ManualClock::new();
    let mut player = two_notes(&clock);
    assert_eq!(player.poll(), Poll::Idle);

    player.play();
    assert_eq!(player.poll(), Poll::Wait(500.));
    assert_eq!(player.timeline().played().len(), 1);

    clock.advance(500.);
    assert_eq!(player.poll(), Poll::Finished);
    assert!(!player.is_playing());
    assert_eq!(player.timeline().pending().len(), 0);
}

#[test]
fn seek_must_be_finite() {
    let clock = ManualClock::new();
    let mut player = two_notes(&clock);
    player.seek(200.).unwrap();
    assert!(matches!(player.seek(f64::NAN), Err(ValidationError::Seek(ms)) if ms.is_nan()));
    assert_eq!(
        player.seek(f64::INFINITY),
        Err(ValidationError::Seek(f64::INFINITY))
    );
    assert_eq!(player.current_time(), 200.);
    assert_eq!(player.timeline().played().len(), 1);
}

#[test]
fn speed_must_be_positive() {
    let mut player = Player::with_clock(ManualClock::new());
    assert_eq!(player.set_speed(0.), Err(ValidationError::Speed(0.)));
    assert_eq!(player.set_speed(-2.), Err(ValidationError::Speed(-2.)));
    assert!(player.set_speed(f64::NAN).is_err());
    assert_eq!(player.speed(), 1.);
    assert!(Player::with_config(PlayerConfig {
        speed: 0.,
        ..Default::default()
    })
    .is_err());
}
