use crate::prelude::*;
use crossbeam_channel::Receiver;
use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

/// The time source a [`Player`] projects play time from.
pub trait Clock {
    /// Milliseconds since some fixed point in the past
    fn now_ms(&self) -> f64;

    /// Blocks for up to `ms` milliseconds.
    ///
    /// Returns early with the first command queued on `wake`, so a [`PlayHandle`] used from
    /// another thread takes effect at the moment it is called.
    fn wait_ms(&self, ms: f64, wake: &Receiver<PlayCommand>) -> Option<PlayCommand>;
}

/// Wall clock time, measured from the moment the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// A clock starting at 0 now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits too long for a `Duration` are as good as forever.
fn wait_duration(ms: f64) -> Duration {
    Duration::try_from_secs_f64(ms / 1000.).unwrap_or(Duration::MAX)
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.
    }

    fn wait_ms(&self, ms: f64, wake: &Receiver<PlayCommand>) -> Option<PlayCommand> {
        if ms > 0. {
            wake.recv_timeout(wait_duration(ms)).ok()
        } else {
            wake.try_recv().ok()
        }
    }
}

#[doc = r#"
A clock that only moves when told to.

Clones share the same time, so a test can keep one clone and hand another to a player.
Waiting advances the time instantly, unless a command is already queued.

```rust
# use midi_replay::prelude::*;
let clock = ManualClock::new();
let view = clock.clone();
let (_tx, wake) = crossbeam_channel::unbounded();
clock.advance(250.);
assert_eq!(clock.wait_ms(50., &wake), None);
assert_eq!(view.now_ms(), 300.);
```
"#]
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    /// A clock at 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `ms`
    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    /// Sets the clock to `ms`
    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    fn wait_ms(&self, ms: f64, wake: &Receiver<PlayCommand>) -> Option<PlayCommand> {
        if let Ok(command) = wake.try_recv() {
            return Some(command);
        }
        if ms > 0. {
            self.advance(ms);
        }
        None
    }
}

#[test]
fn system_clock_is_monotonic() {
    let (_tx, wake) = crossbeam_channel::unbounded();
    let clock = SystemClock::new();
    let a = clock.now_ms();
    assert_eq!(clock.wait_ms(1., &wake), None);
    assert!(clock.now_ms() >= a + 1.);
}

#[test]
fn system_clock_wakes_on_a_queued_command() {
    let (tx, wake) = crossbeam_channel::unbounded();
    let clock = SystemClock::new();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        let _ = tx.send(PlayCommand::Pause);
    });
    assert_eq!(clock.wait_ms(1e300, &wake), Some(PlayCommand::Pause));
    assert!(clock.now_ms() < 60_000.);
}

#[test]
fn oversized_waits_saturate() {
    assert_eq!(wait_duration(1e300), Duration::MAX);
    assert_eq!(wait_duration(f64::INFINITY), Duration::MAX);
    assert_eq!(wait_duration(1500.), Duration::from_millis(1500));
}

#[test]
fn manual_clock_returns_queued_commands_without_advancing() {
    let (tx, wake) = crossbeam_channel::unbounded();
    let clock = ManualClock::new();
    tx.send(PlayCommand::Stop).unwrap();
    assert_eq!(clock.wait_ms(100., &wake), Some(PlayCommand::Stop));
    assert_eq!(clock.now_ms(), 0.);
    assert_eq!(clock.wait_ms(100., &wake), None);
    assert_eq!(clock.now_ms(), 100.);
}
