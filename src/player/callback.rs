use crate::prelude::*;
use std::fmt;

/// Identifies a registered callback, for [`Player::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

/// Transport changes a player announces to its callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Playback started
    Play,
    /// Playback paused, including as part of a stop
    Pause,
    /// Playback stopped and rewound
    Stop,
    /// The last pending event was dispatched
    Finish,
}

impl Lifecycle {
    /// The name callbacks register under
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Finish => "finish",
        }
    }
}

/// What a callback listens to.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackTarget {
    /// A lifecycle name (`play`, `pause`, `stop`, `finish`), an event type (`noteOn`,
    /// `noteOff`) or any custom name passed to [`Player::emit`]
    Named(String),
    /// Events carrying every field of the pattern
    Pattern(Pattern),
}

impl From<&str> for CallbackTarget {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for CallbackTarget {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Lifecycle> for CallbackTarget {
    fn from(lifecycle: Lifecycle) -> Self {
        Self::Named(lifecycle.name().to_string())
    }
}

impl From<EventType> for CallbackTarget {
    fn from(kind: EventType) -> Self {
        Self::Named(kind.as_str().to_string())
    }
}

impl From<Pattern> for CallbackTarget {
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

/// What fired a callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger<'a> {
    /// A lifecycle change or a custom name
    Named(&'a str),
    /// A dispatched or emitted event
    Event(&'a NoteEvent),
}

impl Trigger<'_> {
    /// The event, if an event fired the callback
    pub fn event(&self) -> Option<&NoteEvent> {
        match self {
            Self::Event(event) => Some(*event),
            Self::Named(_) => None,
        }
    }

    /// The name, if a name fired the callback
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(*name),
            Self::Event(_) => None,
        }
    }
}

impl CallbackTarget {
    /// True if a callback registered for this target fires on `trigger`.
    ///
    /// A name matches the same name or an event of that type; a pattern only matches events.
    pub fn matches(&self, trigger: &Trigger<'_>) -> bool {
        match (self, trigger) {
            (Self::Named(name), Trigger::Named(fired)) => name.as_str() == *fired,
            (Self::Named(name), Trigger::Event(event)) => name == event.kind.as_str(),
            (Self::Pattern(pattern), Trigger::Event(event)) => pattern.matches(event),
            (Self::Pattern(_), Trigger::Named(_)) => false,
        }
    }
}

/// Signature of player callbacks.
pub type Handler = Box<dyn FnMut(&Trigger<'_>, &PlayHandle)>;

struct Registration {
    id: CallbackId,
    target: CallbackTarget,
    handler: Handler,
}

/// The callbacks of one player, kept in registration order.
#[derive(Default)]
pub(crate) struct CallbackRegistry {
    next_id: u64,
    callbacks: Vec<Registration>,
}

impl CallbackRegistry {
    pub(crate) fn add(&mut self, target: CallbackTarget, handler: Handler) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.callbacks.push(Registration {
            id,
            target,
            handler,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: CallbackId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|c| c.id != id);
        self.callbacks.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// Runs every matching handler in registration order, returning how many ran.
    pub(crate) fn trigger(&mut self, trigger: &Trigger<'_>, handle: &PlayHandle) -> usize {
        let mut fired = 0;
        for callback in &mut self.callbacks {
            if callback.target.matches(trigger) {
                tracing::trace!(id = callback.id.0, ?trigger, "firing callback");
                (callback.handler)(trigger, handle);
                fired += 1;
            }
        }
        fired
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.callbacks.iter().map(|c| (c.id, &c.target)))
            .finish()
    }
}

#[test]
fn names_match_lifecycle_and_event_types() {
    let on = NoteEvent::note_on(0, 60, 0., 1);
    let note_on = CallbackTarget::from(EventType::NoteOn);
    assert!(note_on.matches(&Trigger::Event(&on)));
    assert!(note_on.matches(&Trigger::Named("noteOn")));
    assert!(!note_on.matches(&Trigger::Named("play")));

    let play = CallbackTarget::from(Lifecycle::Play);
    assert!(play.matches(&Trigger::Named("play")));
    assert!(!play.matches(&Trigger::Event(&on)));

    let pattern = CallbackTarget::from(Pattern::new());
    assert!(pattern.matches(&Trigger::Event(&on)));
    assert!(!pattern.matches(&Trigger::Named("play")));
}

#[test]
fn registry_fires_in_order_and_forgets_removed() {
    use std::{cell::RefCell, rc::Rc};
    let (tx, _rx) = crossbeam_channel::unbounded();
    let handle = PlayHandle::new(tx);
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut registry = CallbackRegistry::default();
    let ids: Vec<_> = (0..3)
        .map(|i| {
            let log = log.clone();
            let handler = move |_: &Trigger<'_>, _: &PlayHandle| log.borrow_mut().push(i);
            registry.add("tick".into(), Box::new(handler))
        })
        .collect();

    assert_eq!(registry.trigger(&Trigger::Named("tick"), &handle), 3);
    assert!(registry.remove(ids[1]));
    assert!(!registry.remove(ids[1]));
    registry.trigger(&Trigger::Named("tick"), &handle);
    assert_eq!(*log.borrow(), vec![0, 1, 2, 0, 2]);

    registry.clear();
    assert_eq!(registry.trigger(&Trigger::Named("tick"), &handle), 0);
}
