//! Event surface for entries and the manager.
//!
//! Both the manager and every `Easing` handle carry an [`Emitter`] and expose
//! it through [`Observable`]. Emission is synchronous; listeners may add or
//! remove animations (or listeners) while an event is being delivered.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::ids::{EntryId, ListenerId};
use crate::target::Target;

/// Lifecycle events emitted per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryEventKind {
    /// A tick was spent waiting
    Wait,
    /// The wait delay elapsed
    WaitEnd,
    /// Timelines were advanced
    Each,
    /// Playback turned around
    Reverse,
    /// A new traversal started
    Repeat,
    /// The entry finished normally
    Complete,
    /// The entry was removed without completing
    Remove,
}

impl EntryEventKind {
    pub const ALL: [EntryEventKind; 7] = [
        Self::Wait,
        Self::WaitEnd,
        Self::Each,
        Self::Reverse,
        Self::Repeat,
        Self::Complete,
        Self::Remove,
    ];

    /// Get the name of this event type
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wait => "wait",
            Self::WaitEnd => "wait-end",
            Self::Each => "each",
            Self::Reverse => "reverse",
            Self::Repeat => "repeat",
            Self::Complete => "complete",
            Self::Remove => "remove",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Terminal events end the entry.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Remove)
    }
}

impl fmt::Display for EntryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload delivered to entry listeners.
#[derive(Clone)]
pub struct EntryEvent {
    pub kind: EntryEventKind,
    pub entry: EntryId,
    /// Running time within the current traversal (ms); waited time for `wait`.
    pub elapsed: f64,
    /// The animated object, when it is still alive.
    pub target: Option<Target>,
}

impl fmt::Debug for EntryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryEvent")
            .field("kind", &self.kind)
            .field("entry", &self.entry)
            .field("elapsed", &self.elapsed)
            .field("has_target", &self.target.is_some())
            .finish()
    }
}

/// Aggregate events emitted by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManagerEventKind {
    /// One tick was distributed to all entries
    Each,
    /// The last entry finished; the manager is idle
    Complete,
}

impl ManagerEventKind {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Each => "each",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManagerEvent {
    pub kind: ManagerEventKind,
    /// The clamped delta of this tick (ms)
    pub elapsed: f64,
    /// Entries still active after pruning
    pub active: usize,
}

struct Slot<K, E> {
    id: ListenerId,
    kind: K,
    once: bool,
    callback: Rc<dyn Fn(&E)>,
}

/// Listener registry keyed by event kind.
pub struct Emitter<K, E> {
    slots: RefCell<Vec<Slot<K, E>>>,
    next_id: Cell<u64>,
}

impl<K: Copy + Eq, E> Emitter<K, E> {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    fn register(&self, kind: K, once: bool, callback: Rc<dyn Fn(&E)>) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.slots.borrow_mut().push(Slot {
            id,
            kind,
            once,
            callback,
        });
        id
    }

    pub fn on(&self, kind: K, callback: impl Fn(&E) + 'static) -> ListenerId {
        self.register(kind, false, Rc::new(callback))
    }

    pub fn once(&self, kind: K, callback: impl Fn(&E) + 'static) -> ListenerId {
        self.register(kind, true, Rc::new(callback))
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut slots = self.slots.borrow_mut();
        let before = slots.len();
        slots.retain(|slot| slot.id != id);
        slots.len() != before
    }

    pub fn clear(&self) {
        self.slots.borrow_mut().clear();
    }

    pub fn listener_count(&self, kind: K) -> usize {
        self.slots.borrow().iter().filter(|s| s.kind == kind).count()
    }

    /// Deliver `event` to every listener of `kind` registered right now.
    /// Listeners added during delivery first hear the next emission.
    pub(crate) fn emit(&self, kind: K, event: &E) {
        let callbacks = {
            let mut slots = self.slots.borrow_mut();
            let callbacks: Vec<Rc<dyn Fn(&E)>> = slots
                .iter()
                .filter(|s| s.kind == kind)
                .map(|s| s.callback.clone())
                .collect();
            slots.retain(|s| !(s.once && s.kind == kind));
            callbacks
        };
        for callback in callbacks {
            callback(event);
        }
    }
}

impl<K: Copy + Eq, E> Default for Emitter<K, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// The `{on, once, off}` capability.
pub trait Observable {
    type Kind: Copy + Eq;
    type Event;

    fn emitter(&self) -> &Emitter<Self::Kind, Self::Event>;

    fn on(&self, kind: Self::Kind, callback: impl Fn(&Self::Event) + 'static) -> ListenerId {
        self.emitter().on(kind, callback)
    }

    fn once(&self, kind: Self::Kind, callback: impl Fn(&Self::Event) + 'static) -> ListenerId {
        self.emitter().once(kind, callback)
    }

    fn off(&self, id: ListenerId) -> bool {
        self.emitter().off(id)
    }
}
