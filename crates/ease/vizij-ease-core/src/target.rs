//! Accessor layer: the objects being animated.
//!
//! The engine never owns a target. Entries keep a [`TargetRef`] (a weak
//! reference) and poll it every tick; a dropped target and a target whose
//! sentinel reports destroyed are both treated as target loss.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use hashbrown::HashMap;

use crate::error::EaseError;
use crate::Result;

/// A caller-managed object exposing numeric fields by dotted path
/// (`x`, `scale.x`, `tint`, ...).
pub trait Animatable {
    /// Read a field. `None` when the path does not exist.
    fn get(&self, path: &str) -> Option<f64>;

    /// Write a field. Returns false when the write is refused.
    fn set(&mut self, path: &str, value: f64) -> bool;

    /// External destruction sentinel, polled every tick.
    fn is_destroyed(&self) -> bool {
        false
    }
}

/// Shared handle to an animatable object.
pub type Target = Rc<RefCell<dyn Animatable>>;

/// Wrap any [`Animatable`] into a shared [`Target`].
pub fn target<T: Animatable + 'static>(value: T) -> Target {
    Rc::new(RefCell::new(value))
}

/// Bundled [`Animatable`]: a flat map of dotted paths to numbers.
///
/// Writes to paths that were never inserted are refused, mirroring a plain
/// object whose shape is fixed by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    values: HashMap<String, f64>,
    destroyed: bool,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, path: impl Into<String>, value: f64) -> Self {
        self.values.insert(path.into(), value);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(path.into(), value)
    }

    pub fn value(&self, path: &str) -> Option<f64> {
        self.values.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raise the destruction sentinel.
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    /// Move into a shared handle, keeping the concrete type.
    pub fn shared(self) -> Rc<RefCell<PropertyMap>> {
        Rc::new(RefCell::new(self))
    }
}

impl Animatable for PropertyMap {
    fn get(&self, path: &str) -> Option<f64> {
        self.values.get(path).copied()
    }

    fn set(&mut self, path: &str, value: f64) -> bool {
        match self.values.get_mut(path) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Read one field, surfacing a missing path (or a target that is mutably
/// borrowed elsewhere) as `PropertyNotFound`.
pub(crate) fn read(target: &Target, path: &str) -> Result<f64> {
    target
        .try_borrow()
        .ok()
        .and_then(|t| t.get(path))
        .ok_or_else(|| EaseError::not_found(path))
}

/// Write one field, surfacing a refusal as `PropertyWriteRejected`.
pub(crate) fn write(target: &Target, path: &str, value: f64) -> Result<()> {
    let accepted = match target.try_borrow_mut() {
        Ok(mut t) => t.set(path, value),
        Err(_) => false,
    };
    if accepted {
        Ok(())
    } else {
        Err(EaseError::rejected(path))
    }
}

/// Position of an object, read from its `x` and `y` fields.
pub(crate) fn position(target: &Target) -> Result<(f64, f64)> {
    Ok((read(target, "x")?, read(target, "y")?))
}

fn is_alive(target: &Target) -> bool {
    // A target borrowed elsewhere right now is still alive.
    target.try_borrow().map(|t| !t.is_destroyed()).unwrap_or(true)
}

/// Non-owning reference held by entries.
#[derive(Clone)]
pub(crate) struct TargetRef {
    weak: Weak<RefCell<dyn Animatable>>,
}

impl TargetRef {
    pub(crate) fn new(target: &Target) -> Self {
        Self {
            weak: Rc::downgrade(target),
        }
    }

    /// The target, if it was neither dropped nor destroyed.
    pub(crate) fn upgrade(&self) -> Option<Target> {
        self.weak.upgrade().filter(is_alive)
    }

    /// Identity comparison against a strong handle.
    pub(crate) fn is(&self, target: &Target) -> bool {
        Weak::as_ptr(&self.weak) as *const () == Rc::as_ptr(target) as *const ()
    }
}

impl fmt::Debug for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetRef({:p})", Weak::as_ptr(&self.weak) as *const ())
    }
}

/// Where a `face`/`target` entry is heading.
#[derive(Clone)]
pub enum Destination {
    /// Another object, followed live through its `x`/`y` fields.
    Object(Weak<RefCell<dyn Animatable>>),
    /// A fixed point.
    Point { x: f64, y: f64 },
}

impl Destination {
    pub fn object(target: &Target) -> Self {
        Self::Object(Rc::downgrade(target))
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self::Point { x, y }
    }

    /// Current position, or `None` once a followed object is gone.
    pub(crate) fn position(&self) -> Result<Option<(f64, f64)>> {
        match self {
            Self::Point { x, y } => Ok(Some((*x, *y))),
            Self::Object(weak) => match weak.upgrade().filter(is_alive) {
                Some(target) => position(&target).map(Some),
                None => Ok(None),
            },
        }
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(weak) => write!(f, "Destination::Object({:p})", weak.as_ptr() as *const ()),
            Self::Point { x, y } => write!(f, "Destination::Point({x}, {y})"),
        }
    }
}

impl From<&Target> for Destination {
    fn from(target: &Target) -> Self {
        Self::object(target)
    }
}

impl From<(f64, f64)> for Destination {
    fn from((x, y): (f64, f64)) -> Self {
        Self::point(x, y)
    }
}
