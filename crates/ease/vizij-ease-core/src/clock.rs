//! Frame clock adapters.
//!
//! The manager only needs `subscribe(callback(delta_ms)) -> Subscription`.
//! Two push sources are supported and behave identically from the manager's
//! point of view:
//!
//! - a [`Ticker`]: a render-loop scheduler with `add`/`remove` that already
//!   reports per-frame deltas ([`SharedTicker`] is the bundled one);
//! - [`AnimationFrames`]: a "request next frame" primitive that reports
//!   timestamps, converted to deltas here.
//!
//! Errors returned by the frame callback (accessor failures inside a tick)
//! propagate out of `SharedTicker::tick` / `AnimationFrames::run_frame`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::Result;

/// Receives the raw elapsed delta (ms) for one frame.
pub type FrameCallback = Rc<dyn Fn(f64) -> Result<()>>;

/// One-shot frame request, receiving the frame timestamp (ms).
pub type FrameRequest = Box<dyn FnOnce(f64) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickerToken(pub u64);

/// A scheduler that calls registered callbacks once per frame with the
/// frame's delta.
pub trait Ticker {
    fn add(&self, callback: FrameCallback) -> TickerToken;
    fn remove(&self, token: TickerToken);
}

/// Bundled [`Ticker`], pumped by the host (or a test) via [`SharedTicker::tick`].
#[derive(Default)]
pub struct SharedTicker {
    callbacks: RefCell<Vec<(TickerToken, FrameCallback)>>,
    next: Cell<u64>,
}

impl SharedTicker {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Deliver one frame. Callbacks removed during delivery are skipped;
    /// callbacks added during delivery first run on the next frame.
    pub fn tick(&self, delta: f64) -> Result<()> {
        let snapshot: Vec<(TickerToken, FrameCallback)> = self.callbacks.borrow().clone();
        for (token, callback) in snapshot {
            if self.contains(token) {
                callback(delta)?;
            }
        }
        Ok(())
    }

    pub fn contains(&self, token: TickerToken) -> bool {
        self.callbacks.borrow().iter().any(|(t, _)| *t == token)
    }

    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }
}

impl Ticker for SharedTicker {
    fn add(&self, callback: FrameCallback) -> TickerToken {
        let token = TickerToken(self.next.get());
        self.next.set(token.0 + 1);
        self.callbacks.borrow_mut().push((token, callback));
        token
    }

    fn remove(&self, token: TickerToken) {
        self.callbacks.borrow_mut().retain(|(t, _)| *t != token);
    }
}

/// A "request next frame" primitive.
///
/// Requests made while a frame is running are queued for the next frame.
#[derive(Default)]
pub struct AnimationFrames {
    pending: RefCell<Vec<(u64, FrameRequest)>>,
    next: Cell<u64>,
    now: Cell<f64>,
}

thread_local! {
    static FRAMES: Rc<AnimationFrames> = Rc::new(AnimationFrames::default());
}

impl AnimationFrames {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// The per-thread platform instance, used when no other source is given.
    pub fn shared() -> Rc<Self> {
        FRAMES.with(Rc::clone)
    }

    pub fn request(&self, callback: FrameRequest) -> u64 {
        let handle = self.next.get();
        self.next.set(handle + 1);
        self.pending.borrow_mut().push((handle, callback));
        handle
    }

    pub fn cancel(&self, handle: u64) -> bool {
        let mut pending = self.pending.borrow_mut();
        let before = pending.len();
        pending.retain(|(h, _)| *h != handle);
        pending.len() != before
    }

    /// Timestamp of the most recent frame.
    pub fn now(&self) -> f64 {
        self.now.get()
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Run every request queued before this frame. On error, the requests
    /// that did not run stay queued.
    pub fn run_frame(&self, timestamp: f64) -> Result<()> {
        self.now.set(timestamp);
        let batch = std::mem::take(&mut *self.pending.borrow_mut());
        let mut batch = batch.into_iter();
        while let Some((_, callback)) = batch.next() {
            if let Err(err) = callback(timestamp) {
                let mut rest: Vec<_> = batch.collect();
                let mut pending = self.pending.borrow_mut();
                rest.append(&mut pending);
                *pending = rest;
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Where a manager's frames come from.
#[derive(Clone)]
pub enum ClockSource {
    Ticker(Rc<dyn Ticker>),
    AnimationFrame(Rc<AnimationFrames>),
    /// No automatic ticking; call `Ease::update` yourself.
    Manual,
}

impl Default for ClockSource {
    fn default() -> Self {
        ClockSource::AnimationFrame(AnimationFrames::shared())
    }
}

impl fmt::Debug for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ticker(_) => "ClockSource::Ticker",
            Self::AnimationFrame(_) => "ClockSource::AnimationFrame",
            Self::Manual => "ClockSource::Manual",
        })
    }
}

impl From<Rc<SharedTicker>> for ClockSource {
    fn from(ticker: Rc<SharedTicker>) -> Self {
        ClockSource::Ticker(ticker)
    }
}

impl From<Rc<AnimationFrames>> for ClockSource {
    fn from(frames: Rc<AnimationFrames>) -> Self {
        ClockSource::AnimationFrame(frames)
    }
}

/// Converts animation-frame timestamps into deltas and keeps re-requesting.
struct FrameLoop {
    frames: Rc<AnimationFrames>,
    callback: FrameCallback,
    last: Cell<f64>,
    handle: Cell<Option<u64>>,
    active: Cell<bool>,
}

impl FrameLoop {
    fn start(frames: Rc<AnimationFrames>, callback: FrameCallback) -> Rc<Self> {
        let looped = Rc::new(Self {
            last: Cell::new(frames.now()),
            frames,
            callback,
            handle: Cell::new(None),
            active: Cell::new(true),
        });
        looped.schedule();
        looped
    }

    fn schedule(self: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(self);
        let handle = self.frames.request(Box::new(move |timestamp| match weak.upgrade() {
            Some(looped) => looped.on_frame(timestamp),
            None => Ok(()),
        }));
        self.handle.set(Some(handle));
    }

    fn on_frame(self: &Rc<Self>, timestamp: f64) -> Result<()> {
        self.handle.set(None);
        if !self.active.get() {
            return Ok(());
        }
        let delta = timestamp - self.last.replace(timestamp);
        self.schedule();
        (self.callback)(delta)
    }

    fn stop(&self) {
        self.active.set(false);
        if let Some(handle) = self.handle.take() {
            self.frames.cancel(handle);
        }
    }
}

/// Live clock registration. Dropping it unsubscribes.
pub struct Subscription {
    inner: SubscriptionInner,
}

enum SubscriptionInner {
    Ticker {
        ticker: Rc<dyn Ticker>,
        token: TickerToken,
    },
    Frames(Rc<FrameLoop>),
    Manual,
}

impl Subscription {
    /// True when frames are actually delivered.
    pub fn is_live(&self) -> bool {
        !matches!(self.inner, SubscriptionInner::Manual)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        match &self.inner {
            SubscriptionInner::Ticker { ticker, token } => ticker.remove(*token),
            SubscriptionInner::Frames(looped) => looped.stop(),
            SubscriptionInner::Manual => {}
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match &self.inner {
            SubscriptionInner::Ticker { .. } => "Subscription::Ticker",
            SubscriptionInner::Frames(_) => "Subscription::Frames",
            SubscriptionInner::Manual => "Subscription::Manual",
        })
    }
}

impl ClockSource {
    /// Start delivering frame deltas to `callback`.
    pub fn subscribe(&self, callback: FrameCallback) -> Subscription {
        let inner = match self {
            Self::Ticker(ticker) => SubscriptionInner::Ticker {
                token: ticker.add(callback),
                ticker: ticker.clone(),
            },
            Self::AnimationFrame(frames) => {
                SubscriptionInner::Frames(FrameLoop::start(frames.clone(), callback))
            }
            Self::Manual => SubscriptionInner::Manual,
        };
        log::debug!("clock subscribed ({self:?})");
        Subscription { inner }
    }
}
