//! Vizij Ease Core (engine-agnostic)
//!
//! Frame-driven property tweening: animate numeric fields of caller-owned
//! objects toward goals over time, with pluggable curves, per-field rules
//! (scalar, vector component, angular, color, randomized offset), and a
//! wait → run → reverse/repeat → complete lifecycle driven by a push-based
//! frame clock.
//!
//! ```
//! use vizij_ease_core::{Ease, EaseConfig, EaseOptions, GoalSpec, PropertyMap};
//!
//! let ease = Ease::new(EaseConfig::default().without_clock_source()).unwrap();
//! let sprite = PropertyMap::new().with("x", 0.0).shared();
//! ease.add(
//!     &sprite,
//!     &GoalSpec::new().number("x", 10.0),
//!     &EaseOptions::default().with_duration(100.0).with_curve("linear"),
//! )
//! .unwrap();
//! for _ in 0..10 {
//!     ease.update(10.0).unwrap();
//! }
//! assert_eq!(sprite.borrow().value("x"), Some(10.0));
//! ```

pub mod clock;
pub mod color;
pub mod config;
pub mod curve;
pub mod entry;
pub mod error;
pub mod events;
pub mod global;
pub mod goal;
pub mod ids;
pub mod manager;
pub mod rng;
pub mod target;
pub mod timeline;

pub type Result<T> = core::result::Result<T, EaseError>;

// Re-exports for consumers (adapters)
pub use clock::{AnimationFrames, ClockSource, FrameCallback, SharedTicker, Subscription, Ticker};
pub use config::{EaseConfig, Repeat};
pub use curve::{Curve, CurveRegistry, CurveSpec};
pub use entry::EntryState;
pub use error::EaseError;
pub use events::{
    Emitter, EntryEvent, EntryEventKind, ManagerEvent, ManagerEventKind, Observable,
};
pub use global::{default_ease, destroy_default, init_default};
pub use goal::{Goal, GoalSpec};
pub use ids::{EntryId, ListenerId};
pub use manager::{Ease, Easing, EaseOptions, FieldFilter, IntoTargets, PursuitOptions};
pub use target::{target, Animatable, Destination, PropertyMap, Target};
pub use timeline::{Axis, ColorMode, ParameterTimeline, TimelineKind};
