//! The animation manager: owns the active entries, distributes clock ticks,
//! prunes finished entries, and exposes the add/remove/query API.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::clock::{ClockSource, FrameCallback, Subscription};
use crate::config::{EaseConfig, Repeat};
use crate::curve::{Curve, CurveRegistry, CurveSpec};
use crate::entry::{AnimationEntry, EntrySettings, EntryState};
use crate::events::{
    Emitter, EntryEvent, EntryEventKind, ManagerEvent, ManagerEventKind, Observable,
};
use crate::goal::GoalSpec;
use crate::ids::{EntryId, IdAllocator};
use crate::rng::Rng64;
use crate::target::{Destination, PropertyMap, Target};
use crate::timeline::{Axis, ParameterTimeline, Pursuit};
use crate::Result;

type EntryEmitter = Emitter<EntryEventKind, EntryEvent>;

/// Per-`add` options. Unset fields inherit the manager defaults at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EaseOptions {
    /// Duration (ms); `None` uses the manager default
    pub duration: Option<f64>,
    /// Curve; `None` uses the manager default
    pub curve: Option<CurveSpec>,
    /// Delay before the entry starts (ms)
    pub wait: f64,
    /// Extra traversals after the first
    pub repeat: Repeat,
    /// Play forward then backward before completing or repeating
    pub reverse: bool,
    /// Remove the same fields from existing entries on the same target first
    pub remove_existing: bool,
}

impl EaseOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_curve(mut self, curve: impl Into<CurveSpec>) -> Self {
        self.curve = Some(curve.into());
        self
    }

    pub fn with_wait(mut self, wait: f64) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_repeat(mut self, repeat: impl Into<Repeat>) -> Self {
        self.repeat = repeat.into();
        self
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_remove_existing(mut self, remove_existing: bool) -> Self {
        self.remove_existing = remove_existing;
        self
    }
}

/// Options for the continuous `target`/`face` entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuitOptions {
    pub wait: f64,
    /// Stop after this long (ms). `None` runs until removed or arrived.
    pub duration: Option<f64>,
    /// Keep steering after reaching the destination.
    pub keep_alive: bool,
}

impl Default for PursuitOptions {
    fn default() -> Self {
        Self {
            wait: 0.0,
            duration: None,
            keep_alive: true,
        }
    }
}

/// Which fields `remove_ease` drops. Names match a timeline's goal field or
/// its accessor path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldFilter {
    #[default]
    All,
    One(String),
    Many(Vec<String>),
}

impl FieldFilter {
    fn names(&self) -> &[String] {
        match self {
            Self::All => &[],
            Self::One(name) => std::slice::from_ref(name),
            Self::Many(names) => names,
        }
    }
}

impl From<&str> for FieldFilter {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for FieldFilter {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl From<&[&str]> for FieldFilter {
    fn from(names: &[&str]) -> Self {
        Self::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldFilter {
    fn from(names: [&str; N]) -> Self {
        Self::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Vec<String>> for FieldFilter {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

/// One object or a set of objects to animate.
pub trait IntoTargets {
    fn into_targets(self) -> Vec<Target>;
}

impl IntoTargets for &Target {
    fn into_targets(self) -> Vec<Target> {
        vec![self.clone()]
    }
}

impl IntoTargets for Target {
    fn into_targets(self) -> Vec<Target> {
        vec![self]
    }
}

impl IntoTargets for &[Target] {
    fn into_targets(self) -> Vec<Target> {
        self.to_vec()
    }
}

impl IntoTargets for &Vec<Target> {
    fn into_targets(self) -> Vec<Target> {
        self.clone()
    }
}

impl IntoTargets for Vec<Target> {
    fn into_targets(self) -> Vec<Target> {
        self
    }
}

impl<const N: usize> IntoTargets for [&Target; N] {
    fn into_targets(self) -> Vec<Target> {
        self.into_iter().cloned().collect()
    }
}

impl IntoTargets for &Rc<RefCell<PropertyMap>> {
    fn into_targets(self) -> Vec<Target> {
        let target: Target = self.clone();
        vec![target]
    }
}

#[derive(Clone)]
struct EntrySlot {
    entry: Rc<RefCell<AnimationEntry>>,
    events: Rc<EntryEmitter>,
}

/// Events collected under a borrow and delivered after it is released.
type PendingEvents = Vec<(Rc<EntryEmitter>, EntryEvent)>;

fn deliver(pending: PendingEvents) {
    for (events, event) in pending {
        events.emit(event.kind, &event);
    }
}

/// Handle returned by `add`/`target`/`face`/`shake`: one entry per object,
/// sharing one set of listeners.
#[derive(Clone)]
pub struct Easing {
    entries: Vec<Rc<RefCell<AnimationEntry>>>,
    events: Rc<EntryEmitter>,
}

impl Easing {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            events: Rc::new(EntryEmitter::new()),
        }
    }

    /// Live timelines across all entries.
    pub fn count(&self) -> usize {
        self.entries.iter().map(|e| e.borrow().count()).sum()
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(|e| e.borrow().id()).collect()
    }

    /// State of the first entry.
    pub fn state(&self) -> Option<EntryState> {
        self.entries.first().map(|e| e.borrow().state())
    }

    pub fn states(&self) -> Vec<EntryState> {
        self.entries.iter().map(|e| e.borrow().state()).collect()
    }

    /// Duration of the first entry; `None` for continuous entries.
    pub fn duration(&self) -> Option<f64> {
        self.entries.first().and_then(|e| e.borrow().duration())
    }

    /// Elapsed time of the first entry.
    pub fn elapsed(&self) -> Option<f64> {
        self.entries.first().map(|e| e.borrow().elapsed())
    }

    /// Accessor paths still animated, across all entries.
    pub fn paths(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|e| {
                let entry = e.borrow();
                if entry.is_finished() {
                    Vec::new()
                } else {
                    entry.timelines().iter().map(|t| t.path().to_string()).collect()
                }
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once every entry completed or was removed.
    pub fn is_finished(&self) -> bool {
        self.entries.iter().all(|e| e.borrow().is_finished())
    }

    /// Remove every entry of this handle, emitting `remove` for each live one.
    pub fn cancel(&self) {
        let pending: PendingEvents = self
            .entries
            .iter()
            .filter_map(|e| e.borrow_mut().remove())
            .map(|event| (self.events.clone(), event))
            .collect();
        deliver(pending);
    }
}

impl Observable for Easing {
    type Kind = EntryEventKind;
    type Event = EntryEvent;

    fn emitter(&self) -> &EntryEmitter {
        &self.events
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Easing")
            .field("ids", &self.ids())
            .field("states", &self.states())
            .finish()
    }
}

struct EaseState {
    config: EaseConfig,
    curves: CurveRegistry,
    entries: Vec<EntrySlot>,
    ids: IdAllocator,
    rng: Rng64,
    clock: ClockSource,
    subscription: Option<Subscription>,
    destroyed: bool,
}

impl EaseState {
    fn remove_matching(&mut self, target: Option<&Target>, filter: &FieldFilter) -> PendingEvents {
        let mut pending = Vec::new();
        for slot in &self.entries {
            let mut entry = slot.entry.borrow_mut();
            if entry.is_finished() {
                continue;
            }
            if let Some(target) = target {
                if !entry.targets(target) {
                    continue;
                }
            }
            let emptied = match filter {
                FieldFilter::All => true,
                _ => entry.remove_fields(filter.names()) > 0 && entry.count() == 0,
            };
            if emptied {
                pending.extend(entry.remove().map(|event| (slot.events.clone(), event)));
            }
        }
        pending
    }

    fn live(&self) -> impl Iterator<Item = &EntrySlot> {
        self.entries.iter().filter(|s| !s.entry.borrow().is_finished())
    }
}

struct Shared {
    state: RefCell<EaseState>,
    events: Emitter<ManagerEventKind, ManagerEvent>,
}

/// The animation manager.
///
/// Cloning yields another handle to the same manager.
#[derive(Clone)]
pub struct Ease {
    shared: Rc<Shared>,
}

impl Default for Ease {
    fn default() -> Self {
        Self::build(EaseConfig::default(), ClockSource::default())
    }
}

impl Ease {
    /// Manager ticking from the per-thread animation-frame source (or not at
    /// all when `use_clock_source` is off).
    pub fn new(config: EaseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, ClockSource::default()))
    }

    /// Manager ticking from a caller-supplied clock.
    pub fn with_clock(config: EaseConfig, clock: impl Into<ClockSource>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, clock.into()))
    }

    fn build(config: EaseConfig, clock: ClockSource) -> Self {
        let clock = if config.use_clock_source {
            clock
        } else {
            ClockSource::Manual
        };
        let rng = Rng64::new(config.seed);
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(EaseState {
                    config,
                    curves: CurveRegistry::new(),
                    entries: Vec::new(),
                    ids: IdAllocator::new(),
                    rng,
                    clock,
                    subscription: None,
                    destroyed: false,
                }),
                events: Emitter::new(),
            }),
        }
    }

    /// Animate `targets` toward `goal`.
    ///
    /// An empty target set, an empty goal, or a destroyed manager yields an
    /// empty handle. Start values are captured now; an unreadable field
    /// fails the whole call before anything is added.
    pub fn add(
        &self,
        targets: impl IntoTargets,
        goal: &GoalSpec,
        options: &EaseOptions,
    ) -> Result<Easing> {
        let targets = targets.into_targets();
        if targets.is_empty() || self.rejects_mutation("add") {
            return Ok(Easing::empty());
        }
        let plans = goal.expand()?;
        if plans.is_empty() {
            return Ok(Easing::empty());
        }

        let settings = {
            let state = self.shared.state.borrow();
            let spec = options.curve.as_ref().unwrap_or(&state.config.curve);
            EntrySettings {
                duration: Some(options.duration.unwrap_or(state.config.duration).max(0.0)),
                curve: state.curves.resolve(spec),
                wait: options.wait.max(0.0),
                repeat: options.repeat,
                reverse: options.reverse,
                keep_alive: true,
            }
        };
        let replace = options.remove_existing.then(|| {
            FieldFilter::Many(plans.iter().map(|plan| plan.path.clone()).collect())
        });

        self.spawn(
            targets,
            |target| {
                plans
                    .iter()
                    .map(|plan| ParameterTimeline::capture(plan, target))
                    .collect()
            },
            settings,
            replace,
        )
    }

    /// Move `object` toward `destination` at `speed` units per ms.
    pub fn target(
        &self,
        object: &Target,
        destination: impl Into<Destination>,
        speed: f64,
        options: &PursuitOptions,
    ) -> Result<Easing> {
        if self.rejects_mutation("target") {
            return Ok(Easing::empty());
        }
        let pursuit = Pursuit {
            destination: destination.into(),
            speed: speed.abs(),
        };
        self.spawn(
            vec![object.clone()],
            |target| {
                Ok(vec![
                    ParameterTimeline::pursuit(Axis::X, pursuit.clone(), target)?,
                    ParameterTimeline::pursuit(Axis::Y, pursuit.clone(), target)?,
                ])
            },
            self.pursuit_settings(options),
            None,
        )
    }

    /// Rotate `object` toward `destination` at `turn_rate` radians per ms.
    pub fn face(
        &self,
        object: &Target,
        destination: impl Into<Destination>,
        turn_rate: f64,
        options: &PursuitOptions,
    ) -> Result<Easing> {
        if self.rejects_mutation("face") {
            return Ok(Easing::empty());
        }
        let destination = destination.into();
        self.spawn(
            vec![object.clone()],
            |target| {
                Ok(vec![ParameterTimeline::turn(
                    destination.clone(),
                    turn_rate.abs(),
                    target,
                )?])
            },
            self.pursuit_settings(options),
            None,
        )
    }

    /// Jitter `x`/`y` by up to `magnitude` for the entry's duration.
    pub fn shake(
        &self,
        targets: impl IntoTargets,
        magnitude: f64,
        options: &EaseOptions,
    ) -> Result<Easing> {
        self.add(targets, &GoalSpec::new().shake(magnitude), options)
    }

    fn pursuit_settings(&self, options: &PursuitOptions) -> EntrySettings {
        EntrySettings {
            duration: options.duration.map(|d| d.max(0.0)),
            curve: Curve::linear(),
            wait: options.wait.max(0.0),
            repeat: Repeat::Count(0),
            reverse: false,
            keep_alive: options.keep_alive,
        }
    }

    fn spawn(
        &self,
        targets: Vec<Target>,
        build: impl Fn(&Target) -> Result<Vec<ParameterTimeline>>,
        settings: EntrySettings,
        replace: Option<FieldFilter>,
    ) -> Result<Easing> {
        let built = targets
            .into_iter()
            .map(|target| build(&target).map(|timelines| (target, timelines)))
            .collect::<Result<Vec<_>>>()?;

        let events = Rc::new(EntryEmitter::new());
        let mut entries = Vec::with_capacity(built.len());
        let mut pending = Vec::new();
        {
            let mut state = self.shared.state.borrow_mut();
            for (target, timelines) in built {
                if let Some(filter) = &replace {
                    pending.extend(state.remove_matching(Some(&target), filter));
                }
                let id = state.ids.alloc_entry();
                let rng = state.rng.fork();
                let entry = AnimationEntry::new(id, &target, timelines, settings.clone(), rng);
                log::debug!(
                    "{id} created: {} timeline(s), duration {:?}, wait {}",
                    entry.count(),
                    settings.duration,
                    settings.wait
                );
                let entry = Rc::new(RefCell::new(entry));
                state.entries.push(EntrySlot {
                    entry: entry.clone(),
                    events: events.clone(),
                });
                entries.push(entry);
            }
            self.ensure_ticking(&mut state);
        }
        deliver(pending);
        Ok(Easing { entries, events })
    }

    fn ensure_ticking(&self, state: &mut EaseState) {
        if state.subscription.is_some() || state.entries.is_empty() {
            return;
        }
        let weak = Rc::downgrade(&self.shared);
        let callback: FrameCallback = Rc::new(move |delta| match weak.upgrade() {
            Some(shared) => Ease { shared }.update(delta),
            None => Ok(()),
        });
        state.subscription = Some(state.clock.subscribe(callback));
    }

    fn rejects_mutation(&self, op: &str) -> bool {
        let destroyed = self.shared.state.borrow().destroyed;
        if destroyed {
            log::warn!("{op} called on a destroyed manager; ignoring");
        }
        destroyed
    }

    /// Advance every entry by `elapsed` ms, clamped to `[0, max_frame]`.
    ///
    /// Entries added during this tick start on the next one; entries removed
    /// during this tick are skipped if not yet processed. Accessor failures
    /// propagate.
    pub fn update(&self, elapsed: f64) -> Result<()> {
        let (delta, slots) = {
            let state = self.shared.state.borrow();
            if state.destroyed {
                return Ok(());
            }
            (clamp_delta(elapsed, state.config.max_frame), state.entries.clone())
        };
        if slots.is_empty() {
            return Ok(());
        }

        for slot in &slots {
            let events = slot.entry.borrow_mut().advance(delta)?;
            for event in &events {
                slot.events.emit(event.kind, event);
            }
        }

        let (active, idle) = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return Ok(());
            }
            let before = state.entries.len();
            state.entries.retain(|slot| !slot.entry.borrow().is_finished());
            if state.entries.len() != before {
                log::debug!("pruned {} entries", before - state.entries.len());
            }
            let active = state.entries.len();
            let idle = if active == 0 {
                state.subscription.take()
            } else {
                None
            };
            (active, idle)
        };
        if idle.is_some() {
            log::debug!("manager idle; clock unsubscribed");
        }
        drop(idle);

        self.shared.events.emit(
            ManagerEventKind::Each,
            &ManagerEvent {
                kind: ManagerEventKind::Each,
                elapsed: delta,
                active,
            },
        );
        if active == 0 && self.shared.state.borrow().entries.is_empty() {
            self.shared.events.emit(
                ManagerEventKind::Complete,
                &ManagerEvent {
                    kind: ManagerEventKind::Complete,
                    elapsed: delta,
                    active: 0,
                },
            );
        }
        Ok(())
    }

    /// Remove matching timelines from every entry on `target` (or from all
    /// entries when `target` is `None`). Entries left empty are removed and
    /// emit `remove`. Unknown fields are ignored.
    pub fn remove_ease(&self, target: Option<&Target>, fields: impl Into<FieldFilter>) {
        let pending = self
            .shared
            .state
            .borrow_mut()
            .remove_matching(target, &fields.into());
        deliver(pending);
    }

    /// Remove every entry, emitting `remove` (never `complete`) for each.
    pub fn remove_all(&self) {
        let (pending, subscription) = {
            let mut state = self.shared.state.borrow_mut();
            let pending = state.remove_matching(None, &FieldFilter::All);
            state.entries.clear();
            (pending, state.subscription.take())
        };
        drop(subscription);
        deliver(pending);
    }

    /// Tear down: unsubscribe, drop every entry without emitting, detach
    /// manager listeners, and ignore further mutation.
    pub fn destroy(&self) {
        let subscription = {
            let mut state = self.shared.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            for slot in state.entries.drain(..) {
                slot.entry.borrow_mut().discard();
            }
            state.subscription.take()
        };
        drop(subscription);
        self.shared.events.clear();
        log::debug!("manager destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.state.borrow().destroyed
    }

    /// Entries not yet finished, waiting or running.
    pub fn count(&self) -> usize {
        self.shared.state.borrow().live().count()
    }

    /// Entries not yet finished and past their wait.
    pub fn count_running(&self) -> usize {
        self.shared
            .state
            .borrow()
            .live()
            .filter(|slot| slot.entry.borrow().state() != EntryState::Waiting)
            .count()
    }

    /// True while a clock subscription is held.
    pub fn is_ticking(&self) -> bool {
        self.shared.state.borrow().subscription.is_some()
    }

    pub fn config(&self) -> EaseConfig {
        self.shared.state.borrow().config.clone()
    }

    pub fn duration(&self) -> f64 {
        self.shared.state.borrow().config.duration
    }

    /// Default duration for entries created from now on.
    pub fn set_duration(&self, duration: f64) {
        self.shared.state.borrow_mut().config.duration = duration.max(0.0);
    }

    pub fn curve(&self) -> CurveSpec {
        self.shared.state.borrow().config.curve.clone()
    }

    /// Default curve for entries created from now on.
    pub fn set_curve(&self, curve: impl Into<CurveSpec>) {
        self.shared.state.borrow_mut().config.curve = curve.into();
    }

    pub fn max_frame(&self) -> f64 {
        self.shared.state.borrow().config.max_frame
    }

    /// Per-tick delta ceiling. Non-positive values are ignored.
    pub fn set_max_frame(&self, max_frame: f64) {
        if max_frame > 0.0 {
            self.shared.state.borrow_mut().config.max_frame = max_frame;
        } else {
            log::warn!("ignoring non-positive max_frame {max_frame}");
        }
    }

    /// Register a named curve for this manager.
    pub fn register_curve(&self, name: &str, func: impl Fn(f64) -> f64 + 'static) {
        self.shared
            .state
            .borrow_mut()
            .curves
            .register(Curve::new(name, func));
    }

    pub fn curve_names(&self) -> Vec<String> {
        let state = self.shared.state.borrow();
        let mut names: Vec<String> = state.curves.names().into_iter().map(String::from).collect();
        names.sort();
        names
    }
}

impl Observable for Ease {
    type Kind = ManagerEventKind;
    type Event = ManagerEvent;

    fn emitter(&self) -> &Emitter<ManagerEventKind, ManagerEvent> {
        &self.shared.events
    }
}

impl fmt::Debug for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("Ease")
            .field("entries", &state.entries.len())
            .field("clock", &state.clock)
            .field("destroyed", &state.destroyed)
            .finish()
    }
}

fn clamp_delta(elapsed: f64, max_frame: f64) -> f64 {
    if !elapsed.is_finite() {
        log::warn!("non-finite tick delta {elapsed}; treating as 0");
        return 0.0;
    }
    let delta = elapsed.clamp(0.0, max_frame);
    if delta != elapsed {
        log::trace!("tick delta {elapsed} clamped to {delta}");
    }
    delta
}
