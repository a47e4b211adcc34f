//! Animation entries: the timelines of one `add` call on one object, plus
//! their shared timing and lifecycle.

use serde::{Deserialize, Serialize};

use crate::config::Repeat;
use crate::curve::Curve;
use crate::events::{EntryEvent, EntryEventKind};
use crate::ids::EntryId;
use crate::rng::Rng64;
use crate::target::{self, Target, TargetRef};
use crate::timeline::{Frame, ParameterTimeline};
use crate::Result;

/// Entry lifecycle.
///
/// `Waiting -> Running -> (Reversing <-> Running)* -> Complete`, with
/// `Removed` reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryState {
    Waiting,
    Running,
    Reversing,
    Complete,
    Removed,
}

impl EntryState {
    #[inline]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Complete | Self::Removed)
    }
}

/// Timing settings, resolved from options and manager defaults at creation.
#[derive(Debug, Clone)]
pub(crate) struct EntrySettings {
    /// `None` for continuous entries that only end on arrival or removal.
    pub duration: Option<f64>,
    pub curve: Curve,
    pub wait: f64,
    pub repeat: Repeat,
    pub reverse: bool,
    /// Continuous entries keep running after arriving.
    pub keep_alive: bool,
}

#[derive(Debug)]
pub(crate) struct AnimationEntry {
    id: EntryId,
    target: TargetRef,
    timelines: Vec<ParameterTimeline>,
    settings: EntrySettings,
    waited: f64,
    elapsed: f64,
    repeats_left: Repeat,
    reversed: bool,
    state: EntryState,
    rng: Rng64,
}

impl AnimationEntry {
    pub(crate) fn new(
        id: EntryId,
        target: &Target,
        timelines: Vec<ParameterTimeline>,
        settings: EntrySettings,
        rng: Rng64,
    ) -> Self {
        let state = if settings.wait > 0.0 {
            EntryState::Waiting
        } else {
            EntryState::Running
        };
        Self {
            id,
            target: TargetRef::new(target),
            timelines,
            repeats_left: settings.repeat,
            settings,
            waited: 0.0,
            elapsed: 0.0,
            reversed: false,
            state,
            rng,
        }
    }

    pub(crate) fn id(&self) -> EntryId {
        self.id
    }

    pub(crate) fn state(&self) -> EntryState {
        self.state
    }

    pub(crate) fn duration(&self) -> Option<f64> {
        self.settings.duration
    }

    /// Time into the current traversal (ms); for continuous entries, total run time.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub(crate) fn timelines(&self) -> &[ParameterTimeline] {
        &self.timelines
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub(crate) fn targets(&self, target: &Target) -> bool {
        self.target.is(target)
    }

    /// Live timelines count; zero once finished.
    pub(crate) fn count(&self) -> usize {
        if self.is_finished() {
            0
        } else {
            self.timelines.len()
        }
    }

    /// Drop timelines whose field or path matches any of `names`.
    /// Returns the number removed.
    pub(crate) fn remove_fields(&mut self, names: &[String]) -> usize {
        let before = self.timelines.len();
        self.timelines
            .retain(|timeline| !names.iter().any(|name| timeline.matches(name)));
        before - self.timelines.len()
    }

    /// Mark removed and build the `remove` event. `None` if already finished.
    pub(crate) fn remove(&mut self) -> Option<EntryEvent> {
        if self.is_finished() {
            return None;
        }
        self.state = EntryState::Removed;
        self.timelines.clear();
        log::debug!("{} removed", self.id);
        Some(self.event(EntryEventKind::Remove, self.elapsed, None))
    }

    /// Drop without emitting anything (manager teardown).
    pub(crate) fn discard(&mut self) {
        self.state = EntryState::Removed;
        self.timelines.clear();
    }

    fn event(&self, kind: EntryEventKind, elapsed: f64, target: Option<&Target>) -> EntryEvent {
        EntryEvent {
            kind,
            entry: self.id,
            elapsed,
            target: target.cloned().or_else(|| self.target.upgrade()),
        }
    }

    /// Advance by one clamped tick delta. Returns the events to deliver, in
    /// order. Accessor and curve failures propagate.
    pub(crate) fn advance(&mut self, dt: f64) -> Result<Vec<EntryEvent>> {
        let mut out = Vec::new();
        if self.is_finished() {
            return Ok(out);
        }

        let Some(target) = self.target.upgrade() else {
            log::debug!("{} lost its target", self.id);
            out.extend(self.remove());
            return Ok(out);
        };
        if self.timelines.is_empty() {
            out.extend(self.remove());
            return Ok(out);
        }

        let mut dt = dt;
        if self.state == EntryState::Waiting {
            self.waited += dt;
            out.push(self.event(EntryEventKind::Wait, self.waited, Some(&target)));
            if self.waited < self.settings.wait {
                return Ok(out);
            }
            dt = self.waited - self.settings.wait;
            self.state = EntryState::Running;
            out.push(self.event(EntryEventKind::WaitEnd, 0.0, Some(&target)));
            if dt <= 0.0 && self.settings.duration != Some(0.0) {
                return Ok(out);
            }
        }

        match self.settings.duration {
            Some(duration) => self.run_timed(&target, dt, duration, &mut out)?,
            None => self.run_continuous(&target, dt, &mut out)?,
        }
        Ok(out)
    }

    fn run_timed(
        &mut self,
        target: &Target,
        dt: f64,
        duration: f64,
        out: &mut Vec<EntryEvent>,
    ) -> Result<()> {
        self.elapsed = (self.elapsed + dt).clamp(0.0, duration);
        let fraction = if duration > 0.0 {
            self.settings.curve.apply(self.elapsed / duration)
        } else {
            1.0
        };
        self.apply(target, fraction, dt)?;
        out.push(self.event(EntryEventKind::Each, self.elapsed, Some(target)));

        if self.arrived() {
            return self.complete(target, out);
        }
        if self.elapsed < duration {
            return Ok(());
        }

        if self.settings.reverse && !self.reversed {
            self.flip();
            self.reversed = true;
            self.elapsed = 0.0;
            self.state = EntryState::Reversing;
            log::debug!("{} reversing", self.id);
            out.push(self.event(EntryEventKind::Reverse, duration, Some(target)));
        } else if self.repeats_left.take() {
            if self.reversed {
                self.flip();
                self.reversed = false;
            }
            self.elapsed = 0.0;
            self.state = EntryState::Running;
            log::debug!("{} repeating ({:?} left)", self.id, self.repeats_left);
            out.push(self.event(EntryEventKind::Repeat, duration, Some(target)));
        } else {
            self.complete(target, out)?;
        }
        Ok(())
    }

    fn run_continuous(&mut self, target: &Target, dt: f64, out: &mut Vec<EntryEvent>) -> Result<()> {
        self.elapsed += dt.max(0.0);
        self.apply(target, 1.0, dt)?;
        out.push(self.event(EntryEventKind::Each, self.elapsed, Some(target)));
        if self.arrived() {
            self.complete(target, out)?;
        }
        Ok(())
    }

    fn apply(&mut self, target: &Target, fraction: f64, dt: f64) -> Result<()> {
        let origin = if self.timelines.iter().any(ParameterTimeline::needs_origin) {
            Some(target::position(target)?)
        } else {
            None
        };
        let mut frame = Frame {
            fraction,
            dt,
            origin,
            rng: &mut self.rng,
        };
        for timeline in &mut self.timelines {
            timeline.apply(target, &mut frame)?;
        }
        Ok(())
    }

    /// Continuous entries without keep-alive finish once every steering
    /// timeline has reached its destination.
    fn arrived(&self) -> bool {
        !self.settings.keep_alive
            && self.timelines.iter().any(ParameterTimeline::is_continuous)
            && self
                .timelines
                .iter()
                .filter(|t| t.is_continuous())
                .all(ParameterTimeline::arrived)
    }

    fn flip(&mut self) {
        for timeline in &mut self.timelines {
            timeline.flip();
        }
    }

    fn complete(&mut self, target: &Target, out: &mut Vec<EntryEvent>) -> Result<()> {
        for timeline in &mut self.timelines {
            timeline.settle(target)?;
        }
        self.state = EntryState::Complete;
        log::debug!("{} complete", self.id);
        out.push(self.event(EntryEventKind::Complete, self.elapsed, Some(target)));
        Ok(())
    }
}
