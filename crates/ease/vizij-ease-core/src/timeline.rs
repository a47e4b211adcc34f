//! Parameter timelines: one animated field each.
//!
//! `TimelineKind` is a closed set; `ParameterTimeline::evaluate` has one arm
//! per kind. Timed kinds are pure functions of `(start, goal, fraction)`;
//! nothing is accumulated from the previous tick. The continuous kinds
//! (pursuit and turn-rate facing) step from their last value by `rate * dt`.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::color;
use crate::goal::{FieldPlan, PlanRule};
use crate::rng::Rng64;
use crate::target::{self, Destination, Target};
use crate::Result;

/// Component of a 2-D field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    #[inline]
    fn pick(self, (x, y): (f64, f64)) -> f64 {
        match self {
            Axis::X => x,
            Axis::Y => y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    /// Channel-wise interpolation across `len - 1` segments.
    Blend,
    /// Hold each color for `duration / len`.
    Cycle,
}

/// Straight-line movement toward a destination at a fixed speed (units/ms).
#[derive(Debug, Clone)]
pub struct Pursuit {
    pub destination: Destination,
    pub speed: f64,
}

#[derive(Debug, Clone)]
pub enum TimelineKind {
    Scalar,
    VectorComponent {
        axis: Axis,
        pursuit: Option<Pursuit>,
    },
    AngularDynamic {
        toward: Destination,
        /// Radians per ms. `None` means the entry's curve drives the turn.
        turn_rate: Option<f64>,
        /// Set while reversed: the goal stops tracking the destination.
        frozen: bool,
    },
    ColorChannel {
        colors: Vec<u32>,
        mode: ColorMode,
    },
    RandomizedOffset {
        magnitude: f64,
    },
}

/// Per-tick inputs shared by every timeline of one entry.
pub(crate) struct Frame<'a> {
    pub fraction: f64,
    pub dt: f64,
    /// Object position at the start of the tick, for kinds that steer.
    pub origin: Option<(f64, f64)>,
    pub rng: &'a mut Rng64,
}

#[derive(Debug, Clone)]
pub struct ParameterTimeline {
    field: String,
    path: String,
    kind: TimelineKind,
    start: f64,
    goal: f64,
    current: f64,
}

impl ParameterTimeline {
    /// Build from a goal plan, capturing the start value from the target.
    pub(crate) fn capture(plan: &FieldPlan, target: &Target) -> Result<Self> {
        let start = target::read(target, &plan.path)?;
        let (kind, start, goal) = match &plan.rule {
            PlanRule::Scalar(goal) => (TimelineKind::Scalar, start, *goal),
            PlanRule::Component { axis, goal } => (
                TimelineKind::VectorComponent {
                    axis: *axis,
                    pursuit: None,
                },
                start,
                *goal,
            ),
            PlanRule::Blend(goals) => {
                let mut colors = Vec::with_capacity(goals.len() + 1);
                colors.push(color::from_value(start));
                colors.extend_from_slice(goals);
                color_kind(colors, ColorMode::Blend)
            }
            PlanRule::Cycle(colors) => color_kind(colors.clone(), ColorMode::Cycle),
            PlanRule::Face(toward) => (
                TimelineKind::AngularDynamic {
                    toward: toward.clone(),
                    turn_rate: None,
                    frozen: false,
                },
                start,
                start,
            ),
            PlanRule::Shake(magnitude) => (
                TimelineKind::RandomizedOffset {
                    magnitude: *magnitude,
                },
                start,
                start,
            ),
        };
        Ok(Self {
            field: plan.field.clone(),
            path: plan.path.clone(),
            kind,
            start,
            goal,
            current: start,
        })
    }

    /// Continuous straight-line movement of one position component.
    pub(crate) fn pursuit(axis: Axis, pursuit: Pursuit, target: &Target) -> Result<Self> {
        let path = match axis {
            Axis::X => "x",
            Axis::Y => "y",
        };
        let start = target::read(target, path)?;
        Ok(Self {
            field: "target".to_string(),
            path: path.to_string(),
            kind: TimelineKind::VectorComponent {
                axis,
                pursuit: Some(pursuit),
            },
            start,
            goal: start,
            current: start,
        })
    }

    /// Continuous rotation toward a destination at `turn_rate` rad/ms.
    pub(crate) fn turn(toward: Destination, turn_rate: f64, target: &Target) -> Result<Self> {
        let start = target::read(target, "rotation")?;
        Ok(Self {
            field: "face".to_string(),
            path: "rotation".to_string(),
            kind: TimelineKind::AngularDynamic {
                toward,
                turn_rate: Some(turn_rate),
                frozen: false,
            },
            start,
            goal: start,
            current: start,
        })
    }

    /// Goal field name (`position`, `tint`, `alpha`, ...).
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Accessor path written on the target (`x`, `scale.x`, ...).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> &TimelineKind {
        &self.kind
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn goal(&self) -> f64 {
        self.goal
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Matches a removal filter name against the field or the path.
    pub(crate) fn matches(&self, name: &str) -> bool {
        self.field == name || self.path == name
    }

    /// Needs the object's position each tick.
    pub(crate) fn needs_origin(&self) -> bool {
        matches!(
            self.kind,
            TimelineKind::AngularDynamic { frozen: false, .. }
                | TimelineKind::VectorComponent {
                    pursuit: Some(_),
                    ..
                }
        )
    }

    /// Driven by a rate rather than by the entry's fraction.
    pub(crate) fn is_continuous(&self) -> bool {
        matches!(
            self.kind,
            TimelineKind::AngularDynamic {
                turn_rate: Some(_),
                ..
            } | TimelineKind::VectorComponent {
                pursuit: Some(_),
                ..
            }
        )
    }

    /// A continuous timeline that has reached its destination.
    pub(crate) fn arrived(&self) -> bool {
        self.is_continuous() && self.current == self.goal
    }

    /// Compute this tick's value and write it to the target.
    pub(crate) fn apply(&mut self, target: &Target, frame: &mut Frame<'_>) -> Result<()> {
        if let Some(value) = self.evaluate(frame)? {
            self.current = value;
            target::write(target, &self.path, value)?;
        }
        Ok(())
    }

    fn evaluate(&mut self, frame: &mut Frame<'_>) -> Result<Option<f64>> {
        let fraction = frame.fraction;
        let value = match &mut self.kind {
            TimelineKind::Scalar
            | TimelineKind::VectorComponent {
                pursuit: None, ..
            } => lerp(self.start, self.goal, fraction),
            TimelineKind::VectorComponent {
                axis,
                pursuit: Some(pursuit),
            } => {
                let (Some(origin), Some(dest)) = (frame.origin, pursuit.destination.position()?)
                else {
                    return Ok(None);
                };
                self.goal = axis.pick(dest);
                let (dx, dy) = (dest.0 - origin.0, dest.1 - origin.1);
                let distance = dx.hypot(dy);
                let step = pursuit.speed * frame.dt;
                if distance <= step || distance == 0.0 {
                    self.goal
                } else {
                    let along = axis.pick((dx, dy)) / distance;
                    axis.pick(origin) + along * step
                }
            }
            TimelineKind::AngularDynamic {
                toward,
                turn_rate,
                frozen,
            } => {
                if !*frozen {
                    let (Some(origin), Some(dest)) = (frame.origin, toward.position()?) else {
                        return Ok(None);
                    };
                    let heading = (dest.1 - origin.1).atan2(dest.0 - origin.0);
                    let from = if turn_rate.is_some() { self.current } else { self.start };
                    self.goal = from + shortest_arc(from, heading);
                }
                match turn_rate {
                    None => lerp(self.start, self.goal, fraction),
                    Some(rate) => {
                        let delta = self.goal - self.current;
                        let step = *rate * frame.dt;
                        if delta.abs() <= step {
                            self.goal
                        } else {
                            self.current + step.copysign(delta)
                        }
                    }
                }
            }
            TimelineKind::ColorChannel { colors, mode } => {
                let c = match mode {
                    ColorMode::Blend => color::sample_blend(colors, fraction),
                    ColorMode::Cycle => color::sample_cycle(colors, fraction),
                };
                c as f64
            }
            TimelineKind::RandomizedOffset { magnitude } => self.start + frame.rng.offset(*magnitude),
        };
        Ok(Some(value))
    }

    /// Swap direction for a reversing (or un-reversing) entry.
    pub(crate) fn flip(&mut self) {
        match &mut self.kind {
            TimelineKind::VectorComponent {
                pursuit: Some(_), ..
            }
            | TimelineKind::AngularDynamic {
                turn_rate: Some(_),
                ..
            }
            | TimelineKind::RandomizedOffset { .. } => {}
            TimelineKind::AngularDynamic { frozen, .. } => {
                *frozen = !*frozen;
                std::mem::swap(&mut self.start, &mut self.goal);
            }
            TimelineKind::ColorChannel { colors, .. } => {
                colors.reverse();
                std::mem::swap(&mut self.start, &mut self.goal);
            }
            TimelineKind::Scalar | TimelineKind::VectorComponent { .. } => {
                std::mem::swap(&mut self.start, &mut self.goal);
            }
        }
    }

    /// Final write on completion. Randomized offsets return exactly to base.
    pub(crate) fn settle(&mut self, target: &Target) -> Result<()> {
        if let TimelineKind::RandomizedOffset { .. } = self.kind {
            self.current = self.start;
            target::write(target, &self.path, self.start)?;
        }
        Ok(())
    }
}

fn color_kind(colors: Vec<u32>, mode: ColorMode) -> (TimelineKind, f64, f64) {
    let first = colors.first().copied().unwrap_or(0) as f64;
    let last = colors.last().copied().unwrap_or(0) as f64;
    (TimelineKind::ColorChannel { colors, mode }, first, last)
}

#[inline]
fn lerp(start: f64, goal: f64, t: f64) -> f64 {
    start + (goal - start) * t
}

/// Signed angle in `(-PI, PI]` that turns `from` onto `to`.
pub(crate) fn shortest_arc(from: f64, to: f64) -> f64 {
    let d = (to - from).rem_euclid(TAU);
    if d > PI {
        d - TAU
    } else {
        d
    }
}
