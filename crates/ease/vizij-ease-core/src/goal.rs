//! Goal specs: what an `add` call animates toward.
//!
//! A [`GoalSpec`] maps field names to [`Goal`] values. Composite aliases
//! (`position`, `scale`, `tint`, `face`, `shake`, ...) expand into one or more
//! field plans, each of which becomes one parameter timeline.

use serde_json::Value as Json;

use crate::error::EaseError;
use crate::target::Destination;
use crate::timeline::Axis;
use crate::Result;

/// One goal value.
#[derive(Debug, Clone)]
pub enum Goal {
    Number(f64),
    Point { x: f64, y: f64 },
    /// A color sequence (`0xRRGGBB` each).
    Colors(Vec<u32>),
    /// Something to look at, for `face`.
    Toward(Destination),
}

impl From<f64> for Goal {
    fn from(v: f64) -> Self {
        Goal::Number(v)
    }
}

impl From<(f64, f64)> for Goal {
    fn from((x, y): (f64, f64)) -> Self {
        Goal::Point { x, y }
    }
}

impl From<Vec<u32>> for Goal {
    fn from(colors: Vec<u32>) -> Self {
        Goal::Colors(colors)
    }
}

impl From<Destination> for Goal {
    fn from(dest: Destination) -> Self {
        Goal::Toward(dest)
    }
}

/// Ordered field → goal mapping.
#[derive(Debug, Clone, Default)]
pub struct GoalSpec {
    fields: Vec<(String, Goal)>,
}

impl GoalSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field's goal, replacing any earlier goal for the same field.
    pub fn set(mut self, field: impl Into<String>, goal: impl Into<Goal>) -> Self {
        let field = field.into();
        let goal = goal.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = goal,
            None => self.fields.push((field, goal)),
        }
        self
    }

    pub fn number(self, field: impl Into<String>, value: f64) -> Self {
        self.set(field, Goal::Number(value))
    }

    pub fn point(self, field: impl Into<String>, x: f64, y: f64) -> Self {
        self.set(field, Goal::Point { x, y })
    }

    pub fn position(self, x: f64, y: f64) -> Self {
        self.point("position", x, y)
    }

    pub fn tint(self, colors: Vec<u32>) -> Self {
        self.set("tint", Goal::Colors(colors))
    }

    pub fn blend(self, colors: Vec<u32>) -> Self {
        self.set("blend", Goal::Colors(colors))
    }

    pub fn face(self, destination: impl Into<Destination>) -> Self {
        self.set("face", Goal::Toward(destination.into()))
    }

    pub fn shake(self, magnitude: f64) -> Self {
        self.number("shake", magnitude)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Goal)> {
        self.fields.iter().map(|(name, goal)| (name.as_str(), goal))
    }

    /// Parse a JSON object such as `{"x": 10, "position": {"x": 1, "y": 2}, "tint": [255, 65280]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Json = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Json) -> Result<Self> {
        let Json::Object(map) = value else {
            return Err(EaseError::invalid_goal("<root>", "expected a JSON object"));
        };
        let mut spec = Self::new();
        for (field, raw) in map {
            let goal = parse_goal(field, raw)?;
            spec = spec.set(field.as_str(), goal);
        }
        Ok(spec)
    }

    /// Expand aliases into per-timeline plans.
    pub(crate) fn expand(&self) -> Result<Vec<FieldPlan>> {
        let mut plans = Vec::with_capacity(self.fields.len());
        for (field, goal) in &self.fields {
            expand_field(field, goal, &mut plans)?;
        }
        Ok(plans)
    }
}

fn parse_goal(field: &str, raw: &Json) -> Result<Goal> {
    match raw {
        Json::Number(n) => n
            .as_f64()
            .map(Goal::Number)
            .ok_or_else(|| EaseError::invalid_goal(field, "number out of range")),
        Json::Object(obj) => {
            let coord = |axis: &str| obj.get(axis).and_then(Json::as_f64);
            match (coord("x"), coord("y")) {
                (Some(x), Some(y)) if field == "face" => Ok(Goal::Toward(Destination::point(x, y))),
                (Some(x), Some(y)) => Ok(Goal::Point { x, y }),
                _ => Err(EaseError::invalid_goal(field, "expected an object with x and y")),
            }
        }
        Json::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .filter(|c| *c <= 0xFF_FF_FF)
                    .map(|c| c as u32)
                    .ok_or_else(|| EaseError::invalid_goal(field, "colors must be integers in 0..=0xFFFFFF"))
            })
            .collect::<Result<Vec<_>>>()
            .map(Goal::Colors),
        _ => Err(EaseError::invalid_goal(field, "unsupported goal value")),
    }
}

/// How one timeline should be built, before start values are captured.
#[derive(Debug, Clone)]
pub(crate) struct FieldPlan {
    pub field: String,
    pub path: String,
    pub rule: PlanRule,
}

#[derive(Debug, Clone)]
pub(crate) enum PlanRule {
    Scalar(f64),
    Component { axis: Axis, goal: f64 },
    /// Blend from the current color through these colors.
    Blend(Vec<u32>),
    /// Step through these colors.
    Cycle(Vec<u32>),
    Face(Destination),
    Shake(f64),
}

impl FieldPlan {
    fn new(field: &str, path: &str, rule: PlanRule) -> Self {
        Self {
            field: field.to_string(),
            path: path.to_string(),
            rule,
        }
    }
}

fn expand_field(field: &str, goal: &Goal, out: &mut Vec<FieldPlan>) -> Result<()> {
    match (field, goal) {
        ("position", Goal::Point { x, y }) => {
            out.push(FieldPlan::new(field, "x", PlanRule::Component { axis: Axis::X, goal: *x }));
            out.push(FieldPlan::new(field, "y", PlanRule::Component { axis: Axis::Y, goal: *y }));
        }
        ("scale" | "skew", Goal::Number(v)) => {
            push_pair(field, *v, *v, out);
        }
        ("scale" | "skew", Goal::Point { x, y }) => {
            push_pair(field, *x, *y, out);
        }
        ("scaleX" | "scaleY" | "skewX" | "skewY", Goal::Number(v)) => {
            let path = match field {
                "scaleX" => "scale.x",
                "scaleY" => "scale.y",
                "skewX" => "skew.x",
                _ => "skew.y",
            };
            out.push(FieldPlan::new(field, path, PlanRule::Scalar(*v)));
        }
        ("tint", Goal::Number(v)) | ("blend", Goal::Number(v)) => {
            out.push(FieldPlan::new(field, "tint", PlanRule::Blend(vec![color(field, *v)?])));
        }
        ("tint", Goal::Colors(colors)) => {
            non_empty(field, colors)?;
            out.push(FieldPlan::new(field, "tint", PlanRule::Cycle(colors.clone())));
        }
        ("blend", Goal::Colors(colors)) => {
            non_empty(field, colors)?;
            out.push(FieldPlan::new(field, "tint", PlanRule::Blend(colors.clone())));
        }
        ("face", Goal::Toward(dest)) => {
            out.push(FieldPlan::new(field, "rotation", PlanRule::Face(dest.clone())));
        }
        ("face", Goal::Point { x, y }) => {
            out.push(FieldPlan::new(field, "rotation", PlanRule::Face(Destination::point(*x, *y))));
        }
        ("shake", Goal::Number(m)) => {
            let magnitude = m.abs();
            out.push(FieldPlan::new(field, "x", PlanRule::Shake(magnitude)));
            out.push(FieldPlan::new(field, "y", PlanRule::Shake(magnitude)));
        }
        (
            "position" | "scale" | "skew" | "scaleX" | "scaleY" | "skewX" | "skewY" | "tint"
            | "blend" | "face" | "shake",
            _,
        ) => {
            return Err(EaseError::invalid_goal(field, "goal has the wrong shape for this field"));
        }
        (_, Goal::Number(v)) => {
            out.push(FieldPlan::new(field, field, PlanRule::Scalar(*v)));
        }
        (_, _) => {
            return Err(EaseError::invalid_goal(field, "generic fields take a number"));
        }
    }
    Ok(())
}

fn push_pair(field: &str, x: f64, y: f64, out: &mut Vec<FieldPlan>) {
    let (px, py) = if field == "scale" {
        ("scale.x", "scale.y")
    } else {
        ("skew.x", "skew.y")
    };
    out.push(FieldPlan::new(field, px, PlanRule::Component { axis: Axis::X, goal: x }));
    out.push(FieldPlan::new(field, py, PlanRule::Component { axis: Axis::Y, goal: y }));
}

fn color(field: &str, v: f64) -> Result<u32> {
    if v.is_finite() && (0.0..=16_777_215.0).contains(&v) {
        Ok(v.round() as u32)
    } else {
        Err(EaseError::invalid_goal(field, "color out of range"))
    }
}

fn non_empty(field: &str, colors: &[u32]) -> Result<()> {
    if colors.is_empty() {
        Err(EaseError::invalid_goal(field, "color list is empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(spec: &GoalSpec) -> Vec<(String, String)> {
        spec.expand()
            .unwrap()
            .into_iter()
            .map(|p| (p.field, p.path))
            .collect()
    }

    #[test]
    fn aliases_expand_to_paths() {
        let spec = GoalSpec::new()
            .position(1.0, 2.0)
            .number("scale", 3.0)
            .number("skewY", 0.5)
            .number("alpha", 0.0);
        assert_eq!(
            paths(&spec),
            vec![
                ("position".into(), "x".into()),
                ("position".into(), "y".into()),
                ("scale".into(), "scale.x".into()),
                ("scale".into(), "scale.y".into()),
                ("skewY".into(), "skew.y".into()),
                ("alpha".into(), "alpha".into()),
            ]
        );
    }

    #[test]
    fn set_replaces_existing_field() {
        let spec = GoalSpec::new().number("x", 1.0).number("x", 5.0);
        assert_eq!(spec.len(), 1);
        assert!(matches!(spec.fields().next(), Some(("x", Goal::Number(v))) if *v == 5.0));
    }

    #[test]
    fn json_goals() {
        let spec = GoalSpec::from_json(
            r#"{"x": 10, "face": {"x": 20, "y": 20}, "tint": [1, 2, 3], "blend": 0, "shake": 5}"#,
        )
        .unwrap();
        let plans = spec.expand().unwrap();
        assert!(plans.iter().any(|p| p.path == "rotation" && matches!(p.rule, PlanRule::Face(_))));
        assert!(plans.iter().any(|p| p.field == "tint" && matches!(&p.rule, PlanRule::Cycle(c) if c == &vec![1, 2, 3])));
        assert!(plans.iter().any(|p| p.field == "blend" && matches!(&p.rule, PlanRule::Blend(c) if c == &vec![0])));
        assert_eq!(plans.iter().filter(|p| p.field == "shake").count(), 2);
    }

    #[test]
    fn malformed_goals_are_rejected() {
        let err = GoalSpec::from_json(r#"{"position": 4}"#).unwrap().expand().unwrap_err();
        assert_eq!(err.category(), "validation");
        assert!(GoalSpec::from_json(r#"{"x": "far"}"#).is_err());
        assert!(GoalSpec::from_json(r#"{"tint": [-1]}"#).is_err());
        assert!(GoalSpec::from_json("[1, 2]").is_err());
        assert!(GoalSpec::new().tint(vec![]).expand().is_err());
    }
}
