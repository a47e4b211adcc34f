//! Curve resolution: maps a curve identifier to a normalized
//! `progress -> progress` function.
//!
//! - `CurveSpec::Unset` resolves to linear
//! - `CurveSpec::Named` is looked up in a `CurveRegistry` (Penner set built in)
//! - `CurveSpec::Function` passes through unchanged
//!
//! An unknown name resolves to linear with a warning. The name is user-authored
//! configuration and must never abort an in-flight animation.

use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A shared, stateless easing function over normalized progress.
///
/// Input is expected in `[0, 1]`; output may overshoot (elastic, back).
#[derive(Clone)]
pub struct Curve {
    name: Option<Rc<str>>,
    func: Rc<dyn Fn(f64) -> f64>,
}

impl Curve {
    /// Wrap a named function.
    pub fn new(name: &str, func: impl Fn(f64) -> f64 + 'static) -> Self {
        Self {
            name: Some(Rc::from(name)),
            func: Rc::new(func),
        }
    }

    /// Wrap an anonymous function.
    pub fn from_fn(func: impl Fn(f64) -> f64 + 'static) -> Self {
        Self {
            name: None,
            func: Rc::new(func),
        }
    }

    /// Identity curve.
    pub fn linear() -> Self {
        Self::new("linear", linear)
    }

    #[inline]
    pub fn apply(&self, t: f64) -> f64 {
        (self.func)(t)
    }

    /// Registry name, if this curve was created by name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// True when both handles share the same function allocation.
    pub fn same_as(&self, other: &Curve) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Curve({name})"),
            None => f.write_str("Curve(<fn>)"),
        }
    }
}

/// How a curve is specified in configuration.
#[derive(Clone, Debug, Default)]
pub enum CurveSpec {
    /// No curve given: linear.
    #[default]
    Unset,
    /// Looked up in the registry at resolution time.
    Named(String),
    /// An already-resolved function.
    Function(Curve),
}

impl CurveSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Name of the curve, when specified by name or wrapping a named curve.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Unset => None,
            Self::Named(name) => Some(name),
            Self::Function(curve) => curve.name(),
        }
    }
}

impl From<&str> for CurveSpec {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for CurveSpec {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Curve> for CurveSpec {
    fn from(curve: Curve) -> Self {
        Self::Function(curve)
    }
}

impl Serialize for CurveSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unset => serializer.serialize_none(),
            Self::Named(name) => serializer.serialize_str(name),
            Self::Function(curve) => match curve.name() {
                Some(name) => serializer.serialize_str(name),
                None => Err(serde::ser::Error::custom(
                    "anonymous curve functions cannot be serialized",
                )),
            },
        }
    }
}

impl<'de> Deserialize<'de> for CurveSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(Self::Unset),
            Some(name) if name.trim().is_empty() => {
                Err(de::Error::custom("curve name must not be empty"))
            }
            Some(name) => Ok(Self::Named(name)),
        }
    }
}

/// Named curves known to one manager.
#[derive(Clone, Debug)]
pub struct CurveRegistry {
    curves: HashMap<String, Curve>,
}

impl CurveRegistry {
    /// Registry with the built-in Penner set.
    pub fn new() -> Self {
        let mut registry = Self {
            curves: HashMap::new(),
        };
        registry.register_builtin_curves();
        registry
    }

    fn register_builtin_curves(&mut self) {
        const BUILTIN: &[(&str, fn(f64) -> f64)] = &[
            ("linear", linear),
            ("easeInQuad", in_quad),
            ("easeOutQuad", out_quad),
            ("easeInOutQuad", in_out_quad),
            ("easeInCubic", in_cubic),
            ("easeOutCubic", out_cubic),
            ("easeInOutCubic", in_out_cubic),
            ("easeInQuart", in_quart),
            ("easeOutQuart", out_quart),
            ("easeInOutQuart", in_out_quart),
            ("easeInQuint", in_quint),
            ("easeOutQuint", out_quint),
            ("easeInOutQuint", in_out_quint),
            ("easeInSine", in_sine),
            ("easeOutSine", out_sine),
            ("easeInOutSine", in_out_sine),
            ("easeInExpo", in_expo),
            ("easeOutExpo", out_expo),
            ("easeInOutExpo", in_out_expo),
            ("easeInCirc", in_circ),
            ("easeOutCirc", out_circ),
            ("easeInOutCirc", in_out_circ),
            ("easeInElastic", in_elastic),
            ("easeOutElastic", out_elastic),
            ("easeInOutElastic", in_out_elastic),
            ("easeInBack", in_back),
            ("easeOutBack", out_back),
            ("easeInOutBack", in_out_back),
            ("easeInBounce", in_bounce),
            ("easeOutBounce", out_bounce),
            ("easeInOutBounce", in_out_bounce),
        ];
        for (name, func) in BUILTIN {
            self.register(Curve::new(name, *func));
        }
    }

    /// Register (or replace) a named curve.
    pub fn register(&mut self, curve: Curve) {
        if let Some(name) = curve.name() {
            self.curves.insert(name.to_string(), curve.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&Curve> {
        self.curves.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }

    /// List all registered names
    pub fn names(&self) -> Vec<&str> {
        self.curves.keys().map(|k| k.as_str()).collect()
    }

    /// Resolve a spec to a curve, falling back to linear.
    pub fn resolve(&self, spec: &CurveSpec) -> Curve {
        match spec {
            CurveSpec::Unset => Curve::linear(),
            CurveSpec::Function(curve) => curve.clone(),
            CurveSpec::Named(name) => match self.get(name) {
                Some(curve) => curve.clone(),
                None => {
                    log::warn!("unknown curve '{name}', falling back to linear");
                    Curve::linear()
                }
            },
        }
    }
}

impl Default for CurveRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Penner curves, normalized to t in [0, 1].

fn linear(t: f64) -> f64 {
    t
}

fn in_quad(t: f64) -> f64 {
    t * t
}

fn out_quad(t: f64) -> f64 {
    t * (2.0 - t)
}

fn in_out_quad(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

fn in_cubic(t: f64) -> f64 {
    t * t * t
}

fn out_cubic(t: f64) -> f64 {
    (t - 1.0).powi(3) + 1.0
}

fn in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn in_quart(t: f64) -> f64 {
    t.powi(4)
}

fn out_quart(t: f64) -> f64 {
    1.0 - (t - 1.0).powi(4)
}

fn in_out_quart(t: f64) -> f64 {
    if t < 0.5 {
        8.0 * t.powi(4)
    } else {
        1.0 - 8.0 * (t - 1.0).powi(4)
    }
}

fn in_quint(t: f64) -> f64 {
    t.powi(5)
}

fn out_quint(t: f64) -> f64 {
    1.0 + (t - 1.0).powi(5)
}

fn in_out_quint(t: f64) -> f64 {
    if t < 0.5 {
        16.0 * t.powi(5)
    } else {
        1.0 + 16.0 * (t - 1.0).powi(5)
    }
}

fn in_sine(t: f64) -> f64 {
    1.0 - (t * PI / 2.0).cos()
}

fn out_sine(t: f64) -> f64 {
    (t * PI / 2.0).sin()
}

fn in_out_sine(t: f64) -> f64 {
    -((PI * t).cos() - 1.0) / 2.0
}

fn in_expo(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else {
        2f64.powf(10.0 * t - 10.0)
    }
}

fn out_expo(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2f64.powf(-10.0 * t)
    }
}

fn in_out_expo(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else if t < 0.5 {
        2f64.powf(20.0 * t - 10.0) / 2.0
    } else {
        (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
    }
}

fn in_circ(t: f64) -> f64 {
    1.0 - (1.0 - t * t).max(0.0).sqrt()
}

fn out_circ(t: f64) -> f64 {
    (1.0 - (t - 1.0).powi(2)).max(0.0).sqrt()
}

fn in_out_circ(t: f64) -> f64 {
    if t < 0.5 {
        (1.0 - (1.0 - (2.0 * t).powi(2)).max(0.0).sqrt()) / 2.0
    } else {
        ((1.0 - (-2.0 * t + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
    }
}

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;

fn in_back(t: f64) -> f64 {
    BACK_C3 * t * t * t - BACK_C1 * t * t
}

fn out_back(t: f64) -> f64 {
    1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2)
}

fn in_out_back(t: f64) -> f64 {
    if t < 0.5 {
        ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
    } else {
        ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0) / 2.0
    }
}

const ELASTIC_C4: f64 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f64 = (2.0 * PI) / 4.5;

fn in_elastic(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
    }
}

fn out_elastic(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
    }
}

fn in_out_elastic(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else if t < 0.5 {
        -(2f64.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
    } else {
        (2f64.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0 + 1.0
    }
}

fn out_bounce(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

fn in_bounce(t: f64) -> f64 {
    1.0 - out_bounce(1.0 - t)
}

fn in_out_bounce(t: f64) -> f64 {
    if t < 0.5 {
        (1.0 - out_bounce(1.0 - 2.0 * t)) / 2.0
    } else {
        (1.0 + out_bounce(2.0 * t - 1.0)) / 2.0
    }
}
