//! Configuration for the easing engine

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::curve::CurveSpec;
use crate::error::EaseError;

/// Default entry duration in milliseconds.
pub const DEFAULT_DURATION_MS: f64 = 1000.0;
/// Default per-tick delta ceiling (one 60 Hz frame).
pub const DEFAULT_MAX_FRAME_MS: f64 = 1000.0 / 60.0;
/// Default curve name.
pub const DEFAULT_CURVE: &str = "easeInOutSine";
/// Default seed for randomized-offset generators.
pub const DEFAULT_SEED: u64 = 0x5EED_0F_EA5E;

/// Manager-level defaults, inherited by entries when they are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EaseConfig {
    /// Default duration for new entries (ms)
    pub duration: f64,
    /// Default curve for new entries
    pub curve: CurveSpec,
    /// When false, no automatic ticking occurs; drive `Ease::update` manually
    pub use_clock_source: bool,
    /// Ceiling applied to every tick delta (ms). `null` in JSON means unbounded.
    #[serde(
        serialize_with = "serialize_ceiling",
        deserialize_with = "deserialize_ceiling"
    )]
    pub max_frame: f64,
    /// Seed for the randomized-offset generators
    pub seed: u64,
}

impl Default for EaseConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_MS,
            curve: CurveSpec::named(DEFAULT_CURVE),
            use_clock_source: true,
            max_frame: DEFAULT_MAX_FRAME_MS,
            seed: DEFAULT_SEED,
        }
    }
}

impl EaseConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, EaseError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), EaseError> {
        if self.duration < 0.0 || !self.duration.is_finite() {
            return Err(EaseError::InvalidConfig {
                reason: "Duration must be non-negative and finite".to_string(),
            });
        }

        if self.max_frame <= 0.0 || self.max_frame.is_nan() {
            return Err(EaseError::InvalidConfig {
                reason: "Max frame must be positive".to_string(),
            });
        }

        Ok(())
    }

    #[inline]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    #[inline]
    pub fn with_curve(mut self, curve: impl Into<CurveSpec>) -> Self {
        self.curve = curve.into();
        self
    }

    #[inline]
    pub fn with_max_frame(mut self, max_frame: f64) -> Self {
        self.max_frame = max_frame;
        self
    }

    #[inline]
    pub fn without_clock_source(mut self) -> Self {
        self.use_clock_source = false;
        self
    }

    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

fn serialize_ceiling<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

fn deserialize_ceiling<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}

/// How many extra traversals an entry makes after the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Count(u32),
    Infinite,
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::Count(0)
    }
}

impl Repeat {
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Repeat::Count(0))
    }

    /// Consume one repeat; false when none are left.
    #[inline]
    pub(crate) fn take(&mut self) -> bool {
        match self {
            Repeat::Infinite => true,
            Repeat::Count(0) => false,
            Repeat::Count(n) => {
                *n -= 1;
                true
            }
        }
    }
}

impl From<u32> for Repeat {
    fn from(n: u32) -> Self {
        Repeat::Count(n)
    }
}

impl Serialize for Repeat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Repeat::Count(n) => serializer.serialize_u32(*n),
            Repeat::Infinite => serializer.serialize_str("infinite"),
        }
    }
}

impl<'de> Deserialize<'de> for Repeat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u32),
            Flag(bool),
            Word(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(Repeat::Count(n)),
            Raw::Flag(true) => Ok(Repeat::Infinite),
            Raw::Flag(false) => Ok(Repeat::Count(0)),
            Raw::Word(word) if word == "infinite" => Ok(Repeat::Infinite),
            Raw::Word(word) => Err(de::Error::custom(format!(
                "expected a repeat count, true, or \"infinite\", got \"{word}\""
            ))),
        }
    }
}
