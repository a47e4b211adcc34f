//! Small deterministic generator for randomized-offset timelines.

/// SplitMix64. Cheap, seedable, and good enough for visual jitter.
#[derive(Clone, Debug)]
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)` with 53 bits of precision.
    pub fn next_f64_01(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) * (1.0 / ((1u64 << 53) as f64))
    }

    /// Uniform in `[-magnitude, magnitude]`.
    pub fn offset(&mut self, magnitude: f64) -> f64 {
        (self.next_f64_01() * 2.0 - 1.0) * magnitude
    }

    /// Derive an independent generator (one per entry).
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u64())
    }
}
