//! 24-bit RGB helpers for color-channel timelines.
//!
//! Colors travel through the accessor layer as plain numbers (`0xRRGGBB`).
//! Every channel is interpolated independently, rounded, and clamped so that
//! overshooting curves never wrap a channel into its neighbour.

/// Split `0xRRGGBB` into `[r, g, b]`.
#[inline]
pub fn split(color: u32) -> [u8; 3] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

/// Join `[r, g, b]` into `0xRRGGBB`.
#[inline]
pub fn join(rgb: [u8; 3]) -> u32 {
    ((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32
}

/// Coerce an accessor value to a 24-bit color.
#[inline]
pub fn from_value(value: f64) -> u32 {
    if value.is_finite() {
        (value.round().clamp(0.0, 16_777_215.0)) as u32
    } else {
        0
    }
}

/// Channel-wise interpolation between two colors.
pub fn mix(from: u32, to: u32, t: f64) -> u32 {
    let a = split(from);
    let b = split(to);
    let mut out = [0u8; 3];
    for i in 0..3 {
        let (a, b) = (a[i] as f64, b[i] as f64);
        out[i] = (a + (b - a) * t).round().clamp(0.0, 255.0) as u8;
    }
    join(out)
}

/// Blend through `colors` over `len - 1` equal segments.
///
/// Segment boundaries return the boundary color exactly.
pub fn sample_blend(colors: &[u32], fraction: f64) -> u32 {
    match colors.len() {
        0 => 0,
        1 => colors[0],
        n => {
            let segments = (n - 1) as f64;
            let scaled = fraction * segments;
            let index = (scaled.floor().max(0.0) as usize).min(n - 2);
            let local = scaled - index as f64;
            if local == 0.0 {
                return colors[index];
            }
            mix(colors[index], colors[index + 1], local)
        }
    }
}

/// Step through `colors`, holding each for `1 / len` of the fraction range.
pub fn sample_cycle(colors: &[u32], fraction: f64) -> u32 {
    match colors.len() {
        0 => 0,
        n => {
            let index = (fraction * n as f64).floor().max(0.0) as usize;
            colors[index.min(n - 1)]
        }
    }
}
