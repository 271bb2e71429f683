//! Utility functions: geometry helpers and checked numeric casts.

pub mod safe_cast;

use nalgebra::Vector2;

/// Angle at vertex `b` of the triangle `a-b-c`, in degrees.
///
/// Returns NaN when either arm of the angle is degenerate (zero length),
/// matching the convention that unmeasurable angles are NaN until a later
/// stage fills them.
#[must_use]
pub fn angle_between(a: Vector2<f32>, b: Vector2<f32>, c: Vector2<f32>) -> f32 {
    let v1 = a - b;
    let v2 = c - b;
    let n1 = v1.norm();
    let n2 = v2.norm();
    if n1 == 0.0 || n2 == 0.0 {
        return f32::NAN;
    }
    let cosang = (v1.dot(&v2) / (n1 * n2)).clamp(-1.0, 1.0);
    cosang.acos().to_degrees()
}

/// Linear interpolation between two scalars
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (b - a).mul_add(t, a)
}

/// Moving-average smoothing of a signal with a box kernel, same-length output.
/// Signals shorter than the window are returned unchanged.
#[must_use]
pub fn smooth_signal(signal: &[f32], window: usize) -> Vec<f32> {
    if signal.len() < window || window < 2 {
        return signal.to_vec();
    }
    let half = window / 2;
    let mut out = Vec::with_capacity(signal.len());
    for i in 0..signal.len() {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(signal.len());
        let sum: f32 = signal[lo..hi].iter().sum();
        out.push(sum / (hi - lo) as f32);
    }
    out
}

/// Percentile of a sample via nearest-rank on a sorted copy. NaN entries are
/// ignored; an empty (or all-NaN) sample yields 0.
#[must_use]
pub fn percentile(values: &[f32], pct: f32) -> f32 {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = ((pct / 100.0) * (sorted.len() - 1) as f32).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}
