/// Linear-interpolation percentile over an ascending slice.
///
/// Rank is `(n - 1) * q`; the result interpolates between the two neighbouring
/// order statistics. Empty input yields `0.0`.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = (n - 1) as f64 * q.clamp(0.0, 1.0);
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = pos - lo as f64;
            sorted[lo] * (1.0 - frac) + sorted[hi] * frac
        }
    }
}

/// Arithmetic mean, `0.0` when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sort durations ascending in place.
pub fn sort_ascending(values: &mut [f64]) {
    values.sort_by(f64::total_cmp);
}

/// `part / whole * 100`, `0.0` when `whole` is zero.
pub fn rate_percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
