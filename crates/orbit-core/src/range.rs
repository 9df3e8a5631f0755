//! Raw <-> normalized conversion
//!
//! Raw values live in a parameter's engineering range `[min, max]`; normalized
//! values are the same position rescaled linearly to `[0, 1]`.
//!
//! A zero-width range (`min == max`) is a precondition violation: the result
//! is NaN or infinite. The registry refuses to register such ranges.

/// Map a raw value into `[0, 1]` (not clamped)
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    (value - min) / (max - min)
}

/// Map a normalized value back into `[min, max]` (not clamped)
pub fn denormalize(normalized: f64, min: f64, max: f64) -> f64 {
    normalized * (max - min) + min
}

/// Clamp into `[min, max]`, tolerating an inverted range and NaN input
///
/// NaN clamps to `min` so a bad transform can never leak NaN into the registry.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if value.is_nan() {
        return lo;
    }
    value.max(lo).min(hi)
}

/// Whether `[min, max]` is usable as a parameter range
pub fn is_valid_range(min: f64, max: f64) -> bool {
    min.is_finite() && max.is_finite() && min < max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_denormalize_round_trip() {
        let ranges = [(0.0, 1.0), (0.0, 100.0), (-1.0, 1.0), (20.0, 20000.0), (-60.0, 6.0)];
        for (min, max) in ranges {
            for i in 0..=10 {
                let v = min + (max - min) * (i as f64 / 10.0);
                let back = denormalize(normalize(v, min, max), min, max);
                assert!((back - v).abs() < 1e-9 * (max - min).abs().max(1.0), "{v} -> {back}");
            }
        }
    }

    #[test]
    fn test_normalize_endpoints() {
        assert_eq!(normalize(0.0, 0.0, 100.0), 0.0);
        assert_eq!(normalize(100.0, 0.0, 100.0), 1.0);
        assert_eq!(normalize(0.0, -1.0, 1.0), 0.5);
        assert_eq!(denormalize(0.5, -1.0, 1.0), 0.0);
    }

    #[test]
    fn test_zero_width_range_is_not_finite() {
        assert!(!normalize(1.0, 1.0, 1.0).is_finite());
        assert!(!is_valid_range(1.0, 1.0));
        assert!(!is_valid_range(2.0, 1.0));
        assert!(!is_valid_range(0.0, f64::INFINITY));
        assert!(is_valid_range(0.0, 1.0));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
        assert_eq!(clamp(f64::NAN, 0.0, 1.0), 0.0);
        assert_eq!(clamp(5.0, 1.0, 0.0), 1.0);
    }
}
