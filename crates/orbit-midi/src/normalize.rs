//! Value conversion between MIDI (0-127) and normalized parameter space (0.0-1.0)
//!
//! Parameters do their own range mapping, so everything here targets the
//! canonical unit range.

use crate::config::EncoderMode;

const MIDI_MAX: f64 = 127.0;
const MIDI_CENTER: f64 = 64.0;

/// Normalize a MIDI CC value (0-127) to 0.0-1.0
///
/// `center_deadzone` (in MIDI units, e.g. 5 = values 59-69) snaps readings
/// near the middle to the exact center and stretches the rest so both ends
/// still reach 0.0 and 1.0.
pub fn normalize_cc_value(midi_value: u8, center_deadzone: Option<u8>) -> f64 {
    let midi = f64::from(midi_value.min(127));

    let effective_midi = match center_deadzone {
        Some(deadzone) if deadzone > 0 => {
            let dz = f64::from(deadzone);
            let low = (MIDI_CENTER - dz).max(1.0);
            let high = (MIDI_CENTER + dz).min(MIDI_MAX - 1.0);

            if midi >= low && midi <= high {
                MIDI_CENTER
            } else if midi < low {
                (midi / low) * MIDI_CENTER
            } else {
                MIDI_CENTER + ((midi - high) / (MIDI_MAX - high)) * (MIDI_MAX - MIDI_CENTER)
            }
        }
        _ => midi,
    };

    effective_midi / MIDI_MAX
}

/// Convert an encoder's relative value to a signed step count
///
/// - Relative: 1-63 = CW amount, 65-127 = CCW amount (64 unused)
/// - RelativeSigned: <64 = CCW, >64 = CW, 64 = no change
pub fn encoder_to_delta(midi_value: u8, mode: EncoderMode) -> i32 {
    let value = i32::from(midi_value);
    match mode {
        EncoderMode::Absolute => value - 64,
        EncoderMode::Relative => match midi_value {
            1..=63 => value,
            65..=127 => -(value - 64),
            _ => 0,
        },
        EncoderMode::RelativeSigned => value - 64,
    }
}

/// Convert a normalized value back to MIDI (0-127) for feedback
///
/// Out-of-range input (e.g. right after a parameter's range shrank) clamps.
pub fn denormalize_to_midi(normalized: f64) -> u8 {
    if normalized.is_nan() {
        return 0;
    }
    (normalized.clamp(0.0, 1.0) * MIDI_MAX).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_range() {
        assert_eq!(normalize_cc_value(0, None), 0.0);
        assert_eq!(normalize_cc_value(127, None), 1.0);
        assert!((normalize_cc_value(64, None) - 0.504).abs() < 0.01);
    }

    #[test]
    fn test_deadzone() {
        let center = normalize_cc_value(64, Some(5));
        assert!((center - 0.504).abs() < 0.01);
        assert_eq!(normalize_cc_value(60, Some(5)), center);
        assert_eq!(normalize_cc_value(68, Some(5)), center);
        // Ends still reach the limits
        assert_eq!(normalize_cc_value(0, Some(5)), 0.0);
        assert_eq!(normalize_cc_value(127, Some(5)), 1.0);
        assert!(normalize_cc_value(58, Some(5)) < center);
        assert!(normalize_cc_value(70, Some(5)) > center);
    }

    #[test]
    fn test_encoder_relative() {
        assert_eq!(encoder_to_delta(1, EncoderMode::Relative), 1);
        assert_eq!(encoder_to_delta(10, EncoderMode::Relative), 10);
        assert_eq!(encoder_to_delta(65, EncoderMode::Relative), -1);
        assert_eq!(encoder_to_delta(75, EncoderMode::Relative), -11);
        assert_eq!(encoder_to_delta(64, EncoderMode::Relative), 0);
        assert_eq!(encoder_to_delta(0, EncoderMode::Relative), 0);
    }

    #[test]
    fn test_encoder_relative_signed() {
        assert_eq!(encoder_to_delta(65, EncoderMode::RelativeSigned), 1);
        assert_eq!(encoder_to_delta(63, EncoderMode::RelativeSigned), -1);
        assert_eq!(encoder_to_delta(64, EncoderMode::RelativeSigned), 0);
    }

    #[test]
    fn test_denormalize() {
        assert_eq!(denormalize_to_midi(0.0), 0);
        assert_eq!(denormalize_to_midi(1.0), 127);
        assert_eq!(denormalize_to_midi(0.5), 64);
        assert_eq!(denormalize_to_midi(1.6), 127);
        assert_eq!(denormalize_to_midi(-0.2), 0);
        assert_eq!(denormalize_to_midi(f64::NAN), 0);
    }
}
