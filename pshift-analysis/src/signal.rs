//! Test signals and level measurements

use std::f64::consts::PI;

/// Sine tone of `len` samples starting at phase zero
pub fn sine(frequency: f32, sample_rate: f32, len: usize, amplitude: f32) -> Vec<f32> {
    let step = 2.0 * PI * frequency as f64 / sample_rate as f64;
    (0..len)
        .map(|i| amplitude * (step * i as f64).sin() as f32)
        .collect()
}

/// Largest absolute sample value
pub fn peak_level(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
}

/// Root-mean-square level, 0.0 for an empty slice
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| s as f64 * s as f64).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_shape() {
        let samples = sine(1000.0, 8000.0, 8, 0.5);
        let expected = [0.0, 0.353_553, 0.5, 0.353_553, 0.0, -0.353_553, -0.5, -0.353_553];
        for (s, e) in samples.iter().zip(expected) {
            assert!((s - e).abs() < 1e-5);
        }
    }

    #[test]
    fn test_levels() {
        let samples = sine(440.0, 44100.0, 44100, 0.8);
        assert!((peak_level(&samples) - 0.8).abs() < 1e-3);
        assert!((rms(&samples) - 0.8 / 2.0f32.sqrt()).abs() < 1e-3);
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(peak_level(&[-0.25, 0.1]), 0.25);
    }
}
