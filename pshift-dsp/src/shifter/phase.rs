//! Phase vocoder analysis, pitch remap and resynthesis.
//!
//! Each frame is windowed and transformed, then every bin 0..=N/2 is reduced
//! to a magnitude and a "true" frequency estimated from the phase drift
//! since the previous frame. Bins are moved to `trunc(k * ratio)`, their
//! frequencies scaled by the ratio, and a coherent spectrum is rebuilt by
//! accumulating the implied phase increment per bin. Negative frequencies
//! are discarded, not mirrored.

use std::f64::consts::PI;

use super::fft::{Complex, Direction, Fft};
use crate::params::{Normalization, ShiftParams};

const TWO_PI: f64 = 2.0 * PI;

/// Per-instance phase vocoder state and scratch
pub struct PhaseVocoder {
    frame_size: usize,
    /// Index of the Nyquist bin (N/2)
    half: usize,
    oversample: f64,
    freq_per_bin: f64,
    /// Expected phase advance of bin 1 over one hop
    expected: f64,
    /// Overlap-add scale, folds in the unnormalized inverse FFT
    output_scale: f64,
    /// Hann window
    window: Vec<f64>,
    /// Spectral working buffer (N complex = 2N interleaved floats)
    spectrum: Vec<Complex>,
    /// Measured phase per bin from the previous frame
    last_phase: Vec<f64>,
    /// Running synthesis phase per bin
    sum_phase: Vec<f64>,
    ana_magn: Vec<f64>,
    ana_freq: Vec<f64>,
    syn_magn: Vec<f64>,
    syn_freq: Vec<f64>,
}

impl PhaseVocoder {
    /// Build the vocoder for already-validated parameters
    pub fn new(params: &ShiftParams) -> Self {
        let n = params.frame_size;
        let half = n / 2;
        let step = params.step_size();
        let oversample = params.oversample as f64;

        let window = (0..n)
            .map(|k| 0.5 - 0.5 * (TWO_PI * k as f64 / n as f64).cos())
            .collect();

        let mut output_scale = 2.0 / (half as f64 * oversample);
        if params.normalization == Normalization::UnityGain {
            output_scale /= overlap_gain(n, step, params.oversample);
        }

        Self {
            frame_size: n,
            half,
            oversample,
            freq_per_bin: params.sample_rate as f64 / n as f64,
            expected: TWO_PI * step as f64 / n as f64,
            output_scale,
            window,
            spectrum: vec![Complex::default(); n],
            last_phase: vec![0.0; half + 1],
            sum_phase: vec![0.0; half + 1],
            ana_magn: vec![0.0; n],
            ana_freq: vec![0.0; n],
            syn_magn: vec![0.0; n],
            syn_freq: vec![0.0; n],
        }
    }

    /// Run one frame through analysis, remap and synthesis and overlap-add
    /// the result into `accum` (length N)
    pub fn process_frame(&mut self, fft: &Fft, frame: &[f32], accum: &mut [f64], ratio: f64) {
        debug_assert_eq!(frame.len(), self.frame_size);
        debug_assert_eq!(accum.len(), self.frame_size);

        for ((bin, &x), &w) in self.spectrum.iter_mut().zip(frame).zip(&self.window) {
            *bin = Complex::new(x as f64 * w, 0.0);
        }
        fft.transform(&mut self.spectrum, Direction::Forward);

        self.analyze();
        remap_bins(
            &self.ana_magn[..=self.half],
            &self.ana_freq[..=self.half],
            &mut self.syn_magn,
            &mut self.syn_freq,
            ratio,
        );
        self.synthesize();

        fft.transform(&mut self.spectrum, Direction::Inverse);

        for ((acc, bin), &w) in accum.iter_mut().zip(&self.spectrum).zip(&self.window) {
            *acc += w * bin.re * self.output_scale;
        }
    }

    fn analyze(&mut self) {
        for k in 0..=self.half {
            let bin = self.spectrum[k];
            let magn = 2.0 * bin.magnitude();
            let phase = bin.phase();

            let residual = phase - self.last_phase[k] - k as f64 * self.expected;
            self.last_phase[k] = phase;

            let deviation = self.oversample * wrap_phase(residual) / TWO_PI;

            self.ana_magn[k] = magn;
            self.ana_freq[k] = k as f64 * self.freq_per_bin + deviation * self.freq_per_bin;
        }
    }

    fn synthesize(&mut self) {
        for k in 0..=self.half {
            let deviation = (self.syn_freq[k] - k as f64 * self.freq_per_bin) / self.freq_per_bin;
            let increment = TWO_PI * deviation / self.oversample + k as f64 * self.expected;

            self.sum_phase[k] += increment;
            self.spectrum[k] = Complex::from_polar(self.syn_magn[k], self.sum_phase[k]);
        }

        for bin in &mut self.spectrum[self.half + 1..] {
            *bin = Complex::default();
        }
    }

    pub fn reset(&mut self) {
        self.spectrum.fill(Complex::default());
        self.last_phase.fill(0.0);
        self.sum_phase.fill(0.0);
        self.ana_magn.fill(0.0);
        self.ana_freq.fill(0.0);
        self.syn_magn.fill(0.0);
        self.syn_freq.fill(0.0);
    }
}

/// Steady-state gain of a ratio-1.0 round trip under the reference divisor:
/// one-sided doubling times the Hann² overlap sum `3N / (8 * hop)`, over
/// `osamp / 4`
pub(crate) fn overlap_gain(frame_size: usize, step_size: usize, oversample: usize) -> f64 {
    3.0 * frame_size as f64 / (2.0 * oversample as f64 * step_size as f64)
}

/// Subtract the even multiple of π nearest to `residual / π`, taken from
/// its truncation: an odd quotient is pushed one step away from zero
#[inline]
pub(crate) fn wrap_phase(residual: f64) -> f64 {
    let mut q = (residual / PI).trunc();
    if q % 2.0 != 0.0 {
        q += q.signum();
    }
    residual - PI * q
}

/// Move analysis bins to `trunc(k * ratio)`.
///
/// Magnitudes landing on the same target are summed; the frequency of the
/// highest contributing `k` wins. Targets outside `0..=N/2` are dropped.
pub(crate) fn remap_bins(
    ana_magn: &[f64],
    ana_freq: &[f64],
    syn_magn: &mut [f64],
    syn_freq: &mut [f64],
    ratio: f64,
) {
    syn_magn.fill(0.0);
    syn_freq.fill(0.0);

    let nyquist = (ana_magn.len() - 1) as f64;
    for (k, (&magn, &freq)) in ana_magn.iter().zip(ana_freq).enumerate() {
        let target = (k as f64 * ratio).trunc();
        if target >= 0.0 && target <= nyquist {
            let target = target as usize;
            syn_magn[target] += magn;
            syn_freq[target] = freq * ratio;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_phase_even_multiples() {
        assert!(wrap_phase(0.0).abs() < 1e-12);
        assert!((wrap_phase(0.5 * PI) - 0.5 * PI).abs() < 1e-12);
        assert!((wrap_phase(PI + 0.1) - (-PI + 0.1)).abs() < 1e-12);
        assert!((wrap_phase(-PI - 0.1) - (PI - 0.1)).abs() < 1e-12);
        assert!((wrap_phase(3.0 * PI - 0.1) - (PI - 0.1)).abs() < 1e-12);
        assert!((wrap_phase(-2.5 * PI) - (-0.5 * PI)).abs() < 1e-12);
        assert!((wrap_phase(1000.25 * PI) - 0.25 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_phase_matches_integer_rule() {
        // q += q & 1 for q >= 0, q -= q & 1 otherwise
        for i in -400..400 {
            let residual = i as f64 * 0.0737;
            let mut q = (residual / PI) as i64;
            if q >= 0 {
                q += q & 1;
            } else {
                q -= q & 1;
            }
            let expected = residual - PI * q as f64;
            assert!((wrap_phase(residual) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_remap_tie_break_sums_magnitude_last_frequency_wins() {
        let ana_magn = [0.0, 0.0, 0.3, 0.5, 0.0];
        let ana_freq = [0.0, 0.0, 100.0, 150.0, 0.0];
        let mut syn_magn = [9.0; 8];
        let mut syn_freq = [9.0; 8];

        // k = 2 and k = 3 both land on bin 1
        remap_bins(&ana_magn, &ana_freq, &mut syn_magn, &mut syn_freq, 0.5);

        assert!((syn_magn[1] - 0.8).abs() < 1e-12);
        assert_eq!(syn_freq[1], 150.0 * 0.5);
        assert_eq!(syn_magn[2], 0.0);
        assert_eq!(syn_magn[5], 0.0);
        assert_eq!(syn_freq[5], 0.0);
    }

    #[test]
    fn test_remap_drops_bins_beyond_nyquist() {
        let ana_magn = [1.0, 1.0, 1.0, 1.0, 1.0];
        let ana_freq = [0.0, 10.0, 20.0, 30.0, 40.0];
        let mut syn_magn = [0.0; 8];
        let mut syn_freq = [0.0; 8];

        remap_bins(&ana_magn, &ana_freq, &mut syn_magn, &mut syn_freq, 2.0);

        assert_eq!(&syn_magn[..5], &[1.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(&syn_freq[..5], &[0.0, 0.0, 20.0, 0.0, 40.0]);
        assert_eq!(&syn_magn[5..], &[0.0; 3]);
    }

    #[test]
    fn test_remap_nan_ratio_maps_nothing() {
        let ana_magn = [1.0; 5];
        let ana_freq = [1.0; 5];
        let mut syn_magn = [0.0; 5];
        let mut syn_freq = [0.0; 5];

        remap_bins(&ana_magn, &ana_freq, &mut syn_magn, &mut syn_freq, f64::NAN);

        assert!(syn_magn.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_overlap_gain() {
        assert!((overlap_gain(256, 64, 4) - 1.5).abs() < 1e-12);
        assert!((overlap_gain(1024, 102, 10) - 1.505_882_352_9).abs() < 1e-9);
    }

    #[test]
    fn test_unity_gain_scale() {
        let reference = PhaseVocoder::new(&ShiftParams::default());
        let unity = PhaseVocoder::new(&ShiftParams {
            normalization: Normalization::UnityGain,
            ..Default::default()
        });

        let gain = reference.output_scale / unity.output_scale;
        assert!((gain - overlap_gain(1024, 102, 10)).abs() < 1e-9);
        assert!((reference.output_scale - 2.0 / (512.0 * 10.0)).abs() < 1e-15);
    }

    #[test]
    fn test_silent_frame_adds_nothing() {
        let params = ShiftParams::default();
        let fft = Fft::new(params.frame_size).unwrap();
        let mut vocoder = PhaseVocoder::new(&params);
        let frame = vec![0.0f32; params.frame_size];
        let mut accum = vec![0.0f64; params.frame_size];

        for _ in 0..4 {
            vocoder.process_frame(&fft, &frame, &mut accum, 1.5);
        }

        assert!(accum.iter().all(|&a| a == 0.0));
    }
}
