//! FFT spectrum analyzer for measuring pitch-shifted output

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Magnitudes below this are treated as silence
const SILENCE_FLOOR: f32 = 1e-6;

/// Hann-windowed FFT analyzer with a fixed size
pub struct SpectrumAnalyzer {
    sample_rate: f32,
    fft_size: usize,
    fft: Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    /// Pre-allocated FFT buffer to avoid allocation in analyze()
    fft_buffer: Vec<Complex<f32>>,
    /// Magnitudes of bins 0..=fft_size/2
    magnitudes: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Create a new spectrum analyzer
    pub fn new(sample_rate: f32, fft_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        // Pre-compute Hann window
        let window: Vec<f32> = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / fft_size as f32).cos()))
            .collect();

        Self {
            sample_rate,
            fft_size,
            fft,
            window,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            magnitudes: vec![0.0; fft_size / 2 + 1],
        }
    }

    /// Width of one bin in Hz
    #[inline]
    pub fn bin_width(&self) -> f32 {
        self.sample_rate / self.fft_size as f32
    }

    /// Magnitude spectrum of the first `fft_size` samples (zero padded)
    pub fn magnitudes(&mut self, samples: &[f32]) -> &[f32] {
        let sample_count = samples.len().min(self.fft_size);
        for (i, &sample) in samples.iter().enumerate().take(sample_count) {
            self.fft_buffer[i] = Complex::new(sample * self.window[i], 0.0);
        }
        // Zero pad the rest
        for buf in self.fft_buffer.iter_mut().skip(sample_count) {
            *buf = Complex::new(0.0, 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        for (mag, bin) in self.magnitudes.iter_mut().zip(&self.fft_buffer) {
            *mag = bin.norm();
        }
        &self.magnitudes
    }

    /// Frequency of the strongest bin (DC excluded), refined by parabolic
    /// interpolation over its neighbours. `None` for silence.
    pub fn dominant_frequency(&mut self, samples: &[f32]) -> Option<f32> {
        let bin_width = self.bin_width();
        let mags = self.magnitudes(samples);
        let last = mags.len() - 1;

        let (peak, &peak_mag) = mags
            .iter()
            .enumerate()
            .take(last)
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))?;

        if peak_mag < SILENCE_FLOOR {
            tracing::debug!(peak_mag, "no spectral peak above the silence floor");
            return None;
        }

        let (a, b, c) = (mags[peak - 1], peak_mag, mags[peak + 1]);
        let denom = a - 2.0 * b + c;
        let offset = if denom.abs() > f32::EPSILON {
            (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
        } else {
            0.0
        };

        Some((peak as f32 + offset) * bin_width)
    }
}
