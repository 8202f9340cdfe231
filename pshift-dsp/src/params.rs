//! Engine parameters and their validation

use std::ops::RangeInclusive;

use crate::error::ShiftError;

/// Largest accepted frame size; the largest usable power of two is 8192
pub const MAX_FRAME_LENGTH: usize = 16000;

/// Default FFT frame size
pub const DEFAULT_FRAME_SIZE: usize = 1024;

/// Default STFT oversampling factor
pub const DEFAULT_OVERSAMPLE: usize = 10;

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Ratios the engine is tuned for (one octave down to one octave up).
/// Ratios outside still run, but bins scaled past Nyquist are dropped.
pub const REFERENCE_RATIO_RANGE: RangeInclusive<f64> = 0.5..=2.0;

/// Output scaling applied during overlap-add
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// `2 / ((N/2) * osamp)`: the classic divisor. A ratio of 1.0 comes
    /// back with a gain of `3N / (2 * osamp * hop)`, i.e. about 1.5.
    #[default]
    Reference,
    /// Reference divisor further divided by the Hann² overlap gain, so a
    /// ratio of 1.0 reproduces the input level.
    UnityGain,
}

/// How working state is treated between `process` calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Every call starts from zeroed state; calls are independent
    #[default]
    PerCall,
    /// State carries over, so contiguous chunks behave like one buffer
    Streaming,
}

/// Pitch shifter configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftParams {
    /// FFT frame size, a power of two
    pub frame_size: usize,
    /// STFT oversampling factor (frame overlap)
    pub oversample: usize,
    /// Sample rate in Hz
    pub sample_rate: f32,
    /// Overlap-add output scaling
    pub normalization: Normalization,
    /// State handling across calls
    pub lifecycle: Lifecycle,
}

impl Default for ShiftParams {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME_SIZE,
            oversample: DEFAULT_OVERSAMPLE,
            sample_rate: DEFAULT_SAMPLE_RATE,
            normalization: Normalization::Reference,
            lifecycle: Lifecycle::PerCall,
        }
    }
}

impl ShiftParams {
    /// Check every parameter against the engine contract
    pub fn validate(&self) -> Result<(), ShiftError> {
        if self.frame_size < 2 || !self.frame_size.is_power_of_two() {
            return Err(ShiftError::InvalidFrameSize(self.frame_size));
        }
        if self.frame_size > MAX_FRAME_LENGTH {
            return Err(ShiftError::FrameSizeTooLarge {
                size: self.frame_size,
                max: MAX_FRAME_LENGTH,
            });
        }
        if self.oversample == 0 || self.oversample > self.frame_size {
            return Err(ShiftError::InvalidOversample {
                oversample: self.oversample,
                frame_size: self.frame_size,
            });
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ShiftError::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }

    /// Hop size between consecutive frames
    #[inline]
    pub fn step_size(&self) -> usize {
        self.frame_size / self.oversample
    }

    /// Offset between the input write cursor and the output read position
    #[inline]
    pub fn fifo_latency(&self) -> usize {
        self.frame_size - self.step_size()
    }

    /// Width of one FFT bin in Hz
    #[inline]
    pub fn bin_width(&self) -> f32 {
        self.sample_rate / self.frame_size as f32
    }
}

/// Convert a shift in semitones to a pitch ratio (12 semitones = 2.0)
#[inline]
pub fn semitones_to_ratio(semitones: f64) -> f64 {
    2.0f64.powf(semitones / 12.0)
}
