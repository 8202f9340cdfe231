//! Duration-preserving pitch shifting for mono buffers.
//!
//! A [`PitchShifter`] owns every working buffer it needs, sized once from
//! its [`ShiftParams`]. Samples pass through a sliding-window scheduler;
//! each time a full frame has been collected it goes through the phase
//! vocoder and the result is overlap-added back into the output stream.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pshift_dsp::{PitchShifter, ShiftParams};
//!
//! let mut shifter = PitchShifter::new(ShiftParams::default())?;
//! shifter.set_ratio(1.5); // a fifth up, same duration
//! shifter.process_in_place(&mut samples);
//! ```
//!
//! # Latency
//!
//! The first hop of output is silence. A processed input sample comes out
//! [`PitchShifter::latency`] (= frame size) samples later: the scheduler's
//! fifo offset of `N - hop` plus the hop it waits before draining a frame.
//!
//! # Lifecycle
//!
//! With [`Lifecycle::PerCall`] (the default) every `process` call starts from
//! zeroed state, so calls are independent and repeatable. With
//! [`Lifecycle::Streaming`] state carries over and contiguous chunks
//! produce exactly what one call over their concatenation would.

mod fft;
mod fifo;
mod phase;

pub use fft::{Complex, Direction, Fft};

use tracing::{debug, trace, warn};

use crate::error::ShiftError;
use crate::params::{semitones_to_ratio, Lifecycle, ShiftParams, REFERENCE_RATIO_RANGE};
use fifo::FrameFifo;
use phase::PhaseVocoder;

/// Phase-vocoder pitch shifter for one mono signal
pub struct PitchShifter {
    params: ShiftParams,
    /// Pitch ratio (1.0 = unchanged, 2.0 = octave up)
    ratio: f64,
    fft: Fft,
    fifo: FrameFifo,
    vocoder: PhaseVocoder,
}

impl PitchShifter {
    /// Create a pitch shifter, rejecting parameters the engine cannot run
    pub fn new(params: ShiftParams) -> Result<Self, ShiftError> {
        params.validate()?;
        let fft = Fft::new(params.frame_size)?;
        let step_size = params.step_size();

        debug!(
            frame_size = params.frame_size,
            oversample = params.oversample,
            step_size,
            sample_rate = params.sample_rate,
            normalization = ?params.normalization,
            lifecycle = ?params.lifecycle,
            "pitch shifter created"
        );

        Ok(Self {
            params,
            ratio: 1.0,
            fft,
            fifo: FrameFifo::new(params.frame_size, step_size),
            vocoder: PhaseVocoder::new(&params),
        })
    }

    /// Set the pitch ratio. Ratios outside 0.5..=2.0 are accepted; bins
    /// scaled past Nyquist lose their energy.
    pub fn set_ratio(&mut self, ratio: f64) {
        if !REFERENCE_RATIO_RANGE.contains(&ratio) {
            warn!(
                ratio,
                "pitch ratio outside 0.5..=2.0, bins shifted past Nyquist will be dropped"
            );
        }
        self.ratio = ratio;
    }

    /// Set the pitch shift in semitones
    pub fn set_semitones(&mut self, semitones: f64) {
        self.set_ratio(semitones_to_ratio(semitones));
    }

    #[inline]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    #[inline]
    pub fn params(&self) -> &ShiftParams {
        &self.params
    }

    #[inline]
    pub fn frame_size(&self) -> usize {
        self.params.frame_size
    }

    /// Hop between frames
    #[inline]
    pub fn step_size(&self) -> usize {
        self.params.step_size()
    }

    /// Scheduler offset between write cursor and read position (`N - hop`)
    #[inline]
    pub fn fifo_latency(&self) -> usize {
        self.fifo.latency()
    }

    /// Delay from an input sample to its processed output, in samples
    #[inline]
    pub fn latency(&self) -> usize {
        self.params.frame_size
    }

    /// Shift `input` into `output`. Both slices must have the same length.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), ShiftError> {
        if input.len() != output.len() {
            return Err(ShiftError::LengthMismatch {
                input: input.len(),
                output: output.len(),
            });
        }

        self.begin_call();
        for (&x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.tick(x);
        }
        Ok(())
    }

    /// Shift `buffer` in place
    pub fn process_in_place(&mut self, buffer: &mut [f32]) {
        self.begin_call();
        for sample in buffer.iter_mut() {
            *sample = self.tick(*sample);
        }
    }

    /// Zero all working state and realign frames to the start of the next
    /// sample
    pub fn reset(&mut self) {
        self.fifo.reset();
        self.vocoder.reset();
    }

    fn begin_call(&mut self) {
        if self.params.lifecycle == Lifecycle::PerCall {
            trace!("resetting pitch shifter state for new call");
            self.reset();
        }
    }

    #[inline]
    fn tick(&mut self, sample: f32) -> f32 {
        let out = self.fifo.push(sample);

        if self.fifo.frame_ready() {
            let (frame, accum) = self.fifo.frame_and_accumulator();
            self.vocoder
                .process_frame(&self.fft, frame, accum, self.ratio);
            self.fifo.advance();
        }

        out
    }
}

/// Pitch-shift a mono buffer in place with the default frame size (1024),
/// oversampling (10) and sample rate (44100 Hz).
pub fn shift_pitch(buffer: &mut [f32], ratio: f64) -> Result<(), ShiftError> {
    let mut shifter = PitchShifter::new(ShiftParams::default())?;
    shifter.set_ratio(ratio);
    shifter.process_in_place(buffer);
    Ok(())
}

/// Pitch-shift the first `sample_count` samples of `input`.
///
/// Returns exactly `sample_count` samples. Uses a fresh engine, so repeated
/// calls with the same arguments give bit-identical results.
pub fn pitch_shift_frame(
    ratio: f64,
    sample_count: usize,
    frame_size: usize,
    oversample: usize,
    sample_rate: f32,
    input: &[f32],
) -> Result<Vec<f32>, ShiftError> {
    if sample_count > input.len() {
        return Err(ShiftError::SampleCountOutOfRange {
            count: sample_count,
            len: input.len(),
        });
    }

    let mut shifter = PitchShifter::new(ShiftParams {
        frame_size,
        oversample,
        sample_rate,
        ..Default::default()
    })?;
    shifter.set_ratio(ratio);

    let mut output = input[..sample_count].to_vec();
    shifter.process_in_place(&mut output);
    Ok(output)
}
