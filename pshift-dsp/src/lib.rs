//! Pitch-shifting engine for pshift
//!
//! Duration-preserving pitch shifting of mono audio with a phase vocoder:
//! - Shifter: engine object, one-call helpers, scheduler and vocoder
//! - Params: frame size, oversampling, sample rate, normalization, lifecycle
//! - Error: contract violations rejected at construction

mod error;
mod params;
pub mod shifter;

pub use error::ShiftError;
pub use params::{
    semitones_to_ratio, Lifecycle, Normalization, ShiftParams, DEFAULT_FRAME_SIZE,
    DEFAULT_OVERSAMPLE, DEFAULT_SAMPLE_RATE, MAX_FRAME_LENGTH, REFERENCE_RATIO_RANGE,
};
pub use shifter::{pitch_shift_frame, shift_pitch, PitchShifter};
