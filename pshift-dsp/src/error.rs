//! Contract violations rejected before any processing happens

use thiserror::Error;

/// Errors raised when engine parameters or buffers break the engine's contract
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShiftError {
    #[error("frame size must be a power of two of at least 2, got {0}")]
    InvalidFrameSize(usize),
    #[error("frame size {size} exceeds the maximum frame length of {max}")]
    FrameSizeTooLarge { size: usize, max: usize },
    #[error("oversampling factor must be between 1 and the frame size ({frame_size}), got {oversample}")]
    InvalidOversample { oversample: usize, frame_size: usize },
    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),
    #[error("sample count {count} exceeds input length {len}")]
    SampleCountOutOfRange { count: usize, len: usize },
    #[error("output length {output} does not match input length {input}")]
    LengthMismatch { input: usize, output: usize },
}
