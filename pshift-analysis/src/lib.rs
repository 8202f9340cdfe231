//! Signal analysis for pshift
//!
//! Provides test-tone generation, level measurement and FFT peak
//! detection for checking what a pitch shift actually did.

mod signal;
mod spectrum;

pub use signal::{peak_level, rms, sine};
pub use spectrum::SpectrumAnalyzer;
