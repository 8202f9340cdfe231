//! Tone probe: shift a synthetic sine and measure what comes out

use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;
use pshift_analysis::{peak_level, rms, sine, SpectrumAnalyzer};
use pshift_dsp::{Normalization, PitchShifter};
use tracing::info;

use crate::config::{normalization_name, Settings};

/// Largest analysis window used for peak detection
const MAX_ANALYSIS_SIZE: usize = 16384;

/// Longest probe tone, one hour at 192 kHz
const MAX_TONE_SAMPLES: usize = 192_000 * 3600;

#[derive(Args)]
pub struct ProbeArgs {
    /// Tone frequency in Hz
    #[arg(long, default_value = "440.0")]
    frequency: f32,

    /// Pitch ratio (1.0 = unchanged) [default: 1.5]
    #[arg(long, conflicts_with = "semitones")]
    ratio: Option<f64>,

    /// Pitch shift in semitones instead of a ratio
    #[arg(long, allow_hyphen_values = true)]
    semitones: Option<f64>,

    /// Tone duration in seconds
    #[arg(long, default_value = "1.0", allow_hyphen_values = true)]
    duration: f32,

    /// Tone amplitude (0-1)
    #[arg(long, default_value = "0.5")]
    amplitude: f32,

    /// FFT frame size, overrides the saved setting
    #[arg(long)]
    frame_size: Option<usize>,

    /// Oversampling factor, overrides the saved setting
    #[arg(long)]
    oversample: Option<usize>,

    /// Sample rate in Hz, overrides the saved setting
    #[arg(long)]
    sample_rate: Option<f32>,

    /// Normalize output to unity gain
    #[arg(long)]
    unity_gain: bool,
}

pub fn run(args: ProbeArgs) -> Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    let mut params = settings.to_params();
    if let Some(frame_size) = args.frame_size {
        params.frame_size = frame_size;
    }
    if let Some(oversample) = args.oversample {
        params.oversample = oversample;
    }
    if let Some(sample_rate) = args.sample_rate {
        params.sample_rate = sample_rate;
    }
    if args.unity_gain {
        params.normalization = Normalization::UnityGain;
    }

    let mut shifter = PitchShifter::new(params).context("invalid engine parameters")?;
    match args.semitones {
        Some(semitones) => shifter.set_semitones(semitones),
        None => shifter.set_ratio(args.ratio.unwrap_or(1.5)),
    }
    let ratio = shifter.ratio();

    let len = tone_length(args.duration, params.sample_rate)?;
    let settle = 2 * shifter.latency();
    if len <= settle + 2 {
        bail!(
            "duration too short: need more than {} samples to settle, got {}",
            settle + 2,
            len
        );
    }

    let input = sine(args.frequency, params.sample_rate, len, args.amplitude);
    let mut output = input.clone();

    let started = Instant::now();
    shifter.process_in_place(&mut output);
    let elapsed = started.elapsed();
    info!(
        samples = len,
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "processed probe tone"
    );

    // Measure on the settled tail only
    let available = len - settle;
    let analysis_size = prev_power_of_two(available).min(MAX_ANALYSIS_SIZE);
    let mut analyzer = SpectrumAnalyzer::new(params.sample_rate, analysis_size);
    let measured_in = analyzer.dominant_frequency(&input[len - analysis_size..]);
    let measured_out = analyzer.dominant_frequency(&output[len - analysis_size..]);

    let expected = args.frequency * ratio as f32;
    let bin_width = params.bin_width();
    let tail = &output[settle..];

    println!("engine");
    println!("  frame size     {}", params.frame_size);
    println!("  oversample     {}", params.oversample);
    println!("  hop            {}", shifter.step_size());
    println!(
        "  latency        {} samples ({:.1} ms)",
        shifter.latency(),
        shifter.latency() as f32 * 1000.0 / params.sample_rate
    );
    println!("  normalization  {}", normalization_name(params.normalization));
    println!("tone");
    println!("  ratio          {:.4}", ratio);
    println!("  input          {}", format_hz(measured_in));
    println!("  expected       {:.1} Hz", expected);
    println!("  measured       {}", format_hz(measured_out));
    if let Some(measured) = measured_out {
        println!(
            "  error          {:.2} bins ({:.1} Hz per bin)",
            (measured - expected).abs() / bin_width,
            bin_width
        );
    }
    println!("  output peak    {:.4}", peak_level(tail));
    println!("  output rms     {:.4}", rms(tail));
    println!(
        "  processing     {:.2} ms ({:.0}x realtime)",
        elapsed.as_secs_f64() * 1000.0,
        args.duration as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    Ok(())
}

/// Number of samples in a tone of `duration` seconds
fn tone_length(duration: f32, sample_rate: f32) -> Result<usize> {
    if !duration.is_finite() || duration <= 0.0 {
        bail!("duration must be a positive number of seconds, got {}", duration);
    }
    let len = (duration as f64 * sample_rate as f64).round();
    if len > MAX_TONE_SAMPLES as f64 {
        bail!(
            "duration too long: {} samples, at most {} allowed",
            len,
            MAX_TONE_SAMPLES
        );
    }
    Ok(len as usize)
}

fn format_hz(freq: Option<f32>) -> String {
    match freq {
        Some(hz) => format!("{:.1} Hz", hz),
        None => "silent".to_string(),
    }
}

fn prev_power_of_two(n: usize) -> usize {
    debug_assert!(n > 0);
    1 << (usize::BITS - 1 - n.leading_zeros())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prev_power_of_two() {
        assert_eq!(prev_power_of_two(1), 1);
        assert_eq!(prev_power_of_two(1023), 512);
        assert_eq!(prev_power_of_two(1024), 1024);
        assert_eq!(prev_power_of_two(44100), 32768);
    }

    #[test]
    fn test_tone_length() {
        assert_eq!(tone_length(1.0, 44100.0).unwrap(), 44100);
        assert_eq!(tone_length(0.5, 48000.0).unwrap(), 24000);
    }

    #[test]
    fn test_tone_length_rejects_bad_durations() {
        for duration in [0.0, -1.0, f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = tone_length(duration, 44100.0).unwrap_err();
            assert!(err.to_string().contains("positive"), "{}", err);
        }
        let err = tone_length(1.0e9, 44100.0).unwrap_err();
        assert!(err.to_string().contains("too long"), "{}", err);
    }

    #[test]
    fn test_format_hz() {
        assert_eq!(format_hz(Some(660.04)), "660.0 Hz");
        assert_eq!(format_hz(None), "silent");
    }
}
