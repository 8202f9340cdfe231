//! In-place radix-2 FFT over interleaved complex buffers.
//!
//! Features:
//! - Decimation-in-time with a pre-computed bit-reversal table
//! - Pre-computed twiddle factors for both directions (no runtime trig)
//! - Zero-allocation `transform`
//!
//! The inverse transform is unnormalized: forward followed by inverse scales
//! every value by N. Callers fold the 1/N into their own output scaling.

use std::f64::consts::PI;

use crate::error::ShiftError;

/// Transform direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Twiddle sign -1
    Forward,
    /// Twiddle sign +1, not divided by N
    Inverse,
}

impl Direction {
    #[inline]
    fn sign(self) -> f64 {
        match self {
            Direction::Forward => -1.0,
            Direction::Inverse => 1.0,
        }
    }
}

/// Complex number. A `[Complex]` of length N has the layout of a 2N
/// interleaved (re, im) float buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    #[inline(always)]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    #[inline(always)]
    pub fn from_polar(magnitude: f64, phase: f64) -> Self {
        let (sin, cos) = phase.sin_cos();
        Self {
            re: magnitude * cos,
            im: magnitude * sin,
        }
    }

    #[inline(always)]
    pub fn magnitude(self) -> f64 {
        (self.re * self.re + self.im * self.im).sqrt()
    }

    #[inline(always)]
    pub fn phase(self) -> f64 {
        self.im.atan2(self.re)
    }

    #[inline(always)]
    pub fn mul(self, other: Self) -> Self {
        Self {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }

    #[inline(always)]
    pub fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }

    #[inline(always)]
    pub fn sub(self, other: Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }
}

/// Radix-2 FFT for one fixed power-of-two size
pub struct Fft {
    /// Transform size in complex samples
    size: usize,
    /// e^(-2πik/N) for k in 0..N/2
    twiddles: Vec<Complex>,
    /// e^(+2πik/N) for k in 0..N/2
    twiddles_inv: Vec<Complex>,
    /// Bit-reversal permutation table
    bit_rev: Vec<usize>,
}

impl Fft {
    /// Create an FFT of `size` complex samples. `size` must be a power of
    /// two and at least 2.
    pub fn new(size: usize) -> Result<Self, ShiftError> {
        if size < 2 || !size.is_power_of_two() {
            return Err(ShiftError::InvalidFrameSize(size));
        }
        let log2_size = size.trailing_zeros();

        Ok(Self {
            size,
            twiddles: Self::compute_twiddles(size, Direction::Forward),
            twiddles_inv: Self::compute_twiddles(size, Direction::Inverse),
            bit_rev: Self::compute_bit_reversal(size, log2_size),
        })
    }

    fn compute_twiddles(size: usize, direction: Direction) -> Vec<Complex> {
        let sign = direction.sign();
        (0..size / 2)
            .map(|k| {
                let angle = sign * 2.0 * PI * k as f64 / size as f64;
                let (sin, cos) = angle.sin_cos();
                Complex::new(cos, sin)
            })
            .collect()
    }

    fn compute_bit_reversal(size: usize, log2_size: u32) -> Vec<usize> {
        (0..size)
            .map(|i| {
                let mut rev = 0;
                let mut n = i;
                for _ in 0..log2_size {
                    rev = (rev << 1) | (n & 1);
                    n >>= 1;
                }
                rev
            })
            .collect()
    }

    /// Transform size in complex samples
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Transform `buffer` in place. `buffer.len()` must equal `size()`.
    pub fn transform(&self, buffer: &mut [Complex], direction: Direction) {
        debug_assert_eq!(buffer.len(), self.size);
        let n = self.size;
        let twiddles = match direction {
            Direction::Forward => &self.twiddles,
            Direction::Inverse => &self.twiddles_inv,
        };

        // The first and last indices are their own bit reversal
        for i in 1..n - 1 {
            let j = self.bit_rev[i];
            if i < j {
                buffer.swap(i, j);
            }
        }

        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let step = n / len;

            for start in (0..n).step_by(len) {
                for j in 0..half {
                    let i = start + j;
                    let t = buffer[i + half].mul(twiddles[j * step]);
                    buffer[i + half] = buffer[i].sub(t);
                    buffer[i] = buffer[i].add(t);
                }
            }
            len *= 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_buffer(rng: &mut StdRng, n: usize) -> Vec<Complex> {
        (0..n)
            .map(|_| Complex::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect()
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        for size in [0, 1, 3, 6, 1000] {
            assert!(matches!(
                Fft::new(size),
                Err(ShiftError::InvalidFrameSize(s)) if s == size
            ));
        }
        assert_eq!(Fft::new(2).unwrap().size(), 2);
        assert_eq!(Fft::new(1024).unwrap().size(), 1024);
    }

    #[test]
    fn test_roundtrip_scales_by_n() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for log2 in 1..=12 {
            let n = 1usize << log2;
            let fft = Fft::new(n).unwrap();
            let original = random_buffer(&mut rng, n);
            let mut buffer = original.clone();

            fft.transform(&mut buffer, Direction::Forward);
            fft.transform(&mut buffer, Direction::Inverse);

            for (out, orig) in buffer.iter().zip(&original) {
                assert!((out.re - orig.re * n as f64).abs() < 1e-9 * n as f64);
                assert!((out.im - orig.im * n as f64).abs() < 1e-9 * n as f64);
            }
        }
    }

    #[test]
    fn test_forward_matches_rustfft() {
        use rustfft::num_complex::Complex64;
        use rustfft::FftPlanner;

        let mut rng = StdRng::seed_from_u64(42);
        let mut planner = FftPlanner::<f64>::new();

        for n in [2, 8, 64, 1024] {
            let fft = Fft::new(n).unwrap();
            let mut ours = random_buffer(&mut rng, n);
            let mut reference: Vec<Complex64> =
                ours.iter().map(|c| Complex64::new(c.re, c.im)).collect();

            fft.transform(&mut ours, Direction::Forward);
            planner.plan_fft_forward(n).process(&mut reference);

            for (a, b) in ours.iter().zip(&reference) {
                assert!((a.re - b.re).abs() < 1e-9, "n={} re {} vs {}", n, a.re, b.re);
                assert!((a.im - b.im).abs() < 1e-9, "n={} im {} vs {}", n, a.im, b.im);
            }
        }
    }

    #[test]
    fn test_impulse_has_flat_spectrum() {
        let fft = Fft::new(16).unwrap();
        let mut buffer = vec![Complex::default(); 16];
        buffer[0] = Complex::new(1.0, 0.0);

        fft.transform(&mut buffer, Direction::Forward);

        for bin in &buffer {
            assert!((bin.re - 1.0).abs() < 1e-12);
            assert!(bin.im.abs() < 1e-12);
        }
    }

    #[test]
    fn test_forward_sign_convention() {
        // e^(+2πi n/N) concentrates in bin 1 under the -1 forward sign
        let n = 32;
        let fft = Fft::new(n).unwrap();
        let mut buffer: Vec<Complex> = (0..n)
            .map(|i| Complex::from_polar(1.0, 2.0 * PI * i as f64 / n as f64))
            .collect();

        fft.transform(&mut buffer, Direction::Forward);

        assert!((buffer[1].re - n as f64).abs() < 1e-9);
        for (k, bin) in buffer.iter().enumerate().filter(|(k, _)| *k != 1) {
            assert!(bin.magnitude() < 1e-9, "leak into bin {}", k);
        }
    }
}
