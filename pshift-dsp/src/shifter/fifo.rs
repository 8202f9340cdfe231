//! Sliding-window frame scheduler.
//!
//! Input samples are written at a rotating cursor that starts at the fifo
//! latency (`N - hop`). Once the cursor reaches the frame size a frame is
//! ready: the caller takes `frame_and_accumulator()`, overlap-adds into it,
//! then calls `advance`, which drains one hop of finished output and slides
//! the input tail and accumulator left by one hop.
//!
//! The output sample for position i is read before any frame fired at i is
//! processed, so a caller may overwrite input[i] with it (in-place use).

pub struct FrameFifo {
    frame_size: usize,
    step_size: usize,
    /// Cursor reset position, `frame_size - step_size`
    latency: usize,
    /// Last `frame_size` input samples
    input: Vec<f32>,
    /// Finished samples waiting to be emitted
    output: Vec<f32>,
    /// Overlap-add accumulator (2N, upper half stays zero)
    accum: Vec<f64>,
    cursor: usize,
}

impl FrameFifo {
    pub fn new(frame_size: usize, step_size: usize) -> Self {
        debug_assert!(step_size >= 1 && step_size <= frame_size);
        let latency = frame_size - step_size;

        Self {
            frame_size,
            step_size,
            latency,
            input: vec![0.0; frame_size],
            output: vec![0.0; frame_size],
            accum: vec![0.0; frame_size * 2],
            cursor: latency,
        }
    }

    /// Write one input sample and return the output sample for the same
    /// position
    #[inline]
    pub fn push(&mut self, sample: f32) -> f32 {
        self.input[self.cursor] = sample;
        let out = self.output[self.cursor - self.latency];
        self.cursor += 1;
        out
    }

    /// True once a full frame has been collected
    #[inline]
    pub fn frame_ready(&self) -> bool {
        self.cursor >= self.frame_size
    }

    /// Current frame together with the live part of the accumulator
    #[inline]
    pub fn frame_and_accumulator(&mut self) -> (&[f32], &mut [f64]) {
        (self.input.as_slice(), &mut self.accum[..self.frame_size])
    }

    /// Emit one hop of accumulated output and slide the window
    pub fn advance(&mut self) {
        let n = self.frame_size;
        let step = self.step_size;

        for (out, acc) in self.output[..step].iter_mut().zip(&self.accum[..step]) {
            *out = *acc as f32;
        }
        self.accum.copy_within(step..step + n, 0);
        self.input.copy_within(step..n, 0);
        self.cursor = self.latency;
    }

    pub fn reset(&mut self) {
        self.input.fill(0.0);
        self.output.fill(0.0);
        self.accum.fill(0.0);
        self.cursor = self.latency;
    }

    #[inline]
    pub fn latency(&self) -> usize {
        self.latency
    }
}
