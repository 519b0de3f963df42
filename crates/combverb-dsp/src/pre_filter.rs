/// Input conditioning: 9-tap FIR high-pass ahead of the comb bank.
///
/// Strips DC and low rumble so the comb loops are not driven by energy they
/// would only smear into boom. Feed-forward, so always stable.

use crate::kernels::{self, FIR_TAPS, PRE_FILTER_KERNEL};
use crate::ring_buffer::RingBuffer;

pub struct PreFilter<'a> {
    line: RingBuffer<'a>,
}

impl<'a> PreFilter<'a> {
    /// `storage` must be a power of two of at least `FIR_TAPS` samples.
    pub fn new(storage: &'a mut [f32]) -> Self {
        debug_assert!(
            storage.len() >= FIR_TAPS,
            "pre-filter storage {} shorter than the {FIR_TAPS}-tap window",
            storage.len()
        );
        Self {
            line: RingBuffer::new(storage),
        }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        self.line.advance();
        self.line.write(x);
        let window = self.line.read_window::<FIR_TAPS>(0);
        kernels::convolve_folded(&window, &PRE_FILTER_KERNEL)
    }

    pub fn reset(&mut self) {
        self.line.clear();
    }
}
