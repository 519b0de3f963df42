/// Four parallel feedback comb lines with FIR-smoothed taps.
///
/// Each line reads a 9-sample window centred on its nominal delay and
/// lowpasses it, so both the output tap and the recirculated signal lose highs
/// on every pass:
///
///   tap[i]   = kernel[i] * window(delay[i] - 4 .. delay[i] + 4)
///   line[i] <- x + tap[i] * gain[i]
///   y        = tap[0] - tap[1] + tap[2] - tap[3]
///
/// The alternating signs keep the four resonance series from stacking into
/// one coloured peak. Stability needs `|gain[i]| * dc_gain(kernel[i]) < 1`;
/// that is checked when the configuration is validated, never here.
///
/// Storage is one arena of `COMB_LINES` equal power-of-two partitions.

use crate::config::{COMB_LINES, LineTuning};
use crate::kernels::{self, FIR_TAPS, FirKernel, HALF_WINDOW};
use crate::ring_buffer::{self, RingBuffer};

pub struct CombBank<'a> {
    lines: [RingBuffer<'a>; COMB_LINES],
    tuning: [LineTuning; COMB_LINES],
    kernels: [FirKernel; COMB_LINES],
    /// Last raw (unsigned) taps, kept for stereo derivation by the host.
    taps: [f32; COMB_LINES],
}

impl<'a> CombBank<'a> {
    /// `storage.len()` must be `COMB_LINES` times a power of two, and each
    /// line's capacity must cover its delay plus `HALF_WINDOW`.
    pub fn new(
        storage: &'a mut [f32],
        tuning: [LineTuning; COMB_LINES],
        kernels: [FirKernel; COMB_LINES],
    ) -> Self {
        let capacity = storage.len() / COMB_LINES;
        for line in &tuning {
            debug_assert!(
                line.delay > HALF_WINDOW && line.delay + HALF_WINDOW <= capacity,
                "comb delay {} outside {}..={}",
                line.delay,
                HALF_WINDOW + 1,
                capacity.saturating_sub(HALF_WINDOW)
            );
        }
        for kernel in &kernels {
            debug_assert!(kernels::is_symmetric(kernel), "comb kernel must be symmetric");
        }
        Self {
            lines: ring_buffer::split_equal::<COMB_LINES>(storage).map(RingBuffer::new),
            tuning,
            kernels,
            taps: [0.0; COMB_LINES],
        }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        for i in 0..COMB_LINES {
            let line = &mut self.lines[i];
            let LineTuning { delay, gain } = self.tuning[i];
            line.advance();
            let window = line.read_window::<FIR_TAPS>(delay - HALF_WINDOW);
            let tap = kernels::convolve_folded(&window, &self.kernels[i]);
            line.write(x + tap * gain);
            self.taps[i] = tap;
        }
        self.taps[0] - self.taps[1] + self.taps[2] - self.taps[3]
    }

    /// Raw per-line taps from the last `process` call.
    ///
    /// Stereo extension point: a second output can be formed from the
    /// inverted pairing (e.g. `tap[0] + tap[1] - tap[2] - tap[3]`); the core
    /// itself only produces the mono combination.
    pub fn taps(&self) -> &[f32; COMB_LINES] {
        &self.taps
    }

    pub fn tuning(&self) -> &[LineTuning; COMB_LINES] {
        &self.tuning
    }

    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        self.taps = [0.0; COMB_LINES];
    }
}
