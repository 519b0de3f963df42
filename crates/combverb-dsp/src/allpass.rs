/// Allpass diffusion: nested (outer, inner) allpass pairs in cascade.
///
/// One stateless primitive does all the work. For a line with delay `d` and
/// gain `g`:
///
///   z    = line[n - d]            (after advance, before write)
///   feed = in - z * g
///   line <- feed
///   out  = z + feed * g
///
/// A nested pair runs the same primitive on the outer line, but the outer tap
/// is first diffused through the inner line before it is used. That doubles
/// the echo density per pair without adding a stage to the visible cascade.
/// Every stage is lossless for `|g| < 1`, whatever its delay.

use crate::config::{AllpassTopology, LineTuning};
use crate::ring_buffer::{self, RingBuffer};

/// Single allpass step on `line`; the line is advanced and written.
#[inline]
pub fn allpass(input: f32, line: &mut RingBuffer<'_>, tuning: LineTuning) -> f32 {
    allpass_refined(input, line, tuning, |z| z)
}

/// Allpass step whose delayed tap passes through `refine` before use.
///
/// `refine` runs after this line has advanced and before it is written, so a
/// nested stage can be slotted in as the closure.
#[inline]
pub fn allpass_refined(
    input: f32,
    line: &mut RingBuffer<'_>,
    tuning: LineTuning,
    refine: impl FnOnce(f32) -> f32,
) -> f32 {
    line.advance();
    let z = refine(line.read_at(tuning.delay));
    let feed = input - z * tuning.gain;
    line.write(feed);
    z + feed * tuning.gain
}

/// Two allpass lines processed as one nested unit.
struct NestedPair<'a> {
    outer: RingBuffer<'a>,
    inner: RingBuffer<'a>,
    outer_tuning: LineTuning,
    inner_tuning: LineTuning,
}

impl NestedPair<'_> {
    #[inline]
    fn process_nested(&mut self, input: f32) -> f32 {
        let inner = &mut self.inner;
        let inner_tuning = self.inner_tuning;
        allpass_refined(input, &mut self.outer, self.outer_tuning, |z| {
            allpass(z, inner, inner_tuning)
        })
    }

    #[inline]
    fn process_series(&mut self, input: f32) -> f32 {
        let y = allpass(input, &mut self.outer, self.outer_tuning);
        allpass(y, &mut self.inner, self.inner_tuning)
    }

    fn reset(&mut self) {
        self.outer.clear();
        self.inner.clear();
    }
}

/// Cascade of `PAIRS` allpass pairs (`2 * PAIRS` stages).
///
/// Parameterising by pair count keeps the stage count even by construction.
pub struct AllpassDiffuser<'a, const PAIRS: usize> {
    pairs: [NestedPair<'a>; PAIRS],
    topology: AllpassTopology,
}

impl<'a, const PAIRS: usize> AllpassDiffuser<'a, PAIRS> {
    /// `storage` is split into `2 * PAIRS` equal power-of-two lines, each at
    /// least as long as the largest stage delay. `stages[2p]` is the outer and
    /// `stages[2p + 1]` the inner stage of pair `p`.
    pub fn new(
        storage: &'a mut [f32],
        stages: &[LineTuning],
        topology: AllpassTopology,
    ) -> Self {
        const { assert!(PAIRS > 0, "diffuser needs at least one allpass pair") };
        debug_assert_eq!(
            stages.len(),
            2 * PAIRS,
            "expected {} allpass stages, got {}",
            2 * PAIRS,
            stages.len()
        );
        let capacity = storage.len() / (2 * PAIRS);
        for stage in stages {
            debug_assert!(
                stage.delay >= 1 && stage.delay <= capacity,
                "allpass delay {} outside 1..={capacity}",
                stage.delay
            );
            debug_assert!(stage.gain.abs() < 1.0, "allpass gain {} unstable", stage.gain);
        }

        let mut p = 0;
        let pairs = ring_buffer::split_equal::<PAIRS>(storage).map(|pair_storage| {
            let (outer, inner) = pair_storage.split_at_mut(pair_storage.len() / 2);
            let pair = NestedPair {
                outer: RingBuffer::new(outer),
                inner: RingBuffer::new(inner),
                outer_tuning: stages[2 * p],
                inner_tuning: stages[2 * p + 1],
            };
            p += 1;
            pair
        });
        Self { pairs, topology }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let mut y = x;
        match self.topology {
            AllpassTopology::Nested => {
                for pair in &mut self.pairs {
                    y = pair.process_nested(y);
                }
            }
            AllpassTopology::Series => {
                for pair in &mut self.pairs {
                    y = pair.process_series(y);
                }
            }
        }
        y
    }

    pub fn topology(&self) -> AllpassTopology {
        self.topology
    }

    pub fn reset(&mut self) {
        for pair in &mut self.pairs {
            pair.reset();
        }
    }
}
