/// Power-of-two circular sample storage shared by every reverb stage.
///
/// The buffer borrows caller-owned memory; it never allocates. Writing happens
/// at `cursor` ("age zero") and positive offsets reach progressively older
/// history:
///
///   advance() -> write(x) -> read_at(k) == x[n - k]
///
/// The cursor moves backward, so a read at offset `k` taken before this step's
/// write returns the sample written `k` steps ago.

pub struct RingBuffer<'a> {
    samples: &'a mut [f32],
    mask: usize,
    cursor: usize,
}

impl<'a> RingBuffer<'a> {
    /// Wrap `samples` as a ring. The slice length is the capacity and must be a
    /// power of two. History is zero-filled.
    pub fn new(samples: &'a mut [f32]) -> Self {
        debug_assert!(
            samples.len().is_power_of_two(),
            "ring buffer capacity {} is not a power of two",
            samples.len()
        );
        samples.fill(0.0);
        let mask = samples.len().wrapping_sub(1);
        Self {
            samples,
            mask,
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Step one slot back in time. Call once per sample, before `write`.
    #[inline]
    pub fn advance(&mut self) {
        self.cursor = self.cursor.wrapping_sub(1) & self.mask;
    }

    #[inline]
    pub fn write(&mut self, value: f32) {
        self.samples[self.cursor] = value;
    }

    /// Exact point read `offset` slots from the cursor, no interpolation.
    #[inline]
    pub fn read_at(&self, offset: usize) -> f32 {
        self.samples[self.cursor.wrapping_add(offset) & self.mask]
    }

    /// `N` consecutive samples starting `base` slots from the cursor, ordered
    /// from newest to oldest. Returned by value for FIR convolution.
    #[inline]
    pub fn read_window<const N: usize>(&self, base: usize) -> [f32; N] {
        std::array::from_fn(|k| self.read_at(base.wrapping_add(k)))
    }

    /// Silence the history and return the cursor to slot 0.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
        self.cursor = 0;
    }
}

/// Partition one arena into `N` equal, non-overlapping slices.
///
/// Multi-line stages keep all their lines in one contiguous allocation; this is
/// how they hand each line its own slice. Any remainder past `N * (len / N)` is
/// left unused.
pub fn split_equal<const N: usize>(storage: &mut [f32]) -> [&mut [f32]; N] {
    debug_assert!(N > 0, "cannot split storage into zero lines");
    debug_assert!(
        storage.len() % N == 0,
        "storage length {} does not divide into {N} lines",
        storage.len()
    );
    let line_len = storage.len() / N;
    let mut rest = storage;
    std::array::from_fn(|_| {
        let remaining = std::mem::take(&mut rest);
        let (line, tail) = remaining.split_at_mut(line_len);
        rest = tail;
        line
    })
}
