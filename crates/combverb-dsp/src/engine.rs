/// Complete reverb: pre-filter -> comb bank -> allpass diffuser, one sample
/// at a time.
///
/// `ReverbEngine` borrows three caller-owned stores for its whole life and
/// never allocates. Every `process` call does the same fixed amount of work:
/// one 9-tap FIR, four FIR-tapped comb lines, `AP_STAGES` allpass steps.
///
/// Hosts that don't manage their own memory can use `ReverbStorage`, which
/// allocates the three stores once, sized from the configuration.

use crate::allpass::AllpassDiffuser;
use crate::comb_bank::CombBank;
use crate::config::{AP_PAIRS, COMB_LINES, ReverbConfig, StorageLayout};
use crate::pre_filter::PreFilter;

pub struct ReverbEngine<'a> {
    pre: PreFilter<'a>,
    comb: CombBank<'a>,
    diffuser: AllpassDiffuser<'a, AP_PAIRS>,
}

impl<'a> ReverbEngine<'a> {
    /// Build an engine over caller-owned stores.
    ///
    /// - `pre`: power of two, at least `FIR_TAPS` samples
    /// - `comb`: `COMB_LINES` power-of-two lines, each >= max comb delay + 4
    /// - `allpass`: `AP_STAGES` power-of-two lines, each >= max allpass delay
    ///
    /// All stores are zeroed. A configuration that fails
    /// `ReverbConfig::validate` against these stores trips a debug assertion;
    /// release builds log it and carry on with an unstable instance.
    pub fn new(
        pre: &'a mut [f32],
        comb: &'a mut [f32],
        allpass: &'a mut [f32],
        config: &ReverbConfig,
    ) -> Self {
        let layout = StorageLayout::from_lengths(pre.len(), comb.len(), allpass.len());
        let validation = config.validate(&layout);
        if let Err(err) = &validation {
            log::error!("reverb misconfigured: {err}");
        }
        debug_assert!(validation.is_ok(), "misconfigured reverb: {validation:?}");

        log::debug!(
            "reverb engine: comb delays {:?}, allpass delays {:?} ({:?}), {} samples of storage",
            config.comb.map(|l| l.delay),
            config.allpass.map(|s| s.delay),
            config.topology,
            layout.total_len()
        );

        Self {
            pre: PreFilter::new(pre),
            comb: CombBank::new(comb, config.comb, config.comb_kernels),
            diffuser: AllpassDiffuser::new(allpass, &config.allpass, config.topology),
        }
    }

    /// One mono sample in, one reverberated sample out.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let conditioned = self.pre.process(x);
        let combed = self.comb.process(conditioned);
        self.diffuser.process(combed)
    }

    /// Stereo frame in, summed to mono ahead of the pre-filter.
    #[inline]
    pub fn process_frame(&mut self, left: f32, right: f32) -> f32 {
        self.process(left + right)
    }

    /// Process `buffer` in place.
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Raw comb taps from the last sample; see `CombBank::taps`.
    pub fn comb_taps(&self) -> &[f32; COMB_LINES] {
        self.comb.taps()
    }

    /// Silence every line and rewind all cursors.
    pub fn reset(&mut self) {
        self.pre.reset();
        self.comb.reset();
        self.diffuser.reset();
    }
}

/// Host-side owner of the three backing stores.
pub struct ReverbStorage {
    pre: Vec<f32>,
    comb: Vec<f32>,
    allpass: Vec<f32>,
}

impl ReverbStorage {
    pub fn new(layout: StorageLayout) -> Self {
        Self {
            pre: vec![0.0; layout.pre_capacity],
            comb: vec![0.0; layout.comb_len()],
            allpass: vec![0.0; layout.allpass_len()],
        }
    }

    /// Minimal storage for `config`.
    pub fn for_config(config: &ReverbConfig) -> Self {
        Self::new(StorageLayout::for_config(config))
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::from_lengths(self.pre.len(), self.comb.len(), self.allpass.len())
    }

    /// Lend the stores to a new engine. History starts silent.
    pub fn engine(&mut self, config: &ReverbConfig) -> ReverbEngine<'_> {
        ReverbEngine::new(&mut self.pre, &mut self.comb, &mut self.allpass, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AllpassTopology, LineTuning};

    fn impulse(engine: &mut ReverbEngine<'_>, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| engine.process(if n == 0 { 1.0 } else { 0.0 }))
            .collect()
    }

    #[test]
    fn test_engine_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ReverbEngine<'static>>();
    }

    #[test]
    fn test_storage_matches_layout() {
        let config = ReverbConfig::default();
        let storage = ReverbStorage::for_config(&config);
        assert_eq!(storage.layout(), StorageLayout::for_config(&config));
    }

    #[test]
    fn test_silence_in_silence_out() {
        let config = ReverbConfig::default();
        let mut storage = ReverbStorage::for_config(&config);
        let mut engine = storage.engine(&config);
        for _ in 0..10_000 {
            assert_eq!(engine.process(0.0), 0.0);
        }
    }

    #[test]
    fn test_nothing_before_first_comb_echo() {
        // Pre-filter and combs add no zero-delay path: the earliest energy
        // arrives at the shortest comb delay minus the half window.
        let config = ReverbConfig::default();
        let mut storage = ReverbStorage::for_config(&config);
        let mut engine = storage.engine(&config);
        let h = impulse(&mut engine, 2000);
        let first = h.iter().position(|&y| y != 0.0);
        assert_eq!(first, Some(1433 - 4));
    }

    #[test]
    fn test_zero_feedback_matches_stage_chain() {
        // With every gain at zero the engine is FIR -> FIR taps -> pure delay.
        let mut config = ReverbConfig::default().with_comb_gain(0.0).with_allpass_gain(0.0);
        config.comb = [
            LineTuning::new(20, 0.0),
            LineTuning::new(31, 0.0),
            LineTuning::new(45, 0.0),
            LineTuning::new(52, 0.0),
        ];
        let mut storage = ReverbStorage::for_config(&config);
        let mut engine = storage.engine(&config);
        let input: Vec<f32> = (0..4000).map(|n| ((n * 13) % 7) as f32 - 3.0).collect();
        let output: Vec<f32> = input.iter().map(|&x| engine.process(x)).collect();

        let mut pre_storage = [0.0f32; 16];
        let mut pre = PreFilter::new(&mut pre_storage);
        let mut comb_storage = vec![0.0f32; 64 * COMB_LINES];
        let mut comb = CombBank::new(&mut comb_storage, config.comb, config.comb_kernels);
        let delay = config.allpass_delay();
        for n in 0..output.len() {
            let staged = comb.process(pre.process(input[n]));
            if n + delay < output.len() {
                assert_eq!(output[n + delay], staged, "n={n}");
            }
        }
    }

    #[test]
    fn test_stereo_frame_sums_channels() {
        let config = ReverbConfig::default();
        let mut a = ReverbStorage::for_config(&config);
        let mut b = ReverbStorage::for_config(&config);
        let mut stereo = a.engine(&config);
        let mut mono = b.engine(&config);
        for n in 0..5000 {
            let l = ((n % 31) as f32 - 15.0) / 15.0;
            let r = ((n % 17) as f32 - 8.0) / 8.0;
            assert_eq!(stereo.process_frame(l, r), mono.process(l + r));
        }
    }

    #[test]
    fn test_block_matches_per_sample() {
        let config = ReverbConfig::default().with_topology(AllpassTopology::Series);
        let mut a = ReverbStorage::for_config(&config);
        let mut b = ReverbStorage::for_config(&config);
        let mut block_engine = a.engine(&config);
        let mut sample_engine = b.engine(&config);

        let input: Vec<f32> = (0..3000).map(|n| ((n * 7) % 11) as f32 / 11.0 - 0.5).collect();
        let mut block = input.clone();
        for chunk in block.chunks_mut(256) {
            block_engine.process_block(chunk);
        }
        let per_sample: Vec<f32> = input.iter().map(|&x| sample_engine.process(x)).collect();
        assert_eq!(block, per_sample);
    }

    #[test]
    fn test_reset_restores_initial_response() {
        let config = ReverbConfig::default();
        let mut storage = ReverbStorage::for_config(&config);
        let mut engine = storage.engine(&config);
        let first = impulse(&mut engine, 6000);
        engine.reset();
        let second = impulse(&mut engine, 6000);
        assert_eq!(first, second);
    }

    #[test]
    fn test_comb_taps_exposed() {
        let config = ReverbConfig::default();
        let mut storage = ReverbStorage::for_config(&config);
        let mut engine = storage.engine(&config);
        // Samples 0..1429 precede the first comb echo.
        let h = impulse(&mut engine, 1429);
        assert!(h.iter().all(|&y| y == 0.0));
        engine.process(0.0);
        assert!(engine.comb_taps()[0] != 0.0, "line 0 should be sounding");
        assert_eq!(engine.comb_taps()[3], 0.0, "line 3 is still silent");
    }

    #[test]
    #[should_panic(expected = "misconfigured reverb")]
    #[cfg(debug_assertions)]
    fn test_unstable_config_asserts() {
        let config = ReverbConfig::default().with_comb_gain(1.5);
        let mut storage = ReverbStorage::for_config(&config);
        let _ = storage.engine(&config);
    }
}
