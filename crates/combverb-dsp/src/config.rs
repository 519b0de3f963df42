/// Reverb tuning data and backing-storage layout.
///
/// The engine never derives these itself: a host maps its controls to delays
/// and gains, sizes the storage with `StorageLayout`, and may check the result
/// with `ReverbConfig::validate` before building an engine.

use crate::error::{ConfigError, ConfigResult};
use crate::kernels::{self, FIR_TAPS, FirKernel, HALF_WINDOW, SHARED_COMB_KERNEL, VOICED_COMB_KERNELS};

pub const COMB_LINES: usize = 4;
pub const AP_PAIRS: usize = 3;
/// Allpass stages, processed as `AP_PAIRS` nested (outer, inner) pairs.
pub const AP_STAGES: usize = AP_PAIRS * 2;

const _: () = assert!(AP_STAGES % 2 == 0, "allpass stages must pair up");

/// Smallest power of two that holds the pre-filter window.
pub const PRE_FILTER_CAPACITY: usize = FIR_TAPS.next_power_of_two();

/// Delay (samples) and feedback gain of one recursive line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineTuning {
    pub delay: usize,
    pub gain: f32,
}

impl LineTuning {
    pub const fn new(delay: usize, gain: f32) -> Self {
        Self { delay, gain }
    }
}

/// How the allpass stages are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum AllpassTopology {
    /// Each pair's outer tap is diffused through the inner stage before use.
    #[default]
    Nested,
    /// Plain cascade: every stage in order, no nesting.
    Series,
}

/// Which kernel table the comb lines use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CombVoicing {
    /// One lowpass kernel on every comb line
    #[default]
    Shared,
    /// Progressively darker kernel per comb line
    Voiced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReverbConfig {
    pub comb: [LineTuning; COMB_LINES],
    /// Flat per-stage tuning; stages `2p` and `2p + 1` form pair `p`.
    pub allpass: [LineTuning; AP_STAGES],
    pub comb_kernels: [FirKernel; COMB_LINES],
    pub topology: AllpassTopology,
}

impl Default for ReverbConfig {
    /// Medium room at 48 kHz: ~30-43 ms comb loops, under a second to -60 dB.
    fn default() -> Self {
        Self {
            comb: [
                LineTuning::new(1433, 0.84),
                LineTuning::new(1601, 0.82),
                LineTuning::new(1867, 0.80),
                LineTuning::new(2053, 0.78),
            ],
            allpass: [
                LineTuning::new(347, 0.6),
                LineTuning::new(113, 0.5),
                LineTuning::new(241, 0.6),
                LineTuning::new(79, 0.5),
                LineTuning::new(173, 0.6),
                LineTuning::new(37, 0.5),
            ],
            comb_kernels: [SHARED_COMB_KERNEL; COMB_LINES],
            topology: AllpassTopology::Nested,
        }
    }
}

impl ReverbConfig {
    pub fn with_comb_gain(mut self, gain: f32) -> Self {
        for line in &mut self.comb {
            line.gain = gain;
        }
        self
    }

    pub fn with_allpass_gain(mut self, gain: f32) -> Self {
        for stage in &mut self.allpass {
            stage.gain = gain;
        }
        self
    }

    pub fn with_voiced_kernels(mut self) -> Self {
        self.comb_kernels = VOICED_COMB_KERNELS;
        self
    }

    pub fn with_voicing(mut self, voicing: CombVoicing) -> Self {
        self.comb_kernels = match voicing {
            CombVoicing::Shared => [SHARED_COMB_KERNEL; COMB_LINES],
            CombVoicing::Voiced => VOICED_COMB_KERNELS,
        };
        self
    }

    /// Apply optional uniform gain overrides, as host controls supply them.
    pub fn with_gain_overrides(self, comb: Option<f32>, allpass: Option<f32>) -> Self {
        let config = match comb {
            Some(g) => self.with_comb_gain(g),
            None => self,
        };
        match allpass {
            Some(g) => config.with_allpass_gain(g),
            None => config,
        }
    }

    pub fn with_topology(mut self, topology: AllpassTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Sum of every allpass delay: the diffuser's latency when all gains are 0.
    pub fn allpass_delay(&self) -> usize {
        self.allpass.iter().map(|s| s.delay).sum()
    }

    /// Sum of all configured delay lengths, comb and allpass.
    pub fn total_delay(&self) -> usize {
        self.comb.iter().map(|l| l.delay).sum::<usize>() + self.allpass_delay()
    }

    /// Check every precondition the per-sample path relies on.
    pub fn validate(&self, layout: &StorageLayout) -> ConfigResult<()> {
        layout.validate()?;

        for (line, (tuning, kernel)) in self.comb.iter().zip(&self.comb_kernels).enumerate() {
            if !kernels::is_symmetric(kernel) {
                return Err(ConfigError::AsymmetricKernel { line });
            }
            // The window's newest tap must already be history when it is read.
            let min = HALF_WINDOW + 1;
            if tuning.delay < min {
                return Err(ConfigError::CombDelayTooShort {
                    line,
                    delay: tuning.delay,
                    min,
                });
            }
            if tuning.delay + HALF_WINDOW > layout.comb_line_capacity {
                return Err(ConfigError::CombDelayExceedsCapacity {
                    line,
                    delay: tuning.delay,
                    capacity: layout.comb_line_capacity,
                });
            }
            let loop_gain = tuning.gain.abs() * kernels::dc_gain(kernel).abs();
            if !is_stable_gain(tuning.gain) || !is_stable_gain(loop_gain) {
                return Err(ConfigError::UnstableCombGain {
                    line,
                    gain: tuning.gain,
                    loop_gain,
                });
            }
        }

        for (stage, tuning) in self.allpass.iter().enumerate() {
            if tuning.delay == 0 || tuning.delay > layout.allpass_line_capacity {
                return Err(ConfigError::AllpassDelayOutOfRange {
                    stage,
                    delay: tuning.delay,
                    capacity: layout.allpass_line_capacity,
                });
            }
            if !is_stable_gain(tuning.gain) {
                return Err(ConfigError::UnstableAllpassGain {
                    stage,
                    gain: tuning.gain,
                });
            }
        }

        Ok(())
    }
}

/// `|g| < 1`, rejecting NaN.
fn is_stable_gain(gain: f32) -> bool {
    gain.abs() < 1.0
}

/// Capacities of the three backing stores an engine borrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageLayout {
    pub pre_capacity: usize,
    /// Per-line capacity; the comb store holds `COMB_LINES` of these.
    pub comb_line_capacity: usize,
    /// Per-stage capacity; the allpass store holds `AP_STAGES` of these.
    pub allpass_line_capacity: usize,
}

impl StorageLayout {
    /// Smallest power-of-two layout that fits `config`.
    pub fn for_config(config: &ReverbConfig) -> Self {
        let max_comb = config.comb.iter().map(|l| l.delay).max().unwrap_or(0);
        let max_allpass = config.allpass.iter().map(|s| s.delay).max().unwrap_or(0);
        Self {
            pre_capacity: PRE_FILTER_CAPACITY,
            comb_line_capacity: (max_comb + HALF_WINDOW).next_power_of_two(),
            allpass_line_capacity: max_allpass.max(1).next_power_of_two(),
        }
    }

    /// Recover the layout from the lengths of caller-supplied stores.
    pub fn from_lengths(pre_len: usize, comb_len: usize, allpass_len: usize) -> Self {
        Self {
            pre_capacity: pre_len,
            comb_line_capacity: comb_len / COMB_LINES,
            allpass_line_capacity: allpass_len / AP_STAGES,
        }
    }

    pub fn comb_len(&self) -> usize {
        self.comb_line_capacity * COMB_LINES
    }

    pub fn allpass_len(&self) -> usize {
        self.allpass_line_capacity * AP_STAGES
    }

    /// Total samples across all three stores.
    pub fn total_len(&self) -> usize {
        self.pre_capacity + self.comb_len() + self.allpass_len()
    }

    fn validate(&self) -> ConfigResult<()> {
        let stores = [
            ("pre-filter", self.pre_capacity),
            ("comb line", self.comb_line_capacity),
            ("allpass stage", self.allpass_line_capacity),
        ];
        for (stage, capacity) in stores {
            if !capacity.is_power_of_two() {
                return Err(ConfigError::CapacityNotPowerOfTwo { stage, capacity });
            }
        }
        if self.pre_capacity < FIR_TAPS {
            return Err(ConfigError::PreFilterTooSmall {
                capacity: self.pre_capacity,
                window: FIR_TAPS,
            });
        }
        Ok(())
    }
}
