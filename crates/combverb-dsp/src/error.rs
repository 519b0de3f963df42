//! Configuration errors.
//!
//! Nothing on the per-sample path can fail; every error here describes a
//! tuning or storage layout that would make an engine unstable or read outside
//! its history.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{stage} capacity {capacity} is not a power of two")]
    CapacityNotPowerOfTwo { stage: &'static str, capacity: usize },

    #[error("pre-filter capacity {capacity} cannot hold the {window}-tap window")]
    PreFilterTooSmall { capacity: usize, window: usize },

    #[error("comb line {line}: delay {delay} is shorter than the minimum {min}")]
    CombDelayTooShort { line: usize, delay: usize, min: usize },

    #[error("comb line {line}: delay {delay} plus FIR half-window exceeds capacity {capacity}")]
    CombDelayExceedsCapacity {
        line: usize,
        delay: usize,
        capacity: usize,
    },

    #[error("allpass stage {stage}: delay {delay} outside 1..={capacity}")]
    AllpassDelayOutOfRange {
        stage: usize,
        delay: usize,
        capacity: usize,
    },

    #[error("comb line {line}: loop gain {loop_gain} (feedback {gain}) must stay below 1")]
    UnstableCombGain { line: usize, gain: f32, loop_gain: f32 },

    #[error("allpass stage {stage}: feedback {gain} must satisfy |g| < 1")]
    UnstableAllpassGain { stage: usize, gain: f32 },

    #[error("comb line {line}: kernel is not symmetric")]
    AsymmetricKernel { line: usize },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
