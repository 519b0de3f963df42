//! combverb DSP library: FIR-tapped comb bank + nested allpass reverb.
//!
//! Pure DSP with no audio framework dependencies. The engine borrows
//! caller-owned delay storage and processes one sample per call without
//! allocating.

// Delay storage and fixed FIR kernels
pub mod kernels;
pub mod ring_buffer;

// Signal chain stages
pub mod allpass;
pub mod comb_bank;
pub mod pre_filter;

// Engine, tuning, configuration errors
pub mod config;
pub mod engine;
pub mod error;

pub use config::{AllpassTopology, CombVoicing, LineTuning, ReverbConfig, StorageLayout};
pub use engine::{ReverbEngine, ReverbStorage};
pub use error::ConfigError;
