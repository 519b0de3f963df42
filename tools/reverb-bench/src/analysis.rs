//! Impulse-response measurements.

use combverb_dsp::{ReverbConfig, ReverbStorage};

#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseStats {
    /// First non-zero output sample.
    pub onset: Option<usize>,
    pub peak: f32,
    pub peak_at: usize,
    pub energy: f64,
    /// Reverb time in seconds, extrapolated from the -5..-35 dB decay.
    pub t60: Option<f64>,
}

/// Run a unit impulse through a fresh engine for `len` samples.
pub fn impulse_response(config: &ReverbConfig, len: usize) -> Vec<f32> {
    let mut storage = ReverbStorage::for_config(config);
    let mut engine = storage.engine(config);
    (0..len)
        .map(|n| engine.process(if n == 0 { 1.0 } else { 0.0 }))
        .collect()
}

/// Schroeder backward-integrated energy decay, in dB relative to the total.
///
/// Empty when `h` carries no energy: there is nothing to decay from.
pub fn decay_curve_db(h: &[f32]) -> Vec<f64> {
    let mut remaining: Vec<f64> = h.iter().map(|&y| (y as f64) * (y as f64)).collect();
    for n in (0..remaining.len().saturating_sub(1)).rev() {
        remaining[n] += remaining[n + 1];
    }
    let total = remaining.first().copied().unwrap_or(0.0);
    if total <= 0.0 {
        return Vec::new();
    }
    remaining
        .iter()
        .map(|&e| 10.0 * (e / total).log10())
        .collect()
}

fn crossing(curve: &[f64], level_db: f64) -> Option<usize> {
    curve.iter().position(|&db| db <= level_db)
}

/// T30 estimate: time between the -5 dB and -35 dB points, doubled.
pub fn t60(h: &[f32], sample_rate: f64) -> Option<f64> {
    let curve = decay_curve_db(h);
    let start = crossing(&curve, -5.0)?;
    let end = crossing(&curve, -35.0)?;
    Some(2.0 * (end - start) as f64 / sample_rate)
}

pub fn measure(h: &[f32], sample_rate: f64) -> ImpulseStats {
    let (peak_at, peak) = h
        .iter()
        .enumerate()
        .fold((0, 0.0f32), |(at, best), (n, &y)| {
            if y.abs() > best { (n, y.abs()) } else { (at, best) }
        });
    ImpulseStats {
        onset: h.iter().position(|&y| y != 0.0),
        peak,
        peak_at,
        energy: h.iter().map(|&y| (y as f64) * (y as f64)).sum(),
        t60: t60(h, sample_rate),
    }
}

/// Peak of the last `fraction` of `h` relative to the overall peak, in dB.
///
/// Silent or empty responses have no tail: `-inf`.
pub fn tail_level_db(h: &[f32], fraction: f64) -> f64 {
    let start = ((1.0 - fraction).clamp(0.0, 1.0) * h.len() as f64) as usize;
    let overall = h.iter().fold(0.0f32, |acc, &y| acc.max(y.abs()));
    if overall == 0.0 {
        return f64::NEG_INFINITY;
    }
    let tail = h[start..].iter().fold(0.0f32, |acc, &y| acc.max(y.abs()));
    20.0 * (tail as f64 / overall as f64).log10()
}
