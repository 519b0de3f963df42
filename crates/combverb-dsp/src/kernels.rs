/// Fixed 9-tap FIR kernels and the convolution used at every FIR read point.
///
/// All kernels are linear-phase (symmetric) and were designed offline with a
/// Kaiser window. Cutoffs are normalized to the sample rate.

pub const FIR_TAPS: usize = 9;

/// Taps on either side of the kernel centre. Comb reads start this many
/// samples before the nominal delay so the window is centred on it.
pub const HALF_WINDOW: usize = FIR_TAPS / 2;

pub type FirKernel = [f32; FIR_TAPS];

/// Input conditioning high-pass: fc 0.094, Kaiser beta 3.395.
///
/// Built as `delta - lowpass` with the lowpass normalized to unity DC gain, so
/// the taps sum to zero and a constant input settles to silence. The negative
/// centre tap means the passband is polarity-inverted, which is inaudible in
/// the reverb tail.
pub const PRE_FILTER_KERNEL: FirKernel = [
    0.010_154_58,
    0.051_322_97,
    0.124_345_03,
    0.198_836_25,
    -0.769_317_66,
    0.198_836_25,
    0.124_345_03,
    0.051_322_97,
    0.010_154_58,
];

/// Comb tap lowpass shared by all four lines: fc 0.091, unity DC gain.
pub const SHARED_COMB_KERNEL: FirKernel = [
    0.000_274_37,
    0.015_634_21,
    0.093_494_90,
    0.234_328_05,
    0.312_536_94,
    0.234_328_05,
    0.093_494_90,
    0.015_634_21,
    0.000_274_37,
];

/// Per-line comb voicing, darkest on the last line.
///
/// fc = 0.118, 0.110, 0.102, 0.091. Swap in via `ReverbConfig::comb_kernels`
/// when the lines should colour their resonances differently.
pub const VOICED_COMB_KERNELS: [FirKernel; 4] = [
    [
        0.000_054_55,
        0.010_356_17,
        0.084_027_83,
        0.239_626_98,
        0.331_868_96,
        0.239_626_98,
        0.084_027_83,
        0.010_356_17,
        0.000_054_55,
    ],
    [
        0.000_115_71,
        0.011_951_54,
        0.087_047_18,
        0.238_020_43,
        0.325_730_29,
        0.238_020_43,
        0.087_047_18,
        0.011_951_54,
        0.000_115_71,
    ],
    [
        0.000_180_71,
        0.013_527_85,
        0.089_890_39,
        0.236_436_97,
        0.319_928_16,
        0.236_436_97,
        0.089_890_39,
        0.013_527_85,
        0.000_180_71,
    ],
    SHARED_COMB_KERNEL,
];

/// Straight 9-multiply convolution. Reference form for `convolve_folded`.
#[inline]
pub fn convolve(window: &[f32; FIR_TAPS], kernel: &FirKernel) -> f32 {
    let mut acc = 0.0;
    for k in 0..FIR_TAPS {
        acc += window[k] * kernel[k];
    }
    acc
}

/// Symmetric-kernel convolution: mirrored samples are summed before the
/// multiply, 5 multiplies instead of 9. Only valid when `is_symmetric(kernel)`.
#[inline]
pub fn convolve_folded(window: &[f32; FIR_TAPS], kernel: &FirKernel) -> f32 {
    let mut acc = window[HALF_WINDOW] * kernel[HALF_WINDOW];
    for k in 0..HALF_WINDOW {
        acc += (window[k] + window[FIR_TAPS - 1 - k]) * kernel[k];
    }
    acc
}

pub fn is_symmetric(kernel: &FirKernel) -> bool {
    (0..HALF_WINDOW).all(|k| kernel[k] == kernel[FIR_TAPS - 1 - k])
}

/// Sum of taps: the kernel's gain at 0 Hz.
pub fn dc_gain(kernel: &FirKernel) -> f32 {
    kernel.iter().sum()
}

/// Magnitude response at normalized frequency `f` (cycles/sample, 0..0.5).
pub fn magnitude_at(kernel: &FirKernel, f: f64) -> f64 {
    let w = 2.0 * std::f64::consts::PI * f;
    let (mut re, mut im) = (0.0f64, 0.0f64);
    for (k, &c) in kernel.iter().enumerate() {
        re += c as f64 * (w * k as f64).cos();
        im -= c as f64 * (w * k as f64).sin();
    }
    (re * re + im * im).sqrt()
}
