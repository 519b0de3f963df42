/// Reverb Renderer: runs a WAV file (or a unit impulse) through the
/// combverb engine and writes the result as a 24-bit mono WAV.
///
/// Stereo input is summed into the engine; the dry path uses the same sum so
/// `--mix` blends like for like.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use combverb_dsp::{
    AllpassTopology, CombVoicing, ReverbConfig, ReverbEngine, ReverbStorage, StorageLayout,
};

mod wav;

/// Rate the default delays were tuned at; also the impulse render rate.
const TUNED_SAMPLE_RATE: u32 = 48_000;

#[derive(Parser, Debug)]
#[command(
    name = "reverb-renderer",
    about = "Render a WAV file or an impulse through the combverb reverb"
)]
struct Cli {
    /// Input WAV file, mono or stereo (omit to render the impulse response)
    input: Option<PathBuf>,

    /// Output WAV file (24-bit mono)
    #[arg(short, long)]
    output: PathBuf,

    /// Seconds appended after the input; total length for an impulse render
    #[arg(short, long, default_value_t = 2.0)]
    tail: f64,

    /// Wet fraction: 0 is dry only, 1 is reverb only
    #[arg(short, long, default_value_t = 1.0)]
    mix: f32,

    /// Allpass wiring
    #[arg(long, value_enum, default_value_t = AllpassTopology::Nested)]
    topology: AllpassTopology,

    /// Comb line kernels
    #[arg(long, value_enum, default_value_t = CombVoicing::Shared)]
    voicing: CombVoicing,

    /// Override every comb feedback gain
    #[arg(long, allow_negative_numbers = true)]
    comb_gain: Option<f32>,

    /// Override every allpass feedback gain
    #[arg(long, allow_negative_numbers = true)]
    allpass_gain: Option<f32>,

    /// Scale the output to peak at -1 dBFS
    #[arg(long)]
    normalize: bool,
}

fn build_config(cli: &Cli) -> ReverbConfig {
    ReverbConfig::default()
        .with_topology(cli.topology)
        .with_voicing(cli.voicing)
        .with_gain_overrides(cli.comb_gain, cli.allpass_gain)
}

fn render(engine: &mut ReverbEngine<'_>, frames: &[[f32; 2]], tail: usize, mix: f32) -> Vec<f32> {
    let silence = std::iter::repeat_n([0.0, 0.0], tail);
    frames
        .iter()
        .copied()
        .chain(silence)
        .map(|[l, r]| {
            let wet = engine.process_frame(l, r);
            (l + r) * (1.0 - mix) + wet * mix
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if !(0.0..=1.0).contains(&cli.mix) {
        bail!("--mix must lie in 0..=1, got {}", cli.mix);
    }
    if !cli.tail.is_finite() || cli.tail < 0.0 {
        bail!("--tail must be a non-negative number of seconds, got {}", cli.tail);
    }

    let config = build_config(&cli);
    let layout = StorageLayout::for_config(&config);
    config
        .validate(&layout)
        .context("invalid reverb configuration")?;

    let (sample_rate, frames, tail_len) = match &cli.input {
        Some(path) => {
            let audio = wav::read_wav(path)?;
            log::info!(
                "Input {}: {} frames, {} ch, {} Hz",
                path.display(),
                audio.frames.len(),
                audio.channels,
                audio.sample_rate
            );
            let tail_len = (cli.tail * audio.sample_rate as f64).round() as usize;
            (audio.sample_rate, audio.frames, tail_len)
        }
        None => {
            let len = (cli.tail * TUNED_SAMPLE_RATE as f64).round() as usize;
            log::info!("Rendering {len}-sample impulse response");
            (TUNED_SAMPLE_RATE, vec![[1.0, 0.0]], len.saturating_sub(1))
        }
    };
    if sample_rate != TUNED_SAMPLE_RATE {
        log::warn!(
            "delays are tuned for {TUNED_SAMPLE_RATE} Hz; at {sample_rate} Hz the room scales by {:.3}",
            TUNED_SAMPLE_RATE as f64 / sample_rate as f64
        );
    }

    let mut storage = ReverbStorage::new(layout);
    let mut engine = storage.engine(&config);
    log::info!(
        "{:?} allpass, {:?} kernels, {} samples of delay storage",
        config.topology,
        cli.voicing,
        layout.total_len()
    );

    let mut samples = render(&mut engine, &frames, tail_len, cli.mix);

    let mut peak = samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    if cli.normalize && peak > 0.0 {
        let gain = 10f32.powf(-1.0 / 20.0) / peak;
        samples.iter_mut().for_each(|s| *s *= gain);
        peak *= gain;
    }
    log::info!("Peak amplitude: {peak:.6} ({:.1} dBFS)", 20.0 * peak.log10());
    if peak > 1.0 {
        log::warn!("output clips at full scale; rerun with --normalize");
    }

    wav::write_wav(&cli.output, &samples, sample_rate)?;
    log::info!("Written: {}", cli.output.display());
    Ok(())
}
