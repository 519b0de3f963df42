/// Reverb Bench: combverb DSP measurement CLI.
///
/// Usage:
///   reverb-bench impulse [--seconds S] [--topology T] [--voicing V] [--csv FILE]
///   reverb-bench kernels [--points N] [--csv FILE]
///   reverb-bench stability [--min G] [--max G] [--steps N] [--csv FILE]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use combverb_dsp::kernels::{self, FirKernel, PRE_FILTER_KERNEL, SHARED_COMB_KERNEL, VOICED_COMB_KERNELS};
use combverb_dsp::{AllpassTopology, CombVoicing, ReverbConfig, StorageLayout};

mod analysis;

const SAMPLE_RATE: f64 = 48_000.0;

#[derive(Parser)]
#[command(name = "reverb-bench", about = "combverb DSP measurements")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Impulse-response statistics for one tuning
    Impulse {
        #[command(flatten)]
        tuning: TuningArgs,
        /// Impulse response length in seconds
        #[arg(long, default_value_t = 4.0)]
        seconds: f64,
        /// Write the energy decay curve as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Magnitude response of the fixed FIR kernels
    Kernels {
        /// Log-spaced frequencies from 20 Hz to Nyquist
        #[arg(long, default_value_t = 24)]
        points: usize,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Reverb time and tail level across comb feedback gains
    Stability {
        #[command(flatten)]
        tuning: TuningArgs,
        #[arg(long, default_value_t = 0.1, allow_negative_numbers = true)]
        min: f32,
        #[arg(long, default_value_t = 0.99, allow_negative_numbers = true)]
        max: f32,
        #[arg(long, default_value_t = 10)]
        steps: usize,
        /// Impulse response length per step in seconds
        #[arg(long, default_value_t = 6.0)]
        seconds: f64,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
struct TuningArgs {
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
}

impl TuningArgs {
    fn config(&self) -> ReverbConfig {
        ReverbConfig::default()
            .with_topology(self.topology)
            .with_voicing(self.voicing)
            .with_gain_overrides(self.comb_gain, self.allpass_gain)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match Cli::parse().command {
        Commands::Impulse { tuning, seconds, csv } => cmd_impulse(&tuning, seconds, csv.as_deref()),
        Commands::Kernels { points, csv } => cmd_kernels(points, csv.as_deref()),
        Commands::Stability {
            tuning,
            min,
            max,
            steps,
            seconds,
            csv,
        } => cmd_stability(&tuning, min, max, steps, seconds, csv.as_deref()),
    }
}

fn write_csv(path: &Path, lines: &[String]) -> Result<()> {
    std::fs::write(path, lines.join("\n") + "\n")
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("CSV written to {}", path.display());
    Ok(())
}

fn seconds_to_samples(seconds: f64) -> usize {
    (seconds.max(0.0) * SAMPLE_RATE).round() as usize
}

// ─── Impulse statistics ─────────────────────────────────────────────────────

fn cmd_impulse(tuning: &TuningArgs, seconds: f64, csv: Option<&Path>) -> Result<()> {
    let config = tuning.config();
    config
        .validate(&StorageLayout::for_config(&config))
        .context("invalid reverb configuration")?;

    let h = analysis::impulse_response(&config, seconds_to_samples(seconds));
    let stats = analysis::measure(&h, SAMPLE_RATE);

    println!("Impulse response ({:?}, {:?} kernels)", config.topology, tuning.voicing);
    println!("  Comb delays:   {:?}", config.comb.map(|l| l.delay));
    println!("  Comb gains:    {:?}", config.comb.map(|l| l.gain));
    println!("  Allpass:       {:?}", config.allpass.map(|s| (s.delay, s.gain)));
    match stats.onset {
        Some(n) => println!("  Onset:         {n} samples ({:.2} ms)", n as f64 / SAMPLE_RATE * 1e3),
        None => println!("  Onset:         none"),
    }
    println!(
        "  Peak:          {:.6} ({:.1} dBFS) at {:.2} ms",
        stats.peak,
        20.0 * (stats.peak as f64).log10(),
        stats.peak_at as f64 / SAMPLE_RATE * 1e3
    );
    println!("  Energy:        {:.6e}", stats.energy);
    match stats.t60 {
        Some(t) => println!("  T60 (T30):     {t:.3} s"),
        None => println!("  T60 (T30):     decay did not reach -35 dB"),
    }
    println!("  Tail (last 10%): {:.1} dB re peak", analysis::tail_level_db(&h, 0.1));

    if let Some(path) = csv {
        let curve = analysis::decay_curve_db(&h);
        let mut lines = vec!["time_s,amplitude,decay_db".to_string()];
        // A silent response has no decay curve; its column stays blank.
        lines.extend(h.iter().enumerate().map(|(n, y)| {
            let db = curve.get(n).map_or(String::new(), |db| format!("{db:.3}"));
            format!("{:.6},{y:.8e},{db}", n as f64 / SAMPLE_RATE)
        }));
        write_csv(path, &lines)?;
    }
    Ok(())
}

// ─── Kernel response ────────────────────────────────────────────────────────

fn cmd_kernels(points: usize, csv: Option<&Path>) -> Result<()> {
    let mut named: Vec<(String, &FirKernel)> = vec![
        ("pre".to_string(), &PRE_FILTER_KERNEL),
        ("shared".to_string(), &SHARED_COMB_KERNEL),
    ];
    named.extend(
        VOICED_COMB_KERNELS
            .iter()
            .enumerate()
            .map(|(i, k)| (format!("voiced{i}"), k)),
    );

    println!("Kernel DC gain / symmetry");
    for (name, kernel) in &named {
        println!(
            "  {name:<8} dc {:+.6}  symmetric {}",
            kernels::dc_gain(kernel),
            kernels::is_symmetric(kernel)
        );
    }
    println!();

    let header: Vec<String> = named.iter().map(|(name, _)| format!("{name:>9}")).collect();
    println!("{:>10}  {}", "Freq (Hz)", header.join(" "));

    let mut lines = vec![format!(
        "freq_hz,{}",
        named.iter().map(|(n, _)| format!("{n}_db")).collect::<Vec<_>>().join(",")
    )];
    let (log_start, log_end) = (20f64.ln(), (SAMPLE_RATE / 2.0).ln());
    for i in 0..points {
        let frac = i as f64 / (points - 1).max(1) as f64;
        let freq = (log_start + frac * (log_end - log_start)).exp();
        let gains_db: Vec<f64> = named
            .iter()
            .map(|(_, k)| 20.0 * kernels::magnitude_at(k, freq / SAMPLE_RATE).max(1e-12).log10())
            .collect();

        let row: Vec<String> = gains_db.iter().map(|db| format!("{db:>9.2}")).collect();
        println!("{freq:>10.1}  {}", row.join(" "));
        let csv_row: Vec<String> = gains_db.iter().map(|db| format!("{db:.3}")).collect();
        lines.push(format!("{freq:.1},{}", csv_row.join(",")));
    }

    if let Some(path) = csv {
        write_csv(path, &lines)?;
    }
    Ok(())
}

// ─── Stability sweep ────────────────────────────────────────────────────────

fn cmd_stability(
    tuning: &TuningArgs,
    min: f32,
    max: f32,
    steps: usize,
    seconds: f64,
    csv: Option<&Path>,
) -> Result<()> {
    let base = tuning.config();
    let len = seconds_to_samples(seconds);

    println!("Comb gain sweep ({:?}, {len} samples per step)", base.topology);
    println!("{:>8}  {:>10}  {:>12}  {}", "Gain", "T60 (s)", "Tail (dB)", "Status");
    println!("{:-<8}  {:-<10}  {:-<12}  {:-<6}", "", "", "", "");

    let mut lines = vec!["comb_gain,t60_s,tail_db,valid".to_string()];
    for i in 0..steps {
        let frac = i as f32 / (steps - 1).max(1) as f32;
        let gain = min + frac * (max - min);
        let config = base.clone().with_comb_gain(gain);

        match config.validate(&StorageLayout::for_config(&config)) {
            Ok(()) => {
                let h = analysis::impulse_response(&config, len);
                let t60 = analysis::t60(&h, SAMPLE_RATE);
                let tail_db = analysis::tail_level_db(&h, 0.1);
                let t60_text = t60.map_or("-".to_string(), |t| format!("{t:.3}"));
                println!("{gain:>8.3}  {t60_text:>10}  {tail_db:>12.1}  ok");
                lines.push(format!(
                    "{gain:.4},{},{tail_db:.2},true",
                    t60.map_or(String::new(), |t| format!("{t:.4}"))
                ));
            }
            Err(err) => {
                log::warn!("gain {gain:.3} rejected: {err}");
                println!("{gain:>8.3}  {:>10}  {:>12}  rejected", "-", "-");
                lines.push(format!("{gain:.4},,,false"));
            }
        }
    }

    if let Some(path) = csv {
        write_csv(path, &lines)?;
    }
    Ok(())
}
