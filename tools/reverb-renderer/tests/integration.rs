/// Integration tests for the reverb renderer CLI.
///
/// Each test renders a short clip and checks format, timing and decay:
/// 1. Impulse renders have the requested length and start at the first comb echo
/// 2. Stereo input is accepted and the tail dies away
/// 3. A dry-only mix reproduces the input
/// 4. Unstable tunings are rejected before rendering
/// 5. Float input decodes; more than two channels is refused
use std::path::{Path, PathBuf};
use std::process::Command;

fn renderer() -> Command {
    Command::new(env!("CARGO_BIN_EXE_reverb-renderer"))
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("combverb_{}_{name}", std::process::id()))
}

fn read_wav_samples(path: &Path) -> Vec<f64> {
    let mut reader = hound::WavReader::open(path).expect("failed to open WAV");
    let max_val = (1i32 << (reader.spec().bits_per_sample - 1)) as f64;
    reader
        .samples::<i32>()
        .map(|s| s.unwrap() as f64 / max_val)
        .collect()
}

fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0f64, |acc, s| acc.max(s.abs()))
}

/// Deterministic noise burst followed by nothing.
fn write_burst(path: &Path, channels: u16, frames: usize) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: 48_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let mut seed = 0x2545_f491_u32;
    for _ in 0..frames * channels as usize {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        writer.write_sample((seed >> 16) as i16 / 2).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_impulse_render_format_and_onset() {
    let output = temp_path("impulse.wav");
    let _ = std::fs::remove_file(&output);

    let status = renderer()
        .args(["--tail", "0.5", "-o"])
        .arg(&output)
        .status()
        .expect("failed to run reverb-renderer");
    assert!(status.success(), "reverb-renderer exited with error");

    let reader = hound::WavReader::open(&output).expect("invalid WAV file");
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.spec().sample_rate, 48_000);
    assert_eq!(reader.spec().bits_per_sample, 24);
    assert_eq!(reader.len(), 24_000);
    drop(reader);

    let samples = read_wav_samples(&output);
    // Shortest comb delay (1433) minus the FIR half-window.
    let onset = samples.iter().position(|&s| s != 0.0);
    assert_eq!(onset, Some(1429));

    std::fs::remove_file(&output).ok();
}

#[test]
fn test_stereo_input_tail_decays() {
    let input = temp_path("burst_in.wav");
    let output = temp_path("burst_out.wav");
    write_burst(&input, 2, 4800);

    let status = renderer()
        .arg(&input)
        .args(["--tail", "1.0", "-o"])
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());

    let samples = read_wav_samples(&output);
    assert_eq!(samples.len(), 4800 + 48_000);

    let body = peak(&samples[..12_000]);
    let tail = peak(&samples[samples.len() - 12_000..]);
    assert!(body > 1e-3, "reverb body too quiet: {body}");
    assert!(
        tail < body * 1e-2,
        "tail ({tail:.3e}) should be 40 dB below the body ({body:.3e})"
    );

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();
}

#[test]
fn test_dry_mix_passes_input() {
    let input = temp_path("dry_in.wav");
    let output = temp_path("dry_out.wav");
    write_burst(&input, 1, 2000);

    let status = renderer()
        .arg(&input)
        .args(["--mix", "0", "--tail", "0.1", "-o"])
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());

    let dry = read_wav_samples(&input);
    let rendered = read_wav_samples(&output);
    assert_eq!(rendered.len(), 2000 + 4800);
    for (n, (&x, &y)) in dry.iter().zip(&rendered).enumerate() {
        assert!((x - y).abs() < 1e-4, "n={n}: dry {x} vs rendered {y}");
    }
    assert!(rendered[2000..].iter().all(|&y| y == 0.0));

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();
}

/// Mono 32-bit float ramp-and-alternate pattern.
fn write_float_pattern(path: &Path, frames: usize) -> Vec<f32> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48_000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let samples: Vec<f32> = (0..frames)
        .map(|n| {
            let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
            sign * (n % 100) as f32 / 200.0
        })
        .collect();
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in &samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
    samples
}

#[test]
fn test_float_input_decodes() {
    let input = temp_path("float_in.wav");
    let output = temp_path("float_out.wav");
    let dry = write_float_pattern(&input, 1000);

    let status = renderer()
        .arg(&input)
        .args(["--mix", "0", "--tail", "0", "-o"])
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());

    let rendered = read_wav_samples(&output);
    assert_eq!(rendered.len(), dry.len());
    for (n, (&x, &y)) in dry.iter().zip(&rendered).enumerate() {
        assert!((x as f64 - y).abs() < 1e-6, "n={n}: dry {x} vs rendered {y}");
    }

    // The same file through the reverb produces a wet signal.
    let status = renderer()
        .arg(&input)
        .args(["--tail", "0.2", "-o"])
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(peak(&read_wav_samples(&output)) > 0.0);

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&output).ok();
}

#[test]
fn test_three_channel_input_rejected() {
    let input = temp_path("three_ch_in.wav");
    let output = temp_path("three_ch_out.wav");
    let _ = std::fs::remove_file(&output);
    write_burst(&input, 3, 480);

    let result = renderer()
        .arg(&input)
        .args(["--tail", "0.1", "-o"])
        .arg(&output)
        .output()
        .unwrap();
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("3 channels not supported"),
        "unexpected stderr: {stderr}"
    );
    assert!(!output.exists(), "no WAV should be written for a 3-channel input");

    std::fs::remove_file(&input).ok();
}

#[test]
fn test_unstable_gain_rejected() {
    let output = temp_path("unstable.wav");
    let _ = std::fs::remove_file(&output);

    let result = renderer()
        .args(["--comb-gain", "1.2", "--tail", "0.1", "-o"])
        .arg(&output)
        .output()
        .unwrap();
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("invalid reverb configuration"),
        "unexpected stderr: {stderr}"
    );
    assert!(!output.exists(), "no WAV should be written for a bad tuning");
}

#[test]
fn test_topology_and_voicing_change_output() {
    let variants: [(&str, &[&str]); 3] = [
        ("nested", &[]),
        ("series", &["--topology", "series"]),
        ("voiced", &["--voicing", "voiced"]),
    ];
    let mut renders = Vec::new();
    for (name, extra) in variants {
        let output = temp_path(&format!("variant_{name}.wav"));
        let status = renderer()
            .args(extra)
            .args(["--tail", "0.3", "-o"])
            .arg(&output)
            .status()
            .unwrap();
        assert!(status.success(), "{name} render failed");
        renders.push(read_wav_samples(&output));
        std::fs::remove_file(&output).ok();
    }
    assert_ne!(renders[0], renders[1], "series should differ from nested");
    assert_ne!(renders[0], renders[2], "voiced kernels should differ from shared");
}

#[test]
fn test_deterministic_output() {
    let path1 = temp_path("det_1.wav");
    let path2 = temp_path("det_2.wav");

    for path in [&path1, &path2] {
        let status = renderer()
            .args(["--tail", "0.3", "--normalize", "-o"])
            .arg(path)
            .status()
            .unwrap();
        assert!(status.success());
    }

    let samples1 = read_wav_samples(&path1);
    let samples2 = read_wav_samples(&path2);
    assert_eq!(samples1, samples2, "two renders of one tuning should be identical");
    assert!((peak(&samples1) - 10f64.powf(-1.0 / 20.0)).abs() < 1e-3);

    std::fs::remove_file(&path1).ok();
    std::fs::remove_file(&path2).ok();
}
