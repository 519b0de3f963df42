//! WAV file input and output.

use std::path::Path;

use anyhow::{Context, Result, bail};

/// Decoded input as (left, right) frames; mono files leave the right
/// channel silent.
pub struct InputAudio {
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: Vec<[f32; 2]>,
}

pub fn read_wav(path: &Path) -> Result<InputAudio> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("failed to decode {}", path.display()))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .with_context(|| format!("failed to decode {}", path.display()))?
        }
    };

    let frames = match spec.channels {
        1 => samples.iter().map(|&s| [s, 0.0]).collect(),
        2 => samples.chunks_exact(2).map(|c| [c[0], c[1]]).collect(),
        n => bail!(
            "{}: {n} channels not supported (mono or stereo only)",
            path.display()
        ),
    };

    Ok(InputAudio {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        frames,
    })
}

/// Write `samples` as 24-bit mono PCM, clamped to full scale.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 24,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let scale = (1 << 23) as f32 - 1.0;
    for &s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        writer.write_sample((clamped * scale) as i32)?;
    }
    writer
        .finalize()
        .with_context(|| format!("failed to finalize {}", path.display()))?;
    Ok(())
}
