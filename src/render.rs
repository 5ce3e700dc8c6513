use anyhow::{Context, Result, bail};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::params::ParameterStore;
use crate::processor::Processor;

/// Summary of one offline render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStats {
    pub frames: usize,
    pub channels: usize,
    pub sample_rate: u32,
    pub input_peak: f32,
    pub output_peak: f32,
}

/// Run a WAV file through the compressor and write a 32-bit float WAV.
///
/// Mono and stereo inputs are accepted, in integer or float format. The
/// output has the same channel count and sample rate as the input.
pub fn render_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    store: Arc<ParameterStore>,
    block_size: usize,
) -> Result<RenderStats> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let reader = WavReader::open(input)
        .with_context(|| format!("Failed to open WAV file {}", input.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if !Processor::is_layout_supported(channels, channels) {
        bail!("unsupported channel count {channels}, expected mono or stereo");
    }

    let samples: Vec<f32> = if spec.sample_format == SampleFormat::Float {
        reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read float samples")?
    } else {
        let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
        reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / max_val))
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read integer samples")?
    };
    debug!(
        "Read {} frames at {} Hz from {}",
        samples.len() / channels,
        spec.sample_rate,
        input.display()
    );

    let mut processor = Processor::new(store);
    processor
        .prepare(spec.sample_rate as f32, block_size, channels)
        .context("failed to prepare processor")?;
    let rendered = process_interleaved(&mut processor, &samples, channels, block_size);

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(output, out_spec)
        .with_context(|| format!("Failed to create WAV file {}", output.display()))?;
    for &sample in &rendered {
        writer
            .write_sample(sample)
            .context("Failed to write sample")?;
    }
    writer.finalize().context("Failed to finalize WAV file")?;

    let stats = RenderStats {
        frames: samples.len() / channels,
        channels,
        sample_rate: spec.sample_rate,
        input_peak: peak(&samples),
        output_peak: peak(&rendered),
    };
    info!(
        "Rendered {} frames to {} (peak in {:.3}, out {:.3})",
        stats.frames,
        output.display(),
        stats.input_peak,
        stats.output_peak
    );
    Ok(stats)
}

/// Process interleaved samples block by block. A trailing partial frame is
/// dropped.
pub fn process_interleaved(
    processor: &mut Processor,
    samples: &[f32],
    channels: usize,
    block_size: usize,
) -> Vec<f32> {
    let channels = channels.max(1);
    let block_size = block_size.max(1);
    let frames = samples.len() / channels;
    let mut output = vec![0.0; frames * channels];
    let mut buffer = AudioBuffer::new(channels, block_size);

    for (block_in, block_out) in samples[..frames * channels]
        .chunks(block_size * channels)
        .zip(output.chunks_mut(block_size * channels))
    {
        buffer.set_num_samples(block_in.len() / channels);
        for ch in 0..channels {
            for (dst, frame) in buffer.channel_mut(ch).iter_mut().zip(block_in.chunks(channels)) {
                *dst = frame[ch];
            }
        }

        processor.process(&mut buffer);

        for ch in 0..channels {
            for (src, frame) in buffer.channel(ch).iter().zip(block_out.chunks_mut(channels)) {
                frame[ch] = *src;
            }
        }
    }
    output
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}
