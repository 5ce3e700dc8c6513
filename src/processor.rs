use anyhow::{Result, bail};
use log::debug;
use std::sync::Arc;

use crate::buffer::{AudioBuffer, MAX_CHANNELS};
use crate::dsp::common::db_to_lin;
use crate::dsp::compressor::CompressorBand;
use crate::dsp::crossover::Crossover;
use crate::dsp::meter::MeterHandle;
use crate::params::{Band, ParamId, ParameterStore};

/// Lowest stream rate `prepare` accepts.
pub const MIN_SAMPLE_RATE: f32 = 8000.0;

/// Everything read from the store once per `process` call.
#[derive(Debug, Clone, Copy)]
struct BlockParams {
    input_gain: f32,
    output_gain: f32,
    low_mid_hz: f32,
    mid_high_hz: f32,
    audible: [bool; 3],
}

impl BlockParams {
    fn read(store: &ParameterStore) -> Self {
        let mute = Band::ALL.map(|band| store.get_bool(band.keys().mute));
        let solo = Band::ALL.map(|band| store.get_bool(band.keys().solo));
        Self {
            input_gain: db_to_lin(store.get(ParamId::InputGain)),
            output_gain: db_to_lin(store.get(ParamId::OutputGain)),
            low_mid_hz: store.get(ParamId::LowMidCrossover),
            mid_high_hz: store.get(ParamId::MidHighCrossover),
            audible: resolve_audible(mute, solo),
        }
    }
}

/// Which bands reach the output.
///
/// Any solo wins: only soloed bands are heard, whatever their mute state.
/// Without a solo, muted bands are silent. Bypass never silences a band.
pub fn resolve_audible(mute: [bool; 3], solo: [bool; 3]) -> [bool; 3] {
    if solo.iter().any(|&s| s) {
        solo
    } else {
        mute.map(|m| !m)
    }
}

/// Crossover, band compressors and their scratch buffers.
struct BandPipeline {
    num_channels: usize,
    crossover: Crossover,
    bands: [CompressorBand; 3],
    band_buffers: [AudioBuffer; 3],
}

impl BandPipeline {
    fn new(sample_rate: f32, max_block_size: usize, num_channels: usize) -> Self {
        Self {
            num_channels,
            crossover: Crossover::new(sample_rate),
            bands: Band::ALL.map(|band| CompressorBand::new(band, sample_rate)),
            band_buffers: std::array::from_fn(|_| AudioBuffer::new(num_channels, max_block_size)),
        }
    }

    /// Pull per-block settings into the crossover and the bands. Called once
    /// per `process` call, before any chunking.
    fn apply(&mut self, store: &ParameterStore, params: &BlockParams) {
        self.crossover
            .set_frequencies(params.low_mid_hz, params.mid_high_hz);
        for band in &mut self.bands {
            band.update_settings(store);
        }
    }

    fn reset(&mut self) {
        self.crossover.reset();
        for band in &mut self.bands {
            band.reset();
        }
    }

    /// Runs one block of at most the prepared size through the bands.
    fn process_block(&mut self, params: &BlockParams, io: &mut AudioBuffer, meters: &MeterHandle) {
        let active = io.num_channels().min(self.num_channels);

        io.apply_gain(params.input_gain);

        let [low, mid, high] = &mut self.band_buffers;
        self.crossover.split(io, low, mid, high);
        for buffer in &mut self.band_buffers {
            for ch in active..buffer.num_channels() {
                buffer.channel_mut(ch).fill(0.0);
            }
        }

        for (i, band) in self.bands.iter_mut().enumerate() {
            let buffer = &mut self.band_buffers[i];
            band.process(buffer);
            // Silenced after processing so the envelope keeps tracking.
            if !params.audible[i] {
                buffer.clear();
            }
            meters.band(band.band()).publish(band.meter_reading());
        }

        let [low, mid, high] = &self.band_buffers;
        for ch in 0..active {
            let (l, m, h) = (low.channel(ch), mid.channel(ch), high.channel(ch));
            for (i, out) in io.channel_mut(ch).iter_mut().enumerate() {
                *out = l[i] + m[i] + h[i];
            }
        }

        io.apply_gain(params.output_gain);
    }
}

struct Prepared {
    sample_rate: f32,
    max_block_size: usize,
    pipeline: BandPipeline,
    chunk: AudioBuffer,
}

/// The three-band compressor.
///
/// `prepare` allocates everything; `process` then runs without allocating,
/// locking or failing.
pub struct Processor {
    store: Arc<ParameterStore>,
    meters: MeterHandle,
    prepared: Option<Prepared>,
}

impl Processor {
    pub fn new(store: Arc<ParameterStore>) -> Self {
        Self {
            store,
            meters: MeterHandle::new(),
            prepared: None,
        }
    }

    /// Mono and stereo, with matching input and output counts.
    pub const fn is_layout_supported(inputs: usize, outputs: usize) -> bool {
        inputs == outputs && inputs >= 1 && inputs <= MAX_CHANNELS
    }

    /// Allocate buffers and filter state for a stream. Calling it again
    /// starts from clean state.
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        max_block_size: usize,
        num_channels: usize,
    ) -> Result<()> {
        if !sample_rate.is_finite() || sample_rate < MIN_SAMPLE_RATE {
            bail!("invalid sample rate {sample_rate}, expected at least {MIN_SAMPLE_RATE} Hz");
        }
        if max_block_size == 0 {
            bail!("block size must be greater than zero");
        }
        if !Self::is_layout_supported(num_channels, num_channels) {
            bail!("unsupported channel count {num_channels}");
        }

        let mut pipeline = BandPipeline::new(sample_rate, max_block_size, num_channels);
        pipeline.apply(&self.store, &BlockParams::read(&self.store));
        self.meters.reset();
        self.prepared = Some(Prepared {
            sample_rate,
            max_block_size,
            pipeline,
            chunk: AudioBuffer::new(num_channels, max_block_size),
        });

        debug!(
            "Processor prepared: {sample_rate} Hz, {max_block_size} frames, {num_channels} channel(s)"
        );
        Ok(())
    }

    /// Process `buffer` in place.
    ///
    /// Before `prepare` the audio passes through untouched. Channels beyond
    /// the prepared count are silenced. Blocks longer than the prepared
    /// size are split into chunks that share one parameter read.
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        let Some(prepared) = self.prepared.as_mut() else {
            return;
        };
        let Prepared {
            max_block_size,
            pipeline,
            chunk,
            ..
        } = prepared;

        for ch in pipeline.num_channels..buffer.num_channels() {
            buffer.channel_mut(ch).fill(0.0);
        }

        let params = BlockParams::read(&self.store);
        pipeline.apply(&self.store, &params);

        let num_samples = buffer.num_samples();
        if num_samples <= *max_block_size {
            pipeline.process_block(&params, buffer, &self.meters);
            return;
        }

        let active = buffer.num_channels().min(pipeline.num_channels);
        let mut offset = 0;
        while offset < num_samples {
            let len = (num_samples - offset).min(*max_block_size);
            chunk.set_num_samples(len);
            for ch in 0..chunk.num_channels() {
                if ch < active {
                    chunk
                        .channel_mut(ch)
                        .copy_from_slice(&buffer.channel(ch)[offset..offset + len]);
                } else {
                    chunk.channel_mut(ch).fill(0.0);
                }
            }

            pipeline.process_block(&params, chunk, &self.meters);

            for ch in 0..active {
                buffer.channel_mut(ch)[offset..offset + len].copy_from_slice(chunk.channel(ch));
            }
            offset += len;
        }
    }

    /// Clear filter and envelope state, keeping allocations.
    pub fn reset(&mut self) {
        if let Some(prepared) = self.prepared.as_mut() {
            prepared.pipeline.reset();
        }
        self.meters.reset();
    }

    pub const fn latency_samples(&self) -> usize {
        0
    }

    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    pub fn meters(&self) -> MeterHandle {
        self.meters.clone()
    }

    pub const fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    pub fn sample_rate(&self) -> Option<f32> {
        self.prepared.as_ref().map(|p| p.sample_rate)
    }

    pub fn max_block_size(&self) -> Option<usize> {
        self.prepared.as_ref().map(|p| p.max_block_size)
    }

    pub fn num_channels(&self) -> Option<usize> {
        self.prepared.as_ref().map(|p| p.pipeline.num_channels)
    }

    /// Crossover points in use after ordering and range clamps.
    pub fn crossover_frequencies(&self) -> Option<(f32, f32)> {
        self.prepared
            .as_ref()
            .map(|p| p.pipeline.crossover.frequencies())
    }
}
