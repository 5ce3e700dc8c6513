use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, Sender, TrySendError, bounded};
use log::{debug, warn};
use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::dsp::meter::MeterHandle;
use crate::params::{ParameterStore, Snapshot};
use crate::processor::Processor;

const MESSAGE_QUEUE_SIZE: usize = 16;

pub enum EngineMessage {
    /// Replace every parameter at the top of the next block.
    LoadSnapshot(Snapshot),
    /// Clear filter and envelope state.
    Reset,
}

/// Real-time side: owns the processor and a scratch buffer.
pub struct Engine {
    processor: Processor,
    store: Arc<ParameterStore>,
    buffer: AudioBuffer,
    rx_updates: Receiver<EngineMessage>,
}

/// Control side: the shared store, meters and the message channel.
#[derive(Clone)]
pub struct EngineHandle {
    store: Arc<ParameterStore>,
    meters: MeterHandle,
    tx_updates: Sender<EngineMessage>,
}

impl Engine {
    pub fn new(
        store: Arc<ParameterStore>,
        sample_rate: f32,
        buffer_size: usize,
        num_channels: usize,
    ) -> Result<(Self, EngineHandle)> {
        let mut processor = Processor::new(Arc::clone(&store));
        processor
            .prepare(sample_rate, buffer_size, num_channels)
            .context("failed to prepare processor")?;

        let (tx_updates, rx_updates) = bounded(MESSAGE_QUEUE_SIZE);
        let handle = EngineHandle {
            store: Arc::clone(&store),
            meters: processor.meters(),
            tx_updates,
        };

        Ok((
            Self {
                processor,
                store,
                buffer: AudioBuffer::new(num_channels, buffer_size),
                rx_updates,
            },
            handle,
        ))
    }

    /// Process one host block.
    ///
    /// Each input slice feeds the output slice with the same index. Output
    /// channels without a matching input are silenced.
    pub fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
        self.handle_messages();

        let num_channels = self.buffer.num_channels().min(inputs.len());
        let frames = outputs.iter().map(|o| o.len()).min().unwrap_or(0);
        let capacity = self.buffer.capacity();

        let mut offset = 0;
        while offset < frames {
            let len = (frames - offset).min(capacity);
            self.buffer.set_num_samples(len);
            for ch in 0..self.buffer.num_channels() {
                let scratch = self.buffer.channel_mut(ch);
                match inputs.get(ch) {
                    Some(input) if ch < num_channels => {
                        let start = offset.min(input.len());
                        let available = (input.len() - start).min(len);
                        scratch[..available].copy_from_slice(&input[start..start + available]);
                        scratch[available..].fill(0.0);
                    }
                    _ => scratch.fill(0.0),
                }
            }

            self.processor.process(&mut self.buffer);

            for (ch, output) in outputs.iter_mut().enumerate() {
                let target = &mut output[offset..offset + len];
                if ch < num_channels {
                    target.copy_from_slice(self.buffer.channel(ch));
                } else {
                    target.fill(0.0);
                }
            }
            offset += len;
        }
    }

    /// Re-prepare for a new host block size at the current rate. Not
    /// real-time safe.
    pub fn update_buffer_size(&mut self, new_size: usize) -> Result<()> {
        let sample_rate = self.processor.sample_rate().unwrap_or(48_000.0);
        self.update_stream(sample_rate, new_size)
    }

    /// Re-prepare for a new host sample rate and block size. Filter and
    /// envelope state start clean. Not real-time safe.
    pub fn update_stream(&mut self, sample_rate: f32, buffer_size: usize) -> Result<()> {
        let num_channels = self.buffer.num_channels();
        self.processor
            .prepare(sample_rate, buffer_size, num_channels)
            .context("failed to re-prepare processor")?;
        self.buffer = AudioBuffer::new(num_channels, buffer_size);
        Ok(())
    }

    pub fn sample_rate(&self) -> Option<f32> {
        self.processor.sample_rate()
    }

    pub fn handle_messages(&mut self) {
        while let Ok(message) = self.rx_updates.try_recv() {
            match message {
                EngineMessage::LoadSnapshot(snapshot) => self.store.apply(&snapshot),
                EngineMessage::Reset => self.processor.reset(),
            }
        }
    }

    pub const fn processor(&self) -> &Processor {
        &self.processor
    }
}

impl EngineHandle {
    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    pub fn meters(&self) -> &MeterHandle {
        &self.meters
    }

    /// Queue a whole-preset load; it lands between two blocks.
    pub fn load_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        debug!("Queueing snapshot load");
        self.send(EngineMessage::LoadSnapshot(snapshot))
    }

    pub fn reset(&self) -> Result<()> {
        self.send(EngineMessage::Reset)
    }

    fn send(&self, message: EngineMessage) -> Result<()> {
        match self.tx_updates.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("Engine message queue is full, dropping message");
                anyhow::bail!("engine message queue is full")
            }
            Err(TrySendError::Disconnected(_)) => anyhow::bail!("engine has shut down"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Band, ParamId};

    #[test]
    fn snapshot_lands_at_block_start() -> Result<()> {
        let store = Arc::new(ParameterStore::new());
        let (mut engine, handle) = Engine::new(Arc::clone(&store), 48_000.0, 64, 2)?;

        let mut snapshot = Snapshot::default();
        snapshot.set(ParamId::OutputGain, -6.0);
        snapshot.set(Band::Mid.keys().mute, 1.0);
        handle.load_snapshot(snapshot)?;
        assert_eq!(store.get(ParamId::OutputGain), 0.0);

        let input = [0.0f32; 64];
        let mut left = [0.0f32; 64];
        let mut right = [0.0f32; 64];
        engine.process(
            &[input.as_slice(), input.as_slice()],
            &mut [left.as_mut_slice(), right.as_mut_slice()],
        );

        assert_eq!(store.get(ParamId::OutputGain), -6.0);
        assert!(store.get_bool(Band::Mid.keys().mute));
        Ok(())
    }

    #[test]
    fn oversized_host_blocks_are_fully_covered() -> Result<()> {
        let store = Arc::new(ParameterStore::new());
        store.set_global_bypass(true);
        let (mut engine, _handle) = Engine::new(store, 48_000.0, 32, 2)?;

        let input: Vec<f32> = (0..100).map(|i| (i as f32 * 0.1).sin() * 0.5).collect();
        let mut left = vec![1.0f32; 100];
        let mut right = vec![1.0f32; 100];
        engine.process(
            &[input.as_slice()],
            &mut [left.as_mut_slice(), right.as_mut_slice()],
        );

        assert!(left.iter().any(|&s| s != 0.0));
        assert!(right.iter().all(|&s| s == 0.0));
        Ok(())
    }

    #[test]
    fn stream_changes_re_prepare_the_processor() -> Result<()> {
        let store = Arc::new(ParameterStore::new());
        let (mut engine, _handle) = Engine::new(store, 48_000.0, 64, 2)?;

        engine.update_stream(96_000.0, 128)?;
        assert_eq!(engine.sample_rate(), Some(96_000.0));
        assert_eq!(engine.processor().max_block_size(), Some(128));

        engine.update_buffer_size(256)?;
        assert_eq!(engine.sample_rate(), Some(96_000.0));
        assert_eq!(engine.processor().max_block_size(), Some(256));

        assert!(engine.update_stream(0.0, 256).is_err());
        assert_eq!(engine.sample_rate(), Some(96_000.0));
        Ok(())
    }

    #[test]
    fn full_queue_reports_an_error() -> Result<()> {
        let store = Arc::new(ParameterStore::new());
        let (_engine, handle) = Engine::new(store, 48_000.0, 64, 1)?;
        for _ in 0..MESSAGE_QUEUE_SIZE {
            handle.reset()?;
        }
        assert!(handle.reset().is_err());
        Ok(())
    }
}
