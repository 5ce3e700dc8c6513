/// Maximum channel count the processor supports.
pub const MAX_CHANNELS: usize = 2;

/// Fixed-capacity, non-interleaved audio buffer.
///
/// Storage is allocated once in [`AudioBuffer::new`]; changing the active
/// length with [`AudioBuffer::set_num_samples`] never reallocates.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    num_samples: usize,
}

impl AudioBuffer {
    pub fn new(num_channels: usize, capacity: usize) -> Self {
        Self {
            channels: vec![vec![0.0; capacity]; num_channels],
            num_samples: capacity,
        }
    }

    /// Builds a buffer holding a copy of the given channel data.
    pub fn from_channels(data: &[&[f32]]) -> Self {
        let num_samples = data.iter().map(|c| c.len()).min().unwrap_or(0);
        Self {
            channels: data.iter().map(|c| c[..num_samples].to_vec()).collect(),
            num_samples,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub const fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn capacity(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Sets the active length, truncated to the capacity.
    pub fn set_num_samples(&mut self, num_samples: usize) {
        self.num_samples = num_samples.min(self.capacity());
    }

    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel][..self.num_samples]
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut self.channels[channel][..self.num_samples]
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        let n = self.num_samples;
        self.channels.iter().map(move |c| &c[..n])
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        let n = self.num_samples;
        self.channels.iter_mut().map(move |c| &mut c[..n])
    }

    pub fn clear(&mut self) {
        for channel in self.channels_mut() {
            channel.fill(0.0);
        }
    }

    pub fn apply_gain(&mut self, gain: f32) {
        if gain == 1.0 {
            return;
        }
        for channel in self.channels_mut() {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }

    /// Root-mean-square level over all active samples of all channels.
    pub fn rms(&self) -> f32 {
        let count = self.num_samples * self.num_channels();
        if count == 0 {
            return 0.0;
        }
        let sum: f32 = self.channels().flatten().map(|s| s * s).sum();
        (sum / count as f32).sqrt()
    }

    pub fn peak(&self) -> f32 {
        self.channels()
            .flatten()
            .map(|s| s.abs())
            .fold(0.0f32, f32::max)
    }
}
