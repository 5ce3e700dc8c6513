use triband::buffer::AudioBuffer;

pub const SAMPLE_RATE: f32 = 48_000.0;

/// Stereo buffer of deterministic noise at roughly -6 dBFS.
pub fn noise_buffer(num_samples: usize) -> AudioBuffer {
    let mut seed = 0x2545_f491u32;
    let mut next = || {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (seed >> 8) as f32 / (1u32 << 24) as f32 - 0.5
    };
    let left: Vec<f32> = (0..num_samples).map(|_| next()).collect();
    let right: Vec<f32> = (0..num_samples).map(|_| next()).collect();
    AudioBuffer::from_channels(&[left.as_slice(), right.as_slice()])
}
