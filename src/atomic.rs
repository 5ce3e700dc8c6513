use std::sync::atomic::{AtomicU32, Ordering};

/// An `f32` stored as its bit pattern in an `AtomicU32`.
///
/// Loads and stores are single-word and never block, so the audio thread can
/// read values the control thread is writing.
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub const fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}
