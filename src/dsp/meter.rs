use std::sync::Arc;

use super::common::{NEGATIVE_INFINITY_DB, lin_to_db};
use crate::atomic::AtomicF32;
use crate::params::Band;

/// Time constant of the RMS smoothing.
pub const RMS_TIME_MS: f32 = 300.0;

/// Smoothed RMS level: a one-pole lowpass over the block mean square.
#[derive(Debug, Clone)]
pub struct RmsMeter {
    mean_square: f32,
    sample_rate: f32,
}

impl RmsMeter {
    pub const fn new(sample_rate: f32) -> Self {
        Self {
            mean_square: 0.0,
            sample_rate,
        }
    }

    pub const fn reset(&mut self) {
        self.mean_square = 0.0;
    }

    /// Feed one block's mean square covering `num_samples` frames.
    pub fn process(&mut self, block_mean_square: f32, num_samples: usize) {
        if num_samples == 0 {
            return;
        }
        let coeff = (-(num_samples as f32) / (self.sample_rate * RMS_TIME_MS * 0.001)).exp();
        self.mean_square = coeff.mul_add(self.mean_square, (1.0 - coeff) * block_mean_square);
    }

    pub fn level_db(&self) -> f32 {
        lin_to_db(self.mean_square.sqrt())
    }
}

/// Levels published for one band.
#[derive(Debug)]
pub struct BandMeters {
    input_db: AtomicF32,
    output_db: AtomicF32,
    gain_reduction_db: AtomicF32,
}

impl Default for BandMeters {
    fn default() -> Self {
        Self {
            input_db: AtomicF32::new(NEGATIVE_INFINITY_DB),
            output_db: AtomicF32::new(NEGATIVE_INFINITY_DB),
            gain_reduction_db: AtomicF32::new(0.0),
        }
    }
}

impl BandMeters {
    pub fn publish(&self, reading: MeterReading) {
        self.input_db.store(reading.input_db);
        self.output_db.store(reading.output_db);
        self.gain_reduction_db.store(reading.gain_reduction_db);
    }

    pub fn reading(&self) -> MeterReading {
        MeterReading {
            input_db: self.input_db.load(),
            output_db: self.output_db.load(),
            gain_reduction_db: self.gain_reduction_db.load(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterReading {
    pub input_db: f32,
    pub output_db: f32,
    /// Largest reduction applied during the last block, as a positive number.
    pub gain_reduction_db: f32,
}

impl Default for MeterReading {
    fn default() -> Self {
        Self {
            input_db: NEGATIVE_INFINITY_DB,
            output_db: NEGATIVE_INFINITY_DB,
            gain_reduction_db: 0.0,
        }
    }
}

/// Read side of the band meters. Cloning shares the same slots.
#[derive(Debug, Clone, Default)]
pub struct MeterHandle {
    bands: Arc<[BandMeters; 3]>,
}

impl MeterHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn band(&self, band: Band) -> &BandMeters {
        &self.bands[band.index()]
    }

    pub fn reading(&self, band: Band) -> MeterReading {
        self.band(band).reading()
    }

    pub fn reset(&self) {
        for meters in self.bands.iter() {
            meters.publish(MeterReading::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_settles_on_constant_level() {
        let mut meter = RmsMeter::new(48_000.0);
        for _ in 0..1000 {
            meter.process(0.25, 512);
        }
        assert!((meter.level_db() - lin_to_db(0.5)).abs() < 0.01);
    }

    #[test]
    fn rms_smoothing_is_independent_of_block_size() {
        let mut small = RmsMeter::new(48_000.0);
        let mut large = RmsMeter::new(48_000.0);
        for _ in 0..64 {
            small.process(1.0, 64);
        }
        large.process(1.0, 4096);
        assert!((small.level_db() - large.level_db()).abs() < 1e-3);
    }

    #[test]
    fn silent_meter_reads_floor() {
        let meter = RmsMeter::new(44_100.0);
        assert_eq!(meter.level_db(), NEGATIVE_INFINITY_DB);
    }

    #[test]
    fn handle_clones_share_readings() {
        let handle = MeterHandle::new();
        let other = handle.clone();
        handle.band(Band::High).publish(MeterReading {
            input_db: -6.0,
            output_db: -9.0,
            gain_reduction_db: 3.0,
        });
        assert_eq!(other.reading(Band::High).gain_reduction_db, 3.0);
        assert_eq!(other.reading(Band::Low), MeterReading::default());

        other.reset();
        assert_eq!(handle.reading(Band::High), MeterReading::default());
    }
}
