use super::common::{EnvelopeFollower, calculate_coefficient, db_to_lin, lin_to_db};
use super::meter::{MeterReading, RmsMeter};
use crate::buffer::{AudioBuffer, MAX_CHANNELS};
use crate::params::{Band, BandKeys, ParameterStore};

/// Values one band reads from the store at the top of a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorSettings {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    pub bypassed: bool,
}

impl CompressorSettings {
    pub fn from_store(store: &ParameterStore, band: Band) -> Self {
        let keys = band.keys();
        Self {
            threshold_db: store.get(keys.threshold),
            ratio: store.ratio(band),
            attack_ms: store.get(keys.attack),
            release_ms: store.get(keys.release),
            bypassed: store.get_bool(keys.bypassed),
        }
    }
}

/// Feed-forward peak compressor for one band.
pub struct CompressorBand {
    band: Band,
    keys: BandKeys,
    sample_rate: f32,
    settings: CompressorSettings,
    threshold: f32, // Threshold in linear scale
    exponent: f32,  // 1 / ratio - 1
    envelopes: [EnvelopeFollower; MAX_CHANNELS],
    input_rms: RmsMeter,
    output_rms: RmsMeter,
    gain_reduction_db: f32,
}

impl CompressorBand {
    pub fn new(band: Band, sample_rate: f32) -> Self {
        let settings = CompressorSettings::from_store(&ParameterStore::new(), band);
        let mut compressor = Self {
            band,
            keys: band.keys(),
            sample_rate,
            settings,
            threshold: 1.0,
            exponent: 0.0,
            envelopes: std::array::from_fn(|_| {
                EnvelopeFollower::from_ms(settings.attack_ms, settings.release_ms, sample_rate)
            }),
            input_rms: RmsMeter::new(sample_rate),
            output_rms: RmsMeter::new(sample_rate),
            gain_reduction_db: 0.0,
        };
        compressor.set_gain_curve(settings.threshold_db, settings.ratio);
        compressor
    }

    pub const fn band(&self) -> Band {
        self.band
    }

    pub const fn keys(&self) -> BandKeys {
        self.keys
    }

    pub const fn settings(&self) -> CompressorSettings {
        self.settings
    }

    /// Pull this band's values from the store.
    pub fn update_settings(&mut self, store: &ParameterStore) {
        self.apply_settings(CompressorSettings::from_store(store, self.band));
    }

    pub fn apply_settings(&mut self, settings: CompressorSettings) {
        if settings.attack_ms != self.settings.attack_ms {
            let coeff = calculate_coefficient(settings.attack_ms, self.sample_rate);
            for env in &mut self.envelopes {
                env.set_attack_coeff(coeff);
            }
        }
        if settings.release_ms != self.settings.release_ms {
            let coeff = calculate_coefficient(settings.release_ms, self.sample_rate);
            for env in &mut self.envelopes {
                env.set_release_coeff(coeff);
            }
        }
        if settings.threshold_db != self.settings.threshold_db
            || settings.ratio != self.settings.ratio
        {
            self.set_gain_curve(settings.threshold_db, settings.ratio);
        }
        self.settings = settings;
    }

    fn set_gain_curve(&mut self, threshold_db: f32, ratio: f32) {
        self.threshold = db_to_lin(threshold_db);
        // An infinite ratio gives -1: the output is pinned at the threshold.
        self.exponent = ratio.max(1.0).recip() - 1.0;
    }

    /// Re-initialise for a new stream. Clears envelopes and meters.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.input_rms = RmsMeter::new(sample_rate);
        self.output_rms = RmsMeter::new(sample_rate);
        let settings = self.settings;
        for env in &mut self.envelopes {
            *env = EnvelopeFollower::from_ms(settings.attack_ms, settings.release_ms, sample_rate);
        }
        self.gain_reduction_db = 0.0;
    }

    pub fn reset(&mut self) {
        for env in &mut self.envelopes {
            env.reset();
        }
        self.input_rms.reset();
        self.output_rms.reset();
        self.gain_reduction_db = 0.0;
    }

    /// Compress `buffer` in place.
    ///
    /// When bypassed the envelopes still track the signal, so switching
    /// bypass off does not start from a stale level.
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        let num_samples = buffer.num_samples();
        let num_channels = buffer.num_channels().min(MAX_CHANNELS);
        let bypassed = self.settings.bypassed;
        let threshold = self.threshold;
        let exponent = self.exponent;

        let mut sum_in = 0.0f32;
        let mut sum_out = 0.0f32;
        let mut min_gain = 1.0f32;

        for ch in 0..num_channels {
            let env = &mut self.envelopes[ch];
            for sample in buffer.channel_mut(ch) {
                let input = *sample;
                sum_in += input * input;

                let level = env.process(input);
                if !bypassed && level > threshold {
                    let gain = (level / threshold).powf(exponent);
                    min_gain = min_gain.min(gain);
                    *sample = input * gain;
                }
                sum_out += *sample * *sample;
            }
        }

        let count = (num_samples * num_channels).max(1) as f32;
        self.input_rms.process(sum_in / count, num_samples);
        self.output_rms.process(sum_out / count, num_samples);
        self.gain_reduction_db = -lin_to_db(min_gain);
    }

    /// Largest gain reduction applied in the last block, in positive dB.
    pub const fn gain_reduction_db(&self) -> f32 {
        self.gain_reduction_db
    }

    pub fn input_rms_db(&self) -> f32 {
        self.input_rms.level_db()
    }

    pub fn output_rms_db(&self) -> f32 {
        self.output_rms.level_db()
    }

    pub fn meter_reading(&self) -> MeterReading {
        MeterReading {
            input_db: self.input_rms_db(),
            output_db: self.output_rms_db(),
            gain_reduction_db: self.gain_reduction_db,
        }
    }
}
