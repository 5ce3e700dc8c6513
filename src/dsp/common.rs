/// Level reported for silence, in dB.
pub const NEGATIVE_INFINITY_DB: f32 = -72.0;

/// Convert decibels to linear amplitude.
#[inline]
pub fn db_to_lin(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels, floored at [`NEGATIVE_INFINITY_DB`].
#[inline]
pub fn lin_to_db(gain: f32) -> f32 {
    if gain > 0.0 {
        (20.0 * gain.log10()).max(NEGATIVE_INFINITY_DB)
    } else {
        NEGATIVE_INFINITY_DB
    }
}

/// Calculate a one-pole smoothing coefficient from a time constant in milliseconds.
///
/// Returns `exp(-1 / (sample_rate * time_ms * 0.001))`.
#[inline]
pub fn calculate_coefficient(time_ms: f32, sample_rate: f32) -> f32 {
    (-1.0 / (sample_rate * 0.001 * time_ms)).exp()
}

/// One-pole peak envelope follower with separate attack and release coefficients.
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

impl EnvelopeFollower {
    /// Create from pre-computed coefficients.
    pub const fn new(attack_coeff: f32, release_coeff: f32) -> Self {
        Self {
            envelope: 0.0,
            attack_coeff,
            release_coeff,
        }
    }

    /// Create from attack/release times in milliseconds.
    pub fn from_ms(attack_ms: f32, release_ms: f32, sample_rate: f32) -> Self {
        Self::new(
            calculate_coefficient(attack_ms, sample_rate),
            calculate_coefficient(release_ms, sample_rate),
        )
    }

    pub const fn set_attack_coeff(&mut self, coeff: f32) {
        self.attack_coeff = coeff;
    }

    pub const fn set_release_coeff(&mut self, coeff: f32) {
        self.release_coeff = coeff;
    }

    pub const fn value(&self) -> f32 {
        self.envelope
    }

    pub const fn reset(&mut self) {
        self.envelope = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let abs_input = input.abs();
        let coeff = if abs_input > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff.mul_add(self.envelope, (1.0 - coeff) * abs_input);
        self.envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_conversions_invert() {
        for &db in &[-60.0, -20.0, -6.0, 0.0, 12.0] {
            assert!((lin_to_db(db_to_lin(db)) - db).abs() < 1e-4);
        }
        assert_eq!(lin_to_db(0.0), NEGATIVE_INFINITY_DB);
        assert_eq!(lin_to_db(1e-9), NEGATIVE_INFINITY_DB);
    }

    #[test]
    fn envelope_reaches_63_percent_after_one_time_constant() {
        let sample_rate = 48_000.0;
        let mut env = EnvelopeFollower::from_ms(10.0, 100.0, sample_rate);
        let samples = (sample_rate * 0.010) as usize;
        for _ in 0..samples {
            env.process(1.0);
        }
        assert!((env.value() - (1.0 - (-1.0f32).exp())).abs() < 0.01);
    }

    #[test]
    fn release_is_slower_than_attack() {
        let mut env = EnvelopeFollower::from_ms(1.0, 100.0, 48_000.0);
        for _ in 0..4800 {
            env.process(1.0);
        }
        assert!(env.value() > 0.99);
        for _ in 0..480 {
            env.process(0.0);
        }
        // 10 ms into a 100 ms release
        assert!(env.value() > 0.85);
        env.reset();
        assert_eq!(env.value(), 0.0);
    }
}
