use std::f32::consts::{FRAC_1_SQRT_2, PI};

/// Lowest cutoff the filters accept.
pub const MIN_CUTOFF_HZ: f32 = 10.0;
/// Highest cutoff as a fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.49;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    Lowpass,
    Highpass,
    Allpass,
}

/// Clamp a cutoff into the range the bilinear design stays stable for.
#[inline]
pub fn clamp_cutoff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    // max/min rather than clamp: tiny sample rates invert the bounds.
    cutoff_hz.min(sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF_HZ)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Coefficients {
    /// Second-order section with Butterworth Q, normalised by a0.
    fn butterworth(filter_type: FilterType, cutoff_hz: f32, sample_rate: f32) -> Self {
        let omega = 2.0 * PI * clamp_cutoff(cutoff_hz, sample_rate) / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * FRAC_1_SQRT_2);

        let a0 = 1.0 + alpha;
        let (b0, b1, b2) = match filter_type {
            FilterType::Lowpass => (
                (1.0 - cos_omega) / 2.0,
                1.0 - cos_omega,
                (1.0 - cos_omega) / 2.0,
            ),
            FilterType::Highpass => (
                (1.0 + cos_omega) / 2.0,
                -(1.0 + cos_omega),
                (1.0 + cos_omega) / 2.0,
            ),
            FilterType::Allpass => (1.0 - alpha, -2.0 * cos_omega, 1.0 + alpha),
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: (-2.0 * cos_omega) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

/// Biquad in transposed direct form II.
#[derive(Debug, Clone)]
pub struct Biquad {
    coeffs: Coefficients,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, sample_rate: f32) -> Self {
        Self {
            coeffs: Coefficients::butterworth(filter_type, cutoff_hz, sample_rate),
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Recompute coefficients, keeping the delay state.
    pub fn set_cutoff(&mut self, filter_type: FilterType, cutoff_hz: f32, sample_rate: f32) {
        self.coeffs = Coefficients::butterworth(filter_type, cutoff_hz, sample_rate);
    }

    pub const fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let output = c.b0 * input + self.z1;
        self.z1 = c.b1 * input - c.a1 * output + self.z2;
        self.z2 = c.b2 * input - c.a2 * output;
        output
    }
}

/// Linkwitz-Riley 4th order filter.
///
/// Low- and high-pass are two cascaded 2nd order Butterworth sections, so
/// LP + HP at the same cutoff is flat in magnitude. That sum equals a single
/// 2nd order all-pass with Butterworth Q, which is what the all-pass variant
/// runs; it is used to give a band the same phase shift as a sibling that
/// went through an extra split.
#[derive(Debug, Clone)]
pub struct LinkwitzRiley {
    filter_type: FilterType,
    cutoff_hz: f32,
    sections: [Biquad; 2],
}

impl LinkwitzRiley {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, sample_rate: f32) -> Self {
        Self {
            filter_type,
            cutoff_hz,
            sections: [
                Biquad::new(filter_type, cutoff_hz, sample_rate),
                Biquad::new(filter_type, cutoff_hz, sample_rate),
            ],
        }
    }

    pub const fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub const fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        self.cutoff_hz = cutoff_hz;
        for section in &mut self.sections {
            section.set_cutoff(self.filter_type, cutoff_hz, sample_rate);
        }
    }

    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let first = self.sections[0].process(input);
        if self.filter_type == FilterType::Allpass {
            first
        } else {
            self.sections[1].process(first)
        }
    }
}
