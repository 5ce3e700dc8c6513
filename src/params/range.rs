/// A continuous parameter range with a skew factor.
///
/// The skew shapes the normalised 0..1 mapping used by automation and
/// controls: `normalized = ((value - min) / (max - min)).powf(skew)`. A skew
/// below 1 gives more of the control's travel to the low end of the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
    pub skew: f32,
}

impl FloatRange {
    pub const fn linear(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            skew: 1.0,
        }
    }

    pub const fn skewed(min: f32, max: f32, skew: f32) -> Self {
        Self { min, max, skew }
    }

    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn to_normalized(&self, value: f32) -> f32 {
        let proportion = (self.clamp(value) - self.min) / (self.max - self.min);
        if self.skew == 1.0 {
            proportion
        } else {
            proportion.powf(self.skew)
        }
    }

    pub fn from_normalized(&self, normalized: f32) -> f32 {
        let normalized = normalized.clamp(0.0, 1.0);
        let proportion = if self.skew == 1.0 {
            normalized
        } else {
            normalized.powf(1.0 / self.skew)
        };
        self.clamp(self.min + (self.max - self.min) * proportion)
    }
}
