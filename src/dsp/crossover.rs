use super::biquad::{FilterType, LinkwitzRiley, MAX_CUTOFF_RATIO, MIN_CUTOFF_HZ};
use crate::buffer::{AudioBuffer, MAX_CHANNELS};
use crate::params::ParamId;

/// Smallest gap kept between the two crossover points.
pub const MIN_CROSSOVER_SPACING_HZ: f32 = 1.0;

/// Filters for one channel of the network.
#[derive(Debug, Clone)]
struct ChannelFilters {
    lp1: LinkwitzRiley,
    hp1: LinkwitzRiley,
    ap2: LinkwitzRiley,
    lp2: LinkwitzRiley,
    hp2: LinkwitzRiley,
}

impl ChannelFilters {
    fn new(low_mid: f32, mid_high: f32, sample_rate: f32) -> Self {
        Self {
            lp1: LinkwitzRiley::new(FilterType::Lowpass, low_mid, sample_rate),
            hp1: LinkwitzRiley::new(FilterType::Highpass, low_mid, sample_rate),
            ap2: LinkwitzRiley::new(FilterType::Allpass, mid_high, sample_rate),
            lp2: LinkwitzRiley::new(FilterType::Lowpass, mid_high, sample_rate),
            hp2: LinkwitzRiley::new(FilterType::Highpass, mid_high, sample_rate),
        }
    }

    fn set_frequencies(&mut self, low_mid: f32, mid_high: f32, sample_rate: f32) {
        self.lp1.set_cutoff(low_mid, sample_rate);
        self.hp1.set_cutoff(low_mid, sample_rate);
        self.ap2.set_cutoff(mid_high, sample_rate);
        self.lp2.set_cutoff(mid_high, sample_rate);
        self.hp2.set_cutoff(mid_high, sample_rate);
    }

    fn reset(&mut self) {
        self.lp1.reset();
        self.hp1.reset();
        self.ap2.reset();
        self.lp2.reset();
        self.hp2.reset();
    }

    #[inline]
    fn split(&mut self, x: f32) -> (f32, f32, f32) {
        let low = self.ap2.process(self.lp1.process(x));
        let upper = self.hp1.process(x);
        let mid = self.lp2.process(upper);
        let high = self.hp2.process(upper);
        (low, mid, high)
    }
}

/// Three-way Linkwitz-Riley crossover.
///
/// The low band goes through an all-pass at the upper crossover so that it
/// carries the same phase shift as the mid and high bands, which both went
/// through the second split. Summing the three outputs gives the input run
/// through two all-pass sections: flat magnitude, no cancellation notches.
#[derive(Debug, Clone)]
pub struct Crossover {
    sample_rate: f32,
    low_mid_hz: f32,
    mid_high_hz: f32,
    channels: [ChannelFilters; MAX_CHANNELS],
}

impl Crossover {
    pub fn new(sample_rate: f32) -> Self {
        let (low_mid, mid_high) = effective_frequencies(
            ParamId::LowMidCrossover.info().default,
            ParamId::MidHighCrossover.info().default,
            sample_rate,
        );
        Self {
            sample_rate,
            low_mid_hz: low_mid,
            mid_high_hz: mid_high,
            channels: std::array::from_fn(|_| ChannelFilters::new(low_mid, mid_high, sample_rate)),
        }
    }

    /// Effective `(low_mid, mid_high)` cutoffs after ordering and range clamps.
    pub const fn frequencies(&self) -> (f32, f32) {
        (self.low_mid_hz, self.mid_high_hz)
    }

    /// Moves the crossover points. Coefficients are only recomputed when the
    /// effective frequencies change; filter state is kept either way.
    pub fn set_frequencies(&mut self, low_mid: f32, mid_high: f32) {
        let (low_mid, mid_high) = effective_frequencies(low_mid, mid_high, self.sample_rate);
        if low_mid == self.low_mid_hz && mid_high == self.mid_high_hz {
            return;
        }
        self.low_mid_hz = low_mid;
        self.mid_high_hz = mid_high;
        for channel in &mut self.channels {
            channel.set_frequencies(low_mid, mid_high, self.sample_rate);
        }
    }

    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }

    /// Split one channel of `input` into the three band slices.
    ///
    /// All four slices must be the same length.
    pub fn split_channel(
        &mut self,
        channel: usize,
        input: &[f32],
        low: &mut [f32],
        mid: &mut [f32],
        high: &mut [f32],
    ) {
        let filters = &mut self.channels[channel];
        for (i, &x) in input.iter().enumerate() {
            let (l, m, h) = filters.split(x);
            low[i] = l;
            mid[i] = m;
            high[i] = h;
        }
    }

    /// Split every channel of `input` into the band buffers.
    ///
    /// The band buffers take the input's active length.
    pub fn split(
        &mut self,
        input: &AudioBuffer,
        low: &mut AudioBuffer,
        mid: &mut AudioBuffer,
        high: &mut AudioBuffer,
    ) {
        let num_samples = input.num_samples();
        for band in [&mut *low, &mut *mid, &mut *high] {
            band.set_num_samples(num_samples);
        }
        let num_channels = input
            .num_channels()
            .min(low.num_channels())
            .min(MAX_CHANNELS);
        for ch in 0..num_channels {
            self.split_channel(
                ch,
                input.channel(ch),
                low.channel_mut(ch),
                mid.channel_mut(ch),
                high.channel_mut(ch),
            );
        }
    }
}

/// Keeps `mid_high` at least [`MIN_CROSSOVER_SPACING_HZ`] above `low_mid` and
/// both below the Nyquist limit.
pub fn effective_frequencies(low_mid: f32, mid_high: f32, sample_rate: f32) -> (f32, f32) {
    let limit = sample_rate * MAX_CUTOFF_RATIO;
    let low_mid = low_mid
        .min(limit - MIN_CROSSOVER_SPACING_HZ)
        .max(MIN_CUTOFF_HZ);
    let mid_high = mid_high
        .max(low_mid + MIN_CROSSOVER_SPACING_HZ)
        .min(limit);
    (low_mid, mid_high)
}
