//! Parameter identities, layout and the shared store.
//!
//! Every parameter is addressed by a [`ParamId`]. Each id has a stable
//! string key (used by presets and the control surface) and a dense index
//! (used by the store's atomic slots).

pub mod layout;
pub mod range;
pub mod store;

pub use layout::{ParamInfo, ParamKind, RATIO_CHOICES};
pub use range::FloatRange;
pub use store::{ParameterStore, Snapshot};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    pub const ALL: [Self; 3] = [Self::Low, Self::Mid, Self::High];

    pub const fn index(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Mid => 1,
            Self::High => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Mid => "Mid",
            Self::High => "High",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "mid" => Some(Self::Mid),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// The parameter ids this band reads.
    pub const fn keys(self) -> BandKeys {
        BandKeys {
            threshold: ParamId::Band(self, BandParam::Threshold),
            attack: ParamId::Band(self, BandParam::Attack),
            release: ParamId::Band(self, BandParam::Release),
            ratio: ParamId::Band(self, BandParam::Ratio),
            bypassed: ParamId::Band(self, BandParam::Bypassed),
            mute: ParamId::Band(self, BandParam::Mute),
            solo: ParamId::Band(self, BandParam::Solo),
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BandParam {
    Threshold,
    Attack,
    Release,
    Ratio,
    Bypassed,
    Mute,
    Solo,
}

impl BandParam {
    pub const ALL: [Self; 7] = [
        Self::Threshold,
        Self::Attack,
        Self::Release,
        Self::Ratio,
        Self::Bypassed,
        Self::Mute,
        Self::Solo,
    ];

    const fn offset(self) -> usize {
        match self {
            Self::Threshold => 0,
            Self::Attack => 1,
            Self::Release => 2,
            Self::Ratio => 3,
            Self::Bypassed => 4,
            Self::Mute => 5,
            Self::Solo => 6,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "threshold" => Some(Self::Threshold),
            "attack" => Some(Self::Attack),
            "release" => Some(Self::Release),
            "ratio" => Some(Self::Ratio),
            "bypass" | "bypassed" => Some(Self::Bypassed),
            "mute" => Some(Self::Mute),
            "solo" => Some(Self::Solo),
            _ => None,
        }
    }
}

/// The set of parameter ids one band reads from the store.
///
/// Switching which band is being edited means switching key-sets; nothing
/// holds a reference into the store itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandKeys {
    pub threshold: ParamId,
    pub attack: ParamId,
    pub release: ParamId,
    pub ratio: ParamId,
    pub bypassed: ParamId,
    pub mute: ParamId,
    pub solo: ParamId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamId {
    LowMidCrossover,
    MidHighCrossover,
    InputGain,
    OutputGain,
    Band(Band, BandParam),
}

const GLOBAL_COUNT: usize = 4;

const KEYS: [&str; ParamId::COUNT] = [
    "low_mid_crossover",
    "mid_high_crossover",
    "input_gain",
    "output_gain",
    "threshold_low",
    "attack_low",
    "release_low",
    "ratio_low",
    "bypassed_low",
    "mute_low",
    "solo_low",
    "threshold_mid",
    "attack_mid",
    "release_mid",
    "ratio_mid",
    "bypassed_mid",
    "mute_mid",
    "solo_mid",
    "threshold_high",
    "attack_high",
    "release_high",
    "ratio_high",
    "bypassed_high",
    "mute_high",
    "solo_high",
];

impl ParamId {
    pub const COUNT: usize = GLOBAL_COUNT + Band::ALL.len() * BandParam::ALL.len();

    /// Dense index into the store's value slots.
    pub const fn index(self) -> usize {
        match self {
            Self::LowMidCrossover => 0,
            Self::MidHighCrossover => 1,
            Self::InputGain => 2,
            Self::OutputGain => 3,
            Self::Band(band, param) => {
                GLOBAL_COUNT + band.index() * BandParam::ALL.len() + param.offset()
            }
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::LowMidCrossover),
            1 => Some(Self::MidHighCrossover),
            2 => Some(Self::InputGain),
            3 => Some(Self::OutputGain),
            i if i < Self::COUNT => {
                let rel = i - GLOBAL_COUNT;
                let band = Band::ALL[rel / BandParam::ALL.len()];
                let param = BandParam::ALL[rel % BandParam::ALL.len()];
                Some(Self::Band(band, param))
            }
            _ => None,
        }
    }

    /// Every id, in index order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).filter_map(Self::from_index)
    }

    /// Stable key used for persistence and lookup by name.
    pub const fn key(self) -> &'static str {
        KEYS[self.index()]
    }

    pub fn from_key(key: &str) -> Option<Self> {
        KEYS.iter()
            .position(|&k| k == key)
            .and_then(Self::from_index)
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
