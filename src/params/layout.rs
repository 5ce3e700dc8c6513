use super::range::FloatRange;
use super::{BandParam, ParamId};

/// Ratio choices offered per band. The last entry is limiting.
pub const RATIO_CHOICES: [f32; 15] = [
    1.0,
    1.5,
    2.0,
    3.0,
    4.0,
    5.0,
    6.0,
    7.0,
    8.0,
    10.0,
    15.0,
    20.0,
    50.0,
    100.0,
    f32::INFINITY,
];

const DEFAULT_RATIO_INDEX: f32 = 3.0;

pub const LOW_MID_RANGE: FloatRange = FloatRange::skewed(20.0, 999.0, 0.25);
pub const MID_HIGH_RANGE: FloatRange = FloatRange::skewed(1000.0, 20000.0, 0.25);
pub const GAIN_RANGE: FloatRange = FloatRange::linear(-24.0, 24.0);
pub const THRESHOLD_RANGE: FloatRange = FloatRange::linear(-60.0, 0.0);
pub const TIME_RANGE: FloatRange = FloatRange::skewed(5.0, 500.0, 0.5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Float(FloatRange),
    Choice(&'static [f32]),
    Bool,
}

/// Everything a control surface needs to present one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamInfo {
    pub id: ParamId,
    pub name: &'static str,
    pub unit: &'static str,
    pub kind: ParamKind,
    pub default: f32,
}

const NAMES: [&str; ParamId::COUNT] = [
    "Low-Mid Crossover Freq",
    "Mid-High Crossover Freq",
    "Gain In",
    "Gain Out",
    "Threshold Low Band",
    "Attack Low Band",
    "Release Low Band",
    "Ratio Low Band",
    "Bypassed Low Band",
    "Mute Low Band",
    "Solo Low Band",
    "Threshold Mid Band",
    "Attack Mid Band",
    "Release Mid Band",
    "Ratio Mid Band",
    "Bypassed Mid Band",
    "Mute Mid Band",
    "Solo Mid Band",
    "Threshold High Band",
    "Attack High Band",
    "Release High Band",
    "Ratio High Band",
    "Bypassed High Band",
    "Mute High Band",
    "Solo High Band",
];

impl ParamId {
    pub fn info(self) -> ParamInfo {
        let (unit, kind, default) = match self {
            Self::LowMidCrossover => ("Hz", ParamKind::Float(LOW_MID_RANGE), 400.0),
            Self::MidHighCrossover => ("Hz", ParamKind::Float(MID_HIGH_RANGE), 2000.0),
            Self::InputGain | Self::OutputGain => ("dB", ParamKind::Float(GAIN_RANGE), 0.0),
            Self::Band(_, param) => match param {
                BandParam::Threshold => ("dB", ParamKind::Float(THRESHOLD_RANGE), 0.0),
                BandParam::Attack => ("ms", ParamKind::Float(TIME_RANGE), 50.0),
                BandParam::Release => ("ms", ParamKind::Float(TIME_RANGE), 250.0),
                BandParam::Ratio => ("", ParamKind::Choice(&RATIO_CHOICES), DEFAULT_RATIO_INDEX),
                BandParam::Bypassed | BandParam::Mute | BandParam::Solo => {
                    ("", ParamKind::Bool, 0.0)
                }
            },
        };

        ParamInfo {
            id: self,
            name: NAMES[self.index()],
            unit,
            kind,
            default,
        }
    }
}

impl ParamInfo {
    /// Bring any incoming value into this parameter's domain.
    ///
    /// Floats clamp to the range, choices round to the nearest index, and
    /// booleans threshold at 0.5. NaN falls back to the default.
    pub fn sanitize(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        match self.kind {
            ParamKind::Float(range) => range.clamp(value),
            ParamKind::Choice(choices) => value.round().clamp(0.0, (choices.len() - 1) as f32),
            ParamKind::Bool => {
                if value >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn to_normalized(&self, value: f32) -> f32 {
        match self.kind {
            ParamKind::Float(range) => range.to_normalized(value),
            ParamKind::Choice(choices) => self.sanitize(value) / (choices.len() - 1) as f32,
            ParamKind::Bool => self.sanitize(value),
        }
    }

    pub fn from_normalized(&self, normalized: f32) -> f32 {
        let normalized = normalized.clamp(0.0, 1.0);
        match self.kind {
            ParamKind::Float(range) => range.from_normalized(normalized),
            ParamKind::Choice(choices) => self.sanitize(normalized * (choices.len() - 1) as f32),
            ParamKind::Bool => self.sanitize(normalized),
        }
    }

    /// Human-readable value with unit, e.g. `2.5kHz`, `-20dB`, `4:1`.
    pub fn format(&self, value: f32) -> String {
        let value = self.sanitize(value);
        match self.kind {
            ParamKind::Float(_) => {
                if value.abs() > 999.0 {
                    format!("{}k{}", trim_number(value / 1000.0), self.unit)
                } else {
                    format!("{}{}", trim_number(value), self.unit)
                }
            }
            ParamKind::Choice(choices) => {
                let ratio = choices[value as usize];
                if ratio.is_infinite() {
                    "∞:1".to_string()
                } else {
                    format!("{}:1", trim_number(ratio))
                }
            }
            ParamKind::Bool => {
                if value >= 0.5 {
                    "on".to_string()
                } else {
                    "off".to_string()
                }
            }
        }
    }
}

fn trim_number(value: f32) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
