//! Text control surface.
//!
//! Commands are parsed into [`Command`] values and applied by a single
//! [`ControlSurface`], which owns the band currently being edited.

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info};
use std::fmt::Write as _;

use crate::engine::EngineHandle;
use crate::params::{Band, BandParam, ParamId, RATIO_CHOICES};
use crate::preset::Manager;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set any parameter by its stable key.
    Set(ParamId, f32),
    SelectBand(Band),
    /// Set a parameter of the selected band.
    SetBand(BandParam, f32),
    /// Toggle mute, solo or bypass on a band, or on the selected one.
    Toggle(BandParam, Option<Band>),
    ToggleGlobalBypass,
    LoadPreset(String),
    SavePreset(String),
    Reset,
    Show,
    Meters,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  set <key> <value>                    set any parameter by key
  band <low|mid|high>                  select the band to edit
  threshold|attack|release <value>     edit the selected band
  ratio <value>                        e.g. 4, 4:1 or inf
  mute|solo|bypass [low|mid|high]      toggle a band flag
  bypass all                           toggle global bypass
  load <preset> / save <preset>        presets
  reset                                clear filter and envelope state
  show | meters | help | quit";

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let head = words
            .next()
            .ok_or_else(|| anyhow!("empty command"))?
            .to_ascii_lowercase();
        let rest: Vec<&str> = words.collect();

        let command = match (head.as_str(), rest.as_slice()) {
            ("set", [key, value]) => {
                let id = ParamId::from_key(key).ok_or_else(|| anyhow!("unknown parameter '{key}'"))?;
                let value = if matches!(id, ParamId::Band(_, BandParam::Ratio)) {
                    ratio_index(parse_ratio(value)?)
                } else {
                    parse_number(value)?
                };
                Self::Set(id, value)
            }
            ("band", [name]) => Self::SelectBand(parse_band(name)?),
            ("ratio", [value]) => Self::SetBand(BandParam::Ratio, ratio_index(parse_ratio(value)?)),
            ("threshold" | "attack" | "release", [value]) => {
                let param = BandParam::from_name(&head).ok_or_else(|| anyhow!("unknown command"))?;
                Self::SetBand(param, parse_number(value)?)
            }
            ("bypass", ["all"]) => Self::ToggleGlobalBypass,
            ("mute" | "solo" | "bypass", []) => {
                let param = BandParam::from_name(&head).ok_or_else(|| anyhow!("unknown command"))?;
                Self::Toggle(param, None)
            }
            ("mute" | "solo" | "bypass", [name]) => {
                let param = BandParam::from_name(&head).ok_or_else(|| anyhow!("unknown command"))?;
                Self::Toggle(param, Some(parse_band(name)?))
            }
            ("load", [_, ..]) => Self::LoadPreset(rest.join(" ")),
            ("save", [_, ..]) => Self::SavePreset(rest.join(" ")),
            ("reset", []) => Self::Reset,
            ("show", []) => Self::Show,
            ("meters", []) => Self::Meters,
            ("help" | "?", []) => Self::Help,
            ("quit" | "exit" | "q", []) => Self::Quit,
            _ => bail!("cannot parse '{}', try 'help'", line.trim()),
        };
        Ok(command)
    }
}

fn parse_band(name: &str) -> Result<Band> {
    Band::from_name(name).ok_or_else(|| anyhow!("unknown band '{name}'"))
}

fn parse_number(text: &str) -> Result<f32> {
    text.parse::<f32>()
        .with_context(|| format!("'{text}' is not a number"))
}

fn parse_ratio(text: &str) -> Result<f32> {
    let text = text.trim_end_matches(":1");
    match text.to_ascii_lowercase().as_str() {
        "inf" | "∞" | "limit" => Ok(f32::INFINITY),
        other => parse_number(other),
    }
}

/// Index of the ratio choice closest to `ratio`.
pub fn ratio_index(ratio: f32) -> f32 {
    if ratio.is_infinite() {
        return (RATIO_CHOICES.len() - 1) as f32;
    }
    RATIO_CHOICES
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_finite())
        .min_by(|(_, a), (_, b)| (*a - ratio).abs().total_cmp(&(*b - ratio).abs()))
        .map_or(0.0, |(i, _)| i as f32)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

/// Applies commands to the engine's parameters.
pub struct ControlSurface {
    engine: EngineHandle,
    presets: Option<Manager>,
    selected: Band,
}

impl ControlSurface {
    pub const fn new(engine: EngineHandle, presets: Option<Manager>) -> Self {
        Self {
            engine,
            presets,
            selected: Band::Mid,
        }
    }

    pub const fn selected_band(&self) -> Band {
        self.selected
    }

    pub fn execute_line(&mut self, line: &str) -> Result<Outcome> {
        self.execute(Command::parse(line)?)
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        debug!("Control command: {command:?}");
        let store = self.engine.store();

        let text = match command {
            Command::Set(id, value) => {
                let stored = store.set(id, value);
                format!("{} = {}", id.info().name, id.info().format(stored))
            }
            Command::SelectBand(band) => {
                self.selected = band;
                format!("editing {band} band")
            }
            Command::SetBand(param, value) => {
                let id = ParamId::Band(self.selected, param);
                let stored = store.set(id, value);
                format!("{} = {}", id.info().name, id.info().format(stored))
            }
            Command::Toggle(param, band) => {
                let id = ParamId::Band(band.unwrap_or(self.selected), param);
                let on = store.toggle(id);
                format!("{} {}", id.info().name, if on { "on" } else { "off" })
            }
            Command::ToggleGlobalBypass => {
                let bypassed = !store.global_bypass();
                store.set_global_bypass(bypassed);
                format!("global bypass {}", if bypassed { "on" } else { "off" })
            }
            Command::LoadPreset(name) => {
                let presets = self
                    .presets
                    .as_ref()
                    .ok_or_else(|| anyhow!("no preset directory configured"))?;
                let preset = presets
                    .get_preset_by_name(&name)
                    .ok_or_else(|| anyhow!("no preset named '{name}'"))?;
                self.engine.load_snapshot(preset.to_snapshot())?;
                info!("Loaded preset '{name}'");
                format!("loaded '{name}'")
            }
            Command::SavePreset(name) => {
                let snapshot = store.snapshot();
                let presets = self
                    .presets
                    .as_mut()
                    .ok_or_else(|| anyhow!("no preset directory configured"))?;
                presets.save_snapshot(&name, &snapshot)?;
                info!("Saved preset '{name}'");
                format!("saved '{name}'")
            }
            Command::Reset => {
                self.engine.reset()?;
                "state cleared".to_string()
            }
            Command::Show => self.describe(),
            Command::Meters => self.describe_meters(),
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Continue(text))
    }

    /// Every parameter with its formatted value.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (info, value) in self.engine.store().iter() {
            let marker = match info.id {
                ParamId::Band(band, _) if band == self.selected => '*',
                _ => ' ',
            };
            let _ = writeln!(out, "{marker} {:<26} {}", info.name, info.format(value));
        }
        out
    }

    pub fn describe_meters(&self) -> String {
        let mut out = String::new();
        for band in Band::ALL {
            let reading = self.engine.meters().reading(band);
            let _ = writeln!(
                out,
                "{:<5} in {:>6.1} dB  out {:>6.1} dB  gr {:>5.1} dB",
                band.name(),
                reading.input_db,
                reading.output_db,
                reading.gain_reduction_db
            );
        }
        out
    }
}
