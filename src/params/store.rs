use anyhow::{Result, anyhow};

use super::layout::{ParamInfo, RATIO_CHOICES};
use super::{Band, ParamId};
use crate::atomic::AtomicF32;

/// Current value of every parameter, shared between the control thread and
/// the audio thread.
///
/// Values are stored in plain units: Hz, dB and ms for floats, the choice
/// index for the ratio, and 0/1 for flags. Every slot is a single atomic
/// word, so no access ever blocks. Setting a value only stores it; consumers
/// pull on their own schedule.
pub struct ParameterStore {
    values: [AtomicF32; ParamId::COUNT],
}

/// A copy of every parameter value, in index order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    values: [f32; ParamId::COUNT],
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| {
                let default = ParamId::from_index(i).map_or(0.0, |id| id.info().default);
                AtomicF32::new(default)
            }),
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()].load()
    }

    /// Stores `value` after clamping it into the parameter's domain and
    /// returns what was stored.
    pub fn set(&self, id: ParamId, value: f32) -> f32 {
        let value = id.info().sanitize(value);
        self.values[id.index()].store(value);
        value
    }

    #[inline]
    pub fn get_bool(&self, id: ParamId) -> bool {
        self.get(id) >= 0.5
    }

    pub fn set_bool(&self, id: ParamId, value: bool) {
        self.set(id, if value { 1.0 } else { 0.0 });
    }

    pub fn toggle(&self, id: ParamId) -> bool {
        let value = !self.get_bool(id);
        self.set_bool(id, value);
        value
    }

    pub fn get_normalized(&self, id: ParamId) -> f32 {
        id.info().to_normalized(self.get(id))
    }

    pub fn set_normalized(&self, id: ParamId, normalized: f32) -> f32 {
        let info = id.info();
        self.set(id, info.from_normalized(normalized))
    }

    /// Looks a parameter up by its stable key and sets it.
    pub fn set_by_key(&self, key: &str, value: f32) -> Result<f32> {
        let id = ParamId::from_key(key).ok_or_else(|| anyhow!("unknown parameter '{key}'"))?;
        Ok(self.set(id, value))
    }

    /// The ratio selected for `band`, resolved through the choice list.
    pub fn ratio(&self, band: Band) -> f32 {
        let index = self.get(band.keys().ratio) as usize;
        RATIO_CHOICES[index.min(RATIO_CHOICES.len() - 1)]
    }

    /// True when every band is bypassed.
    pub fn global_bypass(&self) -> bool {
        Band::ALL
            .iter()
            .all(|band| self.get_bool(band.keys().bypassed))
    }

    pub fn set_global_bypass(&self, bypassed: bool) {
        for band in Band::ALL {
            self.set_bool(band.keys().bypassed, bypassed);
        }
    }

    pub fn any_solo(&self) -> bool {
        Band::ALL.iter().any(|band| self.get_bool(band.keys().solo))
    }

    pub fn reset_to_defaults(&self) {
        for id in ParamId::all() {
            self.values[id.index()].store(id.info().default);
        }
    }

    /// Every parameter with its metadata and current value, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamInfo, f32)> + '_ {
        ParamId::all().map(|id| (id.info(), self.get(id)))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            values: std::array::from_fn(|i| self.values[i].load()),
        }
    }

    pub fn apply(&self, snapshot: &Snapshot) {
        for (id, value) in snapshot.iter() {
            self.set(id, value);
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            values: std::array::from_fn(|i| {
                ParamId::from_index(i).map_or(0.0, |id| id.info().default)
            }),
        }
    }
}

impl Snapshot {
    pub const fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()]
    }

    pub fn set(&mut self, id: ParamId, value: f32) {
        self.values[id.index()] = id.info().sanitize(value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamId, f32)> + '_ {
        ParamId::all().map(|id| (id, self.values[id.index()]))
    }
}
