use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::params::{ParamId, Snapshot};

pub mod manager;

pub use manager::Manager;

/// A named set of parameter values, stored by stable key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, f32>,
}

impl Default for Preset {
    fn default() -> Self {
        Self::from_snapshot("New Preset".to_string(), &Snapshot::default())
    }
}

impl Preset {
    pub fn from_snapshot(name: String, snapshot: &Snapshot) -> Self {
        Self {
            name,
            description: None,
            author: None,
            values: snapshot
                .iter()
                .map(|(id, value)| (id.key().to_string(), value))
                .collect(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    /// Values as a snapshot. Keys the preset lacks keep their defaults;
    /// keys this build does not know are skipped.
    pub fn to_snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for (key, &value) in &self.values {
            match ParamId::from_key(key) {
                Some(id) => snapshot.set(id, value),
                None => warn!("Preset '{}': ignoring unknown parameter '{key}'", self.name),
            }
        }
        snapshot
    }
}
