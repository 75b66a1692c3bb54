//! Per-user check defaults (device and location) keyed by user id.
//!
//! Entries are created on the first write and live for the lifetime of the
//! process.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::Device;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Default)]
pub struct PreferenceStore {
    entries: RwLock<HashMap<String, Preference>>,
}

impl PreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: &str) -> Option<Preference> {
        self.entries.read().await.get(user_id).cloned()
    }

    /// Merges `update` into the user's entry; `None` fields keep their
    /// current value and a blank location clears it.
    pub async fn update(&self, user_id: &str, update: Preference) -> Preference {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(user_id.to_string()).or_default();

        if let Some(device) = update.device {
            entry.device = Some(device);
        }
        if let Some(location) = update.location {
            let location = location.trim();
            entry.location = (!location.is_empty()).then(|| location.to_string());
        }

        entry.clone()
    }

    /// `false` when the user had no entry.
    pub async fn remove(&self, user_id: &str) -> bool {
        self.entries.write().await.remove(user_id).is_some()
    }
}
