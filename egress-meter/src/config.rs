//! Probe configuration.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::table::{DEFAULT_MAX_ENTRIES, DEFAULT_SHARDS};

/// Sizing knobs for the accounting table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Maximum number of destinations tracked at once
    pub max_entries: usize,
    /// Number of lock stripes in the table (clamped to at least 1)
    pub shards: usize,
}

impl ProbeConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("failed to parse config file as JSON")
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("failed to serialize config to JSON")?;

        fs::write(path.as_ref(), content)
            .with_context(|| format!("failed to write config file: {:?}", path.as_ref()))?;

        Ok(())
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            shards: DEFAULT_SHARDS,
        }
    }
}
