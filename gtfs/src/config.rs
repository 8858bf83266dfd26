use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How a feed is loaded. Every field has a default, so a config file only needs to name what it
/// overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub store: StoreConfig,
    pub dangling: DanglingPolicy,
    pub duplicates: DuplicatePolicy,
}

/// Tuning for the disk-backed tables (stop times and shape points)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Where scratch databases are created. Defaults to the system temp directory.
    pub scratch_dir: Option<PathBuf>,
    /// Page cache per store. Past this, pages spill to the scratch file.
    pub cache_size_kib: u32,
    /// How much of the scratch file reads may memory-map
    pub mmap_size_bytes: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            cache_size_kib: 64 * 1024,
            mmap_size_bytes: 256 * 1024 * 1024,
        }
    }
}

/// What happens to a row referencing an ID that hasn't been loaded. The error is recorded
/// either way. One policy covers every table in a load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingPolicy {
    #[default]
    Drop,
    Retain,
}

/// What happens when a later row has the same key as an earlier one. The error is recorded
/// either way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    LastWins,
    FirstWins,
}

impl FeedConfig {
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }
}
