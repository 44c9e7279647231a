use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::profile::Difficulty;
use crate::trainer::INTER_SET_PAUSE;

pub const DEFAULT_TICK_RATE_MS: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    pub wallet_address: Option<String>,
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Beginner,
            wallet_address: None,
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
        }
    }
}

impl Config {
    /// Command-line values win over stored ones
    pub fn with_overrides(mut self, difficulty: Option<Difficulty>, wallet: Option<String>) -> Self {
        if let Some(d) = difficulty {
            self.difficulty = d;
        }
        if wallet.is_some() {
            self.wallet_address = wallet;
        }
        if !tick_rate_fits_schedules(self.tick_rate_ms) {
            tracing::warn!(
                tick_rate_ms = self.tick_rate_ms,
                "tick rate does not divide every phase length, using default"
            );
            self.tick_rate_ms = DEFAULT_TICK_RATE_MS;
        }
        self
    }
}

/// Phase boundaries only land on a tick when the cadence divides every phase
/// length and the inter-set pause; anything else stretches phases.
pub fn tick_rate_fits_schedules(tick_rate_ms: u64) -> bool {
    if tick_rate_ms == 0 {
        return false;
    }
    let pause_ms = INTER_SET_PAUSE.as_millis() as u64;
    pause_ms % tick_rate_ms == 0
        && Difficulty::ALL.iter().all(|d| {
            let p = d.profile();
            p.contract_ms() % tick_rate_ms == 0 && p.relax_ms() % tick_rate_ms == 0
        })
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "peed") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("peed_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|err| {
                tracing::warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
