mod file_config;

pub use file_config::FileConfig;

use crate::sync::SyncDrainerSettings;
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Values collected from the command line before file merging.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: PathBuf,
    pub config_file: Option<PathBuf>,
}

/// Sync tunables after defaults and file overrides are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub drain_interval_secs: u64,
    pub batch_size: usize,
    pub mirror_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    pub replay_timeout_secs: u64,
    pub max_attempts: i32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            drain_interval_secs: 30,
            batch_size: 50,
            mirror_timeout_ms: 300,
            probe_timeout_ms: 200,
            replay_timeout_secs: 5,
            max_attempts: 10,
        }
    }
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub sync: SyncSettings,
}

impl AppConfig {
    /// Merge CLI values with the optional TOML file; file values win over
    /// built-in defaults for the sync tunables.
    pub fn resolve(cli: CliConfig) -> Result<Self> {
        let file = match &cli.config_file {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(cli, file))
    }

    fn merge(cli: CliConfig, file: FileConfig) -> Self {
        let defaults = SyncSettings::default();
        let sync = SyncSettings {
            drain_interval_secs: file
                .sync
                .drain_interval_secs
                .unwrap_or(defaults.drain_interval_secs),
            batch_size: file.sync.batch_size.unwrap_or(defaults.batch_size),
            mirror_timeout_ms: file
                .sync
                .mirror_timeout_ms
                .unwrap_or(defaults.mirror_timeout_ms),
            probe_timeout_ms: file
                .sync
                .probe_timeout_ms
                .unwrap_or(defaults.probe_timeout_ms),
            replay_timeout_secs: file
                .sync
                .replay_timeout_secs
                .unwrap_or(defaults.replay_timeout_secs),
            max_attempts: file.sync.max_attempts.unwrap_or(defaults.max_attempts),
        };
        Self {
            db_dir: cli.db_dir,
            sync,
        }
    }

    pub fn workshops_db_path(&self) -> PathBuf {
        self.db_dir.join("workshops.db")
    }

    pub fn search_index_db_path(&self) -> PathBuf {
        self.db_dir.join("search_index.db")
    }

    pub fn sync_ledger_db_path(&self) -> PathBuf {
        self.db_dir.join("sync_ledger.db")
    }

    pub fn mirror_timeout(&self) -> Duration {
        Duration::from_millis(self.sync.mirror_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.sync.probe_timeout_ms)
    }

    pub fn drainer_settings(&self) -> SyncDrainerSettings {
        SyncDrainerSettings {
            drain_interval: Duration::from_secs(self.sync.drain_interval_secs),
            batch_size: self.sync.batch_size,
            replay_timeout: Duration::from_secs(self.sync.replay_timeout_secs),
            max_attempts: self.sync.max_attempts,
        }
    }
}
