use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML configuration file. Every field overrides the built-in
/// default when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub sync: FileSyncSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileSyncSettings {
    pub drain_interval_secs: Option<u64>,
    pub batch_size: Option<usize>,
    pub mirror_timeout_ms: Option<u64>,
    pub probe_timeout_ms: Option<u64>,
    pub replay_timeout_secs: Option<u64>,
    pub max_attempts: Option<i32>,
}

impl FileConfig {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_parses_to_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.sync.drain_interval_secs.is_none());
        assert!(config.sync.max_attempts.is_none());
    }

    #[test]
    fn test_partial_sync_section() {
        let config: FileConfig = toml::from_str(
            "[sync]\n\
             drain_interval_secs = 10\n\
             max_attempts = 3\n",
        )
        .unwrap();
        assert_eq!(config.sync.drain_interval_secs, Some(10));
        assert_eq!(config.sync.max_attempts, Some(3));
        assert!(config.sync.batch_size.is_none());
    }

    #[test]
    fn test_read_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync]\nbatch_size = 7").unwrap();

        let config = FileConfig::read(file.path()).unwrap();
        assert_eq!(config.sync.batch_size, Some(7));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(FileConfig::read("/no/such/config.toml").is_err());
    }
}
