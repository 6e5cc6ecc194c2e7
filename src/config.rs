use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// SQLite journal mode applied when a store opens its connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
    Memory,
}

impl JournalMode {
    pub fn pragma_value(&self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
            JournalMode::Memory => "MEMORY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database: Option<String>,
    /// Reject attribute/trial rows that reference missing parents
    pub foreign_keys: bool,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout_ms: u64,
    pub journal_mode: JournalMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: None,
            foreign_keys: true,
            busy_timeout_ms: 5_000,
            journal_mode: JournalMode::Wal,
        }
    }
}

impl StoreConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path)
    }

    /// Reject settings SQLite would misread
    pub fn validate(&self) -> crate::Result<()> {
        if matches!(self.database.as_deref(), Some(path) if path.trim().is_empty()) {
            return Err(crate::Error::Config("database path is empty".to_string()));
        }
        if self.busy_timeout_ms > u32::MAX as u64 {
            return Err(crate::Error::Config(format!(
                "busy_timeout_ms {} is out of range",
                self.busy_timeout_ms
            )));
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("trialstore.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("trialstore.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<StoreConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: StoreConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &StoreConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: StoreConfig =
            toml::from_str("database = \"runs/study.db\"\nforeign_keys = false\n").unwrap();
        assert_eq!(config.database_path(), PathBuf::from("runs/study.db"));
        assert!(!config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert_eq!(config.journal_mode, JournalMode::Wal);
    }

    #[test]
    fn test_validate() {
        assert!(StoreConfig::default().validate().is_ok());

        let empty = StoreConfig {
            database: Some("  ".to_string()),
            ..StoreConfig::default()
        };
        assert!(matches!(empty.validate(), Err(crate::Error::Config(_))));

        let slow = StoreConfig {
            busy_timeout_ms: u64::MAX,
            ..StoreConfig::default()
        };
        assert!(matches!(slow.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trialstore.toml");
        let config = StoreConfig {
            journal_mode: JournalMode::Delete,
            ..StoreConfig::default()
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, config);
        assert!(load_config(Some(&dir.path().join("missing.toml"))).unwrap().is_none());
    }
}
