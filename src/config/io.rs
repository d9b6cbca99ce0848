//! Configuration file I/O operations

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::LevelingConfig;

impl LevelingConfig {
    /// Get the global data directory path (~/.lounge-level/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lounge-level")
    }

    /// Get the global config file path (~/.lounge-level/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Get the default level record database path (~/.lounge-level/levels.db)
    pub fn global_db_path() -> PathBuf {
        Self::global_config_dir().join("levels.db")
    }

    /// Load configuration from `path`, falling back to built-in defaults when
    /// the file does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Save configuration to a file with atomic write and file locking.
    ///
    /// An exclusive lock on a sibling `.lock` file keeps concurrent admin
    /// edits apart, and the temp file + rename keeps the config intact on crash.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        write_locked(path, content.as_bytes())
    }
}

/// Replace `path` with `content` under an exclusive `<ext>.lock` sibling lock
fn write_locked(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    // Lock a sibling file; the target itself is swapped out by the rename
    let lock_path = sibling(path, "lock");
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;
    lock_file
        .lock_exclusive()
        .with_context(|| format!("Failed to lock {}", lock_path.display()))?;

    // Full content reaches disk before the old file is replaced
    let temp_path = sibling(path, "tmp");
    let mut temp_file = File::create(&temp_path)
        .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
    temp_file
        .write_all(content)
        .and_then(|()| temp_file.sync_all())
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    // Lock released when `lock_file` drops
    Ok(())
}

/// `config.toml` -> `config.toml.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelPolicy;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = LevelingConfig::default();
        config.level_policy = LevelPolicy::HighWaterMark;
        config.weights.excellent_post = 42;
        config.save_to_file(&path).expect("save");

        let loaded = LevelingConfig::from_file(&path).expect("load");
        assert_eq!(loaded, config);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_save_overwrites_and_leaves_lock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not toml at all [").expect("write");

        LevelingConfig::default().save_to_file(&path).expect("save");

        assert_eq!(
            LevelingConfig::from_file(&path).expect("load"),
            LevelingConfig::default()
        );
        assert!(sibling(&path, "lock").exists());
        assert!(!sibling(&path, "tmp").exists());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded =
            LevelingConfig::load_or_default(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(loaded, LevelingConfig::default());
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [[tiers]]
            name = "Only"
            level_range = [1, 50]
            base_exp = 0.0
            exp_increment = 10.0
            exp_multiplier = 1.0
            "#,
        )
        .expect("write");

        let err = LevelingConfig::from_file(&path).expect_err("should reject");
        assert!(format!("{:#}", err).contains("must end at level 99"));
    }
}
