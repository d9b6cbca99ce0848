//! Init command implementation

use anyhow::{bail, Result};
use std::path::Path;

use lounge_level::LevelingConfig;

/// Write the built-in configuration to `config_path`
pub fn init_command(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    LevelingConfig::default().save_to_file(config_path)?;
    println!("Created: {}", config_path.display());

    Ok(())
}
