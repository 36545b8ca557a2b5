//! Init command implementation

use crate::config::{Config, PathsConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Write a default config file to `config_path`
pub fn cmd_init(config_path: &Path, force: bool) -> Result<PathBuf> {
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite it.",
            config_path.display()
        )));
    }

    let config = Config {
        paths: PathsConfig {
            config_file: config_path.to_path_buf(),
        },
        ..Config::default()
    };
    config.save()?;

    info!("Initialized minirag config at {}", config_path.display());
    Ok(config_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        cmd_init(&path, false).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.provider.backend, "ollama");
        assert_eq!(loaded.chunk.max_chars, 1000);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[chunk]\nmax_chars = 50\noverlap_chars = 5\n").unwrap();

        assert!(matches!(cmd_init(&path, false), Err(Error::Config(_))));
        assert_eq!(Config::load(&path).unwrap().chunk.max_chars, 50);

        cmd_init(&path, true).unwrap();
        assert_eq!(Config::load(&path).unwrap().chunk.max_chars, 1000);
    }
}
