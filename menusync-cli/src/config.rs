use anyhow::{Context, Result};
use menusync_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Load configuration from `path`
    pub fn load_from(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from an explicit path, or from the default location if one exists
    pub fn resolve(explicit: Option<&Path>) -> Result<Config> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let path = get_config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Config::default())
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Home directory not found")?;
    Ok(home.join(".menusync").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use menusync_menu::MenuLayout;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            sync: SyncConfig::new()
                .disambiguate_titles(true)
                .default_submenu_layout(MenuLayout::Tiles),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[sync]"));
        assert!(toml_str.contains("disambiguate_titles = true"));

        let deserialized: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[sync]\nprefetch_artworks = false\n").unwrap();

        assert!(!config.sync.prefetch_artworks);
        assert!(!config.sync.disambiguate_titles);
        assert_eq!(config.sync.default_submenu_layout, MenuLayout::List);

        let empty: Config = toml::from_str("").unwrap();
        assert_eq!(empty, Config::default());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            sync: SyncConfig::new().prefetch_artworks(false),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::resolve(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let temp_dir = tempdir().unwrap();
        let result = Config::resolve(Some(&temp_dir.path().join("absent.toml")));
        assert!(result.is_err());
    }
}
