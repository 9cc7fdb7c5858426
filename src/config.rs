//! # Configuration Module
//!
//! Runtime settings for the curator: where the catalog snapshot lives, how
//! many album fetches may run at once, and the genre taxonomy used by the
//! librarian.
//!
//! ## Config File
//!
//! Settings are read as JSON from the platform config directory:
//! - Linux: `~/.config/muse-curator/config.json`
//! - macOS: `~/Library/Application Support/muse-curator/config.json`
//! - Windows: `%APPDATA%\muse-curator\config.json`
//!
//! Every field is optional. A missing file means defaults; command-line
//! flags override whatever the file says.
//!
//! ```json
//! {
//!   "catalog_path": "/home/me/catalog.json",
//!   "fan_out": 8,
//!   "taxonomy": [{"label": "🎸 Rock", "keywords": ["rock", "metal"]}]
//! }
//! ```

use crate::taxonomy::Taxonomy;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of concurrent per-album fetches.
pub const DEFAULT_FAN_OUT: usize = 4;

/// Returns the platform-appropriate config file path.
///
/// Unlike a data directory the config directory is not created here; a
/// missing file simply means defaults.
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system config directory. Pass --config to point at a config file."
        )
    })?;
    Ok(config_dir.join("muse-curator").join("config.json"))
}

/// Settings shared by every pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    /// Snapshot file backing the offline catalog
    pub catalog_path: Option<PathBuf>,
    /// Upper bound on concurrent per-album fetches in a deep dive
    pub fan_out: usize,
    /// Categories used to classify playlists
    pub taxonomy: Taxonomy,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            fan_out: DEFAULT_FAN_OUT,
            taxonomy: Taxonomy::default(),
        }
    }
}

impl CurationConfig {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        let path = get_config_path()?;
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    /// Load from an explicit file, which must exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        let config = config.validated()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Clamp the fan-out and re-check the taxonomy.
    fn validated(mut self) -> Result<Self> {
        self.fan_out = self.fan_out.max(1);
        self.taxonomy = Taxonomy::new(self.taxonomy.categories().to_vec())
            .context("Invalid taxonomy in config file")?;
        Ok(self)
    }

    /// Override the catalog path, e.g. from `--catalog`.
    pub fn with_catalog_path(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.catalog_path = path;
        }
        self
    }

    /// The catalog snapshot to open.
    pub fn require_catalog_path(&self) -> Result<&Path> {
        self.catalog_path.as_deref().ok_or_else(|| {
            anyhow::anyhow!("No catalog snapshot configured. Pass --catalog <FILE> or set catalog_path in the config file.")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_config_path_structure() {
        let path = get_config_path().expect("Should get valid path");
        assert!(path.ends_with("muse-curator/config.json"));
    }

    #[test]
    fn test_defaults() {
        let config = CurationConfig::default();
        assert_eq!(config.fan_out, DEFAULT_FAN_OUT);
        assert_eq!(config.taxonomy.len(), 10);
        assert!(config.require_catalog_path().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(r#"{"fan_out": 0}"#);
        let config = CurationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.fan_out, 1);
        assert_eq!(config.taxonomy, Taxonomy::default());
    }

    #[test]
    fn test_custom_taxonomy() {
        let file = write_config(
            r#"{"catalog_path": "/tmp/c.json",
                "taxonomy": [{"label": "Loud", "keywords": [" Metal ", "noise"]}]}"#,
        );
        let config = CurationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.taxonomy.len(), 1);
        assert_eq!(config.taxonomy.categories()[0].keywords, vec!["metal", "noise"]);
        assert_eq!(config.require_catalog_path().unwrap(), Path::new("/tmp/c.json"));
    }

    #[test]
    fn test_invalid_taxonomy_rejected() {
        let file = write_config(r#"{"taxonomy": [{"label": "", "keywords": ["x"]}]}"#);
        assert!(CurationConfig::from_file(file.path()).is_err());

        let file = write_config(r#"{"taxonomy": []}"#);
        assert!(CurationConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_cli_override() {
        let config = CurationConfig::default().with_catalog_path(Some(PathBuf::from("a.json")));
        let config = config.with_catalog_path(None);
        assert_eq!(config.catalog_path, Some(PathBuf::from("a.json")));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(CurationConfig::from_file(Path::new("/nonexistent/curator.json")).is_err());
    }
}
