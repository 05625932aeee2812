//! User configuration file
//!
//! Read from `~/.config/stackshift/config.yaml` unless `--config` names
//! another file. Every setting can be overridden by a flag or its
//! `STACKSHIFT_*` environment variable.
//!
//! ```yaml
//! catalog: ./catalog.yaml
//! matchCutoff: 50
//! sectionCutoff: 95
//! outputDir: ./terraform
//! strict: false
//! ```

use serde::{Deserialize, Serialize};
use stackshift_convert::mapper::DEFAULT_SECTION_CUTOFF;
use stackshift_convert::resolver::DEFAULT_MATCH_CUTOFF;
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackshiftConfig {
    /// Schema catalog file
    pub catalog: Option<PathBuf>,

    /// Minimum fuzzy score for property and attribute names
    pub match_cutoff: u8,

    /// Minimum fuzzy score for a property to become a nested block
    pub section_cutoff: u8,

    /// Directory for per-kind `.tf` files
    pub output_dir: Option<PathBuf>,

    /// Fail when anything had to be kept as a comment
    pub strict: bool,
}

impl Default for StackshiftConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            match_cutoff: DEFAULT_MATCH_CUTOFF,
            section_cutoff: DEFAULT_SECTION_CUTOFF,
            output_dir: None,
            strict: false,
        }
    }
}

impl StackshiftConfig {
    /// Load the configuration
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::config(format!("{}: {}", path.display(), e)))?;

        let mut config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| CliError::config(format!("{}: {}", path.display(), e)))?
        };

        for cutoff in [config.match_cutoff, config.section_cutoff] {
            if cutoff > 100 {
                return Err(CliError::config(format!(
                    "{}: cutoff {} is outside 0..=100",
                    path.display(),
                    cutoff
                )));
            }
        }

        // Relative paths are relative to the config file
        let base = path.parent().unwrap_or(Path::new("."));
        config.catalog = config.catalog.map(|p| resolve(base, p));
        config.output_dir = config.output_dir.map(|p| resolve(base, p));

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// `~/.config/stackshift/config.yaml` (platform config dir)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("stackshift").join("config.yaml"))
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
