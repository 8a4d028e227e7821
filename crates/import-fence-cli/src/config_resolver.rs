//! Locating and loading the configuration for a project.
//!
//! Lookup order: the `--config` path, then `import-fence.toml` and
//! `.import-fence.toml` in the project directory, then a `pyproject.toml`
//! carrying a `[tool.import-fence]` table, then `config.toml` in the global
//! directory (`$IMPORT_FENCE_CONFIG_DIR`, else `~/.import-fence`). Without any
//! of them the built-in defaults apply, which check nothing.

use anyhow::{Context, Result};
use import_fence_core::Config;
use std::path::{Path, PathBuf};

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`; a `pyproject.toml` here is read from its table.
    Explicit(PathBuf),
    /// Dedicated config file in the project directory.
    Project(PathBuf),
    /// `[tool.import-fence]` table of the project's `pyproject.toml`.
    Pyproject(PathBuf),
    /// Fallback in the global config directory.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// Reads and parses the configuration.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not parse, including
    /// unknown keys inside a section.
    pub fn load(&self) -> Result<Config> {
        let path = match self {
            Self::Default => {
                tracing::warn!("No configuration found; run `import-fence init` to create one");
                return Ok(Config::default());
            }
            Self::Global(path) => {
                tracing::info!("Using global config: {}", path.display());
                path
            }
            Self::Explicit(path) | Self::Project(path) | Self::Pyproject(path) => path,
        };
        Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
    }
}

const PROJECT_CONFIG_NAMES: &[&str] = &["import-fence.toml", ".import-fence.toml"];

const PYPROJECT: &str = "pyproject.toml";

const GLOBAL_CONFIG_NAME: &str = "config.toml";

const CONFIG_DIR_ENV: &str = "IMPORT_FENCE_CONFIG_DIR";

/// Finds the configuration for `project_dir`.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_in(project_dir, explicit, global_config_dir().as_deref())
}

fn resolve_in(project_dir: &Path, explicit: Option<&Path>, global_dir: Option<&Path>) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    if let Some(path) = PROJECT_CONFIG_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|p| p.is_file())
    {
        tracing::debug!("Found project config: {}", path.display());
        return ConfigSource::Project(path);
    }

    let pyproject = project_dir.join(PYPROJECT);
    if std::fs::read_to_string(&pyproject).is_ok_and(|content| Config::pyproject_has_table(&content)) {
        tracing::debug!("Found [tool.import-fence] in {}", pyproject.display());
        return ConfigSource::Pyproject(pyproject);
    }

    global_dir
        .map(|dir| dir.join(GLOBAL_CONFIG_NAME))
        .filter(|p| p.is_file())
        .map_or(ConfigSource::Default, |path| {
            tracing::debug!("Found global config: {}", path.display());
            ConfigSource::Global(path)
        })
}

fn global_config_dir() -> Option<PathBuf> {
    std::env::var_os(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|home| home.join(".import-fence")))
}
