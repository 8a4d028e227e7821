//! Configuration types for import-fence.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::rule::RuleError;
use crate::session::AnalysisSession;
use crate::types::Severity;

/// Table name used inside `pyproject.toml` (`[tool.import-fence]`).
pub const PYPROJECT_TABLE: &str = "import-fence";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Severity threshold for a failing run (default: "error").
    #[serde(default)]
    pub fail_on: Option<Severity>,

    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Permission graph rules.
    #[serde(default)]
    pub dependencies: DependenciesConfig,

    /// Encapsulated packages.
    #[serde(default)]
    pub encapsulation: EncapsulationConfig,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// `pyproject.toml` files are read from their `[tool.import-fence]` table.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if path.file_name().is_some_and(|n| n == "pyproject.toml") {
            Self::from_pyproject(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Parses the `[tool.import-fence]` table of a `pyproject.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or the table is missing.
    pub fn from_pyproject(content: &str) -> Result<Self, ConfigError> {
        let document: toml::Table = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        let table = document
            .get("tool")
            .and_then(|tool| tool.get(PYPROJECT_TABLE))
            .cloned()
            .ok_or(ConfigError::MissingTable)?;
        table.try_into().map_err(|e: toml::de::Error| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// True if a `pyproject.toml` body carries a `[tool.import-fence]` table.
    #[must_use]
    pub fn pyproject_has_table(content: &str) -> bool {
        toml::from_str::<toml::Table>(content).is_ok_and(|doc| {
            doc.get("tool")
                .and_then(|tool| tool.get(PYPROJECT_TABLE))
                .is_some()
        })
    }

    /// Severity threshold for a failing run.
    #[must_use]
    pub fn fail_on(&self) -> Severity {
        self.fail_on.unwrap_or(Severity::Error)
    }

    /// Compiles the rule sections into an [`AnalysisSession`].
    ///
    /// # Errors
    ///
    /// Returns the first rule that fails to compile.
    pub fn session(&self) -> Result<AnalysisSession, RuleError> {
        AnalysisSession::builder()
            .allowed_dependencies(self.dependencies.allowed.iter().cloned())
            .dependency_severity(self.dependencies.severity)
            .encapsulated_packages(self.encapsulation.packages.iter().cloned())
            .encapsulated_friendships(self.encapsulation.friendships.iter().cloned())
            .encapsulation_severity(self.encapsulation.severity)
            .build()
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Source root; module names are relative to it (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns to exclude from analysis.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: default_exclude(),
            respect_gitignore: true,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/.venv/**".to_string(),
        "**/venv/**".to_string(),
        "**/__pycache__/**".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

fn default_severity() -> Severity {
    Severity::Error
}

/// `[dependencies]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependenciesConfig {
    /// `dependent->dependency` rules; `*` allowed on either side.
    #[serde(default)]
    pub allowed: Vec<String>,

    /// Severity of forbidden-dependency violations.
    #[serde(default = "default_severity")]
    pub severity: Severity,
}

impl Default for DependenciesConfig {
    fn default() -> Self {
        Self {
            allowed: Vec::new(),
            severity: default_severity(),
        }
    }
}

/// `[encapsulation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncapsulationConfig {
    /// Protected package names.
    #[serde(default)]
    pub packages: Vec<String>,

    /// `friend->protected` exceptions.
    #[serde(default)]
    pub friendships: Vec<String>,

    /// Severity of encapsulation violations.
    #[serde(default = "default_severity")]
    pub severity: Severity,
}

impl Default for EncapsulationConfig {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            friendships: Vec::new(),
            severity: default_severity(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// `pyproject.toml` has no `[tool.import-fence]` table.
    #[error("pyproject.toml has no [tool.import-fence] table")]
    MissingTable,
}
