//! Configuration system

use std::path::{Path, PathBuf};

pub use serde::{Deserialize, Serialize};

use crate::reshape::{IndexMode, ReshapeOptions};
use crate::serializer::{DEFAULT_INDENT, MAX_INDENT};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Format follows the extension
        match ConfigFormat::of(path)? {
            ConfigFormat::Toml => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            ConfigFormat::Ron => {
                ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::of(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that cannot drive an export
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for one export run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Mesh file to read
    pub input: PathBuf,
    /// JSON file to write
    pub output: PathBuf,
    /// Reference to index conversion
    pub index_mode: IndexMode,
    /// JSON indent width, 0 for compact output
    pub indent: usize,
    /// Reject tetrahedra that point past the node list
    pub validate_indices: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            index_mode: IndexMode::default(),
            indent: DEFAULT_INDENT,
            validate_indices: false,
        }
    }
}

impl Config for ExportConfig {}

impl ExportConfig {
    /// Create a configuration with default options
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    /// Check that both paths are set and distinct and the indent is sane
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("no input mesh given".to_string()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("no output path given".to_string()));
        }
        if self.input == self.output {
            return Err(ConfigError::Invalid(format!(
                "output would overwrite the input mesh {}",
                self.input.display()
            )));
        }
        if self.indent > MAX_INDENT {
            return Err(ConfigError::Invalid(format!(
                "indent {} is wider than {MAX_INDENT}",
                self.indent
            )));
        }
        Ok(())
    }

    /// Options handed to the reshaper
    pub const fn reshape_options(&self) -> ReshapeOptions {
        ReshapeOptions {
            index_mode: self.index_mode,
            validate_indices: self.validate_indices,
        }
    }
}
