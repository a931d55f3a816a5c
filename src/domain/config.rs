use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration for expression compilation.
///
/// This struct holds settings that control how addresses are rendered and
/// how strictly unsupported constructs are treated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Name of the instance root element.
    ///
    /// This is the first segment of every absolute path, e.g. `data` in
    /// `/data/q7`.
    data_root: String,

    /// Maximum nesting depth of condition groups and form groups.
    ///
    /// Compilation fails rather than recursing past this depth.
    max_depth: usize,

    /// Whether conditions comparing two questions are rejected.
    ///
    /// When `false` (default): such conditions compile to `true()` and a
    /// warning is logged.
    /// When `true`: compilation fails with a not-implemented error.
    pub strict: bool,

    /// Prefix for option tokens that are not given explicitly.
    ///
    /// An option with id `42` and no token is stored as `on42`.
    option_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            max_depth: default_max_depth(),
            strict: false,
            option_prefix: default_option_prefix(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the name of the instance root element.
    #[must_use]
    pub fn data_root(&self) -> &str {
        &self.data_root
    }

    /// Returns the maximum nesting depth.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the prefix for generated option tokens.
    #[must_use]
    pub fn option_prefix(&self) -> &str {
        &self.option_prefix
    }

    /// Sets the maximum nesting depth.
    pub const fn set_max_depth(&mut self, depth: usize) {
        self.max_depth = depth;
    }

    /// Sets the name of the instance root element.
    pub fn set_data_root(&mut self, root: String) {
        self.data_root = root;
    }
}

fn default_data_root() -> String {
    "data".to_string()
}

const fn default_max_depth() -> usize {
    64
}

fn default_option_prefix() -> String {
    "on".to_string()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_data_root")]
        data_root: String,

        /// Maximum nesting depth of condition groups and form groups.
        #[serde(default = "default_max_depth")]
        max_depth: usize,

        #[serde(default)]
        strict: bool,

        #[serde(default = "default_option_prefix")]
        option_prefix: String,
    },
}

impl From<Versions> for super::Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                data_root,
                max_depth,
                strict,
                option_prefix,
            } => Self {
                data_root,
                max_depth,
                strict,
                option_prefix,
            },
        }
    }
}

impl From<super::Config> for Versions {
    fn from(config: super::Config) -> Self {
        Self::V1 {
            data_root: config.data_root,
            max_depth: config.max_depth,
            strict: config.strict,
            option_prefix: config.option_prefix,
        }
    }
}
