use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod validator;

use crate::cli::Cli;

/// Default location of the optional settings file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "shapemock.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub references: ReferenceSettings,
    #[serde(default)]
    pub formats: FormatSettings,
    /// Fixed seed for reproducible output; fresh entropy when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Inclusive length bounds for generated arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ItemBounds {
    pub min: usize,
    pub max: usize,
}

impl ItemBounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorSettings {
    /// Array bounds for typed shapes without minItems/maxItems
    #[serde(default = "default_typed_items")]
    pub typed_items: ItemBounds,
    /// Array bounds for constraint documents without minItems/maxItems
    #[serde(default = "default_document_items")]
    pub document_items: ItemBounds,
    /// Floor of the default maxLength for strings
    #[serde(default = "default_string_max_length")]
    pub string_max_length: usize,
    #[serde(default = "default_number_min")]
    pub number_min: f64,
    #[serde(default = "default_number_max")]
    pub number_max: f64,
    /// Nesting depth past which a subtree yields no value
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Generated values after which arrays stop at their minimum length
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// Upper bound for unbounded repetition (`*`, `+`) in string patterns
    #[serde(default = "default_pattern_max_repeat")]
    pub pattern_max_repeat: u32,
}

fn default_typed_items() -> ItemBounds {
    ItemBounds::new(0, 10)
}

fn default_document_items() -> ItemBounds {
    ItemBounds::new(1, 5)
}

fn default_string_max_length() -> usize {
    50
}

fn default_number_min() -> f64 {
    -99_999_999_999.0
}

fn default_number_max() -> f64 {
    99_999_999_999.0
}

fn default_max_depth() -> usize {
    20
}

fn default_max_nodes() -> usize {
    10_000
}

fn default_pattern_max_repeat() -> u32 {
    10
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            typed_items: default_typed_items(),
            document_items: default_document_items(),
            string_max_length: default_string_max_length(),
            number_min: default_number_min(),
            number_max: default_number_max(),
            max_depth: default_max_depth(),
            max_nodes: default_max_nodes(),
            pattern_max_repeat: default_pattern_max_repeat(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReferenceSettings {
    /// Directory external `$ref` file paths are resolved against
    #[serde(default = "default_reference_root")]
    pub root: PathBuf,
}

fn default_reference_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self {
            root: default_reference_root(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatSettings {
    /// Register the faker-backed generators for well-known format names
    #[serde(default = "default_builtin_formats")]
    pub builtin: bool,
}

fn default_builtin_formats() -> bool {
    true
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            builtin: default_builtin_formats(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_path(DEFAULT_CONFIG_FILE)
    }

    /// Create settings from CLI arguments (includes config file and CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(&cli.config)?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        Self::validated(settings)
    }

    /// Load settings from a file (missing file means defaults) plus the environment.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let settings = Self::load(path.as_ref())?;
        Self::validated(settings)
    }

    fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix("SHAPEMOCK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn validated(settings: Self) -> Result<Self, anyhow::Error> {
        validator::ConfigValidator::validate(&settings).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;
        Ok(settings)
    }

    /// Apply CLI argument overrides to settings
    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(seed) = cli.seed {
            self.seed = Some(seed);
        }
        if let Some(max_depth) = cli.max_depth {
            self.generator.max_depth = max_depth;
        }
        if let Some(root) = &cli.reference_root {
            self.references.root = root.clone();
        }
    }
}
