//! Layered generator configuration.
//!
//! Sources, highest priority first:
//! 1. Command-line flags (applied by the CLI through [`Overrides`])
//! 2. Environment variables (`OPENAPI_DESCRIPTOR_*` prefix, `__` between section and key)
//! 3. TOML file (`--config PATH`, else `openapi-descriptor.toml` in the working directory)
//! 4. Built-in defaults
//!
//! `OPENAPI_DESCRIPTOR_OUTPUT__FORMAT=chain` maps to `output.format`, and so on.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::load::Source;

pub const DEFAULT_CONFIG_FILE: &str = "openapi-descriptor.toml";
pub const ENV_PREFIX: &str = "OPENAPI_DESCRIPTOR_";

const fn default_timeout_secs() -> u64 {
    60
}

fn default_lookup_var() -> String {
    "name".to_owned()
}

fn default_builder_call() -> String {
    "StringVector::AddString(result, {})".to_owned()
}

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Remote document, fetched over HTTP(S).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Local document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Whole-request timeout for URL fetches.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub order: EntryOrder,

    /// Output file; stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub chain: ChainConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `{"name","descriptor"},` lines for a static table
    #[default]
    Table,
    /// `if (name == "...") { return ...; }` lookup chain
    Chain,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrder {
    /// by schema name, independent of document layout
    #[default]
    Sorted,
    /// as the schemas appear in the document
    Document,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
    /// Variable compared against each schema name.
    #[serde(default = "default_lookup_var")]
    pub lookup_var: String,

    /// Returned expression; `{}` is replaced with the descriptor literal.
    #[serde(default = "default_builder_call")]
    pub builder_call: String,
}

/// Values supplied on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub file: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub order: Option<EntryOrder>,
    pub out: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { url: None, file: None, timeout_secs: default_timeout_secs() }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { lookup_var: default_lookup_var(), builder_call: default_builder_call() }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Table => "table",
            OutputFormat::Chain => "chain",
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl GeneratorConfig {
    /// Load defaults → TOML → env, then validate.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(config_file, &Overrides::default())
    }

    /// Load all layers and apply command-line overrides on top.
    pub fn load_with(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(ConfigError::InvalidValue {
                    field: "config".into(),
                    reason: format!("file not found: {}", path.display()),
                });
            }
        }
        let mut config: Self = Self::figment(config_file).extract()?;
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Provider chain without command-line overrides.
    ///
    /// An explicit `config_file` is always merged; the default file only when
    /// it exists in the working directory.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match config_file {
            Some(path) => {
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    figment = figment.merge(Toml::file(local));
                }
            }
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        // a source on the command line replaces whatever the file/env chose
        if overrides.url.is_some() || overrides.file.is_some() {
            self.source.url = overrides.url.clone();
            self.source.file = overrides.file.clone();
        }
        if let Some(format) = overrides.format {
            self.output.format = format;
        }
        if let Some(order) = overrides.order {
            self.output.order = order;
        }
        if let Some(out) = &overrides.out {
            self.output.path = Some(out.clone());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "source.timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.source.url.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::InvalidValue {
                field: "source.url".into(),
                reason: "must not be empty".into(),
            });
        }
        let chain = &self.output.chain;
        if chain.lookup_var.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.chain.lookup_var".into(),
                reason: "must not be empty".into(),
            });
        }
        if chain.builder_call.matches("{}").count() != 1 {
            return Err(ConfigError::InvalidValue {
                field: "output.chain.builder_call".into(),
                reason: "must contain exactly one `{}` placeholder".into(),
            });
        }
        Ok(())
    }

    /// The one configured document source.
    pub fn document_source(&self) -> Result<Source, ConfigError> {
        match (&self.source.url, &self.source.file) {
            (Some(url), None) => Ok(Source::Url(url.clone())),
            (None, Some(file)) => Ok(Source::File(file.clone())),
            (None, None) => Err(ConfigError::MissingSource),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingSources),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
