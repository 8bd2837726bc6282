//! Error types for loading, configuration and output.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while obtaining the schema registry. Always fatal to a run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch schema document from {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read schema document '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema document ({origin}) {message}")]
    Parse { origin: String, message: String },

    #[error("schema document ({origin}) has neither components.schemas nor definitions")]
    MissingRegistry { origin: String },

    /// Only references into the same document are followed.
    #[error("schema '{schema}' uses unsupported reference '{reference}'")]
    UnsupportedRef { schema: String, reference: String },

    #[error("schema '{schema}' references unknown schema '{reference}'")]
    UnresolvedRef { schema: String, reference: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Figment(#[from] Box<figment::Error>),

    #[error("no schema source configured (set source.url or source.file)")]
    MissingSource,

    #[error("both source.url and source.file are configured; pick one")]
    ConflictingSources,

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("no schema named '{name}' in the registry")]
    UnknownSchema { name: String },

    #[error("failed to write output file '{}'", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
