//! as3ts_options: converter configuration files.
//!
//! Parses the JSON configuration accepted by the converter. Every field is
//! optional; absent fields fall back to the converter defaults.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Converter options, matching the configuration file schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverterConfig {
    // -- Output --
    pub line_separator: Option<LineSeparator>,
    pub use_namespaces: Option<bool>,
    pub output_extension: Option<String>,

    // -- Resolution --
    /// Dotted namespace to the type names it declares, for wildcard imports.
    pub namespace_definitions: Option<IndexMap<String, Vec<String>>>,

    // -- Rewrites --
    pub type_map: Option<IndexMap<String, String>>,
    pub identifier_map: Option<IndexMap<String, String>>,
    pub import_rewrites: Option<Vec<ImportRewrite>>,
}

/// Line ending used for the converted output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSeparator {
    #[default]
    Lf,
    Crlf,
}

impl LineSeparator {
    pub fn as_str(self) -> &'static str {
        match self {
            LineSeparator::Lf => "\n",
            LineSeparator::Crlf => "\r\n",
        }
    }
}

/// A regular-expression rewrite applied to raw import paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRewrite {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConverterConfig {
    /// Output extension without the leading dot.
    pub fn output_extension(&self) -> &str {
        self.output_extension
            .as_deref()
            .map(|ext| ext.trim_start_matches('.'))
            .unwrap_or("ts")
    }

    pub fn line_separator(&self) -> LineSeparator {
        self.line_separator.unwrap_or_default()
    }

    pub fn use_namespaces(&self) -> bool {
        self.use_namespaces.unwrap_or(false)
    }
}

/// Parse a configuration from a JSON string.
pub fn parse_config(content: &str) -> Result<ConverterConfig, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

/// Parse a configuration file.
pub fn parse_config_file(path: impl AsRef<Path>) -> Result<ConverterConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}
