use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use as3ts_options::ConverterConfig;

use crate::extension::{Extension, TableExtension};
use crate::tables::BuiltinTables;

/// Options for a single emission.
#[derive(Clone)]
pub struct EmitterOptions {
    pub line_separator: String,
    /// Wrap packages in `namespace` blocks instead of emitting flat modules.
    pub use_namespaces: bool,
    /// Type names declared by each dotted namespace, used to expand wildcard imports.
    pub namespace_definitions: IndexMap<String, Vec<String>>,
    /// Consulted in order, before the core.
    pub extensions: Vec<Arc<dyn Extension>>,
    pub tables: BuiltinTables,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            line_separator: "\n".to_string(),
            use_namespaces: false,
            namespace_definitions: IndexMap::new(),
            extensions: Vec::new(),
            tables: BuiltinTables::new(),
        }
    }
}

impl EmitterOptions {
    /// Options described by a configuration file.
    ///
    /// Type, identifier and import tables become a [`TableExtension`] placed
    /// ahead of any extensions added later.
    pub fn from_config(config: &ConverterConfig) -> Result<Self, regex::Error> {
        let mut options = Self {
            line_separator: config.line_separator().as_str().to_string(),
            use_namespaces: config.use_namespaces(),
            namespace_definitions: config.namespace_definitions.clone().unwrap_or_default(),
            ..Self::default()
        };
        let tables = TableExtension::from_config(config)?;
        if !tables.is_empty() {
            options.extensions.push(Arc::new(tables));
        }
        Ok(options)
    }

    pub fn with_extension(mut self, extension: impl Extension + 'static) -> Self {
        self.extensions.push(Arc::new(extension));
        self
    }
}

impl fmt::Debug for EmitterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterOptions")
            .field("line_separator", &self.line_separator)
            .field("use_namespaces", &self.use_namespaces)
            .field("namespace_definitions", &self.namespace_definitions)
            .field(
                "extensions",
                &self.extensions.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
