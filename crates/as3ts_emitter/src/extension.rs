//! Pluggable emitter extensions.
//!
//! An extension can take over the emission of any node, contribute type,
//! identifier and import remappings consulted before the built-in tables,
//! and rewrite the final text of each file.

use as3ts_ast::NodeId;
use as3ts_core::FxMap;
use as3ts_diagnostics::ConvertError;
use as3ts_options::ConverterConfig;
use regex::Regex;

use crate::emitter::Emitter;
use crate::options::EmitterOptions;

pub trait Extension: Send + Sync {
    fn name(&self) -> &str;

    /// Emit `node` in place of the core. Return `Ok(true)` when handled.
    fn visit(&self, _emitter: &mut Emitter<'_>, _node: NodeId) -> Result<bool, ConvertError> {
        Ok(false)
    }

    fn remap_type(&self, _name: &str) -> Option<String> {
        None
    }

    fn remap_identifier(&self, _name: &str) -> Option<String> {
        None
    }

    /// Rewrite a dotted import path before it is resolved.
    fn rewrite_import(&self, _path: &str) -> Option<String> {
        None
    }

    /// Final pass over the emitted text of one file.
    fn post_process(&self, _options: &EmitterOptions, text: String) -> String {
        text
    }
}

/// Remapping tables loaded from the configuration file.
#[derive(Debug, Clone, Default)]
pub struct TableExtension {
    type_map: FxMap<String, String>,
    identifier_map: FxMap<String, String>,
    import_rewrites: Vec<(Regex, String)>,
}

impl TableExtension {
    pub fn from_config(config: &ConverterConfig) -> Result<Self, regex::Error> {
        let collect = |map: &Option<indexmap::IndexMap<String, String>>| -> FxMap<String, String> {
            map.iter()
                .flatten()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        let import_rewrites = config
            .import_rewrites
            .iter()
            .flatten()
            .map(|rule| Ok((Regex::new(&rule.pattern)?, rule.replacement.clone())))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self {
            type_map: collect(&config.type_map),
            identifier_map: collect(&config.identifier_map),
            import_rewrites,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.type_map.is_empty() && self.identifier_map.is_empty() && self.import_rewrites.is_empty()
    }
}

impl Extension for TableExtension {
    fn name(&self) -> &str {
        "tables"
    }

    fn remap_type(&self, name: &str) -> Option<String> {
        self.type_map.get(name).cloned()
    }

    fn remap_identifier(&self, name: &str) -> Option<String> {
        self.identifier_map.get(name).cloned()
    }

    fn rewrite_import(&self, path: &str) -> Option<String> {
        let mut current = path.to_string();
        let mut changed = false;
        for (pattern, replacement) in &self.import_rewrites {
            if pattern.is_match(&current) {
                current = pattern.replace_all(&current, replacement.as_str()).into_owned();
                changed = true;
            }
        }
        changed.then_some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use as3ts_options::parse_config;

    #[test]
    fn test_table_extension_from_config() {
        let config = parse_config(
            r#"{
                "typeMap": { "Point": "Vec2" },
                "identifierMap": { "getTimer": "performance.now" },
                "importRewrites": [{ "pattern": "^mx\\.controls\\.", "replacement": "ui.widgets." }]
            }"#,
        )
        .unwrap();
        let ext = TableExtension::from_config(&config).unwrap();
        assert_eq!(ext.remap_type("Point").as_deref(), Some("Vec2"));
        assert_eq!(ext.remap_identifier("getTimer").as_deref(), Some("performance.now"));
        assert_eq!(
            ext.rewrite_import("mx.controls.Button").as_deref(),
            Some("ui.widgets.Button")
        );
        assert_eq!(ext.rewrite_import("flash.events.Event"), None);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let config = parse_config(r#"{ "importRewrites": [{ "pattern": "(", "replacement": "" }] }"#)
            .unwrap();
        assert!(TableExtension::from_config(&config).is_err());
    }
}
