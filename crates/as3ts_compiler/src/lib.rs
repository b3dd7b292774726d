//! as3ts_compiler: Conversion orchestration.
//!
//! Runs parse -> emit -> post-process for one file, and converts batches of
//! files in parallel. A failure in one file never affects the others.

use std::path::{Path, PathBuf};

use as3ts_diagnostics::{ConvertError, Diagnostic, DiagnosticCategory};
use as3ts_emitter::{emit_file, EmitterOptions};
use rayon::prelude::*;
use tracing::debug;

/// An input file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub file_name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            text: text.into(),
        }
    }

    /// Read a file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(path.to_string_lossy(), text))
    }
}

/// The converted text of one file plus its warnings.
#[derive(Debug, Clone)]
pub struct ConvertOutput {
    pub file_name: String,
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConvertOutput {
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.category == DiagnosticCategory::Warning)
            .count()
    }
}

/// Result of converting one file in a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub file_name: String,
    pub result: Result<ConvertOutput, ConvertError>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Converts files with one immutable set of options.
#[derive(Debug, Default)]
pub struct Converter {
    options: EmitterOptions,
}

impl Converter {
    pub fn new(options: EmitterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EmitterOptions {
        &self.options
    }

    /// Convert a single file.
    pub fn convert(&self, file_name: &str, source: &str) -> Result<ConvertOutput, ConvertError> {
        let ast = as3ts_parser::parse(file_name, source)?;
        debug!(file = file_name, "emitting");
        let emitted = emit_file(file_name, &ast, source, &self.options)?;

        let mut text = emitted.text;
        for extension in &self.options.extensions {
            text = extension.post_process(&self.options, text);
        }
        Ok(ConvertOutput {
            file_name: file_name.to_string(),
            text,
            diagnostics: emitted.diagnostics,
        })
    }

    /// Convert every file in parallel; outcomes keep the input order.
    pub fn convert_batch(&self, files: &[SourceFile]) -> Vec<FileOutcome> {
        debug!(files = files.len(), "converting batch");
        files
            .par_iter()
            .map(|file| {
                let result = self.convert(&file.file_name, &file.text);
                if let Err(error) = &result {
                    debug!(file = %file.file_name, %error, "conversion failed");
                }
                FileOutcome {
                    file_name: file.file_name.clone(),
                    result,
                }
            })
            .collect()
    }
}

/// Where the converted form of `source` goes: same stem, new extension,
/// in `out_dir` when given and next to the source otherwise.
pub fn output_path(source: &Path, out_dir: Option<&Path>, extension: &str) -> PathBuf {
    let stem = source.file_stem().unwrap_or_default();
    let base_dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => source.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
    };
    base_dir.join(format!("{}.{}", stem.to_string_lossy(), extension.trim_start_matches('.')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("src/game/Player.as"), None, "ts"),
            PathBuf::from("src/game/Player.ts")
        );
        assert_eq!(
            output_path(Path::new("src/game/Player.as"), Some(Path::new("out")), ".ts"),
            PathBuf::from("out/Player.ts")
        );
        assert_eq!(output_path(Path::new("Main.as"), None, "ts"), PathBuf::from("Main.ts"));
    }
}
