//! Content file handlers.
//!
//! A handler claims input files by extension, converts each one into the
//! content directory at the same relative location, and may run one more
//! pass once every file has been seen (the Aseprite handler packs its atlas
//! there).

mod aseprite;
mod maps;

use std::path::{Path, PathBuf};

pub use aseprite::AsepriteHandler;
pub use maps::{MapsHandler, MAP_MARKER_FIELD};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::output::Printer;
use crate::tools::{CommandRunner, ToolLocator};

/// Everything a handler may need besides its own state.
pub struct PipelineContext<'a> {
    pub config: &'a PipelineConfig,
    pub tools: &'a ToolLocator,
    pub runner: &'a dyn CommandRunner,
    pub printer: &'a Printer,
    /// Root of the generated content, next to the project file.
    pub content_dir: &'a Path,
}

/// Input and output roots a handler mirrors between.
#[derive(Debug, Clone)]
pub struct ContentRoots {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ContentRoots {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// The output path for `path`: same location relative to the output
    /// root as `path` has relative to the input root.
    pub fn mirror(&self, path: &Path) -> PathBuf {
        match path.strip_prefix(&self.input) {
            Ok(relative) => self.output.join(relative),
            Err(_) => self.output.join(path.file_name().unwrap_or(path.as_os_str())),
        }
    }
}

pub trait ContentHandler {
    /// Short name used in status output.
    fn name(&self) -> &'static str;

    /// Extensions handled, without the dot. Matched case-insensitively.
    fn supported_extensions(&self) -> &'static [&'static str];

    fn roots(&self) -> &ContentRoots;

    /// Convert one supported file. `output` is the mirrored path with the
    /// input's extension; handlers pick their own.
    fn handle_file(&mut self, input: &Path, output: &Path, ctx: &PipelineContext) -> Result<()>;

    /// Runs once after every input file was offered to the handler.
    fn post_process(&mut self, _ctx: &PipelineContext) -> Result<()> {
        Ok(())
    }

    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.supported_extensions()
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            })
    }

    /// Offer a file to the handler. Unsupported files are ignored without
    /// side effects. Returns whether the file was handled.
    fn handle(&mut self, input: &Path, ctx: &PipelineContext) -> Result<bool> {
        if !self.supports(input) {
            return Ok(false);
        }
        let output = self.roots().mirror(input);
        self.handle_file(input, &output, ctx)?;
        Ok(true)
    }
}

/// Replace everything after the last dot of the file name with `extension`
/// (which includes its own leading dot).
pub fn change_extension(path: &Path, extension: &str) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();
    let mut name = stem.to_os_string();
    name.push(extension);
    path.with_file_name(name)
}

/// File name without its extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Create the parent directory of `path` if needed.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            crate::error::PipelineError::io(parent, "Failed to create output directory", e)
        })?;
    }
    Ok(())
}
