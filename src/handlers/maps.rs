//! Ogmo map files.
//!
//! Map JSON is copied into the content directory untouched. Only files
//! carrying the Ogmo version marker are maps; other JSON is left alone.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::output::display_path;

use super::{ensure_parent, ContentHandler, ContentRoots, PipelineContext};

/// Top-level field every Ogmo project/level file carries.
pub const MAP_MARKER_FIELD: &str = "ogmoVersion";

pub struct MapsHandler {
    roots: ContentRoots,
    copied: usize,
}

impl MapsHandler {
    pub fn new(roots: ContentRoots) -> Self {
        Self { roots, copied: 0 }
    }

    /// Number of map files written so far.
    pub fn copied(&self) -> usize {
        self.copied
    }
}

impl ContentHandler for MapsHandler {
    fn name(&self) -> &'static str {
        "maps"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn roots(&self) -> &ContentRoots {
        &self.roots
    }

    fn handle_file(&mut self, input: &Path, output: &Path, ctx: &PipelineContext) -> Result<()> {
        let content = fs::read_to_string(input)
            .map_err(|e| PipelineError::io(input, "Failed to read map", e))?;
        let json: Value = serde_json::from_str(&content).map_err(|e| PipelineError::Parse {
            message: format!("Invalid JSON in {}: {}", input.display(), e),
            help: None,
        })?;

        if json.get(MAP_MARKER_FIELD).is_none() {
            ctx.printer.info("Skipping", &format!("{} (not a map)", display_path(input)));
            return Ok(());
        }

        let serialized = serde_json::to_string(&json).map_err(|e| PipelineError::Build {
            message: format!("Failed to serialize map: {}", e),
            help: None,
        })?;
        ensure_parent(output)?;
        fs::write(output, serialized).map_err(|e| PipelineError::io(output, "Failed to write map", e))?;

        ctx.printer.status("Copying", &display_path(output));
        self.copied += 1;
        Ok(())
    }
}
