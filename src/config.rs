//! Pipeline configuration (lux-pipeline.yaml).
//!
//! Everything is optional. Tool paths given here take precedence over the
//! locations derived from the pipeline install root.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// The name of the configuration file looked up under the pipeline root.
pub const CONFIG_FILENAME: &str = "lux-pipeline.yaml";

/// Files never registered in the project, whatever the config says.
pub const DEFAULT_IGNORED_FILES: &[&str] = &["Thumbs.db"];

/// Pipeline configuration loaded from lux-pipeline.yaml.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Path to the Aseprite executable.
    pub aseprite: Option<PathBuf>,

    /// Path to the texture packer executable.
    pub packer: Option<PathBuf>,

    /// Patterns excluded from the input walk.
    pub excludes: Vec<String>,

    /// Extra file names never registered in the project.
    pub ignored_files: Vec<String>,

    /// Width of the sheet the exporter lays frames out on.
    pub sheet_width: u32,

    /// Maximum atlas size handed to the packer.
    pub atlas_size: u32,

    /// Padding in pixels, used for both export and packing.
    pub padding: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            aseprite: None,
            packer: None,
            excludes: vec![],
            ignored_files: vec![],
            sheet_width: 2048,
            atlas_size: 4096,
            padding: 1,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Load `lux-pipeline.yaml` from the pipeline root, or defaults if absent.
    pub fn discover(pipeline_root: &Path) -> Result<Self> {
        let path = pipeline_root.join(CONFIG_FILENAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        // serde_yaml rejects an empty document for a struct
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| PipelineError::Parse {
            message: format!("Invalid config: {}", e),
            help: Some(format!("Check {} syntax", CONFIG_FILENAME)),
        })
    }

    /// Check if a path should be skipped by the input walk.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.excludes
            .iter()
            .any(|pattern| matches_pattern(&path_str, pattern))
    }
}

/// Simple glob matching: `*.ext`, `dir/*`, `**/dir/*`, otherwise substring.
fn matches_pattern(path: &str, pattern: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix("**/") {
        if let Some(dir) = suffix.strip_suffix("/*") {
            return path.starts_with(&format!("{}/", dir))
                || path.contains(&format!("/{}/", dir));
        }
        return path.ends_with(suffix) || path.contains(&format!("/{}", suffix));
    }

    if let Some(suffix) = pattern.strip_prefix('*') {
        if !pattern.contains('/') {
            return path.ends_with(suffix);
        }
    }

    if let Some(prefix) = pattern.strip_suffix("/*") {
        return path.starts_with(&format!("{}/", prefix))
            || path.contains(&format!("/{}/", prefix));
    }

    path.contains(pattern)
}
