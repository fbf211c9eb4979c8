//! Texture atlas packing.
//!
//! Wraps the crunch packer: many PNGs in, one or more atlas textures plus a
//! JSON manifest out.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::tools::{run_tool, CommandRunner};

/// An image's placement inside an atlas texture.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackedImage {
    /// Source image name, without extension.
    #[serde(rename = "n")]
    pub name: String,
    pub x: u32,
    pub y: u32,
    #[serde(default)]
    pub w: u32,
    #[serde(default)]
    pub h: u32,
}

/// One atlas texture and the images packed into it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AtlasTexture {
    pub name: String,
    #[serde(default)]
    pub images: Vec<PackedImage>,
}

/// The packer's `--json` manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AtlasManifest {
    #[serde(default)]
    pub textures: Vec<AtlasTexture>,
}

impl AtlasManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| PipelineError::io(path, "Failed to read atlas manifest", e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| PipelineError::Parse {
            message: format!("Invalid atlas manifest: {}", e),
            help: None,
        })
    }

    /// Every packed image with the texture it landed on.
    pub fn placements(&self) -> impl Iterator<Item = (&AtlasTexture, &PackedImage)> {
        self.textures
            .iter()
            .flat_map(|texture| texture.images.iter().map(move |image| (texture, image)))
    }
}

/// A pending atlas build.
#[derive(Debug, Clone)]
pub struct Atlas {
    /// Output path without extension; the packer appends its own.
    pub output: PathBuf,
    pub images: Vec<PathBuf>,
    pub packer: PathBuf,
    pub max_size: u32,
    pub padding: u32,
}

impl Atlas {
    pub fn new(output: impl Into<PathBuf>, images: Vec<PathBuf>, packer: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            images,
            packer: packer.into(),
            max_size: 4096,
            padding: 1,
        }
    }

    /// Path of the JSON manifest the packer writes.
    pub fn manifest_path(&self) -> PathBuf {
        let mut path = self.output.clone().into_os_string();
        path.push(".json");
        PathBuf::from(path)
    }

    /// Command-line arguments: output, comma-joined inputs, then options.
    pub fn args(&self) -> Vec<OsString> {
        let mut inputs = OsString::new();
        for (i, image) in self.images.iter().enumerate() {
            if i > 0 {
                inputs.push(",");
            }
            inputs.push(image);
        }

        vec![
            self.output.clone().into_os_string(),
            inputs,
            "--premultiply".into(),
            "--json".into(),
            format!("--size{}", self.max_size).into(),
            format!("--pad{}", self.padding).into(),
        ]
    }

    /// Run the packer and read back its manifest.
    pub fn generate(&self, runner: &dyn CommandRunner) -> Result<AtlasManifest> {
        if let Some(parent) = self.output.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PipelineError::io(parent, "Failed to create atlas directory", e))?;
        }

        run_tool(runner, "crunch", &self.packer, &self.args())?;

        AtlasManifest::load(&self.manifest_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_atlas_args() {
        let mut atlas = Atlas::new(
            "Content/Textures/atlas",
            vec![PathBuf::from("art/hero.png"), PathBuf::from("art/bat.png")],
            "crunch",
        );
        atlas.max_size = 2048;
        atlas.padding = 2;

        let args: Vec<String> = atlas
            .args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec![
                "Content/Textures/atlas",
                "art/hero.png,art/bat.png",
                "--premultiply",
                "--json",
                "--size2048",
                "--pad2",
            ]
        );
    }

    #[test]
    fn test_default_options() {
        let atlas = Atlas::new("atlas", vec![], "crunch");
        let args = atlas.args();
        assert_eq!(args[4], OsString::from("--size4096"));
        assert_eq!(args[5], OsString::from("--pad1"));
    }

    #[test]
    fn test_manifest_path() {
        let atlas = Atlas::new("Content/Textures/atlas", vec![], "crunch");
        assert_eq!(atlas.manifest_path(), PathBuf::from("Content/Textures/atlas.json"));
    }

    #[test]
    fn test_parse_manifest() {
        let json = r#"{
            "textures": [
                { "name": "atlas0", "images": [
                    { "n": "hero", "x": 0, "y": 0, "w": 70, "h": 26 },
                    { "n": "bat", "x": 71, "y": 0, "w": 20, "h": 10 }
                ]},
                { "name": "atlas1", "images": [
                    { "n": "tree", "x": 0, "y": 0, "w": 64, "h": 128 }
                ]}
            ]
        }"#;

        let manifest = AtlasManifest::parse(json).unwrap();
        let placements: Vec<(&str, &str, u32)> = manifest
            .placements()
            .map(|(t, i)| (t.name.as_str(), i.name.as_str(), i.x))
            .collect();

        assert_eq!(
            placements,
            vec![("atlas0", "hero", 0), ("atlas0", "bat", 71), ("atlas1", "tree", 0)]
        );
    }

    #[test]
    fn test_parse_manifest_rejects_garbage() {
        assert!(AtlasManifest::parse("[1, 2]").is_err());
    }
}
