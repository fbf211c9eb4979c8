//! Runtime sprite schema.
//!
//! This is the JSON form of the game's `Sprite` protobuf message. Field
//! names keep the message's PascalCase and every field is always written,
//! including zero values, so the game-side parser never sees a gap.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Draw order of a frame relative to the character layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteDepth {
    #[default]
    BehindCharacter,
    InFrontOfCharacter,
}

/// One frame of an animation, located on a texture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AnimationFrame {
    pub width: u32,
    pub height: u32,
    pub texture_position_x: u32,
    pub texture_position_y: u32,
    pub sprite_depth: SpriteDepth,
    /// Milliseconds.
    pub duration: u32,
}

/// A named run of frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Animation {
    pub frames: Vec<AnimationFrame>,
    pub index_start: u32,
    pub index_end: u32,
}

/// A sprite: a texture plus the animations cut from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Sprite {
    pub texture_name: String,
    pub default_animation_name: String,
    pub animations: BTreeMap<String, Animation>,
}

impl Sprite {
    pub fn new(texture_name: impl Into<String>) -> Self {
        Self {
            texture_name: texture_name.into(),
            ..Default::default()
        }
    }

    /// Total number of frames across all animations.
    pub fn frame_count(&self) -> usize {
        self.animations.values().map(|a| a.frames.len()).sum()
    }

    /// Move the sprite onto an atlas texture.
    ///
    /// The texture name becomes the atlas texture and every frame is shifted
    /// by the image's offset inside it. Frame sizes are left untouched: they
    /// are not checked against the packed image size.
    pub fn placed_in_atlas(mut self, texture_name: &str, offset_x: u32, offset_y: u32) -> Self {
        self.texture_name = texture_name.to_string();
        for frame in self
            .animations
            .values_mut()
            .flat_map(|animation| animation.frames.iter_mut())
        {
            frame.texture_position_x += offset_x;
            frame.texture_position_y += offset_y;
        }
        self
    }

    /// Read a sprite from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| PipelineError::io(path, "Failed to read sprite", e))?;
        serde_json::from_str(&content).map_err(|e| PipelineError::Parse {
            message: format!("Invalid sprite JSON in {}: {}", path.display(), e),
            help: None,
        })
    }

    /// Write the sprite as compact JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self).map_err(|e| PipelineError::Build {
            message: format!("Failed to serialize sprite: {}", e),
            help: None,
        })?;
        fs::write(path, json).map_err(|e| PipelineError::io(path, "Failed to write sprite", e))
    }

    /// Write the sprite as JSON indented by four spaces.
    pub fn write_pretty(&self, path: &Path) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer).map_err(|e| PipelineError::Build {
            message: format!("Failed to serialize sprite: {}", e),
            help: None,
        })?;
        fs::write(path, buf).map_err(|e| PipelineError::io(path, "Failed to write sprite", e))
    }
}
