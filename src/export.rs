//! Aseprite command-line export.
//!
//! Runs `aseprite -b` to lay a file's frames out on a PNG sheet and reads
//! back the JSON data file it writes alongside.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::handlers::change_extension;
use crate::sprite::{Animation, AnimationFrame, Sprite, SpriteDepth};
use crate::tools::{run_tool, CommandRunner};

/// Pixel rectangle on the exported sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// One exported frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportFrame {
    #[serde(default)]
    pub filename: Option<String>,
    pub frame: Rect,
    /// Milliseconds.
    pub duration: u32,
}

/// A named, inclusive frame range.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrameTag {
    pub name: String,
    pub from: u32,
    pub to: u32,
    #[serde(default)]
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportMeta {
    #[serde(rename = "frameTags", default)]
    pub frame_tags: Vec<FrameTag>,
}

/// The exporter's data file.
///
/// `frames` is accepted both as an array (`--format json-array`) and as a
/// filename-keyed object; the object form is read in document order.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSheet {
    #[serde(deserialize_with = "frames_in_order")]
    pub frames: Vec<ExportFrame>,
    #[serde(default)]
    pub meta: ExportMeta,
}

impl ExportSheet {
    /// Read an exporter data file. Anything but a `.json` path is refused.
    pub fn load(path: &Path) -> Result<Self> {
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            return Err(PipelineError::Parse {
                message: format!("Export data is not a JSON file: {}", path.display()),
                help: None,
            });
        }

        let content = fs::read_to_string(path)
            .map_err(|e| PipelineError::io(path, "Failed to read export data", e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| PipelineError::Parse {
            message: format!("Invalid export data: {}", e),
            help: Some("Expected Aseprite --data output with --list-tags".to_string()),
        })
    }

    pub fn frame_tags(&self) -> &[FrameTag] {
        &self.meta.frame_tags
    }

    /// Frames covered by a tag, `from..=to`.
    pub fn frames_for_tag(&self, tag: &FrameTag) -> Result<&[ExportFrame]> {
        if tag.from > tag.to {
            return Ok(&[]);
        }
        let (from, to) = (tag.from as usize, tag.to as usize);
        if to >= self.frames.len() {
            return Err(PipelineError::Parse {
                message: format!(
                    "Frame tag '{}' spans {}..={} but only {} frame(s) were exported",
                    tag.name,
                    tag.from,
                    tag.to,
                    self.frames.len()
                ),
                help: None,
            });
        }
        Ok(&self.frames[from..=to])
    }

    /// Build the runtime sprite: one animation per frame tag, the first tag
    /// being the default.
    pub fn to_sprite(&self, texture_name: &str) -> Result<Sprite> {
        let mut sprite = Sprite::new(texture_name);

        if let Some(first) = self.frame_tags().first() {
            sprite.default_animation_name = first.name.clone();
        }

        for tag in self.frame_tags() {
            let frames = self
                .frames_for_tag(tag)?
                .iter()
                .map(|f| AnimationFrame {
                    width: f.frame.w,
                    height: f.frame.h,
                    texture_position_x: f.frame.x,
                    texture_position_y: f.frame.y,
                    sprite_depth: SpriteDepth::BehindCharacter,
                    duration: f.duration,
                })
                .collect();

            sprite.animations.insert(
                tag.name.clone(),
                Animation {
                    frames,
                    index_start: tag.from,
                    index_end: tag.to,
                },
            );
        }

        Ok(sprite)
    }
}

fn frames_in_order<'de, D>(deserializer: D) -> std::result::Result<Vec<ExportFrame>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FramesVisitor;

    impl<'de> Visitor<'de> for FramesVisitor {
        type Value = Vec<ExportFrame>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an array of frames or a map of frame name to frame")
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
            let mut frames = Vec::new();
            while let Some(frame) = seq.next_element::<ExportFrame>()? {
                frames.push(frame);
            }
            Ok(frames)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut frames = Vec::new();
            while let Some((name, mut frame)) = map.next_entry::<String, ExportFrame>()? {
                frame.filename.get_or_insert(name);
                frames.push(frame);
            }
            Ok(frames)
        }
    }

    deserializer.deserialize_any(FramesVisitor)
}

/// Invokes the Aseprite CLI.
#[derive(Debug, Clone)]
pub struct AsepriteExporter {
    pub program: PathBuf,
    pub sheet_width: u32,
    pub padding: u32,
}

impl AsepriteExporter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            sheet_width: 2048,
            padding: 1,
        }
    }

    /// Command-line arguments for one export.
    pub fn args(&self, input: &Path, sheet: &Path, data: &Path) -> Vec<OsString> {
        let padding = self.padding.to_string();
        vec![
            "-b".into(),
            input.into(),
            "--sheet".into(),
            sheet.into(),
            "--data".into(),
            data.into(),
            "--list-tags".into(),
            "--format".into(),
            "json-array".into(),
            "--shape-padding".into(),
            padding.clone().into(),
            "--border-padding".into(),
            padding.into(),
            "--sheet-width".into(),
            self.sheet_width.to_string().into(),
        ]
    }

    /// Export `input` to the PNG at `sheet` and return the parsed data file.
    ///
    /// The data file is written next to the sheet as `.tmp.json` and removed
    /// once read.
    pub fn export(&self, runner: &dyn CommandRunner, input: &Path, sheet: &Path) -> Result<ExportSheet> {
        let data = change_extension(sheet, ".tmp.json");

        run_tool(runner, "aseprite", &self.program, &self.args(input, sheet, &data))?;

        let parsed = ExportSheet::load(&data)?;
        fs::remove_file(&data)
            .map_err(|e| PipelineError::io(&data, "Failed to remove export data", e))?;

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ARRAY_EXPORT: &str = r#"{
        "frames": [
            { "filename": "hero 0.aseprite", "frame": { "x": 1, "y": 1, "w": 16, "h": 24 }, "duration": 100 },
            { "filename": "hero 1.aseprite", "frame": { "x": 18, "y": 1, "w": 16, "h": 24 }, "duration": 120 },
            { "filename": "hero 2.aseprite", "frame": { "x": 35, "y": 1, "w": 16, "h": 24 }, "duration": 140 },
            { "filename": "hero 3.aseprite", "frame": { "x": 52, "y": 1, "w": 16, "h": 24 }, "duration": 90 }
        ],
        "meta": {
            "frameTags": [
                { "name": "walk", "from": 0, "to": 2, "direction": "forward" },
                { "name": "hurt", "from": 3, "to": 3, "direction": "forward" }
            ]
        }
    }"#;

    #[test]
    fn test_frames_per_tag_is_inclusive_range() {
        let sheet = ExportSheet::parse(ARRAY_EXPORT).unwrap();
        for tag in sheet.frame_tags() {
            let frames = sheet.frames_for_tag(tag).unwrap();
            assert_eq!(frames.len() as u32, tag.to - tag.from + 1);
        }
    }

    #[test]
    fn test_to_sprite() {
        let sheet = ExportSheet::parse(ARRAY_EXPORT).unwrap();
        let sprite = sheet.to_sprite("hero").unwrap();

        assert_eq!(sprite.texture_name, "hero");
        assert_eq!(sprite.default_animation_name, "walk");
        assert_eq!(sprite.animations.len(), 2);

        let walk = &sprite.animations["walk"];
        assert_eq!(walk.index_start, 0);
        assert_eq!(walk.index_end, 2);
        assert_eq!(walk.frames.len(), 3);
        assert_eq!(
            walk.frames[1],
            AnimationFrame {
                width: 16,
                height: 24,
                texture_position_x: 18,
                texture_position_y: 1,
                sprite_depth: SpriteDepth::BehindCharacter,
                duration: 120,
            }
        );

        let hurt = &sprite.animations["hurt"];
        assert_eq!(hurt.frames.len(), 1);
        assert_eq!(hurt.frames[0].texture_position_x, 52);
    }

    #[test]
    fn test_hash_frames_keep_document_order() {
        let json = r#"{
            "frames": {
                "b 0.aseprite": { "frame": { "x": 40, "y": 0, "w": 8, "h": 8 }, "duration": 10 },
                "a 1.aseprite": { "frame": { "x": 0, "y": 0, "w": 8, "h": 8 }, "duration": 20 }
            },
            "meta": { "frameTags": [ { "name": "all", "from": 0, "to": 1 } ] }
        }"#;

        let sheet = ExportSheet::parse(json).unwrap();
        assert_eq!(sheet.frames[0].frame.x, 40);
        assert_eq!(sheet.frames[0].filename.as_deref(), Some("b 0.aseprite"));
        assert_eq!(sheet.frames[1].duration, 20);
    }

    #[test]
    fn test_no_tags_gives_empty_sprite() {
        let json = r#"{
            "frames": [ { "frame": { "x": 0, "y": 0, "w": 8, "h": 8 }, "duration": 100 } ],
            "meta": { "frameTags": [] }
        }"#;

        let sprite = ExportSheet::parse(json).unwrap().to_sprite("rock").unwrap();
        assert_eq!(sprite.texture_name, "rock");
        assert!(sprite.default_animation_name.is_empty());
        assert!(sprite.animations.is_empty());
    }

    #[test]
    fn test_tag_past_last_frame_is_an_error() {
        let json = r#"{
            "frames": [ { "frame": { "x": 0, "y": 0, "w": 8, "h": 8 }, "duration": 100 } ],
            "meta": { "frameTags": [ { "name": "broken", "from": 0, "to": 4 } ] }
        }"#;

        let sheet = ExportSheet::parse(json).unwrap();
        let err = sheet.to_sprite("rock").unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_load_refuses_non_json_path() {
        let err = ExportSheet::load(Path::new("hero.aseprite")).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
    }

    #[test]
    fn test_exporter_args() {
        let exporter = AsepriteExporter {
            program: PathBuf::from("aseprite"),
            sheet_width: 1024,
            padding: 2,
        };
        let args = exporter.args(
            Path::new("art/hero.aseprite"),
            Path::new("art/hero.png"),
            Path::new("art/hero.tmp.json"),
        );
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(
            args,
            vec![
                "-b",
                "art/hero.aseprite",
                "--sheet",
                "art/hero.png",
                "--data",
                "art/hero.tmp.json",
                "--list-tags",
                "--format",
                "json-array",
                "--shape-padding",
                "2",
                "--border-padding",
                "2",
                "--sheet-width",
                "1024",
            ]
        );
    }
}
