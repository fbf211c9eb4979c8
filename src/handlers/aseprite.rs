//! Aseprite sprites.
//!
//! Each `.aseprite`/`.ase` file is exported to a PNG sheet and a sprite
//! JSON. Once every file is exported the sheets are packed into one atlas
//! and each sprite is pointed at its place in it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::atlas::Atlas;
use crate::error::{PipelineError, Result};
use crate::export::AsepriteExporter;
use crate::output::{display_path, plural};
use crate::sprite::Sprite;

use super::{change_extension, ensure_parent, file_stem, ContentHandler, ContentRoots, PipelineContext};

/// Atlas location under the content directory, without extension.
const ATLAS_DIR: &str = "Textures";
const ATLAS_NAME: &str = "atlas";

pub struct AsepriteHandler {
    roots: ContentRoots,
    /// Sprite name → written sprite JSON.
    sprites: BTreeMap<String, PathBuf>,
    /// Exported sheets waiting to be packed.
    sheets: BTreeSet<PathBuf>,
}

impl AsepriteHandler {
    pub fn new(roots: ContentRoots) -> Self {
        Self {
            roots,
            sprites: BTreeMap::new(),
            sheets: BTreeSet::new(),
        }
    }

    /// Sprite JSON written for each sprite name so far.
    pub fn sprites(&self) -> &BTreeMap<String, PathBuf> {
        &self.sprites
    }

    fn exporter(ctx: &PipelineContext) -> Result<AsepriteExporter> {
        Ok(AsepriteExporter {
            program: ctx.tools.aseprite()?,
            sheet_width: ctx.config.sheet_width,
            padding: ctx.config.padding,
        })
    }
}

impl ContentHandler for AsepriteHandler {
    fn name(&self) -> &'static str {
        "aseprite"
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["aseprite", "ase"]
    }

    fn roots(&self) -> &ContentRoots {
        &self.roots
    }

    fn handle_file(&mut self, input: &Path, output: &Path, ctx: &PipelineContext) -> Result<()> {
        // Atlas images are matched back to sprites by name alone
        let name = file_stem(output);
        let json_path = change_extension(output, ".json");
        if let Some(existing) = self.sprites.get(&name) {
            return Err(PipelineError::Build {
                message: format!(
                    "Sprite name '{}' is used by both {} and {}",
                    name,
                    display_path(existing),
                    display_path(&json_path)
                ),
                help: Some("Sprite file names must be unique across folders".to_string()),
            });
        }

        ctx.printer.status("Exporting", &display_path(input));

        // The sheet lands next to the source file until it is packed
        let sheet = change_extension(input, ".png");
        let export = Self::exporter(ctx)?.export(ctx.runner, input, &sheet)?;
        self.sheets.insert(sheet);

        let sprite = export.to_sprite(&name)?;

        ensure_parent(&json_path)?;
        sprite.write(&json_path)?;
        ctx.printer.status(
            "Writing",
            &format!(
                "{} ({}, {})",
                display_path(&json_path),
                plural(sprite.animations.len(), "animation", "animations"),
                plural(sprite.frame_count(), "frame", "frames")
            ),
        );

        self.sprites.insert(name, json_path);
        Ok(())
    }

    fn post_process(&mut self, ctx: &PipelineContext) -> Result<()> {
        if self.sheets.is_empty() {
            ctx.printer.info("Skipping", "atlas (no sprites exported)");
            return Ok(());
        }

        let output = ctx.content_dir.join(ATLAS_DIR).join(ATLAS_NAME);
        let mut atlas = Atlas::new(output, self.sheets.iter().cloned().collect(), ctx.tools.packer());
        atlas.max_size = ctx.config.atlas_size;
        atlas.padding = ctx.config.padding;

        ctx.printer.status(
            "Packing",
            &format!("{} into {}", plural(atlas.images.len(), "sheet", "sheets"), display_path(&atlas.output)),
        );
        let manifest = atlas.generate(ctx.runner)?;

        for (texture, image) in manifest.placements() {
            let json_path = self.sprites.get(&image.name).ok_or_else(|| PipelineError::Build {
                message: format!("Atlas image '{}' has no exported sprite", image.name),
                help: Some("Every packed image must come from an exported .aseprite file".to_string()),
            })?;

            // TODO: frame width/height are not checked against the packed image size
            let sprite = Sprite::load(json_path)?.placed_in_atlas(&texture.name, image.x, image.y);
            sprite.write_pretty(json_path)?;

            ctx.printer.status(
                "Remapped",
                &format!("{} -> {} @ ({}, {})", image.name, texture.name, image.x, image.y),
            );
        }

        Ok(())
    }
}
