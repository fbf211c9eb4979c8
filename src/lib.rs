//! lux-pipeline - build-time content pipeline
//!
//! Exports Aseprite sprites into the game's sprite JSON, packs their sheets
//! into a texture atlas, copies Ogmo maps, and registers everything in the
//! game's project file.

pub mod atlas;
pub mod cli;
pub mod config;
pub mod csproj;
pub mod error;
pub mod export;
pub mod handlers;
pub mod output;
pub mod pipeline;
pub mod protoc;
pub mod sprite;
pub mod tools;
pub mod walk;

pub use atlas::{Atlas, AtlasManifest, AtlasTexture, PackedImage};
pub use config::PipelineConfig;
pub use csproj::CsProj;
pub use error::{PipelineError, Result};
pub use export::{AsepriteExporter, ExportSheet, FrameTag};
pub use handlers::{AsepriteHandler, ContentHandler, ContentRoots, MapsHandler, PipelineContext};
pub use pipeline::{run_pipeline, PipelineOptions, PipelineSummary};
pub use protoc::ProtoCompiler;
pub use sprite::{Animation, AnimationFrame, Sprite, SpriteDepth};
pub use tools::{CommandRunner, SystemRunner, ToolLocator};
