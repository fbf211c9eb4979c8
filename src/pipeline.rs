//! The content pipeline run.
//!
//! Each handler walks the whole input tree and then gets its post pass,
//! in order. The project file is synced last so it sees every generated
//! file, the atlas included.

use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::csproj::{CsProj, CONTENT_DIR_NAME};
use crate::error::Result;
use crate::handlers::{AsepriteHandler, ContentHandler, ContentRoots, MapsHandler, PipelineContext};
use crate::output::{display_path, plural, Printer};
use crate::tools::{CommandRunner, ToolLocator};
use crate::walk::walk_files;

/// Inputs to one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub csproj: PathBuf,
    pub input_dir: PathBuf,
    pub config: PipelineConfig,
    pub tools: ToolLocator,
}

impl PipelineOptions {
    /// The content directory next to the project file.
    pub fn content_dir(&self) -> PathBuf {
        self.csproj
            .parent()
            .unwrap_or(Path::new(""))
            .join(CONTENT_DIR_NAME)
    }
}

/// What a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Files handled, per handler name.
    pub handled: Vec<(&'static str, usize)>,
    /// New project file entries.
    pub registered: usize,
}

/// The handlers a run applies, in order.
pub fn default_handlers(input_dir: &Path, content_dir: &Path) -> Vec<Box<dyn ContentHandler>> {
    let roots = ContentRoots::new(input_dir, content_dir);
    let aseprite: Box<dyn ContentHandler> = Box::new(AsepriteHandler::new(roots.clone()));
    let maps: Box<dyn ContentHandler> = Box::new(MapsHandler::new(roots));
    vec![aseprite, maps]
}

/// Run every handler over the input tree, then sync the project file.
pub fn run_pipeline(
    options: &PipelineOptions,
    runner: &dyn CommandRunner,
    printer: &Printer,
) -> Result<PipelineSummary> {
    let content_dir = options.content_dir();
    let ctx = PipelineContext {
        config: &options.config,
        tools: &options.tools,
        runner,
        printer,
        content_dir: &content_dir,
    };

    let mut summary = PipelineSummary::default();
    for mut handler in default_handlers(&options.input_dir, &content_dir) {
        let mut handled = 0;
        walk_files(&options.input_dir, &options.config, |path| {
            if handler.handle(path, &ctx)? {
                handled += 1;
            }
            Ok(())
        })?;
        handler.post_process(&ctx)?;
        summary.handled.push((handler.name(), handled));
    }

    let mut csproj = CsProj::load(&options.csproj)?.with_ignored_files(&options.config.ignored_files);
    summary.registered = csproj.sync_content()?;
    if summary.registered > 0 {
        printer.status(
            "Registered",
            &format!(
                "{} in {}",
                plural(summary.registered, "file", "files"),
                display_path(&options.csproj)
            ),
        );
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;
    use tempfile::tempdir;

    struct NoTools;

    impl CommandRunner for NoTools {
        fn run(&self, program: &Path, _args: &[OsString]) -> Result<i32> {
            panic!("unexpected tool run: {}", program.display());
        }
    }

    #[test]
    fn test_content_dir_next_to_csproj() {
        let options = PipelineOptions {
            csproj: PathBuf::from("/games/lux/Lux.csproj"),
            input_dir: PathBuf::from("/games/art"),
            config: PipelineConfig::default(),
            tools: ToolLocator::new("/opt/lux"),
        };
        assert_eq!(options.content_dir(), PathBuf::from("/games/lux/Content"));
    }

    #[test]
    fn test_maps_only_run_needs_no_tools() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("Game");
        let input = dir.path().join("pipeline");
        fs::create_dir_all(&project).unwrap();
        fs::create_dir_all(input.join("maps")).unwrap();
        fs::write(project.join("Game.csproj"), "<Project Sdk=\"Microsoft.NET.Sdk\"></Project>").unwrap();
        fs::write(input.join("maps/level1.json"), r#"{"ogmoVersion": "3.4.0", "layers": []}"#).unwrap();
        fs::write(input.join("notes.txt"), "todo").unwrap();

        let options = PipelineOptions {
            csproj: project.join("Game.csproj"),
            input_dir: input,
            config: PipelineConfig::default(),
            tools: ToolLocator::new(dir.path()),
        };

        let summary = run_pipeline(&options, &NoTools, &Printer::quiet()).unwrap();

        assert_eq!(summary.handled, vec![("aseprite", 0), ("maps", 1)]);
        assert_eq!(summary.registered, 1);
        assert!(project.join("Content/maps/level1.json").exists());
        let csproj = fs::read_to_string(project.join("Game.csproj")).unwrap();
        assert!(csproj.contains(r#"Include="Content/maps/level1.json""#));
    }
}
