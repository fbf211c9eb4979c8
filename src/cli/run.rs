//! run-pipeline implementation.
//!
//! Converts the pipeline files into the game's content directory and
//! registers the results in the project file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::output::{display_path, plural, Printer};
use crate::pipeline::{run_pipeline, PipelineOptions, PipelineSummary};
use crate::tools::{default_pipeline_root, SystemRunner, ToolLocator};

/// Export sprites and maps into a game project's Content directory
#[derive(Parser, Debug)]
#[command(name = "run-pipeline")]
#[command(version, about, long_about = None)]
pub struct RunPipelineArgs {
    /// Project file whose Content directory receives the output
    pub csproj_file_path: PathBuf,

    /// Directory holding the source assets
    pub pipeline_files_dir: PathBuf,

    /// Pipeline install root (default: parent of the executable's directory)
    #[arg(long)]
    pub pipeline_root: Option<PathBuf>,

    /// Config file (default: <pipeline root>/lux-pipeline.yaml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: RunPipelineArgs, printer: &Printer) -> Result<PipelineSummary> {
    let root = match args.pipeline_root {
        Some(root) => root,
        None => default_pipeline_root()?,
    };

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::discover(&root)?,
    };

    let options = PipelineOptions {
        csproj: args.csproj_file_path,
        input_dir: args.pipeline_files_dir,
        tools: ToolLocator::new(root).with_config(&config),
        config,
    };

    printer.status("Processing", &display_path(&options.input_dir));
    let summary = run_pipeline(&options, &SystemRunner, printer)?;

    let handled: usize = summary.handled.iter().map(|(_, n)| n).sum();
    printer.status(
        "Finished",
        &format!(
            "{}, {} registered",
            plural(handled, "file", "files"),
            plural(summary.registered, "entry", "entries")
        ),
    );

    Ok(summary)
}
