use std::process::ExitCode;

use lux_pipeline::cli::{self, run::RunPipelineArgs};
use lux_pipeline::output::Printer;

fn main() -> miette::Result<ExitCode> {
    let args = match cli::parse_args::<RunPipelineArgs>() {
        Ok(args) => args,
        Err(code) => return Ok(code),
    };

    cli::run::run(args, &Printer::new())?;

    Ok(ExitCode::SUCCESS)
}
