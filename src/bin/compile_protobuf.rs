use std::process::ExitCode;

use lux_pipeline::cli::{self, protobuf::CompileProtobufArgs};
use lux_pipeline::output::Printer;

fn main() -> miette::Result<ExitCode> {
    let args = match cli::parse_args::<CompileProtobufArgs>() {
        Ok(args) => args,
        Err(code) => return Ok(code),
    };

    let code = cli::protobuf::run(args, &Printer::new())?;

    Ok(cli::exit_code(code))
}
