pub mod protobuf;
pub mod run;

use std::process::ExitCode;

use clap::Parser;

/// Exit code for a malformed command line.
pub const USAGE_EXIT_CODE: u8 = 1;

/// Parse the process arguments.
///
/// On failure the clap message is printed and the exit code to use is
/// returned: 0 for `--help`/`--version`, 1 for a usage error.
pub fn parse_args<P: Parser>() -> Result<P, ExitCode> {
    P::try_parse().map_err(|err| {
        let _ = err.print();
        if err.use_stderr() {
            ExitCode::from(USAGE_EXIT_CODE)
        } else {
            ExitCode::SUCCESS
        }
    })
}

/// Map a tool's exit status onto the process exit code.
pub fn exit_code(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}
