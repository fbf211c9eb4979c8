//! compile-protobuf implementation.

use std::path::PathBuf;

use clap::Parser;

use crate::error::Result;
use crate::output::Printer;
use crate::protoc::ProtoCompiler;
use crate::tools::{SystemRunner, ToolLocator};

/// Generate C# and Python bindings for the pipeline's .proto files
#[derive(Parser, Debug)]
#[command(name = "compile-protobuf")]
#[command(version, about, long_about = None)]
pub struct CompileProtobufArgs {
    /// Project root holding lib/protoc
    pub lux_project_dir: PathBuf,

    /// Directory of .proto files (C# output is written here too)
    pub proto_files_dir: PathBuf,

    /// Directory receiving the Python modules
    pub python_output_dir: PathBuf,
}

/// Returns protoc's exit code: 0, or the code of the first failing file.
pub fn run(args: CompileProtobufArgs, printer: &Printer) -> Result<i32> {
    let tools = ToolLocator::new(args.lux_project_dir);
    let compiler = ProtoCompiler::new(&tools, args.proto_files_dir, args.python_output_dir);
    compiler.compile_all(&SystemRunner, printer)
}
