//! Protobuf compilation.
//!
//! Generates the C# and Python bindings for the sprite schema by running
//! protoc once per `.proto` file. Unlike the content tools, a protoc
//! failure is not turned into an error: its exit code is handed back so the
//! caller can exit with it.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::output::{display_path, Printer};
use crate::tools::{CommandRunner, ToolLocator};

/// Options for one compile run.
#[derive(Debug, Clone)]
pub struct ProtoCompiler {
    pub protoc: PathBuf,
    pub include_dir: PathBuf,
    pub proto_dir: PathBuf,
    pub python_out: PathBuf,
}

impl ProtoCompiler {
    pub fn new(tools: &ToolLocator, proto_dir: impl Into<PathBuf>, python_out: impl Into<PathBuf>) -> Self {
        Self {
            protoc: tools.protoc(),
            include_dir: tools.protoc_include(),
            proto_dir: proto_dir.into(),
            python_out: python_out.into(),
        }
    }

    /// `.proto` files directly inside the proto directory, sorted.
    pub fn proto_files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.proto_dir)
            .map_err(|e| PipelineError::io(&self.proto_dir, "Failed to list proto files", e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| PipelineError::io(&self.proto_dir, "Failed to list proto files", e))?
                .path();
            if path.is_file() && path.extension().is_some_and(|e| e == "proto") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn args(&self, proto_file: &Path) -> Vec<OsString> {
        let flag = |name: &str, value: &Path| {
            let mut arg = OsString::from(name);
            arg.push(value);
            arg
        };

        vec![
            flag("--proto_path=", &self.proto_dir),
            flag("--proto_path=", &self.include_dir),
            flag("--csharp_out=", &self.proto_dir),
            flag("--python_out=", &self.python_out),
            proto_file.into(),
        ]
    }

    /// Compile every proto file, stopping at the first failure.
    ///
    /// Returns protoc's exit code for the failing file, or 0.
    pub fn compile_all(&self, runner: &dyn CommandRunner, printer: &Printer) -> Result<i32> {
        let files = self.proto_files()?;
        for file in &files {
            printer.status("Compiling", &display_path(file));
            let code = runner.run(&self.protoc, &self.args(file))?;
            if code != 0 {
                printer.warning("Failed", &format!("protoc exited with {}", code));
                return Ok(code);
            }
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use tempfile::tempdir;

    /// Exits with the scripted code for each call, 0 once the script runs out.
    struct ScriptedProtoc {
        codes: RefCell<Vec<i32>>,
        compiled: RefCell<Vec<String>>,
    }

    impl ScriptedProtoc {
        fn new(codes: &[i32]) -> Self {
            Self {
                codes: RefCell::new(codes.iter().rev().copied().collect()),
                compiled: RefCell::new(vec![]),
            }
        }
    }

    impl CommandRunner for ScriptedProtoc {
        fn run(&self, _program: &Path, args: &[OsString]) -> Result<i32> {
            let file = Path::new(args.last().unwrap());
            self.compiled
                .borrow_mut()
                .push(file.file_name().unwrap().to_string_lossy().into_owned());
            Ok(self.codes.borrow_mut().pop().unwrap_or(0))
        }
    }

    fn proto_dir(names: &[&str]) -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), "syntax = \"proto3\";").unwrap();
        }
        dir
    }

    #[test]
    fn test_args() {
        let tools = ToolLocator::new("/opt/lux");
        let compiler = ProtoCompiler::new(&tools, "/opt/lux/proto", "/opt/lux/python");
        let args: Vec<String> = compiler
            .args(Path::new("/opt/lux/proto/Sprite.proto"))
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec![
                "--proto_path=/opt/lux/proto",
                "--proto_path=/opt/lux/lib/protoc/include",
                "--csharp_out=/opt/lux/proto",
                "--python_out=/opt/lux/python",
                "/opt/lux/proto/Sprite.proto",
            ]
        );
    }

    #[test]
    fn test_only_proto_files_sorted() {
        let dir = proto_dir(&["Sprite.proto", "Map.proto", "README.md"]);
        let compiler = ProtoCompiler::new(&ToolLocator::new("/opt/lux"), dir.path(), dir.path());

        let names: Vec<String> = compiler
            .proto_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Map.proto", "Sprite.proto"]);
    }

    #[test]
    fn test_compile_all_success() {
        let dir = proto_dir(&["Map.proto", "Sprite.proto"]);
        let compiler = ProtoCompiler::new(&ToolLocator::new("/opt/lux"), dir.path(), dir.path());
        let runner = ScriptedProtoc::new(&[]);

        assert_eq!(compiler.compile_all(&runner, &Printer::quiet()).unwrap(), 0);
        assert_eq!(*runner.compiled.borrow(), vec!["Map.proto", "Sprite.proto"]);
    }

    #[test]
    fn test_compile_all_stops_at_first_failure() {
        let dir = proto_dir(&["A.proto", "B.proto", "C.proto"]);
        let compiler = ProtoCompiler::new(&ToolLocator::new("/opt/lux"), dir.path(), dir.path());
        let runner = ScriptedProtoc::new(&[0, 7, 0]);

        assert_eq!(compiler.compile_all(&runner, &Printer::quiet()).unwrap(), 7);
        assert_eq!(*runner.compiled.borrow(), vec!["A.proto", "B.proto"]);
    }

    #[test]
    fn test_missing_proto_dir() {
        let compiler = ProtoCompiler::new(&ToolLocator::new("/opt/lux"), "/nonexistent/proto", "/tmp");
        assert!(compiler.proto_files().is_err());
    }
}
