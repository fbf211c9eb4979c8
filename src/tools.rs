//! External tool resolution and invocation.
//!
//! The pipeline shells out to three binaries: the Aseprite exporter, the
//! crunch texture packer and protoc. Their locations are resolved here from
//! the pipeline install root and the config, never at the call sites.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// Environment variable overriding the Aseprite location.
pub const ASEPRITE_ENV: &str = "ASEPRITE_PATH";

/// Runs an external program to completion and reports its exit code.
pub trait CommandRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<i32>;
}

/// Runs programs as real child processes, inheriting stdio.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<i32> {
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| PipelineError::io(program, "Failed to spawn", e))?;

        // Killed by a signal: no code, treat as a failure
        Ok(status.code().unwrap_or(-1))
    }
}

/// Run a tool and turn a non-zero exit into a fatal error.
pub fn run_tool(runner: &dyn CommandRunner, tool: &str, program: &Path, args: &[OsString]) -> Result<()> {
    let code = runner.run(program, args)?;
    if code != 0 {
        return Err(PipelineError::Tool {
            tool: tool.to_string(),
            code,
        });
    }
    Ok(())
}

/// Append the platform executable suffix (`.exe` on Windows).
pub fn with_exe_suffix(path: PathBuf) -> PathBuf {
    let suffix = std::env::consts::EXE_SUFFIX;
    if suffix.is_empty() {
        return path;
    }
    let mut name = path.into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Locate the pipeline install root from the running executable
/// (`<root>/bin/<exe>` → `<root>`).
pub fn default_pipeline_root() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let root = exe
        .parent()
        .and_then(Path::parent)
        .ok_or_else(|| PipelineError::Build {
            message: format!("Cannot derive pipeline root from {}", exe.display()),
            help: Some("Pass --pipeline-root explicitly".to_string()),
        })?;
    Ok(root.to_path_buf())
}

/// Resolves tool locations for one pipeline install.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    root: PathBuf,
    aseprite: Option<PathBuf>,
    packer: Option<PathBuf>,
}

impl ToolLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            aseprite: None,
            packer: None,
        }
    }

    /// Apply the tool overrides from a config.
    pub fn with_config(mut self, config: &PipelineConfig) -> Self {
        self.aseprite = config.aseprite.clone();
        self.packer = config.packer.clone();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The crunch texture packer.
    pub fn packer(&self) -> PathBuf {
        match &self.packer {
            Some(path) => path.clone(),
            None => with_exe_suffix(self.root.join("lib").join("crunch").join("bin").join("crunch")),
        }
    }

    /// The protobuf compiler.
    pub fn protoc(&self) -> PathBuf {
        with_exe_suffix(self.root.join("lib").join("protoc").join("bin").join("protoc"))
    }

    /// Well-known .proto includes shipped next to protoc.
    pub fn protoc_include(&self) -> PathBuf {
        self.root.join("lib").join("protoc").join("include")
    }

    /// The Aseprite executable.
    ///
    /// Checked in order: config override, `ASEPRITE_PATH`, `PATH`, then the
    /// platform's usual install locations.
    pub fn aseprite(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.aseprite {
            return Ok(path.clone());
        }

        if let Ok(path) = std::env::var(ASEPRITE_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(path);
            }
        }

        if let Ok(path) = which::which("aseprite") {
            return Ok(path);
        }

        let common_paths: &[&str] = if cfg!(windows) {
            &[
                "C:\\Program Files (x86)\\Aseprite\\Aseprite.exe",
                "C:\\Program Files\\Aseprite\\Aseprite.exe",
            ]
        } else if cfg!(target_os = "macos") {
            &["/Applications/Aseprite.app/Contents/MacOS/aseprite"]
        } else {
            &["/usr/bin/aseprite", "/usr/local/bin/aseprite"]
        };

        common_paths
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .ok_or_else(|| PipelineError::ToolNotFound {
                tool: "aseprite".to_string(),
                help: Some(format!(
                    "Set `aseprite` in lux-pipeline.yaml or the {} environment variable",
                    ASEPRITE_ENV
                )),
            })
    }
}
