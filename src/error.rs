use miette::Diagnostic;
use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Error, Diagnostic, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    #[diagnostic(code(lux::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(lux::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(lux::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{tool} failed with exit code {code}")]
    #[diagnostic(code(lux::tool))]
    Tool { tool: String, code: i32 },

    #[error("{tool} executable not found")]
    #[diagnostic(code(lux::tool))]
    ToolNotFound {
        tool: String,
        #[help]
        help: Option<String>,
    },

    #[error("Build error: {message}")]
    #[diagnostic(code(lux::build))]
    Build {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl PipelineError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: &std::path::Path, action: &str, err: impl std::fmt::Display) -> Self {
        PipelineError::Io {
            path: path.to_path_buf(),
            message: format!("{}: {}", action, err),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
