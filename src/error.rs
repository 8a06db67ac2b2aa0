//! Error taxonomy for the build pipeline.
//!
//! Every component returns [`BuildError`] up to `main`, which reports it once.
//! Recoverable conditions (a single source file, no git repository) are logged
//! as warnings and never surface here.

use std::path::PathBuf;

/// Why a single compile unit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The compiler executable could not be spawned at all.
    ToolchainMissing,
    /// The compiler ran and exited non-zero.
    CompileError,
}

/// A failed compile, with everything needed to show it verbatim.
#[derive(Debug, Clone)]
pub struct CompileFailure {
    pub source: PathBuf,
    pub kind: FailureKind,
    pub command: Vec<String>,
    pub status: Option<i32>,
    pub output: String,
}

#[derive(Debug)]
pub enum BuildError {
    /// Compiler missing from PATH, or the environment cannot host it.
    ToolchainNotFound { compiler: String, hint: String },
    /// `-dumpmachine` style introspection exited non-zero.
    ToolchainQuery { compiler: String, stderr: String },
    EntryFileMissing(PathBuf),
    SourceDiscoveryEmpty,
    CompileFailure(Vec<CompileFailure>),
    /// A link input slot was never compiled or its object vanished.
    LinkInputMissing(PathBuf),
    LinkFailure {
        command: Vec<String>,
        status: Option<i32>,
        output: String,
    },
    ArtifactMissing(PathBuf),
    WorkerPool(String),
    State { path: PathBuf, reason: String },
    Io { path: PathBuf, source: std::io::Error },
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Actionable remediation text shown under the error, if any.
    pub fn hint(&self) -> Option<String> {
        match self {
            BuildError::ToolchainNotFound { hint, .. } => Some(hint.clone()),
            BuildError::ToolchainQuery { .. } => Some(
                "The compiler was found but could not report its target. Check the installation."
                    .to_string(),
            ),
            BuildError::EntryFileMissing(_) => Some(
                "Create the entry file or point `project.entry` in kiln.toml at it.".to_string(),
            ),
            BuildError::SourceDiscoveryEmpty => {
                Some("Add source files under one of the `build.sources` directories.".to_string())
            }
            BuildError::LinkInputMissing(_) => {
                Some("Run `kiln clean` and rebuild to regenerate object files.".to_string())
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::ToolchainNotFound { compiler, .. } => {
                write!(f, "Toolchain not found: unable to find '{}' in PATH", compiler)
            }
            BuildError::ToolchainQuery { compiler, stderr } => write!(
                f,
                "Failed to get target triple from '{}': {}",
                compiler,
                stderr.trim()
            ),
            BuildError::EntryFileMissing(path) => {
                write!(f, "Entry file not found: {}", path.display())
            }
            BuildError::SourceDiscoveryEmpty => write!(f, "Failed to find any files to compile"),
            BuildError::CompileFailure(failures) => {
                write!(f, "{} file(s) failed to compile:", failures.len())?;
                for failure in failures {
                    write!(f, " {}", failure.source.display())?;
                }
                Ok(())
            }
            BuildError::LinkInputMissing(path) => {
                write!(f, "Cannot link: object file missing: {}", path.display())
            }
            BuildError::LinkFailure { status, .. } => match status {
                Some(code) => write!(f, "Failed to link all files (exit code {})", code),
                None => write!(f, "Failed to link all files (terminated by signal)"),
            },
            BuildError::ArtifactMissing(path) => {
                write!(f, "Failed to find {}", path.display())
            }
            BuildError::WorkerPool(msg) => write!(f, "Failed to start worker pool: {}", msg),
            BuildError::State { path, reason } => {
                write!(f, "Build state error at {}: {}", path.display(), reason)
            }
            BuildError::Io { path, source } => {
                write!(f, "IO error at {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for BuildError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        BuildError::WorkerPool(e.to_string())
    }
}
