//! Toolchain resolution
//!
//! Maps the host platform and requested language to a concrete compiler,
//! locates it on PATH and asks it for its target triple. Failures here are
//! fatal: a missing compiler cannot heal itself mid-run.

pub mod types;

pub use types::{BuildMode, BuildTarget, CompilerKind, Language};

use crate::error::BuildError;
use crate::process::ProcessRunner;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `cl.exe` has no `-dumpmachine`; it only ever targets this triple here.
pub const MSVC_TRIPLE: &str = "x86_64-pc-windows-msvc";

/// What the user asked for, before anything is looked up.
#[derive(Debug, Clone, Default)]
pub struct ToolchainRequest {
    pub compiler: Option<CompilerKind>,
    pub language: Language,
    pub mode: BuildMode,
    pub standard: Option<String>,
    pub include_paths: Vec<PathBuf>,
}

/// Resolve a request into an immutable [`BuildTarget`] for this host.
pub fn resolve(
    request: &ToolchainRequest,
    runner: &dyn ProcessRunner,
) -> Result<BuildTarget, BuildError> {
    let os = std::env::consts::OS;
    let compiler = request
        .compiler
        .unwrap_or_else(|| CompilerKind::host_default(os));

    preflight(compiler, os, std::env::var_os("VSINSTALLDIR").as_deref())?;

    let program = compiler.executable(request.language);
    let executable = locate(program, std::env::var_os("PATH").as_deref()).ok_or_else(|| {
        BuildError::ToolchainNotFound {
            compiler: program.to_string(),
            hint: not_found_hint(compiler),
        }
    })?;
    debug!(compiler = %compiler, path = %executable.display(), "located compiler");

    let triple = query_triple(compiler, &executable, runner)?;
    let standard = request
        .standard
        .clone()
        .unwrap_or_else(|| compiler.default_standard(request.language).to_string());

    Ok(BuildTarget {
        compiler,
        language: request.language,
        executable,
        mode: request.mode,
        standard,
        triple,
        include_paths: request.include_paths.clone(),
    })
}

/// Check that the environment can host `compiler` before touching it.
pub fn preflight(
    compiler: CompilerKind,
    os: &str,
    vs_install_dir: Option<&OsStr>,
) -> Result<(), BuildError> {
    if compiler != CompilerKind::MSVC {
        return Ok(());
    }
    if os != "windows" {
        return Err(BuildError::ToolchainNotFound {
            compiler: "cl.exe".to_string(),
            hint: "cl.exe is only available on Windows. Use --compiler clang or --compiler gcc."
                .to_string(),
        });
    }
    if vs_install_dir.is_none() {
        return Err(BuildError::ToolchainNotFound {
            compiler: "cl.exe".to_string(),
            hint: not_found_hint(CompilerKind::MSVC),
        });
    }
    Ok(())
}

fn not_found_hint(compiler: CompilerKind) -> String {
    match compiler {
        CompilerKind::MSVC => "You are not in the Developer Command Prompt.\n\
             Run kiln from the 'Developer Command Prompt for VS' (VsDevCmd.bat) \
             so cl.exe and link.exe are on PATH."
            .to_string(),
        CompilerKind::Clang => {
            "Install clang (LLVM) or select another compiler with --compiler.".to_string()
        }
        CompilerKind::GCC => {
            "Install gcc/g++ or select another compiler with --compiler.".to_string()
        }
    }
}

/// Find `program` on the search path. Programs given with a directory are
/// checked as-is.
pub fn locate(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    let with_exe = if cfg!(windows) && direct.extension().is_none() {
        Some(format!("{}.exe", program))
    } else {
        None
    };

    std::env::split_paths(path_var?).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        with_exe
            .as_ref()
            .map(|name| dir.join(name))
            .filter(|p| p.is_file())
    })
}

/// Ask the compiler which triple it generates code for.
pub fn query_triple(
    compiler: CompilerKind,
    executable: &Path,
    runner: &dyn ProcessRunner,
) -> Result<String, BuildError> {
    if compiler == CompilerKind::MSVC {
        return Ok(MSVC_TRIPLE.to_string());
    }

    let name = executable.to_string_lossy().to_string();
    let argv = vec![name.clone(), "-dumpmachine".to_string()];
    let output = runner.capture(&argv).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BuildError::ToolchainNotFound {
                compiler: name.clone(),
                hint: not_found_hint(compiler),
            }
        } else {
            BuildError::ToolchainQuery {
                compiler: name.clone(),
                stderr: e.to_string(),
            }
        }
    })?;

    if !output.success() {
        return Err(BuildError::ToolchainQuery {
            compiler: name,
            stderr: output.stderr,
        });
    }

    Ok(output.stdout.trim().to_string())
}
