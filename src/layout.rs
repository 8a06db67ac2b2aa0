//! On-disk layout of build outputs.
//!
//! ```text
//! <build-root>/compile_commands.json
//! <build-root>/<mode>/state.lock               persisted file hashes
//! <build-root>/<mode>/generated/<rel>.<obj>    one object per source
//! <build-root>/<mode>/bin/<name>[.exe]         linked executable
//! ```

use crate::toolchain::{BuildMode, CompilerKind};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const STATE_FILE: &str = "state.lock";

#[derive(Debug, Clone)]
pub struct BuildLayout {
    pub project_root: PathBuf,
    pub build_root: PathBuf,
    pub mode: BuildMode,
    binary_name: String,
    object_ext: &'static str,
}

impl BuildLayout {
    pub fn new(
        project_root: &Path,
        build_dir: &Path,
        mode: BuildMode,
        compiler: CompilerKind,
        name: &str,
    ) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            build_root: project_root.join(build_dir),
            mode,
            binary_name: format!("{}{}", name, compiler.executable_suffix()),
            object_ext: compiler.object_extension(),
        }
    }

    pub fn mode_dir(&self) -> PathBuf {
        self.build_root.join(self.mode.as_str())
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.mode_dir().join("generated")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.mode_dir().join("bin")
    }

    pub fn binary(&self) -> PathBuf {
        self.bin_dir().join(&self.binary_name)
    }

    /// Per mode, so a debug run never marks a stale release binary current.
    pub fn state_file(&self) -> PathBuf {
        self.mode_dir().join(STATE_FILE)
    }

    pub fn compile_commands(&self) -> PathBuf {
        self.build_root.join("compile_commands.json")
    }

    /// Object path for `source`, keyed by its path relative to the project
    /// root so same-named files in different directories never collide.
    pub fn object_for(&self, source: &Path) -> PathBuf {
        let relative = source
            .strip_prefix(&self.project_root)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| source.file_name().map(PathBuf::from).unwrap_or_default());

        let mut file_name = relative
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        file_name.push(".");
        file_name.push(self.object_ext);

        self.generated_dir().join(relative.with_file_name(file_name))
    }

    pub fn create_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(self.generated_dir())?;
        fs::create_dir_all(self.bin_dir())?;
        Ok(())
    }
}
