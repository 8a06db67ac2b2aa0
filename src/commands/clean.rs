//! Build artifact cleanup.
//!
//! - `kiln clean` removes the output tree of the selected mode
//! - `kiln clean --all` removes the whole build root, both modes and
//!   `compile_commands.json` included

use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::toolchain::BuildMode;

/// Returns the directories that were removed.
pub fn clean(project_root: &Path, build_dir: &Path, mode: BuildMode, all: bool) -> Result<Vec<PathBuf>> {
    let build_root = project_root.join(build_dir);
    let target = if all {
        build_root
    } else {
        build_root.join(mode.as_str())
    };

    let mut removed = Vec::new();
    if target.exists() {
        fs::remove_dir_all(&target)
            .with_context(|| format!("Failed to remove {}", target.display()))?;
        println!("{} Removed {}", "🗑️".red(), target.display());
        removed.push(target);
    }

    if removed.is_empty() {
        println!("{} Nothing to clean", "!".yellow());
    } else {
        println!("{} Clean complete.", "✓".green());
    }
    Ok(removed)
}
