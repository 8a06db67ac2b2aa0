//! Source discovery.
//!
//! Walks the configured source roots depth-first and keeps every regular file
//! with a recognised extension. The entry file is always first.

use crate::error::BuildError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Translation units handed to the compiler.
pub const SOURCE_EXTENSIONS: &[&str] = &["cc", "cpp", "cxx", "c", "i"];

/// Only collected when `include_headers` is set.
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (project-root-joined) path
    pub path: PathBuf,
}

impl SourceFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path relative to `root`, for display.
    pub fn display_relative(&self, root: &Path) -> String {
        self.path
            .strip_prefix(root)
            .unwrap_or(&self.path)
            .display()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryWarning {
    /// Exactly one file: nothing to parallelise.
    InsufficientSources,
    MissingRoot(PathBuf),
}

#[derive(Debug, Default)]
pub struct Discovered {
    pub files: Vec<SourceFile>,
    pub warnings: Vec<DiscoveryWarning>,
}

#[derive(Debug, Clone)]
pub struct SourceDiscovery {
    pub project_root: PathBuf,
    pub roots: Vec<PathBuf>,
    pub entry: PathBuf,
    pub include_headers: bool,
}

impl SourceDiscovery {
    pub fn is_recognised(&self, path: &Path) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        let ext = ext.to_string_lossy();
        SOURCE_EXTENSIONS.contains(&ext.as_ref())
            || (self.include_headers && HEADER_EXTENSIONS.contains(&ext.as_ref()))
    }

    pub fn entry_path(&self) -> PathBuf {
        self.project_root.join(&self.entry)
    }

    pub fn discover(&self) -> Result<Discovered, BuildError> {
        let entry = self.entry_path();
        if !entry.is_file() {
            return Err(BuildError::EntryFileMissing(entry));
        }

        let mut found = Discovered::default();
        let mut seen = HashSet::new();
        seen.insert(entry.clone());
        found.files.push(SourceFile::new(entry));

        for root in &self.roots {
            let root = self.project_root.join(root);
            if !root.is_dir() {
                warn!(root = %root.display(), "source directory does not exist, skipping");
                found.warnings.push(DiscoveryWarning::MissingRoot(root));
                continue;
            }

            for entry in WalkDir::new(&root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() || !self.is_recognised(entry.path()) {
                    continue;
                }
                let path = entry.into_path();
                if seen.insert(path.clone()) {
                    found.files.push(SourceFile::new(path));
                }
            }
        }

        if found.files.is_empty() {
            return Err(BuildError::SourceDiscoveryEmpty);
        }

        if found.files.len() == 1 {
            warn!("only found one file to compile");
            warn!("this is not recommended, add more files to the source directories");
            found.warnings.push(DiscoveryWarning::InsufficientSources);
        }

        debug!(count = found.files.len(), "discovered source files");
        Ok(found)
    }
}
