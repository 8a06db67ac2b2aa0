//! Content-hash change tracking.
//!
//! The candidate set is whatever git reports as staged, unstaged or
//! untracked; ignored files and the build directory never participate. Each
//! candidate is hashed with SHA-256 and compared with the snapshot persisted
//! by the previous run. Any difference means "rebuild everything".
//!
//! The snapshot file is plain JSON, stamped with the fingerprint of the
//! target it was built for:
//!
//! ```json
//! {
//!     "target": "5d41402abc4b2a76b9719d911017c592ae5a1c0d3b8e6e4c8b3f7d7a9b6e0c21",
//!     "files": {
//!         "src/main.cc": "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
//!     }
//! }
//! ```
//!
//! A snapshot for another target counts as no snapshot at all.

use crate::error::BuildError;
use git2::{Repository, Status, StatusOptions};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Repository-relative path → lowercase hex SHA-256.
pub type FileState = BTreeMap<String, String>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    target: String,
    files: FileState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    /// Hash differs, or the path is new.
    Modified,
    /// Present in the previous snapshot, gone now.
    Removed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub changes: BTreeMap<String, Change>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn get(&self, path: &str) -> Option<Change> {
        self.changes.get(path).copied()
    }

    pub fn paths_with(&self, kind: Change) -> impl Iterator<Item = &str> {
        self.changes
            .iter()
            .filter(move |(_, c)| **c == kind)
            .map(|(p, _)| p.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    Tracked(ChangeSet),
    /// No usable snapshot: first run, a failed or interrupted build, or a
    /// snapshot taken for another target. Always rebuilds, even when empty.
    Initial(ChangeSet),
    /// No repository found; every run counts as changed.
    Unavailable,
}

impl Delta {
    pub fn requires_rebuild(&self) -> bool {
        match self {
            Delta::Tracked(changes) => !changes.is_empty(),
            Delta::Initial(_) | Delta::Unavailable => true,
        }
    }

    pub fn changes(&self) -> Option<&ChangeSet> {
        match self {
            Delta::Tracked(changes) | Delta::Initial(changes) => Some(changes),
            Delta::Unavailable => None,
        }
    }
}

/// Files a version-control system considers worth hashing.
#[derive(Debug, Clone)]
pub struct Candidates {
    pub workdir: PathBuf,
    /// Relative to `workdir`, `/`-separated
    pub paths: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct VcsUnavailable(pub String);

pub trait VcsStatus {
    fn candidates(&self) -> Result<Candidates, VcsUnavailable>;
}

/// Working-tree status through libgit2.
#[derive(Debug, Clone)]
pub struct GitStatus {
    pub start: PathBuf,
    /// Absolute directories whose contents are never candidates.
    pub exclude: Vec<PathBuf>,
}

impl GitStatus {
    pub fn new(start: &Path, exclude: Vec<PathBuf>) -> Self {
        Self {
            start: start.to_path_buf(),
            exclude,
        }
    }
}

const CHANGED: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE)
    .union(Status::WT_NEW)
    .union(Status::WT_MODIFIED)
    .union(Status::WT_DELETED)
    .union(Status::WT_RENAMED)
    .union(Status::WT_TYPECHANGE);

impl VcsStatus for GitStatus {
    fn candidates(&self) -> Result<Candidates, VcsUnavailable> {
        let unavailable = |e: git2::Error| VcsUnavailable(e.message().to_string());

        let repo = Repository::discover(&self.start).map_err(unavailable)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| VcsUnavailable("bare repository has no working tree".to_string()))?;
        let workdir = canonical(workdir);

        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = repo.statuses(Some(&mut opts)).map_err(unavailable)?;

        let excluded: Vec<PathBuf> = self.exclude.iter().map(|p| canonical(p)).collect();
        let paths = statuses
            .iter()
            .filter(|entry| entry.status().intersects(CHANGED))
            .filter_map(|entry| entry.path().map(str::to_string))
            .filter(|path| {
                let absolute = workdir.join(path);
                !excluded.iter().any(|ex| absolute.starts_with(ex))
            })
            .collect();

        Ok(Candidates { workdir, paths })
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Streamed SHA-256 of a file, as lowercase hex.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Classify every path that differs between two snapshots.
pub fn diff_states(previous: &FileState, current: &FileState) -> ChangeSet {
    let mut changes = BTreeMap::new();

    for (path, hash) in current {
        if previous.get(path) != Some(hash) {
            changes.insert(path.clone(), Change::Modified);
        }
    }
    for path in previous.keys() {
        if !current.contains_key(path) {
            changes.insert(path.clone(), Change::Removed);
        }
    }

    ChangeSet { changes }
}

#[derive(Debug, Clone)]
pub struct ChangeTracker {
    state_path: PathBuf,
    fingerprint: String,
}

impl ChangeTracker {
    pub fn new(state_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
            fingerprint: String::new(),
        }
    }

    /// Only snapshots stamped with `fingerprint` are trusted.
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Previous snapshot; empty when absent, unreadable or for another target.
    pub fn load_state(&self) -> FileState {
        self.baseline().unwrap_or_default()
    }

    fn baseline(&self) -> Option<FileState> {
        let content = fs::read_to_string(&self.state_path).ok()?;
        let snapshot: Snapshot = match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %self.state_path.display(), error = %e, "corrupt build state, starting fresh");
                return None;
            }
        };
        if snapshot.target != self.fingerprint {
            info!("build target changed since the last build");
            return None;
        }
        Some(snapshot.files)
    }

    /// Overwrite the snapshot with `state`.
    pub fn save_state(&self, state: &FileState) -> Result<(), BuildError> {
        if let Some(parent) = self.state_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }
        let snapshot = Snapshot {
            target: self.fingerprint.clone(),
            files: state.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| BuildError::State {
            path: self.state_path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&self.state_path, json).map_err(|e| BuildError::io(&self.state_path, e))
    }

    /// Forget the snapshot so the next run rebuilds. Used after a failed build.
    pub fn invalidate(&self) -> Result<(), BuildError> {
        match fs::remove_file(&self.state_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BuildError::io(&self.state_path, e)),
        }
    }

    /// Take the snapshot off disk until [`ChangeTracker::save_state`] puts
    /// it back. A build that dies in between leaves nothing behind, so the
    /// next run rebuilds.
    pub fn suspend(&self) -> Result<FileState, BuildError> {
        let state = self.load_state();
        self.invalidate()?;
        Ok(state)
    }

    /// Hash the current candidates, diff against the last snapshot and
    /// persist the new one.
    pub fn compute_delta(&self, vcs: &dyn VcsStatus) -> Result<Delta, BuildError> {
        let candidates = match vcs.candidates() {
            Ok(candidates) => candidates,
            Err(VcsUnavailable(reason)) => {
                warn!(%reason, "this is not a git repo, cannot track changes");
                warn!("will still build, but every run is a full rebuild");
                return Ok(Delta::Unavailable);
            }
        };

        let current: FileState = candidates
            .paths
            .par_iter()
            .filter_map(|rel| {
                let absolute = candidates.workdir.join(rel);
                absolute.is_file().then(|| {
                    hash_file(&absolute)
                        .map(|hash| (rel.clone(), hash))
                        .map_err(|e| BuildError::io(&absolute, e))
                })
            })
            .collect::<Result<FileState, BuildError>>()?;

        let previous = self.baseline();
        let changes = diff_states(previous.as_ref().unwrap_or(&FileState::new()), &current);
        self.save_state(&current)?;

        info!("found {} changed files", changes.len());
        Ok(match previous {
            Some(_) => Delta::Tracked(changes),
            None => Delta::Initial(changes),
        })
    }
}
