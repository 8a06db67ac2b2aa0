//! Per-invocation build state.
//!
//! A [`BuildSession`] owns the compile units (one slot per discovered source),
//! the change delta and the compile outcomes. Components receive it
//! explicitly; nothing lives in process-wide globals.

use crate::coordinator::CompileOutcome;
use crate::discovery::SourceFile;
use crate::error::BuildError;
use crate::layout::BuildLayout;
use crate::tracker::Delta;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    /// Slot now identifies the object file instead of the source.
    Compiled(PathBuf),
    /// Compile failed; the slot stays so positions keep matching.
    Unbuilt,
}

#[derive(Debug, Clone)]
pub struct CompileUnit {
    pub source: SourceFile,
    pub object: PathBuf,
    pub state: UnitState,
}

#[derive(Debug)]
pub struct BuildSession {
    pub layout: BuildLayout,
    pub units: Vec<CompileUnit>,
    pub delta: Option<Delta>,
    pub outcomes: Vec<CompileOutcome>,
}

impl BuildSession {
    pub fn new(layout: BuildLayout, files: Vec<SourceFile>) -> Self {
        let units = files
            .into_iter()
            .map(|source| CompileUnit {
                object: layout.object_for(&source.path),
                source,
                state: UnitState::Pending,
            })
            .collect();

        Self {
            layout,
            units,
            delta: None,
            outcomes: Vec::new(),
        }
    }

    pub fn compiled_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.state, UnitState::Compiled(_)))
            .count()
    }

    /// Every object in slot order. Fails on the first slot that was not
    /// compiled or whose object is gone, so a link never runs on a partial set.
    pub fn artifacts(&self) -> Result<Vec<PathBuf>, BuildError> {
        self.units
            .iter()
            .map(|unit| match &unit.state {
                UnitState::Compiled(object) if object.is_file() => Ok(object.clone()),
                UnitState::Compiled(object) => Err(BuildError::LinkInputMissing(object.clone())),
                _ => Err(BuildError::LinkInputMissing(unit.object.clone())),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::SourceDiscovery;
    use crate::toolchain::{BuildMode, CompilerKind};
    use std::fs;
    use std::path::Path;

    fn session(root: &Path) -> BuildSession {
        for name in ["main.cc", "a.cc"] {
            fs::create_dir_all(root.join("src")).unwrap();
            fs::write(root.join("src").join(name), b"").unwrap();
        }
        let files = SourceDiscovery {
            project_root: root.to_path_buf(),
            roots: vec![PathBuf::from("src")],
            entry: PathBuf::from("src/main.cc"),
            include_headers: false,
        }
        .discover()
        .unwrap()
        .files;
        let layout = BuildLayout::new(
            root,
            Path::new("build"),
            BuildMode::Debug,
            CompilerKind::GCC,
            "main",
        );
        BuildSession::new(layout, files)
    }

    #[test]
    fn test_units_start_pending_with_objects() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        assert_eq!(s.units.len(), 2);
        assert!(s.units.iter().all(|u| u.state == UnitState::Pending));
        assert!(s.units[0].object.ends_with("generated/src/main.cc.o"));
    }

    #[test]
    fn test_artifacts_require_every_slot() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());

        for unit in &mut s.units {
            fs::create_dir_all(unit.object.parent().unwrap()).unwrap();
            fs::write(&unit.object, b"obj").unwrap();
            unit.state = UnitState::Compiled(unit.object.clone());
        }
        assert_eq!(s.artifacts().unwrap().len(), 2);
        assert_eq!(s.compiled_count(), 2);

        s.units[1].state = UnitState::Unbuilt;
        assert!(matches!(
            s.artifacts(),
            Err(BuildError::LinkInputMissing(_))
        ));
    }

    #[test]
    fn test_vanished_object_blocks_link() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        for unit in &mut s.units {
            unit.state = UnitState::Compiled(unit.object.clone());
        }
        assert!(s.artifacts().is_err());
    }
}
