use crate::command::CommandBuilder;
use crate::error::BuildError;
use crate::process::ProcessRunner;
use crate::session::BuildSession;
use crate::ui;
use colored::*;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

/// Links every compiled object of a session into the final executable.
pub struct Linker<'a> {
    builder: &'a CommandBuilder,
    runner: &'a dyn ProcessRunner,
    show_inputs: bool,
}

impl<'a> Linker<'a> {
    pub fn new(builder: &'a CommandBuilder, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            builder,
            runner,
            show_inputs: true,
        }
    }

    /// Print the "linking -> files" table before linking.
    pub fn show_inputs(mut self, show: bool) -> Self {
        self.show_inputs = show;
        self
    }

    /// One link invocation with all artifacts appended in slot order.
    /// A missing object aborts before the linker is started.
    pub fn link(&self, session: &BuildSession) -> Result<Duration, BuildError> {
        let artifacts = session.artifacts()?;
        let output = session.layout.binary();
        if let Some(bin_dir) = output.parent() {
            std::fs::create_dir_all(bin_dir).map_err(|e| BuildError::io(bin_dir, e))?;
        }

        if self.show_inputs {
            let root = &session.layout.project_root;
            let mut table = ui::Table::new(&["linking -> files"]);
            for artifact in &artifacts {
                table.add_row(vec![relative(artifact, root)]);
            }
            table.print();
        }

        let start = Instant::now();
        let command = self.builder.link_command(&output, &artifacts);
        debug!(inputs = artifacts.len(), output = %output.display(), "linking");
        println!("   {} Linking...", "🔗".cyan());

        let result = self.runner.capture(&command);
        let elapsed = start.elapsed();

        match result {
            Ok(out) if out.success() => {
                let diagnostics = out.combined();
                if !diagnostics.trim().is_empty() {
                    println!("{} Linker warnings:\n{}", "!".yellow(), diagnostics);
                }
                Ok(elapsed)
            }
            Ok(out) => Err(BuildError::LinkFailure {
                output: out.combined(),
                status: out.status,
                command,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BuildError::ToolchainNotFound {
                    compiler: command[0].clone(),
                    hint: "The linker could not be started. Run `kiln doctor`.".to_string(),
                })
            }
            Err(e) => Err(BuildError::LinkFailure {
                output: e.to_string(),
                status: None,
                command,
            }),
        }
    }
}

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::SourceFile;
    use crate::layout::BuildLayout;
    use crate::process::ProcessOutput;
    use crate::session::UnitState;
    use crate::toolchain::{BuildMode, BuildTarget, CompilerKind, Language};
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct RecordingLinker {
        status: i32,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ProcessRunner for RecordingLinker {
        fn capture(&self, argv: &[String]) -> io::Result<ProcessOutput> {
            self.calls.lock().unwrap().push(argv.to_vec());
            Ok(ProcessOutput {
                status: Some(self.status),
                stdout: String::new(),
                stderr: if self.status == 0 {
                    String::new()
                } else {
                    "undefined reference to `main'".to_string()
                },
            })
        }

        fn interactive(&self, _argv: &[String]) -> io::Result<Option<i32>> {
            Ok(Some(0))
        }
    }

    fn setup(root: &Path, compiled: bool) -> (CommandBuilder, BuildSession) {
        let builder = CommandBuilder::new(BuildTarget {
            compiler: CompilerKind::GCC,
            language: Language::Cxx,
            executable: PathBuf::from("g++"),
            mode: BuildMode::Release,
            standard: "c++2b".into(),
            triple: String::new(),
            include_paths: vec![],
        });
        let layout = BuildLayout::new(
            root,
            Path::new("build"),
            BuildMode::Release,
            CompilerKind::GCC,
            "main",
        );
        let files = ["main.cc", "b.cc", "a.cc"]
            .iter()
            .map(|n| SourceFile {
                path: root.join("src").join(n),
            })
            .collect();
        let mut session = BuildSession::new(layout, files);
        if compiled {
            for unit in &mut session.units {
                fs::create_dir_all(unit.object.parent().unwrap()).unwrap();
                fs::write(&unit.object, b"obj").unwrap();
                unit.state = UnitState::Compiled(unit.object.clone());
            }
        }
        (builder, session)
    }

    #[test]
    fn test_link_passes_artifacts_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (builder, session) = setup(dir.path(), true);
        let runner = RecordingLinker {
            status: 0,
            calls: Mutex::new(vec![]),
        };

        Linker::new(&builder, &runner)
            .show_inputs(false)
            .link(&session)
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let argv = &calls[0];
        assert_eq!(&argv[..4], &["g++", "-O3", "-flto", "-o"]);
        assert_eq!(PathBuf::from(&argv[4]), session.layout.binary());
        let inputs: Vec<PathBuf> = argv[5..].iter().map(PathBuf::from).collect();
        let expected: Vec<PathBuf> = session.units.iter().map(|u| u.object.clone()).collect();
        assert_eq!(inputs, expected);
    }

    #[test]
    fn test_missing_artifact_never_invokes_linker() {
        let dir = tempfile::tempdir().unwrap();
        let (builder, session) = setup(dir.path(), false);
        let runner = RecordingLinker {
            status: 0,
            calls: Mutex::new(vec![]),
        };

        let err = Linker::new(&builder, &runner)
            .show_inputs(false)
            .link(&session)
            .unwrap_err();
        assert!(matches!(err, BuildError::LinkInputMissing(_)));
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_nonzero_exit_is_link_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (builder, session) = setup(dir.path(), true);
        let runner = RecordingLinker {
            status: 1,
            calls: Mutex::new(vec![]),
        };

        match Linker::new(&builder, &runner).show_inputs(false).link(&session) {
            Err(BuildError::LinkFailure {
                status, output, command,
            }) => {
                assert_eq!(status, Some(1));
                assert!(output.contains("main"));
                assert_eq!(command[0], "g++");
            }
            other => panic!("expected link failure, got {:?}", other),
        }
    }
}
