//! Parallel compilation.
//!
//! One compile invocation per unit on a bounded rayon pool. Each worker owns
//! exactly one slot of the session, so no two workers ever touch the same
//! unit. A failing compile does not cancel its siblings: everything
//! dispatched runs to completion and only the aggregate gates the link.

use crate::command::CommandBuilder;
use crate::error::{BuildError, CompileFailure, FailureKind};
use crate::process::{ProcessOutput, ProcessRunner};
use crate::progress::{CompileProgress, ProgressReporter};
use crate::session::{BuildSession, CompileUnit, UnitState};
use colored::*;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CompileOutcome {
    pub source: PathBuf,
    pub object: PathBuf,
    pub command: Vec<String>,
    pub output: ProcessOutput,
    pub failure: Option<FailureKind>,
}

impl CompileOutcome {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct CompileReport {
    pub outcomes: Vec<CompileOutcome>,
    pub elapsed: Duration,
}

impl CompileReport {
    pub fn failures(&self) -> Vec<CompileFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| {
                o.failure.map(|kind| CompileFailure {
                    source: o.source.clone(),
                    kind,
                    command: o.command.clone(),
                    status: o.output.status,
                    output: o.output.combined(),
                })
            })
            .collect()
    }

    /// `Err(CompileFailure)` listing every failed file, otherwise the report.
    pub fn into_result(self) -> Result<Self, BuildError> {
        let failures = self.failures();
        if failures.is_empty() {
            Ok(self)
        } else {
            Err(BuildError::CompileFailure(failures))
        }
    }
}

/// `min(files + 1, 2 × cores)`, never zero.
pub fn worker_count(files: usize, parallelism: usize) -> usize {
    (files + 1).min(parallelism * 2).max(1)
}

pub struct BuildCoordinator<'a> {
    builder: &'a CommandBuilder,
    runner: &'a dyn ProcessRunner,
    project_root: PathBuf,
    show_progress: bool,
}

impl<'a> BuildCoordinator<'a> {
    pub fn new(
        builder: &'a CommandBuilder,
        runner: &'a dyn ProcessRunner,
        project_root: &Path,
        show_progress: bool,
    ) -> Self {
        Self {
            builder,
            runner,
            project_root: project_root.to_path_buf(),
            show_progress,
        }
    }

    /// Compile every unit of `session`. Outcomes are stored on the session
    /// and returned; failures are data here, not errors.
    pub fn run(&self, session: &mut BuildSession) -> Result<CompileReport, BuildError> {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let workers = worker_count(session.units.len(), parallelism);
        info!("spawning {} workers", workers);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("kiln-cc-{}", i))
            .build()?;

        let progress = Arc::new(CompileProgress::new());
        let reporter = ProgressReporter::start(
            Arc::clone(&progress),
            session.units.len(),
            self.show_progress,
        );

        let start = Instant::now();
        let outcomes: Vec<CompileOutcome> = pool.install(|| {
            session
                .units
                .par_iter_mut()
                .map(|unit| self.compile_unit(unit, &progress))
                .collect()
        });
        let elapsed = start.elapsed();
        reporter.finish();

        for outcome in outcomes.iter().filter(|o| o.success()) {
            let diagnostics = outcome.output.combined();
            if !diagnostics.trim().is_empty() {
                println!(
                    "{} Warning in {}:\n{}",
                    "!".yellow(),
                    self.relative(&outcome.source),
                    diagnostics
                );
            }
        }

        session.outcomes = outcomes.clone();
        Ok(CompileReport { outcomes, elapsed })
    }

    fn compile_unit(&self, unit: &mut CompileUnit, progress: &CompileProgress) -> CompileOutcome {
        let command = self
            .builder
            .compile_command(&unit.source.path, &unit.object);
        let name = unit.source.display_relative(&self.project_root);
        debug!("building {} -> {}", name, self.relative(&unit.object));

        let (output, failure) = match self.invoke(&unit.object, &command) {
            Ok(out) if out.success() => (out, None),
            Ok(out) => (out, Some(FailureKind::CompileError)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (
                ProcessOutput {
                    status: None,
                    stdout: String::new(),
                    stderr: format!("unable to find '{}' in PATH", command[0]),
                },
                Some(FailureKind::ToolchainMissing),
            ),
            Err(e) => (
                ProcessOutput {
                    status: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                },
                Some(FailureKind::CompileError),
            ),
        };

        if failure.is_none() {
            unit.state = UnitState::Compiled(unit.object.clone());
            progress.record_completed(name);
        } else {
            unit.state = UnitState::Unbuilt;
            progress.halt();
        }

        CompileOutcome {
            source: unit.source.path.clone(),
            object: unit.object.clone(),
            command,
            output,
            failure,
        }
    }

    fn invoke(&self, object: &Path, command: &[String]) -> io::Result<ProcessOutput> {
        if let Some(dir) = object.parent()
            && let Err(e) = fs::create_dir_all(dir)
        {
            // Not the compiler's fault; keep NotFound from reading as a missing toolchain.
            return Err(io::Error::other(format!(
                "cannot create {}: {}",
                dir.display(),
                e
            )));
        }
        self.runner.capture(command)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}
