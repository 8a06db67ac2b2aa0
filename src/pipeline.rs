//! Discover → detect changes → compile → link → run.
//!
//! When the change tracker reports nothing new and a binary from an earlier
//! run exists, the compile and link phases are skipped entirely and report
//! zero elapsed time. While a build runs the snapshot is kept off disk and
//! only written back once the link succeeds.

use crate::command::CommandBuilder;
use crate::config::KilnConfig;
use crate::coordinator::{BuildCoordinator, CompileOutcome};
use crate::discovery::{DiscoveryWarning, SourceDiscovery};
use crate::error::BuildError;
use crate::layout::BuildLayout;
use crate::linker::Linker;
use crate::process::ProcessRunner;
use crate::runner::{RunReport, Runner};
use crate::session::BuildSession;
use crate::toolchain::BuildTarget;
use crate::tracker::{Change, ChangeTracker, Delta, VcsStatus};
use crate::ui::Panel;
use colored::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug)]
pub struct PipelineReport {
    /// Compile and link were skipped because nothing changed.
    pub skipped: bool,
    pub delta: Delta,
    pub warnings: Vec<DiscoveryWarning>,
    pub artifacts: Vec<PathBuf>,
    pub binary: PathBuf,
    pub build_time: Duration,
    pub link_time: Duration,
    /// `None` when running was not requested or the binary was missing.
    pub run: Option<RunReport>,
    pub total: Duration,
}

pub struct Pipeline<'a> {
    project_root: PathBuf,
    config: &'a KilnConfig,
    target: BuildTarget,
    runner: &'a dyn ProcessRunner,
    vcs: &'a dyn VcsStatus,
    show_progress: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        project_root: &Path,
        config: &'a KilnConfig,
        target: BuildTarget,
        runner: &'a dyn ProcessRunner,
        vcs: &'a dyn VcsStatus,
    ) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config,
            target,
            runner,
            vcs,
            show_progress: true,
        }
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn layout(&self) -> BuildLayout {
        BuildLayout::new(
            &self.project_root,
            &self.config.build.build_dir,
            self.target.mode,
            self.target.compiler,
            &self.config.project.name,
        )
    }

    pub fn discovery(&self) -> SourceDiscovery {
        SourceDiscovery {
            project_root: self.project_root.clone(),
            roots: self.config.build.sources.clone(),
            entry: self.config.project.entry(),
            include_headers: self.config.build.include_headers,
        }
    }

    /// Build if anything changed, then run the binary when `run_args` is set.
    pub fn execute(&self, run_args: Option<&[String]>) -> Result<PipelineReport, BuildError> {
        let start = Instant::now();
        let layout = self.layout();

        let discovered = self.discovery().discover()?;
        layout
            .create_dirs()
            .map_err(|e| BuildError::io(layout.mode_dir(), e))?;

        let tracker =
            ChangeTracker::new(layout.state_file()).with_fingerprint(self.target.fingerprint());
        let delta = tracker.compute_delta(self.vcs)?;
        let binary = layout.binary();

        let mut report = PipelineReport {
            skipped: false,
            delta: delta.clone(),
            warnings: discovered.warnings,
            artifacts: Vec::new(),
            binary: binary.clone(),
            build_time: Duration::ZERO,
            link_time: Duration::ZERO,
            run: None,
            total: Duration::ZERO,
        };

        if !delta.requires_rebuild() && binary.is_file() {
            debug!("no files have changed, skipping build");
            println!("{} Up to date", "⚡".green());
            report.skipped = true;
        } else {
            let held = match delta {
                Delta::Unavailable => None,
                _ => Some(tracker.suspend()?),
            };
            let mut session = BuildSession::new(layout.clone(), discovered.files);
            session.delta = Some(delta);

            self.build(&mut session, &mut report)?;
            if let Some(state) = held {
                tracker.save_state(&state)?;
            }
        }

        Panel::new(vec![
            format!("built all files in {:.3}s", report.build_time.as_secs_f64()),
            format!("linked all files in {:.3}s", report.link_time.as_secs_f64()),
        ])
        .title("build time")
        .print();

        if let Some(args) = run_args {
            match Runner::new(self.runner).run(&binary, args) {
                Ok(run) => report.run = Some(run),
                Err(BuildError::ArtifactMissing(path)) => {
                    println!("{} Failed to find {}", "x".red(), path.display());
                }
                Err(e) => return Err(e),
            }
        }

        report.total = start.elapsed();
        if let Some(run) = &report.run {
            let mut lines = vec![format!(
                "runtime for {} is {:.3}s",
                self.config.project.name,
                run.elapsed.as_secs_f64()
            )];
            if let Some(code) = run.exit_code.filter(|c| *c != 0) {
                lines.push(format!("exited with code {}", code));
            }
            lines.push(format!("total time is {:.3}s", report.total.as_secs_f64()));
            Panel::new(lines).border(Color::Red).print();
        }

        Ok(report)
    }

    fn build(
        &self,
        session: &mut BuildSession,
        report: &mut PipelineReport,
    ) -> Result<(), BuildError> {
        let builder = CommandBuilder::new(self.target.clone());
        info!(
            files = session.units.len(),
            mode = self.target.mode.as_str(),
            "compiling"
        );
        if let Some(changes) = session.delta.as_ref().and_then(Delta::changes) {
            for path in changes.paths_with(Change::Modified) {
                debug!(path, "modified");
            }
            for path in changes.paths_with(Change::Removed) {
                debug!(path, "removed");
            }
        }

        let compiled = BuildCoordinator::new(
            &builder,
            self.runner,
            &self.project_root,
            self.show_progress,
        )
        .run(session)?
        .into_result()?;
        report.build_time = compiled.elapsed;

        if self.config.build.compile_commands {
            self.write_compile_commands(&session.layout, &compiled.outcomes)?;
        }

        report.link_time = Linker::new(&builder, self.runner).link(session)?;
        report.artifacts = session.artifacts()?;
        println!(
            "{} Build finished in {:.2?}",
            "✓".green(),
            report.build_time + report.link_time
        );
        Ok(())
    }

    fn write_compile_commands(
        &self,
        layout: &BuildLayout,
        outcomes: &[CompileOutcome],
    ) -> Result<(), BuildError> {
        let directory = self.project_root.to_string_lossy().to_string();
        let entries: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|o| {
                json!({
                    "directory": directory,
                    "arguments": o.command,
                    "file": o.source.to_string_lossy(),
                    "output": o.object.to_string_lossy(),
                })
            })
            .collect();

        let path = layout.compile_commands();
        let json = serde_json::to_string_pretty(&entries).map_err(|e| BuildError::State {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, json).map_err(|e| BuildError::io(&path, e))
    }
}
