use crate::error::BuildError;
use crate::process::ProcessRunner;
use colored::*;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub elapsed: Duration,
    /// `None` when the program was terminated by a signal
    pub exit_code: Option<i32>,
}

/// Runs the linked executable with inherited stdio.
pub struct Runner<'a> {
    runner: &'a dyn ProcessRunner,
}

impl<'a> Runner<'a> {
    pub fn new(runner: &'a dyn ProcessRunner) -> Self {
        Self { runner }
    }

    /// `ArtifactMissing` when `binary` does not exist; nothing is spawned then.
    pub fn run(&self, binary: &Path, args: &[String]) -> Result<RunReport, BuildError> {
        if !binary.is_file() {
            return Err(BuildError::ArtifactMissing(binary.to_path_buf()));
        }

        let mut argv = vec![binary.to_string_lossy().to_string()];
        argv.extend(args.iter().cloned());

        println!("{} Running...\n", "▶".green());
        let start = Instant::now();
        let exit_code = self
            .runner
            .interactive(&argv)
            .map_err(|e| BuildError::io(binary, e))?;

        Ok(RunReport {
            elapsed: start.elapsed(),
            exit_code,
        })
    }
}
