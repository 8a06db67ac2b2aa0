//! External process execution.
//!
//! Every compiler, linker and program invocation goes through [`ProcessRunner`]
//! so the pipeline can be driven by a stub in tests.

use std::io;
use std::process::{Command, Stdio};

/// Captured result of one external invocation.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// stdout and stderr joined for display. MSVC writes its errors to stdout.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

pub trait ProcessRunner: Send + Sync {
    /// Run `argv` to completion, capturing both streams.
    fn capture(&self, argv: &[String]) -> io::Result<ProcessOutput>;

    /// Run `argv` with inherited stdio and return its exit code.
    fn interactive(&self, argv: &[String]) -> io::Result<Option<i32>>;
}

/// Spawns real processes with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn capture(&self, argv: &[String]) -> io::Result<ProcessOutput> {
        let (program, args) = split(argv)?;
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn interactive(&self, argv: &[String]) -> io::Result<Option<i32>> {
        let (program, args) = split(argv)?;
        let status = Command::new(program).args(args).status()?;
        Ok(status.code())
    }
}

fn split(argv: &[String]) -> io::Result<(&String, &[String])> {
    argv.split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))
}

/// Render an argument vector the way a user would type it.
pub fn display_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if arg.contains(' ') {
                format!("\"{}\"", arg)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_argv_is_rejected() {
        let err = SystemRunner.capture(&[]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let argv = vec!["kiln-definitely-not-a-real-compiler".to_string()];
        let err = SystemRunner.capture(&argv).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_combined_output() {
        let out = ProcessOutput {
            status: Some(2),
            stdout: "main.cc\n".into(),
            stderr: "error C2065\n".into(),
        };
        assert!(!out.success());
        assert_eq!(out.combined(), "main.cc\nerror C2065\n");
    }

    #[test]
    fn test_display_command_quotes_spaces() {
        let argv = vec!["cl.exe".to_string(), "/Fo:C:/My Build/a.obj".to_string()];
        assert_eq!(display_command(&argv), "cl.exe \"/Fo:C:/My Build/a.obj\"");
    }
}
