//! `kiln doctor`: report what a build would run with.

use colored::*;
use std::path::Path;

use crate::config::{CONFIG_FILE, KilnConfig};
use crate::process::ProcessRunner;
use crate::toolchain::{self, ToolchainRequest};
use crate::tracker::VcsStatus;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct Check {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

impl Check {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

/// Collect the checks without printing anything.
pub fn diagnose(
    project_root: &Path,
    config: &KilnConfig,
    request: &ToolchainRequest,
    runner: &dyn ProcessRunner,
    vcs: &dyn VcsStatus,
) -> Vec<Check> {
    let mut checks = vec![Check::new(
        "os",
        CheckStatus::Ok,
        format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH),
    )];

    checks.push(if project_root.join(CONFIG_FILE).is_file() {
        Check::new("config", CheckStatus::Ok, CONFIG_FILE)
    } else {
        Check::new("config", CheckStatus::Warn, "not found, using defaults")
    });

    let entry = config.project.entry();
    checks.push(if project_root.join(&entry).is_file() {
        Check::new("entry", CheckStatus::Ok, entry.display().to_string())
    } else {
        Check::new(
            "entry",
            CheckStatus::Fail,
            format!("{} does not exist", entry.display()),
        )
    });

    match toolchain::resolve(request, runner) {
        Ok(target) => {
            checks.push(Check::new(
                "compiler",
                CheckStatus::Ok,
                format!("{} ({})", target.compiler, target.executable.display()),
            ));
            checks.push(Check::new("target", CheckStatus::Ok, target.triple));
            checks.push(Check::new("standard", CheckStatus::Ok, target.standard));
        }
        Err(e) => {
            let detail = match e.hint() {
                Some(hint) => format!("{} ({})", e, hint),
                None => e.to_string(),
            };
            checks.push(Check::new("compiler", CheckStatus::Fail, detail));
        }
    }

    checks.push(match vcs.candidates() {
        Ok(candidates) => Check::new(
            "tracking",
            CheckStatus::Ok,
            format!("git ({})", candidates.workdir.display()),
        ),
        Err(e) => Check::new(
            "tracking",
            CheckStatus::Warn,
            format!("unavailable, every run rebuilds: {}", e.0),
        ),
    });

    checks
}

/// Print the checks as a table. Returns `false` if any check failed.
pub fn run_doctor(
    project_root: &Path,
    config: &KilnConfig,
    request: &ToolchainRequest,
    runner: &dyn ProcessRunner,
    vcs: &dyn VcsStatus,
) -> bool {
    println!("{} Running System Doctor...", "🚑".red());

    let checks = diagnose(project_root, config, request, runner, vcs);
    let mut table = ui::Table::new(&["check", "status", "detail"]);
    for check in &checks {
        let status = match check.status {
            CheckStatus::Ok => "ok".green().to_string(),
            CheckStatus::Warn => "warn".yellow().to_string(),
            CheckStatus::Fail => "fail".red().to_string(),
        };
        table.add_row(vec![check.name.to_string(), status, check.detail.clone()]);
    }
    table.print();

    checks.iter().all(|c| c.status != CheckStatus::Fail)
}
