//! # kiln CLI entry point
//!
//! Parses arguments with clap, resolves the toolchain and hands off to the
//! build pipeline or one of the auxiliary commands. With no subcommand kiln
//! behaves like `kiln run`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

use kiln::commands;
use kiln::config::{self, KilnConfig};
use kiln::error::BuildError;
use kiln::feedback::FeedbackAnalyzer;
use kiln::logging::{self, LogLevel};
use kiln::pipeline::Pipeline;
use kiln::process::{SystemRunner, display_command};
use kiln::toolchain::{self, BuildMode, BuildTarget, Language, ToolchainRequest};
use kiln::tracker::GitStatus;
use kiln::ui;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
}

/// Box-drawing and the progress glyphs need a UTF-8 console.
#[cfg(windows)]
fn enable_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_utf8_console() {}

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Incremental C/C++ build-and-run driver", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Build with optimizations
    #[arg(short, long, global = true)]
    release: bool,

    /// Compiler to use (msvc, clang, gcc) [default: host platform's]
    #[arg(long, global = true)]
    compiler: Option<String>,

    /// Source language (c or c++)
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Project root
    #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
    dir: PathBuf,

    /// More diagnostic output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build if anything changed, then run the binary
    Run {
        /// Arguments passed to the program
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Build if anything changed
    Build,
    /// Remove build outputs
    Clean {
        /// Remove the whole build directory, not just the selected mode
        #[arg(long)]
        all: bool,
    },
    /// Check the toolchain and project setup
    Doctor,
}

fn main() {
    enable_utf8_console();

    let cli = Cli::parse();
    logging::init_logging(LogLevel::from_flags(cli.verbose, cli.quiet));

    match dispatch(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            report(&e);
            std::process::exit(1);
        }
    }
}

/// `Ok(false)` exits 1 without an error message of its own.
fn dispatch(cli: &Cli) -> Result<bool> {
    let root = cli.dir.as_path();
    let config = config::load_config(root)?;
    let mode = BuildMode::from_release(cli.release);

    match &cli.command {
        Some(Commands::Clean { all }) => {
            commands::clean::clean(root, &config.build.build_dir, mode, *all)?;
            Ok(true)
        }
        Some(Commands::Doctor) => {
            let request = request_for(cli, &config)?;
            let vcs = GitStatus::new(root, vec![root.join(&config.build.build_dir)]);
            Ok(commands::doctor::run_doctor(
                root,
                &config,
                &request,
                &SystemRunner,
                &vcs,
            ))
        }
        Some(Commands::Build) => build(cli, root, &config, None),
        Some(Commands::Run { args }) => build(cli, root, &config, Some(args.as_slice())),
        None => build(cli, root, &config, Some(&[] as &[String])),
    }
}

fn build(cli: &Cli, root: &Path, config: &KilnConfig, run_args: Option<&[String]>) -> Result<bool> {
    // Nothing else matters until the entry file exists.
    let entry = root.join(config.project.entry());
    if !entry.is_file() {
        return Err(BuildError::EntryFileMissing(entry).into());
    }

    let request = request_for(cli, config)?;
    let target = toolchain::resolve(&request, &SystemRunner)?;
    if !cli.quiet {
        banner(&target);
    }

    let build_root = root.join(&config.build.build_dir);
    let vcs = GitStatus::new(root, vec![build_root]);
    let pipeline = Pipeline::new(root, config, target, &SystemRunner, &vcs).show_progress(!cli.quiet);
    pipeline.execute(run_args)?;
    Ok(true)
}

fn request_for(cli: &Cli, config: &KilnConfig) -> Result<ToolchainRequest> {
    let compiler = match &cli.compiler {
        Some(name) => Some(
            toolchain::CompilerKind::parse(name)
                .with_context(|| format!("Unknown compiler '{}' (expected msvc, clang or gcc)", name))?,
        ),
        None => config.build.compiler_kind()?,
    };
    let language = match &cli.lang {
        Some(name) => Language::parse(name)
            .with_context(|| format!("Unknown language '{}' (expected c or c++)", name))?,
        None => config.project.language,
    };

    Ok(ToolchainRequest {
        compiler,
        language,
        mode: BuildMode::from_release(cli.release),
        standard: config.build.standard.clone(),
        include_paths: config
            .build
            .includes
            .iter()
            .map(|p| cli.dir.join(p))
            .collect(),
    })
}

fn banner(target: &BuildTarget) {
    ui::Panel::new(vec![
        format!("kiln v{}", env!("CARGO_PKG_VERSION")),
        format!("target: {}", target.triple),
        format!("compiler: {} ({})", target.compiler, target.mode.as_str()),
    ])
    .border(Color::Cyan)
    .print();
}

fn report(err: &anyhow::Error) {
    eprintln!("{} {:#}", "error:".red().bold(), err);

    let Some(build) = err.downcast_ref::<BuildError>() else {
        return;
    };

    match build {
        BuildError::CompileFailure(failures) => {
            for failure in failures {
                eprintln!(
                    "\n{} {}",
                    "x Compilation failed:".red(),
                    failure.source.display()
                );
                eprintln!("{}", display_command(&failure.command).dimmed());
                eprintln!("{}", failure.output.trim_end());
                if let Some(hint) = FeedbackAnalyzer::for_failure(failure.kind, &failure.output) {
                    print_hint(&hint);
                }
            }
        }
        BuildError::LinkFailure { command, output, .. } => {
            eprintln!("{}", display_command(command).dimmed());
            eprintln!("{}", output.trim_end());
            if let Some(hint) = FeedbackAnalyzer::analyze(output) {
                print_hint(&hint);
            }
        }
        _ => {}
    }

    if let Some(hint) = build.hint() {
        print_hint(&hint);
    }
}

fn print_hint(hint: &str) {
    eprintln!("\n{} {}", "💡 Hint:".yellow().bold(), hint);
}
