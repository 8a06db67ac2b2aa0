//! # kiln - incremental C/C++ build-and-run driver
//!
//! kiln compiles every C/C++ source under a project's source roots in
//! parallel, links the objects into one executable and runs it. Builds are
//! skipped entirely when nothing git considers changed has a different
//! content hash since the previous run.
//!
//! ## Quick Start
//!
//! ```bash
//! # Build (if needed) and run src/main.cc
//! kiln
//!
//! # Optimised build with clang, no run
//! kiln build --release --compiler clang
//! ```
//!
//! ## Module Organization
//!
//! - [`pipeline`] - discover → detect changes → compile → link → run
//! - [`toolchain`] - compiler selection and target triple
//! - [`tracker`] - git status plus SHA-256 snapshot diffing
//! - [`coordinator`] - parallel compilation of a [`session::BuildSession`]
//! - [`commands`] - `clean` and `doctor`

/// Per-compiler command-line templates.
pub mod command;

/// `clean` and `doctor` command handlers.
pub mod commands;

/// Configuration file parsing (`kiln.toml`).
pub mod config;

/// Parallel compile phase.
pub mod coordinator;

/// Source file discovery.
pub mod discovery;

/// Build error taxonomy.
pub mod error;

/// Remediation hints for compiler and linker output.
pub mod feedback;

/// On-disk build directory layout.
pub mod layout;

/// Link phase.
pub mod linker;

/// `tracing` subscriber setup.
pub mod logging;

/// End-to-end build orchestration.
pub mod pipeline;

/// Process spawning abstraction.
pub mod process;

/// Compile progress display.
pub mod progress;

/// Runs the built executable.
pub mod runner;

/// Per-run compile slots.
pub mod session;

/// Compiler detection and target resolution.
pub mod toolchain;

/// Content-hash change tracking.
pub mod tracker;

/// Terminal tables and panels.
pub mod ui;
