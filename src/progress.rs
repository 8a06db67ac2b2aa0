//! Live compilation progress.
//!
//! Workers record completions into a lock-protected [`CompileProgress`]; a
//! separate reporter thread polls it at a fixed rate and redraws an indicatif
//! bar. Nothing ever blocks a worker on the display.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// ~10 Hz
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
pub struct CompileProgress {
    completed: Mutex<Vec<String>>,
    halted: AtomicBool,
}

impl CompileProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completed(&self, name: String) {
        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name);
    }

    /// Stop live rendering after a failure; workers keep running.
    pub fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    fn completed(&self) -> Vec<String> {
        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn snapshot(&self) -> (usize, Option<String>) {
        let completed = self
            .completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        (completed.len(), completed.last().cloned())
    }
}

pub struct ProgressReporter {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Spawn the polling thread. With `visible == false` nothing is drawn
    /// but the same loop runs.
    pub fn start(progress: Arc<CompileProgress>, total: usize, visible: bool) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let bar = ProgressBar::new(total as u64);
        if !visible {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message("Compiling...");

        let handle = thread::Builder::new()
            .name("kiln-progress".to_string())
            .spawn(move || render_loop(&progress, &bar, &thread_stop))
            .ok();

        Self { stop, handle }
    }

    /// Signal the thread and wait for its final redraw.
    pub fn finish(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn render_loop(progress: &CompileProgress, bar: &ProgressBar, stop: &AtomicBool) {
    loop {
        if progress.is_halted() {
            bar.abandon_with_message("Compilation failed");
            return;
        }

        let (done, last) = progress.snapshot();
        bar.set_position(done as u64);
        if let Some(name) = last {
            bar.set_message(name);
        }
        bar.tick();

        if stop.load(Ordering::SeqCst) {
            break;
        }
        thread::sleep(REFRESH_INTERVAL);
    }
    bar.finish_with_message("Compilation complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_are_visible_to_readers() {
        let progress = Arc::new(CompileProgress::new());
        let writers: Vec<_> = (0..4)
            .map(|i| {
                let p = Arc::clone(&progress);
                thread::spawn(move || p.record_completed(format!("file{}.cc", i)))
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        let mut done = progress.completed();
        done.sort();
        assert_eq!(done, vec!["file0.cc", "file1.cc", "file2.cc", "file3.cc"]);
    }

    #[test]
    fn test_reporter_stops_on_finish() {
        let progress = Arc::new(CompileProgress::new());
        let reporter = ProgressReporter::start(Arc::clone(&progress), 2, false);
        progress.record_completed("a.cc".into());
        progress.record_completed("b.cc".into());
        reporter.finish();
        assert_eq!(progress.completed().len(), 2);
    }

    #[test]
    fn test_reporter_exits_when_halted() {
        let progress = Arc::new(CompileProgress::new());
        let reporter = ProgressReporter::start(Arc::clone(&progress), 3, false);
        progress.halt();
        thread::sleep(REFRESH_INTERVAL * 2);
        assert!(progress.is_halted());
        reporter.finish();
    }
}
