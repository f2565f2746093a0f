//! Watch mode for specscope
//!
//! Monitors spec files and re-runs the analysis whenever one changes.

use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Watch mode errors
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to create file watcher: {0}")]
    WatcherError(#[from] notify::Error),
    #[error("Failed to receive events: {0}")]
    RecvError(#[from] std::sync::mpsc::RecvError),
}

/// File watcher for continuous analysis
pub struct FileWatcher {
    /// Debounce duration in milliseconds
    debounce_ms: u64,
    /// File extensions to watch
    extensions: Vec<String>,
    /// Directory names whose contents never trigger a run
    ignored_dirs: Vec<String>,
    /// Files written by the tool itself (reports, baselines)
    ignored_files: Vec<PathBuf>,
}

impl FileWatcher {
    /// Create a new file watcher with default settings
    pub fn new() -> Self {
        Self {
            debounce_ms: 500,
            extensions: vec!["yaml".to_string(), "yml".to_string(), "json".to_string()],
            ignored_dirs: vec![
                "node_modules".to_string(),
                "target".to_string(),
                ".git".to_string(),
            ],
            ignored_files: Vec::new(),
        }
    }

    /// Set debounce duration
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Never re-run for changes to these files
    pub fn with_ignored_files(mut self, files: Vec<PathBuf>) -> Self {
        self.ignored_files = files;
        self
    }

    /// Check if a path should trigger a re-run
    fn should_trigger(&self, path: &Path) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        let ext_str = ext.to_string_lossy().to_lowercase();
        if !self.extensions.iter().any(|e| e == &ext_str) {
            return false;
        }

        let in_ignored_dir = path.components().any(|c| match c {
            Component::Normal(name) => self.ignored_dirs.iter().any(|d| name == d.as_str()),
            _ => false,
        });
        if in_ignored_dir {
            return false;
        }

        !self
            .ignored_files
            .iter()
            .any(|ignored| path == ignored || path.ends_with(ignored))
    }

    /// Start watching a spec file or directory and call the callback on changes
    pub fn watch<F>(&self, path: &Path, mut on_change: F) -> Result<(), WatchError>
    where
        F: FnMut() -> bool, // Returns false to stop watching
    {
        let (tx, rx) = channel();

        let mut debouncer = new_debouncer(Duration::from_millis(self.debounce_ms), tx)?;

        let mode = if path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        debouncer.watcher().watch(path, mode)?;
        debug!("Watching {} ({:?})", path.display(), mode);

        println!();
        println!("{}", "Watch mode active. Press Ctrl+C to stop.".cyan().bold());
        println!("{}", format!("   Watching: {}", path.display()).dimmed());
        println!();

        if !on_change() {
            return Ok(());
        }

        loop {
            let events = match rx.recv()? {
                Ok(events) => events,
                Err(e) => {
                    eprintln!("{}: {:?}", "Watch error".red(), e);
                    continue;
                }
            };

            let mut changed: Vec<PathBuf> = events
                .into_iter()
                .filter(|e| {
                    matches!(e.kind, DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous)
                        && self.should_trigger(&e.path)
                })
                .map(|e| e.path)
                .collect();
            changed.sort();
            changed.dedup();

            if changed.is_empty() {
                continue;
            }

            announce_changes(path, &changed);
            if !on_change() {
                break;
            }
        }

        Ok(())
    }
}

/// Print the changed specs, relative to the watched root when possible
fn announce_changes(root: &Path, changed: &[PathBuf]) {
    const LISTED: usize = 5;

    println!();
    println!(
        "{}",
        format!("{} spec file(s) changed, re-analyzing...", changed.len()).yellow()
    );
    for file in changed.iter().take(LISTED) {
        let shown = file.strip_prefix(root).unwrap_or(file);
        println!("   • {}", shown.display().to_string().dimmed());
    }
    if changed.len() > LISTED {
        println!("   • ... and {} more", changed.len() - LISTED);
    }
    println!();
}

impl Default for FileWatcher {
    fn default() -> Self {
        Self::new()
    }
}
