//! The directory shared by worker processes for multiprocess metrics.
//!
//! Every worker writes its own metric files here and an aggregation step
//! merges them. This module only creates, clears and removes the directory,
//! and retires the live-gauge files of exited workers. It never arbitrates
//! between concurrent writers.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Environment variable through which workers discover the directory.
pub const MULTIPROC_DIR_ENV: &str = "prometheus_multiproc_dir";

const LIVE_GAUGE_PREFIX: &str = "gauge_live";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiprocessDir {
    path: PathBuf,
}

impl MultiprocessDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Leaves the directory existing and empty, discarding any previous contents.
    pub fn prepare(&self) -> io::Result<()> {
        if self.path.exists() {
            debug!(path = %self.path.display(), "clearing metrics directory");
            std::fs::remove_dir_all(&self.path)?;
        }
        std::fs::create_dir_all(&self.path)?;
        debug!(path = %self.path.display(), "created metrics directory");
        Ok(())
    }

    /// Publishes the directory path to child processes forked after this call.
    ///
    /// Mutates the process environment: call it before any worker or thread
    /// that reads the environment is started.
    pub fn export_env(&self) {
        std::env::set_var(MULTIPROC_DIR_ENV, &self.path);
    }

    /// `prometheus_multiproc_dir=<path>`, for a supervisor running in another
    /// process to export before it forks workers.
    pub fn env_assignment(&self) -> String {
        format!("{}={}", MULTIPROC_DIR_ENV, self.path.display())
    }

    /// Removes the live-gauge files written by `pid` so aggregated readings
    /// stop including a terminated worker. Returns the number of files removed.
    ///
    /// A missing directory matches nothing.
    pub fn mark_process_dead(&self, pid: u32) -> io::Result<usize> {
        let entries = match std::fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let suffix = format!("_{pid}.db");
        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(LIVE_GAUGE_PREFIX) && name.ends_with(&suffix) {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }

        debug!(pid, removed, "marked worker metrics dead");
        Ok(removed)
    }

    /// Removes the directory and everything in it, if present.
    pub fn remove(&self) -> io::Result<()> {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed metrics directory");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
