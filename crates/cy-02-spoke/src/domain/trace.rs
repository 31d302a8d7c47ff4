//! Bound Trace Log
//!
//! Append-only CSV of every bound a spoke sets:
//!
//! ```text
//! time,bound
//! 0.0123,10
//! 0.0456,8
//! ```

use crate::error::{SpokeError, SpokeResult};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;

pub const TRACE_HEADER: &str = "time,bound";

/// Trace file path for a spoke: `<prefix><name>.csv`.
pub fn trace_path(prefix: &Path, name: &str) -> PathBuf {
    let mut raw = prefix.as_os_str().to_owned();
    raw.push(name);
    raw.push(".csv");
    PathBuf::from(raw)
}

/// An open bound trace.
#[derive(Debug)]
pub struct TraceLog {
    path: PathBuf,
    file: File,
    start: Instant,
}

impl TraceLog {
    /// Create the trace file and write its header.
    ///
    /// Fails with `TraceFileExists` rather than appending to an earlier run.
    pub fn create(path: PathBuf) -> SpokeResult<Self> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(SpokeError::TraceFileExists { path })
            }
            Err(source) => return Err(SpokeError::TraceIo { path, source }),
        };
        writeln!(file, "{TRACE_HEADER}").map_err(|source| SpokeError::TraceIo {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            file,
            start: Instant::now(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close and delete the file of a trace whose spoke never came up.
    pub fn discard(self) {
        let Self { path, file, .. } = self;
        drop(file);
        if let Err(e) = std::fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "Could not remove unused trace file");
        }
    }

    /// Append `<elapsed secs>,<bound>`.
    pub fn append(&mut self, bound: f64) -> SpokeResult<()> {
        let elapsed = self.start.elapsed().as_secs_f64();
        writeln!(self.file, "{elapsed},{bound}").map_err(|source| SpokeError::TraceIo {
            path: self.path.clone(),
            source,
        })
    }
}
