//! File-backed store: one JSON object per line.
//!
//! Writes are atomic: the new contents go to a uniquely named temp file next
//! to the store, which is then renamed over it. A reader never sees a
//! half-written file, and concurrent writers never share a staging file.

use crate::{LogStore, StoreStat};
use logpulse_core::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the staging file is created in; must share a filesystem
    /// with the store for the final rename to be atomic.
    fn staging_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn absolute_path(&self) -> PathBuf {
        std::path::absolute(&self.path).unwrap_or_else(|_| self.path.clone())
    }
}

fn stage(dir: &Path, contents: &str) -> std::io::Result<NamedTempFile> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".logpulse-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

impl LogStore for FileStore {
    fn read_lines(&self) -> Result<Vec<String>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut lines = Vec::new();
        for chunk in BufReader::new(file).split(b'\n') {
            let chunk = chunk?;
            let line = String::from_utf8_lossy(&chunk);
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
        Ok(lines)
    }

    fn replace(&self, contents: &str) -> Result<()> {
        let dir = self.staging_dir();
        std::fs::create_dir_all(dir)?;

        // Dropping a `NamedTempFile` removes it, so a failed write leaves
        // nothing behind.
        let tmp = stage(dir, contents).inspect_err(|e| {
            tracing::warn!(error = %e, dir = %dir.display(), "store: failed to stage tmp file");
        })?;

        if let Err(e) = tmp.persist(&self.path) {
            tracing::warn!(error = %e.error, "store: failed to rename tmp → store file");
            return Err(e.error.into());
        }

        tracing::debug!(path = %self.path.display(), bytes = contents.len(), "store: replaced");
        Ok(())
    }

    fn stat(&self) -> StoreStat {
        let meta = std::fs::metadata(&self.path).ok().filter(|m| m.is_file());
        let exists = meta.is_some();
        let total_lines = if exists {
            self.read_lines().map(|l| l.len()).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "store: failed to count lines");
                0
            })
        } else {
            0
        };

        StoreStat {
            exists,
            path: self.absolute_path().to_string_lossy().into_owned(),
            size_bytes: meta.map(|m| m.len()).unwrap_or(0),
            total_lines,
        }
    }

    fn location(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}
