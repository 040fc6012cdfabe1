pub mod file;
pub mod ingest;
pub mod memory;
pub mod reader;

pub use file::FileStore;
pub use ingest::{IngestMode, IngestReport, ingest};
pub use memory::MemoryStore;
pub use reader::{EventReader, Sample};

use logpulse_core::error::Result;
use serde::Serialize;

/// Handle to the backing line store.
///
/// The store is replaced wholesale on every ingest; there is no append.
/// Implementations must make `replace` atomic with respect to `read_lines`:
/// a concurrent reader observes either the old or the new contents in full.
pub trait LogStore: Send + Sync {
    /// Trimmed, non-blank lines. A store that does not exist yet has none.
    fn read_lines(&self) -> Result<Vec<String>>;

    /// Overwrite the store with `contents`.
    fn replace(&self, contents: &str) -> Result<()>;

    /// File-level facts for the health report.
    fn stat(&self) -> StoreStat;

    /// Human-readable location reported back to uploaders.
    fn location(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStat {
    pub exists: bool,
    pub path: String,
    pub size_bytes: u64,
    pub total_lines: usize,
}

/// Count lines that hold anything besides whitespace.
pub(crate) fn count_non_blank(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}
