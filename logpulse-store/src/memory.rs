use crate::{LogStore, StoreStat, count_non_blank};
use arc_swap::ArcSwapOption;
use logpulse_core::error::Result;
use std::sync::Arc;

/// In-memory store for tests and ephemeral runs.
///
/// Contents are swapped as a whole, so readers always see one complete
/// snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: ArcSwapOption<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `contents` already stored.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let store = Self::new();
        store.contents.store(Some(Arc::new(contents.into())));
        store
    }

    /// Current raw contents, if anything was ever written.
    pub fn snapshot(&self) -> Option<Arc<String>> {
        self.contents.load_full()
    }
}

impl LogStore for MemoryStore {
    fn read_lines(&self) -> Result<Vec<String>> {
        Ok(self
            .snapshot()
            .map(|text| {
                text.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn replace(&self, contents: &str) -> Result<()> {
        self.contents.store(Some(Arc::new(contents.to_string())));
        Ok(())
    }

    fn stat(&self) -> StoreStat {
        let snapshot = self.snapshot();
        StoreStat {
            exists: snapshot.is_some(),
            path: self.location(),
            size_bytes: snapshot.as_ref().map(|s| s.len() as u64).unwrap_or(0),
            total_lines: snapshot.as_deref().map(|s| count_non_blank(s)).unwrap_or(0),
        }
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
