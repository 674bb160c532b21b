//! Content index boundary.
//!
//! The media server never scans the filesystem itself. It asks an externally
//! owned index for the file behind a `(kind, row)` pair. [`MemoryContentIndex`]
//! is the in-process implementation used by the standalone server and tests.

use std::path::PathBuf;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use super::model::{ContentId, MediaKind};

/// File location and MIME type of one index row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub path: PathBuf,
    pub mime: String,
}

impl IndexRecord {
    pub fn new(path: impl Into<PathBuf>, mime: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime: mime.into(),
        }
    }
}

/// Failure inside the index backend.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("content index unavailable: {0}")]
    Unavailable(String),

    #[error("content index query failed: {0}")]
    Query(String),
}

/// Query interface against the content index.
#[async_trait]
pub trait ContentIndex: Send + Sync {
    /// Looks up a row. `Ok(None)` means the index has no such row.
    async fn lookup(&self, kind: MediaKind, row: u64) -> Result<Option<IndexRecord>, IndexError>;
}

/// Thread-safe in-memory content index.
#[derive(Debug, Default)]
pub struct MemoryContentIndex {
    records: DashMap<ContentId, IndexRecord>,
}

impl MemoryContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a row. Returns `false` for generic kinds,
    /// which have no request path.
    pub fn insert(&self, kind: MediaKind, row: u64, record: IndexRecord) -> bool {
        match ContentId::new(kind, row) {
            Some(id) => {
                self.records.insert(id, record);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, kind: MediaKind, row: u64) -> Option<IndexRecord> {
        ContentId::new(kind, row)
            .and_then(|id| self.records.remove(&id))
            .map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ContentIndex for MemoryContentIndex {
    async fn lookup(&self, kind: MediaKind, row: u64) -> Result<Option<IndexRecord>, IndexError> {
        Ok(ContentId::new(kind, row)
            .and_then(|id| self.records.get(&id).map(|r| r.value().clone())))
    }
}
