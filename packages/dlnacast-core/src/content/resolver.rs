//! Resolution of media server request paths to files.
//!
//! A request path looks like `/a-42.mp3`: a media prefix, a numeric content
//! index row and an optional extension that renderers like to see. The
//! extension is cosmetic and ignored when interpreting the identifier.
//!
//! Successful resolutions are cached per request path for the lifetime of
//! the process. Index row ids are stable within a run, so the cache is never
//! invalidated.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use super::index::ContentIndex;
use super::model::ContentId;

/// The only failure callers ever see.
///
/// Malformed identifiers, unknown rows and index failures all collapse into
/// this variant; the underlying cause is logged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0} was not found in the content index")]
    NotFound(String),
}

/// A resolved, servable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerObject {
    pub path: PathBuf,
    pub mime: String,
}

/// Maps request paths to files via the content index, with a cache.
pub struct ContentResolver {
    index: Arc<dyn ContentIndex>,
    /// Keyed by the request path exactly as received (extension included).
    cache: DashMap<String, ServerObject>,
}

impl ContentResolver {
    pub fn new(index: Arc<dyn ContentIndex>) -> Self {
        Self {
            index,
            cache: DashMap::new(),
        }
    }

    /// Resolves a request path such as `/v-7.mkv`.
    pub async fn resolve(&self, request_path: &str) -> Result<ServerObject, ResolveError> {
        if let Some(hit) = self.cache.get(request_path) {
            return Ok(hit.value().clone());
        }

        let not_found = || ResolveError::NotFound(request_path.to_string());

        let id = match parse_request_path(request_path) {
            Ok(id) => id,
            Err(e) => {
                log::debug!("[Resolver] Rejecting {}: {}", request_path, e);
                return Err(not_found());
            }
        };

        let record = match self.index.lookup(id.kind, id.row).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                log::debug!("[Resolver] {} ({:?} row {}) not in index", request_path, id.kind, id.row);
                return Err(not_found());
            }
            Err(e) => {
                log::warn!("[Resolver] Index lookup for {} failed: {}", request_path, e);
                return Err(not_found());
            }
        };

        let object = ServerObject {
            path: record.path,
            mime: record.mime,
        };

        // Concurrent misses for the same path may both land here; both
        // values come from the same row, so last write wins harmlessly.
        self.cache.insert(request_path.to_string(), object.clone());
        log::debug!("[Resolver] {} -> {}", request_path, object.path.display());

        Ok(object)
    }

    /// Number of cached resolutions.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Strips the leading slash and any extension, then parses the identifier.
fn parse_request_path(request_path: &str) -> Result<ContentId, super::model::ContentIdError> {
    let without_ext = match request_path.rfind('.') {
        Some(dot) => &request_path[..dot],
        None => request_path,
    };
    let identifier = without_ext.strip_prefix('/').unwrap_or(without_ext);
    identifier.parse()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::content::index::{IndexError, IndexRecord, MemoryContentIndex};
    use crate::content::model::MediaKind;

    /// Index wrapper counting backend queries.
    struct CountingIndex {
        inner: MemoryContentIndex,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl ContentIndex for CountingIndex {
        async fn lookup(
            &self,
            kind: MediaKind,
            row: u64,
        ) -> Result<Option<IndexRecord>, IndexError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.lookup(kind, row).await
        }
    }

    struct FailingIndex;

    #[async_trait]
    impl ContentIndex for FailingIndex {
        async fn lookup(&self, _: MediaKind, _: u64) -> Result<Option<IndexRecord>, IndexError> {
            Err(IndexError::Unavailable("database locked".into()))
        }
    }

    fn counting_index() -> Arc<CountingIndex> {
        let inner = MemoryContentIndex::new();
        inner.insert(
            MediaKind::Audio,
            12,
            IndexRecord::new("/music/song.mp3", "audio/mpeg"),
        );
        inner.insert(
            MediaKind::Video,
            4,
            IndexRecord::new("/video/clip.mkv", "video/x-matroska"),
        );
        Arc::new(CountingIndex {
            inner,
            lookups: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn resolves_known_identifier_with_extension() {
        let resolver = ContentResolver::new(counting_index());
        let object = resolver.resolve("/a-12.mp3").await.unwrap();
        assert_eq!(object.path, PathBuf::from("/music/song.mp3"));
        assert_eq!(object.mime, "audio/mpeg");
    }

    #[tokio::test]
    async fn resolves_identifier_without_extension() {
        let resolver = ContentResolver::new(counting_index());
        let object = resolver.resolve("/v-4").await.unwrap();
        assert_eq!(object.mime, "video/x-matroska");
    }

    #[tokio::test]
    async fn repeated_resolution_is_idempotent_and_cached_once() {
        let index = counting_index();
        let resolver = ContentResolver::new(index.clone());

        let first = resolver.resolve("/a-12.mp3").await.unwrap();
        for _ in 0..5 {
            assert_eq!(resolver.resolve("/a-12.mp3").await.unwrap(), first);
        }

        assert_eq!(index.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached(), 1);
    }

    #[tokio::test]
    async fn malformed_paths_are_not_found() {
        let index = counting_index();
        let resolver = ContentResolver::new(index.clone());

        for path in ["/", "/x-12.mp3", "/a-abc.mp3", "/a-.mp3", "/audio", "/a-12x"] {
            assert_eq!(
                resolver.resolve(path).await,
                Err(ResolveError::NotFound(path.to_string())),
                "{path}"
            );
        }
        // Malformed identifiers never reach the index
        assert_eq!(index.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_rows_are_not_found_and_not_cached() {
        let index = counting_index();
        let resolver = ContentResolver::new(index.clone());

        assert!(resolver.resolve("/a-999.mp3").await.is_err());
        assert!(resolver.resolve("/a-999.mp3").await.is_err());
        assert_eq!(index.lookups.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cached(), 0);
    }

    #[tokio::test]
    async fn index_failures_surface_as_not_found() {
        let resolver = ContentResolver::new(Arc::new(FailingIndex));
        assert_eq!(
            resolver.resolve("/i-1.jpg").await,
            Err(ResolveError::NotFound("/i-1.jpg".into()))
        );
    }

    #[tokio::test]
    async fn concurrent_resolution_agrees() {
        let resolver = Arc::new(ContentResolver::new(counting_index()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                tokio::spawn(async move { resolver.resolve("/a-12.mp3").await })
            })
            .collect();

        for handle in handles {
            let object = handle.await.unwrap().unwrap();
            assert_eq!(object.path, PathBuf::from("/music/song.mp3"));
        }
        assert_eq!(resolver.cached(), 1);
    }
}
