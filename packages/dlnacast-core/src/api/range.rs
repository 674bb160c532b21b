//! Byte-range file serving.
//!
//! Serves a file with `Range` (single range, including suffix ranges),
//! `If-None-Match` and `HEAD` support. Knows nothing about DLNA; callers
//! decorate the response with protocol headers.

use std::io::SeekFrom;
use std::path::Path;
use std::time::UNIX_EPOCH;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

#[derive(Debug, Error)]
pub enum RangeError {
    #[error("file access failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("response construction failed: {0}")]
    Http(#[from] axum::http::Error),
}

/// Part of the file a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable `Range` header; serve everything.
    Full,
    /// Inclusive byte bounds.
    Partial { start: u64, end: u64 },
    Unsatisfiable,
}

impl ByteRange {
    /// Interprets a `Range` header value against a file of `len` bytes.
    ///
    /// Syntactically invalid and multi-range headers are ignored, as allowed
    /// by RFC 9110.
    pub fn parse(header: Option<&str>, len: u64) -> Self {
        let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
            return Self::Full;
        };
        if spec.contains(',') {
            return Self::Full;
        }
        let Some((first, last)) = spec.split_once('-') else {
            return Self::Full;
        };
        let (first, last) = (first.trim(), last.trim());

        if first.is_empty() {
            // Suffix range: the last N bytes
            let Ok(suffix) = last.parse::<u64>() else {
                return Self::Full;
            };
            if suffix == 0 || len == 0 {
                return Self::Unsatisfiable;
            }
            return Self::Partial {
                start: len - suffix.min(len),
                end: len - 1,
            };
        }

        let Ok(start) = first.parse::<u64>() else {
            return Self::Full;
        };
        let end = if last.is_empty() {
            u64::MAX
        } else {
            match last.parse::<u64>() {
                Ok(end) if end >= start => end,
                _ => return Self::Full,
            }
        };

        if start >= len {
            return Self::Unsatisfiable;
        }
        Self::Partial {
            start,
            end: end.min(len - 1),
        }
    }
}

/// Weak validator built from size and modification time.
fn entity_tag(len: u64, modified_secs: u64) -> String {
    format!("\"{:x}-{:x}\"", len, modified_secs)
}

fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .map(|candidate| candidate.trim().trim_start_matches("W/"))
        .any(|candidate| candidate == "*" || candidate == etag)
}

/// Serves `path` as `mime`, honouring the request's conditional and range headers.
///
/// With `head_only` the response carries every header but no body.
pub async fn serve_file(
    path: &Path,
    mime: &str,
    request_headers: &HeaderMap,
    head_only: bool,
) -> Result<Response, RangeError> {
    let mut file = tokio::fs::File::open(path).await?;
    let metadata = file.metadata().await?;
    let len = metadata.len();
    let modified_secs = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs());
    let etag = entity_tag(len, modified_secs);

    let if_none_match = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());
    if if_none_match.is_some_and(|value| etag_matches(value, &etag)) {
        return Ok(Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(header::ETAG, &etag)
            .body(Body::empty())?);
    }

    let range_header = request_headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());
    let builder = Response::builder()
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::ETAG, &etag);

    let (builder, start, count) = match ByteRange::parse(range_header, len) {
        ByteRange::Full => (
            builder
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type(mime)),
            0,
            len,
        ),
        ByteRange::Partial { start, end } => (
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, content_type(mime))
                .header(header::CONTENT_RANGE, format!("bytes {}-{}/{}", start, end, len)),
            start,
            end - start + 1,
        ),
        ByteRange::Unsatisfiable => {
            log::debug!(
                "[MediaServer] Unsatisfiable range {:?} for {} ({} bytes)",
                range_header,
                path.display(),
                len
            );
            return Ok(builder
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{}", len))
                .body(Body::empty())?);
        }
    };

    let builder = builder.header(header::CONTENT_LENGTH, count);
    if head_only {
        return Ok(builder.body(Body::empty())?);
    }

    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }
    let body = Body::from_stream(ReaderStream::new(file.take(count)));
    Ok(builder.body(body)?)
}

fn content_type(mime: &str) -> HeaderValue {
    HeaderValue::from_str(mime)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}
