//! Event emitter abstraction for decoupling the orchestrator from transport.
//!
//! Services depend on the [`EventEmitter`] trait rather than concrete broadcast
//! channels, enabling testing and alternative transport implementations.

use super::{ContentEvent, PlaybackEvent};

/// Trait for emitting domain events without knowledge of transport.
///
/// # Example
///
/// ```ignore
/// emitter.emit_playback(PlaybackEvent::StateChanged { state, timestamp: now_millis() });
/// ```
pub trait EventEmitter: Send + Sync {
    /// Emits a content navigation event.
    fn emit_content(&self, event: ContentEvent);

    /// Emits a playback event.
    fn emit_playback(&self, event: PlaybackEvent);
}

/// No-op emitter. Events are silently discarded.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_content(&self, _event: ContentEvent) {}

    fn emit_playback(&self, _event: PlaybackEvent) {}
}

/// Logging emitter for debugging and development.
///
/// Logs all events at debug level.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_content(&self, event: ContentEvent) {
        tracing::debug!(?event, "content_event");
    }

    fn emit_playback(&self, event: PlaybackEvent) {
        tracing::debug!(?event, "playback_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentListing;
    use crate::playback::RendererState;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Test emitter that counts events.
    struct CountingEventEmitter {
        content_count: AtomicUsize,
        playback_count: AtomicUsize,
    }

    impl EventEmitter for CountingEventEmitter {
        fn emit_content(&self, _event: ContentEvent) {
            self.content_count.fetch_add(1, Ordering::SeqCst);
        }

        fn emit_playback(&self, _event: PlaybackEvent) {
            self.playback_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn counting_emitter_tracks_events() {
        let emitter = Arc::new(CountingEventEmitter {
            content_count: AtomicUsize::new(0),
            playback_count: AtomicUsize::new(0),
        });
        let dyn_emitter: Arc<dyn EventEmitter> = emitter.clone();

        dyn_emitter.emit_content(ContentEvent::ListingUpdated {
            listing: ContentListing::default(),
            timestamp: 0,
        });
        dyn_emitter.emit_playback(PlaybackEvent::StateChanged {
            state: RendererState::stopped("x", None),
            timestamp: 0,
        });
        LoggingEventEmitter.emit_content(ContentEvent::DirectoryChanged {
            udn: "uuid:nas".into(),
            name: "NAS".into(),
            timestamp: 0,
        });

        assert_eq!(emitter.content_count.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.playback_count.load(Ordering::SeqCst), 1);
    }
}
