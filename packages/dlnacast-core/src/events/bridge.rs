//! Bridge implementation that maps domain events to broadcast transport.
//!
//! The [`BroadcastEventBridge`] lives at the boundary between the orchestrator
//! and its subscribers, mapping typed domain events onto one broadcast
//! channel.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use super::emitter::EventEmitter;
use super::{CastEvent, ContentEvent, PlaybackEvent};
use crate::playback::RendererState;

/// Bridges domain events to a `tokio::sync::broadcast` channel.
///
/// An optional external emitter can be attached after construction to also
/// receive every event (a logging emitter, for instance).
///
/// # Thread Safety
///
/// The bridge is `Send + Sync` and can be shared across async tasks.
#[derive(Clone)]
pub struct BroadcastEventBridge {
    tx: broadcast::Sender<CastEvent>,
    external_emitter: Arc<RwLock<Option<Arc<dyn EventEmitter>>>>,
}

impl BroadcastEventBridge {
    /// Creates a new bridge with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            external_emitter: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets an external emitter that receives a copy of every event.
    pub fn set_external_emitter(&self, emitter: Arc<dyn EventEmitter>) {
        *self.external_emitter.write() = Some(emitter);
    }

    /// Returns a new receiver for the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<CastEvent> {
        self.tx.subscribe()
    }

    /// Renderer status ticks only, as a stream.
    ///
    /// A subscriber that falls behind skips the missed ticks.
    pub fn renderer_states(&self) -> impl Stream<Item = RendererState> + Send + 'static {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|event| async move {
            match event {
                Ok(CastEvent::Playback(PlaybackEvent::StateChanged { state, .. })) => Some(state),
                Ok(_) => None,
                Err(e) => {
                    log::debug!("[EventBridge] Status subscriber lagging: {}", e);
                    None
                }
            }
        })
    }
}

/// Generates an [`EventEmitter`] method that forwards to the external emitter
/// (if set) and then sends to the broadcast channel.
macro_rules! impl_emit {
    ($method:ident, $event_ty:ty, $variant:ident) => {
        fn $method(&self, event: $event_ty) {
            if let Some(ref emitter) = *self.external_emitter.read() {
                emitter.$method(event.clone());
            }
            if let Err(e) = self.tx.send(CastEvent::$variant(event)) {
                log::trace!("[EventBridge] No broadcast receivers: {}", e);
            }
        }
    };
}

impl EventEmitter for BroadcastEventBridge {
    impl_emit!(emit_content, ContentEvent, Content);
    impl_emit!(emit_playback, PlaybackEvent, Playback);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentListing;
    use crate::events::NoopEventEmitter;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bridge = BroadcastEventBridge::new(16);
        bridge.set_external_emitter(Arc::new(NoopEventEmitter));
        let mut rx = bridge.subscribe();

        bridge.emit_content(ContentEvent::ListingUpdated {
            listing: ContentListing::new("0", vec![]),
            timestamp: 0,
        });

        assert!(matches!(
            rx.recv().await.unwrap(),
            CastEvent::Content(ContentEvent::ListingUpdated { .. })
        ));
    }

    #[tokio::test]
    async fn renderer_states_filters_other_events() {
        let bridge = BroadcastEventBridge::new(16);
        let states = bridge.renderer_states();
        futures::pin_mut!(states);

        bridge.emit_playback(PlaybackEvent::LaunchLocally {
            uri: "u".into(),
            mime: None,
            timestamp: 0,
        });
        bridge.emit_playback(PlaybackEvent::StateChanged {
            state: RendererState::stopped("Photo", None),
            timestamp: 0,
        });

        let state = states.next().await.unwrap();
        assert_eq!(state.title.as_deref(), Some("Photo"));
    }

    #[test]
    fn emitting_without_subscribers_is_fine() {
        let bridge = BroadcastEventBridge::new(4);
        bridge.emit_playback(PlaybackEvent::StateChanged {
            state: RendererState::stopped("x", None),
            timestamp: 0,
        });
    }
}
