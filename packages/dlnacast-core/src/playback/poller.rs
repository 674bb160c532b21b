//! Renderer State Poller.
//!
//! Produces a lazy, endless stream of [`RendererState`] for one renderer by
//! querying transport and position info every interval. A failed query skips
//! the tick; the stream only ends when its [`PollerHandle`] is disposed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::state::RendererState;
use crate::upnp::{ActionBridge, Device};

/// Disposal handle for a running poller.
#[derive(Debug, Clone, Default)]
pub struct PollerHandle {
    token: CancellationToken,
}

impl PollerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests termination. Idempotent; never waits for an in-flight tick.
    pub fn dispose(&self) {
        self.token.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

pub struct RendererStatePoller {
    bridge: ActionBridge,
    renderer: Device,
    interval: Duration,
    /// While set, ticks pass without querying the renderer.
    updates_paused: Arc<AtomicBool>,
}

impl RendererStatePoller {
    pub fn new(
        bridge: ActionBridge,
        renderer: Device,
        interval: Duration,
        updates_paused: Arc<AtomicBool>,
    ) -> Self {
        Self {
            bridge,
            renderer,
            interval,
            updates_paused,
        }
    }

    /// Starts polling. Nothing is queried until the stream is polled; the
    /// first query happens one interval after that.
    pub fn start(self) -> (PollerHandle, impl Stream<Item = RendererState> + Send + 'static) {
        let handle = PollerHandle::new();
        let token = handle.token();
        let stream = self.ticks().take_until(async move { token.cancelled().await });
        (handle, stream)
    }

    fn ticks(self) -> impl Stream<Item = RendererState> + Send + 'static {
        async_stream::stream! {
            log::debug!("[Poller] Polling {} every {:?}", self.renderer.name, self.interval);
            loop {
                tokio::time::sleep(self.interval).await;
                if self.updates_paused.load(Ordering::SeqCst) {
                    continue;
                }

                let Some(transport) = self.bridge.transport_info(&self.renderer).await else {
                    log::debug!("[Poller] No transport info from {}, skipping tick", self.renderer.name);
                    continue;
                };
                let Some(position) = self.bridge.position_info(&self.renderer).await else {
                    log::debug!("[Poller] No position info from {}, skipping tick", self.renderer.name);
                    continue;
                };

                yield RendererState::from_poll(&transport, &position);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::state::PlayState;
    use crate::upnp::test_support::{position_response, renderer, transport_response, MockTransport};

    fn poller(transport: &Arc<MockTransport>, paused: Arc<AtomicBool>) -> RendererStatePoller {
        RendererStatePoller::new(
            ActionBridge::new(transport.clone(), None),
            renderer(),
            Duration::from_millis(1000),
            paused,
        )
    }

    fn playing_transport() -> Arc<MockTransport> {
        let transport = Arc::new(MockTransport::new());
        transport.respond("GetTransportInfo", transport_response("PLAYING"));
        transport.respond(
            "GetPositionInfo",
            position_response("0:00:30", "0:02:00", Some(("Song", "Band"))),
        );
        transport
    }

    #[tokio::test(start_paused = true)]
    async fn emits_snapshots_each_interval() {
        let transport = playing_transport();
        let (_handle, stream) = poller(&transport, Arc::default()).start();
        futures::pin_mut!(stream);

        let first = stream.next().await.unwrap();
        assert_eq!(first.state, PlayState::Playing);
        assert!((first.progress - 0.25).abs() < 1e-9);
        assert!(stream.next().await.is_some());
        assert_eq!(transport.count("GetTransportInfo"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn is_lazy_until_polled() {
        let transport = playing_transport();
        let (_handle, _stream) = poller(&transport, Arc::default()).start();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_ticks_are_skipped_not_fatal() {
        let transport = playing_transport();
        transport.fail("GetPositionInfo");
        let (_handle, stream) = poller(&transport, Arc::default()).start();
        futures::pin_mut!(stream);

        let next = tokio::time::timeout(Duration::from_millis(3500), stream.next()).await;
        assert!(next.is_err(), "failing ticks must not yield");
        assert_eq!(transport.count("GetPositionInfo"), 3);

        transport.respond(
            "GetPositionInfo",
            position_response("0:00:01", "0:00:10", None),
        );
        assert!(stream.next().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn paused_updates_do_not_query() {
        let transport = playing_transport();
        let paused = Arc::new(AtomicBool::new(true));
        let (_handle, stream) = poller(&transport, Arc::clone(&paused)).start();
        futures::pin_mut!(stream);

        let next = tokio::time::timeout(Duration::from_millis(2500), stream.next()).await;
        assert!(next.is_err());
        assert!(transport.calls().is_empty());

        paused.store(false, Ordering::SeqCst);
        assert!(stream.next().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_ends_the_stream_and_is_idempotent() {
        let transport = playing_transport();
        let (handle, stream) = poller(&transport, Arc::default()).start();
        futures::pin_mut!(stream);

        assert!(stream.next().await.is_some());
        handle.dispose();
        handle.dispose();
        assert!(handle.is_disposed());
        assert!(stream.next().await.is_none());
    }
}
