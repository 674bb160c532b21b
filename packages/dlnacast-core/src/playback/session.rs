//! Playback sessions and the handles they own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::poller::PollerHandle;
use super::state::RendererState;
use crate::content::{Item, RenderItem};
use crate::events::{now_millis, EventEmitter, PlaybackEvent};
use crate::upnp::{ActionBridge, Device};

// ─────────────────────────────────────────────────────────────────────────────
// Renderer Command
// ─────────────────────────────────────────────────────────────────────────────

/// Command handle for the renderer of one session.
///
/// Besides transport commands it carries the session's update switch: while
/// updates are paused the poller idles.
#[derive(Clone)]
pub struct RendererCommand {
    bridge: ActionBridge,
    renderer: Device,
    updates_paused: Arc<AtomicBool>,
    duration: Arc<Mutex<Option<Duration>>>,
}

impl RendererCommand {
    pub fn new(bridge: ActionBridge, renderer: Device) -> Self {
        Self {
            bridge,
            renderer,
            updates_paused: Arc::new(AtomicBool::new(false)),
            duration: Arc::new(Mutex::new(None)),
        }
    }

    pub fn renderer(&self) -> &Device {
        &self.renderer
    }

    pub fn bridge(&self) -> &ActionBridge {
        &self.bridge
    }

    /// Flag shared with the poller.
    pub(crate) fn updates_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.updates_paused)
    }

    pub async fn load(&self, item: &Item) -> bool {
        self.bridge.set_av_transport_uri(&self.renderer, item).await
    }

    pub async fn play(&self) -> bool {
        self.bridge.play(&self.renderer).await
    }

    pub async fn pause(&self) -> bool {
        self.bridge.pause(&self.renderer).await
    }

    pub async fn stop(&self) -> bool {
        self.bridge.stop(&self.renderer).await
    }

    pub async fn seek(&self, position: Duration) -> bool {
        self.bridge.seek(&self.renderer, position).await
    }

    pub fn pause_updates(&self) {
        self.updates_paused.store(true, Ordering::SeqCst);
    }

    pub fn resume_updates(&self) {
        self.updates_paused.store(false, Ordering::SeqCst);
    }

    pub fn updates_paused(&self) -> bool {
        self.updates_paused.load(Ordering::SeqCst)
    }

    /// Total duration of the loaded track, once a tick reported it.
    pub fn duration(&self) -> Option<Duration> {
        *self.duration.lock()
    }

    pub fn record_duration(&self, duration: Duration) {
        if !duration.is_zero() {
            *self.duration.lock() = Some(duration);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Remote session: an item loaded on a network renderer.
pub struct RemoteSession {
    pub id: u64,
    pub item: RenderItem,
    pub command: RendererCommand,
    pub poller: PollerHandle,
}

/// What is currently loaded for playback.
pub enum PlaybackSession {
    Idle,
    /// Handed to the local renderer; nothing to control remotely.
    Local { item: RenderItem },
    Remote(RemoteSession),
}

impl PlaybackSession {
    pub fn item(&self) -> Option<&RenderItem> {
        match self {
            Self::Idle => None,
            Self::Local { item } => Some(item),
            Self::Remote(remote) => Some(&remote.item),
        }
    }

    pub fn command(&self) -> Option<&RendererCommand> {
        match self {
            Self::Remote(remote) => Some(&remote.command),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Status Gate
// ─────────────────────────────────────────────────────────────────────────────

/// Publishes renderer states for the current session only.
///
/// Publishing and closing take the same lock, so once `close` returns no tick
/// of the closed session can be emitted anymore, even one already in flight.
pub struct StatusGate {
    current: Mutex<Option<u64>>,
    emitter: Arc<dyn EventEmitter>,
}

impl StatusGate {
    pub fn new(emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            current: Mutex::new(None),
            emitter,
        }
    }

    /// Opens the gate for `session`.
    pub fn open(&self, session: u64) {
        *self.current.lock() = Some(session);
    }

    /// Closes the gate; ticks of every session are dropped until reopened.
    pub fn close(&self) {
        *self.current.lock() = None;
    }

    /// Emits `state` if `session` is current. Returns whether it was emitted.
    pub fn publish(&self, session: u64, state: RendererState) -> bool {
        let current = self.current.lock();
        if *current != Some(session) {
            log::trace!("[Orchestrator] Dropping tick of stale session {}", session);
            return false;
        }
        self.emitter.emit_playback(PlaybackEvent::StateChanged {
            state,
            timestamp: now_millis(),
        });
        true
    }
}
