//! Playback Orchestrator.
//!
//! A single actor task owns the selection, navigation and session state.
//! Public methods only enqueue commands, so every mutation is serialized
//! through the actor. Render requests pass through a latest-wins throttle
//! first.
//!
//! Rendering an item always tears the previous session down before setting
//! the new one up:
//!
//! 1. the status gate closes, so no tick of the old session escapes
//! 2. the old poller is disposed and the old renderer is stopped
//! 3. the new session is set up and the gate reopens for it

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::navigator::Navigator;
use super::poller::RendererStatePoller;
use super::session::{PlaybackSession, RemoteSession, RendererCommand, StatusGate};
use super::state::RendererState;
use super::throttle::Throttle;
use crate::config::Config;
use crate::content::{ContentListing, Item, MediaKind, RenderItem};
use crate::error::{CastError, CastResult};
use crate::events::{
    now_millis, BroadcastEventBridge, CastEvent, ContentEvent, EventEmitter, PlaybackEvent,
    RenderedItem,
};
use crate::protocol_constants::ROOT_CONTAINER_ID;
use crate::upnp::{ActionBridge, ControlPoint, Device};

/// Longest wait for the old renderer's `Stop` during teardown, even when
/// actions are otherwise unbounded.
const TEARDOWN_STOP_LIMIT: Duration = Duration::from_secs(10);

/// Timing and sizing of the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub render_throttle: Duration,
    pub poll_interval: Duration,
    pub command_capacity: usize,
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        Self {
            render_throttle: config.render_throttle(),
            poll_interval: config.poll_interval(),
            command_capacity: config.command_channel_capacity,
        }
    }
}

/// What kind of session is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    Idle,
    Local,
    Remote,
}

/// Snapshot of the orchestrator state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorStatus {
    pub renderer: Option<Device>,
    pub content_directory: Option<Device>,
    pub folder_id: String,
    pub listing: ContentListing,
    pub mode: SessionMode,
    pub current: Option<RenderItem>,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub updates_paused: bool,
}

enum Command {
    SelectContentDirectory(Device),
    SelectRenderer(Device),
    BrowseHome,
    BrowseTo(String),
    BrowsePrevious(oneshot::Sender<bool>),
    /// Acknowledged once the render has finished.
    Render(RenderItem, oneshot::Sender<()>),
    PlayNext,
    PlayPrevious,
    MoveTo { progress: f64, max: f64 },
    PausePlayback,
    StopPlayback,
    ResumePlayback,
    ResumeRendererUpdate,
    PauseRendererUpdate,
    Status(oneshot::Sender<OrchestratorStatus>),
}

// ─────────────────────────────────────────────────────────────────────────────
// Public Handle
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to the orchestrator task.
pub struct PlaybackOrchestrator {
    command_tx: mpsc::Sender<Command>,
    throttle: Arc<Throttle<RenderItem>>,
    events: BroadcastEventBridge,
    control_point: Arc<dyn ControlPoint>,
}

impl PlaybackOrchestrator {
    /// Spawns the orchestrator task and its render throttle.
    ///
    /// Must be called from within a Tokio runtime. Both tasks end when
    /// `cancel` fires.
    pub fn spawn(
        bridge: ActionBridge,
        events: BroadcastEventBridge,
        control_point: Arc<dyn ControlPoint>,
        config: OrchestratorConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);

        let render_tx = command_tx.clone();
        let throttle = Arc::new(Throttle::spawn(
            config.render_throttle,
            cancel.clone(),
            move |item: RenderItem| {
                let tx = render_tx.clone();
                async move {
                    let (done_tx, done_rx) = oneshot::channel();
                    if tx.send(Command::Render(item, done_tx)).await.is_err() {
                        log::debug!("[Orchestrator] Render dropped, task stopped");
                        return;
                    }
                    // Later requests keep coalescing in the slot meanwhile
                    let _ = done_rx.await;
                }
            },
        ));

        let emitter: Arc<dyn EventEmitter> = Arc::new(events.clone());
        let actor = Actor {
            bridge,
            gate: Arc::new(StatusGate::new(Arc::clone(&emitter))),
            emitter,
            throttle: Arc::clone(&throttle),
            poll_interval: config.poll_interval,
            content_directory: None,
            renderer: None,
            navigator: Navigator::new(),
            listing: ContentListing::new(ROOT_CONTAINER_ID, Vec::new()),
            session: PlaybackSession::Idle,
            next: None,
            previous: None,
            session_counter: 0,
        };
        tokio::spawn(actor.run(command_rx, cancel));

        Self {
            command_tx,
            throttle,
            events,
            control_point,
        }
    }

    async fn send(&self, command: Command) -> CastResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| CastError::OrchestratorStopped)
    }

    /// Selects the content directory to browse; navigation restarts at its root.
    pub async fn select_content_directory(&self, device: Device) -> CastResult<()> {
        self.send(Command::SelectContentDirectory(device)).await
    }

    /// Selects the renderer used by subsequent renders.
    pub async fn select_renderer(&self, device: Device) -> CastResult<()> {
        self.send(Command::SelectRenderer(device)).await
    }

    pub async fn browse_home(&self) -> CastResult<()> {
        self.send(Command::BrowseHome).await
    }

    pub async fn browse_to(&self, folder_id: impl Into<String>) -> CastResult<()> {
        self.send(Command::BrowseTo(folder_id.into())).await
    }

    /// Goes back to the parent folder. Returns `false` at the root.
    pub async fn browse_previous(&self) -> CastResult<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::BrowsePrevious(tx)).await?;
        rx.await.map_err(|_| CastError::OrchestratorStopped)
    }

    /// Requests a new session for `item` at `position` of the current listing.
    ///
    /// Throttled: within one window only the most recent request runs.
    pub fn render_item(&self, item: Item, position: usize) {
        if self.throttle.submit(RenderItem::new(item, position)) {
            log::debug!("[Orchestrator] Superseded a pending render request");
        }
    }

    pub async fn play_next(&self) -> CastResult<()> {
        self.send(Command::PlayNext).await
    }

    pub async fn play_previous(&self) -> CastResult<()> {
        self.send(Command::PlayPrevious).await
    }

    /// Seeks to `progress / max` of the current track.
    pub async fn move_to(&self, progress: f64, max: f64) -> CastResult<()> {
        self.send(Command::MoveTo { progress, max }).await
    }

    pub async fn pause_playback(&self) -> CastResult<()> {
        self.send(Command::PausePlayback).await
    }

    pub async fn stop_playback(&self) -> CastResult<()> {
        self.send(Command::StopPlayback).await
    }

    pub async fn resume_playback(&self) -> CastResult<()> {
        self.send(Command::ResumePlayback).await
    }

    pub async fn resume_renderer_update(&self) -> CastResult<()> {
        self.send(Command::ResumeRendererUpdate).await
    }

    pub async fn pause_renderer_update(&self) -> CastResult<()> {
        self.send(Command::PauseRendererUpdate).await
    }

    /// Starts the discovery subsystem.
    pub fn resume_upnp_controller(&self) {
        self.control_point.resume();
    }

    /// Stops the discovery subsystem.
    pub fn pause_upnp_controller(&self) {
        self.control_point.pause();
    }

    pub async fn status(&self) -> CastResult<OrchestratorStatus> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Status(tx)).await?;
        rx.await.map_err(|_| CastError::OrchestratorStopped)
    }

    /// Subscribes to every published event.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<CastEvent> {
        self.events.subscribe()
    }

    /// Subscribes to renderer status ticks only.
    pub fn renderer_states(&self) -> impl futures::Stream<Item = RendererState> + Send + 'static {
        self.events.renderer_states()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Actor
// ─────────────────────────────────────────────────────────────────────────────

struct Actor {
    bridge: ActionBridge,
    emitter: Arc<dyn EventEmitter>,
    gate: Arc<StatusGate>,
    throttle: Arc<Throttle<RenderItem>>,
    poll_interval: Duration,
    content_directory: Option<Device>,
    renderer: Option<Device>,
    navigator: Navigator,
    listing: ContentListing,
    session: PlaybackSession,
    next: Option<usize>,
    previous: Option<usize>,
    session_counter: u64,
}

impl Actor {
    async fn run(mut self, mut command_rx: mpsc::Receiver<Command>, cancel: CancellationToken) {
        log::info!("[Orchestrator] Started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!("[Orchestrator] Shutting down");
                    break;
                }

                command = command_rx.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
            }
        }

        if let PlaybackSession::Remote(remote) = &self.session {
            self.gate.close();
            remote.poller.dispose();
        }
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::SelectContentDirectory(device) => self.select_content_directory(device),
            Command::SelectRenderer(device) => self.select_renderer(device),
            Command::BrowseHome => {
                self.navigator.home();
                self.browse(ROOT_CONTAINER_ID.to_string()).await;
            }
            Command::BrowseTo(folder_id) => {
                if self.content_directory.is_some() {
                    self.navigator.enter(&folder_id);
                }
                self.browse(folder_id).await;
            }
            Command::BrowsePrevious(reply) => {
                let moved = match self.navigator.back() {
                    Ok(parent) => {
                        let parent = parent.to_string();
                        self.browse(parent).await;
                        true
                    }
                    Err(e) => {
                        log::debug!("[Orchestrator] browse_previous: {}", e);
                        false
                    }
                };
                let _ = reply.send(moved);
            }
            Command::Render(item, done) => {
                self.render(item).await;
                let _ = done.send(());
            }
            Command::PlayNext => self.play_at(self.next, "next"),
            Command::PlayPrevious => self.play_at(self.previous, "previous"),
            Command::MoveTo { progress, max } => self.move_to(progress, max).await,
            Command::PausePlayback => {
                if let Some(command) = self.remote_command("pause") {
                    command.pause().await;
                }
            }
            Command::StopPlayback => {
                if let Some(command) = self.remote_command("stop") {
                    command.stop().await;
                }
            }
            Command::ResumePlayback => {
                if let Some(command) = self.remote_command("resume") {
                    command.resume_updates();
                    command.play().await;
                }
            }
            Command::ResumeRendererUpdate => {
                if let Some(command) = self.remote_command("resume updates") {
                    command.resume_updates();
                }
            }
            Command::PauseRendererUpdate => {
                if let Some(command) = self.remote_command("pause updates") {
                    command.pause_updates();
                }
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn select_content_directory(&mut self, device: Device) {
        log::info!("[Orchestrator] Content directory: {}", device.name);

        self.navigator.home();
        self.listing = ContentListing::new(ROOT_CONTAINER_ID, Vec::new());
        // The session keeps playing; only navigation restarts
        // Positions referred to the previous directory's listing
        self.next = None;
        self.previous = None;

        self.emitter.emit_content(ContentEvent::DirectoryChanged {
            udn: device.udn.clone(),
            name: device.name.clone(),
            timestamp: now_millis(),
        });
        self.emitter.emit_content(ContentEvent::ListingUpdated {
            listing: self.listing.clone(),
            timestamp: now_millis(),
        });
        self.content_directory = Some(device);
    }

    fn select_renderer(&mut self, device: Device) {
        log::info!(
            "[Orchestrator] Renderer: {} ({})",
            device.name,
            if device.is_local { "local" } else { "remote" }
        );
        self.renderer = Some(device);
    }

    async fn browse(&mut self, folder_id: String) {
        let Some(directory) = self.content_directory.as_ref() else {
            log::warn!("[Orchestrator] Browse {} ignored, no content directory selected", folder_id);
            return;
        };

        let entries = self.bridge.browse(directory, &folder_id).await;
        self.listing = ContentListing::new(folder_id, entries);
        self.emitter.emit_content(ContentEvent::ListingUpdated {
            listing: self.listing.clone(),
            timestamp: now_millis(),
        });
    }

    fn play_at(&self, target: Option<usize>, direction: &str) {
        let Some(position) = target else {
            log::debug!("[Orchestrator] No {} item", direction);
            return;
        };
        match self.listing.playable_at(position) {
            Some(item) => {
                self.throttle
                    .submit(RenderItem::new(item.clone(), position));
            }
            None => log::debug!(
                "[Orchestrator] {} position {} is not a playable item",
                direction,
                position
            ),
        }
    }

    fn remote_command(&self, what: &str) -> Option<&RendererCommand> {
        let command = self.session.command();
        if command.is_none() {
            log::debug!("[Orchestrator] {} ignored, no remote session", what);
        }
        command
    }

    async fn move_to(&self, progress: f64, max: f64) {
        let Some(command) = self.remote_command("seek") else {
            return;
        };
        let Some(duration) = command.duration() else {
            log::debug!("[Orchestrator] Seek ignored, track duration unknown");
            return;
        };
        if !progress.is_finite() || !max.is_finite() || max <= 0.0 {
            log::debug!("[Orchestrator] Seek ignored, invalid ratio {}/{}", progress, max);
            return;
        }

        let target = duration.mul_f64((progress / max).clamp(0.0, 1.0));
        command.seek(target).await;
    }

    /// Ends the current session. Returns once no tick of it can be published.
    async fn teardown(&mut self) {
        match std::mem::replace(&mut self.session, PlaybackSession::Idle) {
            PlaybackSession::Remote(remote) => {
                self.gate.close();
                remote.command.pause_updates();
                remote.poller.dispose();
                log::debug!("[Orchestrator] Tearing down session {}", remote.id);
                // Awaited: a late Stop would hit the next item on the same renderer
                if tokio::time::timeout(TEARDOWN_STOP_LIMIT, remote.command.stop())
                    .await
                    .is_err()
                {
                    log::warn!(
                        "[Orchestrator] Stop for session {} unanswered after {:?}, moving on",
                        remote.id,
                        TEARDOWN_STOP_LIMIT
                    );
                }
            }
            PlaybackSession::Local { .. } | PlaybackSession::Idle => {}
        }
    }

    async fn render(&mut self, request: RenderItem) {
        let Some(renderer) = self.renderer.clone() else {
            log::warn!("[Orchestrator] Render of {} ignored, no renderer selected", request.item.title);
            return;
        };
        if request.position >= self.listing.len() {
            log::warn!(
                "[Orchestrator] Render position {} outside listing of {}",
                request.position,
                self.listing.len()
            );
            return;
        }

        self.teardown().await;

        let position = request.position;
        self.next = Some(position + 1);
        self.previous = position.checked_sub(1);

        let item = &request.item;
        log::info!(
            "[Orchestrator] Rendering {} ({:?}) at {} on {}",
            item.title,
            item.kind,
            position,
            renderer.name
        );
        self.emitter.emit_playback(PlaybackEvent::Rendered {
            item: RenderedItem {
                id: item.id.clone(),
                title: item.title.clone(),
                kind: item.kind,
                uri: item.uri.clone(),
                position,
            },
            timestamp: now_millis(),
        });

        if renderer.is_local {
            self.launch_locally(&request.item);
            self.session = PlaybackSession::Local { item: request };
        } else {
            self.start_remote(renderer, request).await;
        }
    }

    fn launch_locally(&self, item: &Item) {
        let Some(uri) = item.uri.clone() else {
            log::warn!("[Orchestrator] {} has no URI, cannot launch locally", item.title);
            return;
        };
        self.emitter.emit_playback(PlaybackEvent::LaunchLocally {
            uri,
            mime: item.kind.mime_category().map(str::to_string),
            timestamp: now_millis(),
        });
    }

    async fn start_remote(&mut self, renderer: Device, request: RenderItem) {
        self.session_counter += 1;
        let id = self.session_counter;
        let command = RendererCommand::new(self.bridge.clone(), renderer.clone());
        let is_image = request.item.kind == MediaKind::Image;
        if is_image {
            command.pause_updates();
        }

        let (poller, ticks) = RendererStatePoller::new(
            self.bridge.clone(),
            renderer,
            self.poll_interval,
            command.updates_flag(),
        )
        .start();

        self.gate.open(id);
        let gate = Arc::clone(&self.gate);
        let forward_command = command.clone();
        tokio::spawn(async move {
            futures::pin_mut!(ticks);
            while let Some(state) = ticks.next().await {
                forward_command.record_duration(state.duration);
                let stopped = state.is_stopped();
                if gate.publish(id, state) && stopped {
                    log::debug!("[Orchestrator] Session {} stopped, pausing updates", id);
                    forward_command.pause_updates();
                }
            }
            log::debug!("[Poller] Session {} poller finished", id);
        });

        command.load(&request.item).await;

        if is_image {
            self.gate.publish(
                id,
                RendererState::stopped(request.item.title.clone(), request.item.artist.clone()),
            );
        } else {
            command.play().await;
        }

        self.session = PlaybackSession::Remote(RemoteSession {
            id,
            item: request,
            command,
            poller,
        });
    }

    fn status(&self) -> OrchestratorStatus {
        let mode = match &self.session {
            PlaybackSession::Idle => SessionMode::Idle,
            PlaybackSession::Local { .. } => SessionMode::Local,
            PlaybackSession::Remote(_) => SessionMode::Remote,
        };
        OrchestratorStatus {
            renderer: self.renderer.clone(),
            content_directory: self.content_directory.clone(),
            folder_id: self.navigator.current().to_string(),
            listing: self.listing.clone(),
            mode,
            current: self.session.item().cloned(),
            next: self.next,
            previous: self.previous,
            updates_paused: self
                .session
                .command()
                .is_some_and(RendererCommand::updates_paused),
        }
    }
}
