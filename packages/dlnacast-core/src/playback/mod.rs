//! Playback orchestration.
//!
//! - `orchestrator` - Actor owning selection, navigation and the active session
//! - `session` - Session variants, renderer commands and the status gate
//! - `poller` - Periodic renderer state polling
//! - `throttle` - Latest-wins render request coalescing
//! - `navigator` - Folder stack of the content directory
//! - `state` - Renderer state snapshots

pub mod navigator;
pub mod orchestrator;
pub mod poller;
pub mod session;
pub mod state;
pub mod throttle;

pub use navigator::{NavigationError, Navigator};
pub use orchestrator::{OrchestratorConfig, OrchestratorStatus, PlaybackOrchestrator, SessionMode};
pub use poller::{PollerHandle, RendererStatePoller};
pub use session::{PlaybackSession, RendererCommand, StatusGate};
pub use state::{PlayState, RendererState};
pub use throttle::Throttle;
