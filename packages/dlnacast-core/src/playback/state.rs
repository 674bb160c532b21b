//! Renderer status snapshots.

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::upnp::{PositionInfo, TransportInfo};

/// Playback state reported by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayState {
    Playing,
    Paused,
    Stop,
    Transitioning,
    NoMediaPresent,
    Unknown,
}

impl PlayState {
    /// Maps an AVTransport `CurrentTransportState` value.
    pub fn from_transport_state(state: &str) -> Self {
        match state {
            "PLAYING" => Self::Playing,
            "PAUSED_PLAYBACK" | "PAUSED_RECORDING" => Self::Paused,
            "STOPPED" => Self::Stop,
            "TRANSITIONING" => Self::Transitioning,
            "NO_MEDIA_PRESENT" => Self::NoMediaPresent,
            _ => Self::Unknown,
        }
    }
}

fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// One status tick for the current session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererState {
    #[serde(rename = "elapsedMs", serialize_with = "as_millis")]
    pub elapsed: Duration,
    #[serde(rename = "remainingMs", serialize_with = "as_millis")]
    pub remaining: Duration,
    #[serde(rename = "durationMs", serialize_with = "as_millis")]
    pub duration: Duration,
    /// Elapsed / duration, in `[0, 1]`. Zero when the duration is unknown.
    pub progress: f64,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub state: PlayState,
}

impl RendererState {
    /// Builds a snapshot from one transport + position poll.
    pub fn from_poll(transport: &TransportInfo, position: &PositionInfo) -> Self {
        let elapsed = position.rel_time.unwrap_or_default();
        let duration = position.track_duration.unwrap_or_default();
        let progress = if duration.is_zero() {
            0.0
        } else {
            (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
        };

        Self {
            elapsed,
            remaining: duration.saturating_sub(elapsed),
            duration,
            progress,
            title: position.title.clone(),
            artist: position.artist.clone(),
            state: PlayState::from_transport_state(&transport.state),
        }
    }

    /// A stopped state with no progress, for items without a timeline.
    pub fn stopped(title: impl Into<String>, artist: Option<String>) -> Self {
        Self {
            elapsed: Duration::ZERO,
            remaining: Duration::ZERO,
            duration: Duration::ZERO,
            progress: 0.0,
            title: Some(title.into()),
            artist,
            state: PlayState::Stop,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.state == PlayState::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(state: &str) -> TransportInfo {
        TransportInfo {
            state: state.into(),
            status: "OK".into(),
        }
    }

    #[test]
    fn maps_transport_states() {
        assert_eq!(PlayState::from_transport_state("PLAYING"), PlayState::Playing);
        assert_eq!(
            PlayState::from_transport_state("PAUSED_PLAYBACK"),
            PlayState::Paused
        );
        assert_eq!(PlayState::from_transport_state("STOPPED"), PlayState::Stop);
        assert_eq!(PlayState::from_transport_state("bogus"), PlayState::Unknown);
    }

    #[test]
    fn progress_and_remaining_from_position() {
        let position = PositionInfo {
            track_duration: Some(Duration::from_secs(200)),
            rel_time: Some(Duration::from_secs(50)),
            title: Some("Song".into()),
            artist: None,
        };
        let state = RendererState::from_poll(&transport("PLAYING"), &position);

        assert_eq!(state.elapsed, Duration::from_secs(50));
        assert_eq!(state.remaining, Duration::from_secs(150));
        assert!((state.progress - 0.25).abs() < f64::EPSILON);
        assert_eq!(state.state, PlayState::Playing);
        assert_eq!(state.title.as_deref(), Some("Song"));
    }

    #[test]
    fn unknown_duration_has_zero_progress() {
        let position = PositionInfo {
            rel_time: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        let state = RendererState::from_poll(&transport("PLAYING"), &position);
        assert_eq!(state.progress, 0.0);
        assert_eq!(state.remaining, Duration::ZERO);
    }

    #[test]
    fn stopped_state_serializes_for_clients() {
        let json = serde_json::to_value(RendererState::stopped("Photo", None)).unwrap();
        assert_eq!(json["state"], "STOP");
        assert_eq!(json["progress"], 0.0);
        assert_eq!(json["elapsedMs"], 0);
    }
}
