//! HTTP route handlers.
//!
//! All handlers are thin - they delegate to the orchestrator, registry and
//! resolver. Any path not matched by the control API is a media request.

use std::convert::Infallible;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::range::serve_file;
use crate::api::response::{api_ok, api_success};
use crate::api::AppState;
use crate::error::{CastError, CastResult};
use crate::protocol_constants::{
    DLNA_CONTENT_FEATURES_HEADER, DLNA_REAL_TIME_INFO_HEADER, DLNA_REAL_TIME_INFO_VALUE,
    DLNA_TRANSFER_MODE_HEADER, DLNA_TRANSFER_MODE_STREAMING, NOT_FOUND_BODY, SERVICE_ID,
};
use crate::upnp::{Device, DeviceRole};

// ─────────────────────────────────────────────────────────────────────────────
// Request Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct DeviceRequest {
    udn: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrowseRequest {
    folder_id: String,
}

#[derive(Deserialize)]
struct RenderRequest {
    position: usize,
}

#[derive(Deserialize)]
struct SeekRequest {
    progress: f64,
    max: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Creates the Axum router with all routes.
///
/// Renderers fetch media from any origin; control clients may be browser based.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::RANGE]);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/devices", get(list_devices))
        .route("/api/renderer", post(select_renderer))
        .route("/api/directory", post(select_content_directory))
        .route("/api/browse/home", post(browse_home))
        .route("/api/browse", post(browse_to))
        .route("/api/browse/previous", post(browse_previous))
        .route("/api/render", post(render))
        .route("/api/playback/next", post(play_next))
        .route("/api/playback/previous", post(play_previous))
        .route("/api/playback/pause", post(pause_playback))
        .route("/api/playback/stop", post(stop_playback))
        .route("/api/playback/resume", post(resume_playback))
        .route("/api/playback/seek", post(seek))
        .route("/api/playback/updates/pause", post(pause_renderer_update))
        .route("/api/playback/updates/resume", post(resume_renderer_update))
        .route("/api/controller/resume", post(resume_controller))
        .route("/api/controller/pause", post(pause_controller))
        .route("/api/status", get(get_status))
        .route("/api/events", get(event_stream))
        .fallback(serve_media)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Media Server
// ─────────────────────────────────────────────────────────────────────────────

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        NOT_FOUND_BODY,
    )
        .into_response()
}

fn add_dlna_headers(headers: &mut HeaderMap, server: &str) {
    headers.insert(
        HeaderName::from_static(DLNA_REAL_TIME_INFO_HEADER),
        HeaderValue::from_static(DLNA_REAL_TIME_INFO_VALUE),
    );
    headers.insert(
        HeaderName::from_static(DLNA_CONTENT_FEATURES_HEADER),
        HeaderValue::from_static(""),
    );
    headers.insert(
        HeaderName::from_static(DLNA_TRANSFER_MODE_HEADER),
        HeaderValue::from_static(DLNA_TRANSFER_MODE_STREAMING),
    );
    if let Ok(value) = HeaderValue::from_str(server) {
        headers.insert(header::SERVER, value);
    }
}

/// `GET|HEAD /{prefix}{id}[.ext]`
async fn serve_media(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = uri.path();
    let object = match state.resolver.resolve(path).await {
        Ok(object) => object,
        Err(e) => {
            log::debug!("[MediaServer] {} {}: {}", method, path, e);
            return not_found();
        }
    };

    match serve_file(&object.path, &object.mime, &headers, method == Method::HEAD).await {
        Ok(mut response) => {
            log::debug!(
                "[MediaServer] {} {} -> {} ({})",
                method,
                path,
                object.path.display(),
                response.status()
            );
            add_dlna_headers(response.headers_mut(), &state.server_header);
            response
        }
        Err(e) => {
            log::warn!(
                "[MediaServer] Cannot serve {} from {}: {}",
                path,
                object.path.display(),
                e
            );
            not_found()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Control API
// ─────────────────────────────────────────────────────────────────────────────

/// Liveness probe.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    api_success(json!({
        "status": "ok",
        "service": SERVICE_ID,
        "port": state.network.get_port(),
    }))
}

async fn list_devices(State(state): State<AppState>) -> impl IntoResponse {
    api_success(json!({
        "renderers": state.registry.renderers(),
        "contentDirectories": state.registry.content_directories(),
    }))
}

/// Looks up a known device and checks it can take `role`.
fn require_device(state: &AppState, udn: &str, role: DeviceRole) -> CastResult<Device> {
    let device = state
        .registry
        .get(udn)
        .ok_or_else(|| CastError::DeviceNotFound(udn.to_string()))?;
    if device.role != role {
        let wanted = match role {
            DeviceRole::Renderer => "renderer",
            DeviceRole::ContentDirectory => "content directory",
            DeviceRole::Undefined => "undefined",
        };
        return Err(CastError::WrongRole(device.name, wanted));
    }
    Ok(device)
}

async fn select_renderer(
    State(state): State<AppState>,
    Json(payload): Json<DeviceRequest>,
) -> CastResult<impl IntoResponse> {
    let device = require_device(&state, &payload.udn, DeviceRole::Renderer)?;
    state.orchestrator.select_renderer(device).await?;
    Ok(api_ok())
}

async fn select_content_directory(
    State(state): State<AppState>,
    Json(payload): Json<DeviceRequest>,
) -> CastResult<impl IntoResponse> {
    let device = require_device(&state, &payload.udn, DeviceRole::ContentDirectory)?;
    state.orchestrator.select_content_directory(device).await?;
    Ok(api_ok())
}

async fn browse_home(State(state): State<AppState>) -> CastResult<impl IntoResponse> {
    state.orchestrator.browse_home().await?;
    let status = state.orchestrator.status().await?;
    Ok(api_success(json!({ "listing": status.listing })))
}

async fn browse_to(
    State(state): State<AppState>,
    Json(payload): Json<BrowseRequest>,
) -> CastResult<impl IntoResponse> {
    if payload.folder_id.is_empty() {
        return Err(CastError::InvalidRequest("folderId must not be empty".into()));
    }
    state.orchestrator.browse_to(payload.folder_id).await?;
    let status = state.orchestrator.status().await?;
    Ok(api_success(json!({ "listing": status.listing })))
}

async fn browse_previous(State(state): State<AppState>) -> CastResult<impl IntoResponse> {
    let moved = state.orchestrator.browse_previous().await?;
    let status = state.orchestrator.status().await?;
    Ok(api_success(json!({ "moved": moved, "listing": status.listing })))
}

/// Renders the item at `position` of the current listing.
async fn render(
    State(state): State<AppState>,
    Json(payload): Json<RenderRequest>,
) -> CastResult<impl IntoResponse> {
    let status = state.orchestrator.status().await?;
    let item = status
        .listing
        .playable_at(payload.position)
        .cloned()
        .ok_or_else(|| {
            CastError::InvalidRequest(format!(
                "position {} is not a playable item",
                payload.position
            ))
        })?;
    state.orchestrator.render_item(item, payload.position);
    Ok((StatusCode::ACCEPTED, Json(json!({ "success": true }))))
}

async fn play_next(State(state): State<AppState>) -> CastResult<impl IntoResponse> {
    state.orchestrator.play_next().await?;
    Ok(api_ok())
}

async fn play_previous(State(state): State<AppState>) -> CastResult<impl IntoResponse> {
    state.orchestrator.play_previous().await?;
    Ok(api_ok())
}

async fn pause_playback(State(state): State<AppState>) -> CastResult<impl IntoResponse> {
    state.orchestrator.pause_playback().await?;
    Ok(api_ok())
}

async fn stop_playback(State(state): State<AppState>) -> CastResult<impl IntoResponse> {
    state.orchestrator.stop_playback().await?;
    Ok(api_ok())
}

async fn resume_playback(State(state): State<AppState>) -> CastResult<impl IntoResponse> {
    state.orchestrator.resume_playback().await?;
    Ok(api_ok())
}

async fn seek(
    State(state): State<AppState>,
    Json(payload): Json<SeekRequest>,
) -> CastResult<impl IntoResponse> {
    if !payload.max.is_finite() || payload.max <= 0.0 || !payload.progress.is_finite() {
        return Err(CastError::InvalidRequest(
            "seek needs finite progress and a positive max".into(),
        ));
    }
    state
        .orchestrator
        .move_to(payload.progress, payload.max)
        .await?;
    Ok(api_ok())
}

async fn pause_renderer_update(State(state): State<AppState>) -> CastResult<impl IntoResponse> {
    state.orchestrator.pause_renderer_update().await?;
    Ok(api_ok())
}

async fn resume_renderer_update(State(state): State<AppState>) -> CastResult<impl IntoResponse> {
    state.orchestrator.resume_renderer_update().await?;
    Ok(api_ok())
}

async fn resume_controller(State(state): State<AppState>) -> impl IntoResponse {
    state.orchestrator.resume_upnp_controller();
    api_ok()
}

async fn pause_controller(State(state): State<AppState>) -> impl IntoResponse {
    state.orchestrator.pause_upnp_controller();
    api_ok()
}

async fn get_status(State(state): State<AppState>) -> CastResult<impl IntoResponse> {
    Ok(api_success(state.orchestrator.status().await?))
}

/// Server-sent events carrying every published [`CastEvent`](crate::events::CastEvent).
async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = BroadcastStream::new(state.event_bridge.subscribe()).filter_map(|event| async move {
        match event {
            Ok(event) => match Event::default().json_data(&event) {
                Ok(sse) => Some(Ok(sse)),
                Err(e) => {
                    log::warn!("[EventStream] Failed to serialize event: {}", e);
                    None
                }
            },
            Err(e) => {
                log::debug!("[EventStream] Subscriber lagging: {}", e);
                None
            }
        }
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}
