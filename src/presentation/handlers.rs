// HTTP request handlers
use crate::application::dashboard_repository::is_valid_dashboard_id;
use crate::application::layout_manager::LayoutManager;
use crate::domain::breakpoint::Breakpoint;
use crate::domain::geometry::{PanelId, PixelPoint};
use crate::domain::panel::PanelTemplate;
use crate::domain::session::{ResizeHandle, SessionEnd, SessionKind};
use crate::infrastructure::blueprint::{
    diagnostic_document, snapshot_message, to_document, DiagnosticDocument, EventMessage,
    ProfileDocument, RectDocument,
};
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

type HandlerResult = Result<Response, StatusCode>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPanelRequest {
    pub kind: String,
    pub title: String,
    pub w: u32,
    pub h: u32,
    #[serde(default)]
    pub data_binding: Value,
    #[serde(default)]
    pub config: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    pub panel_id: Option<String>,
}

#[derive(Deserialize)]
pub struct ViewportRequest {
    pub width: f64,
}

#[derive(Deserialize)]
pub struct PointerRequest {
    pub x: f64,
    pub y: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragStartRequest {
    pub panel_id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeStartRequest {
    pub panel_id: String,
    pub handle: ResizeHandle,
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelCreated {
    pub id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportChanged {
    pub breakpoint: Breakpoint,
    pub changed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStarted {
    pub started: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMoved {
    pub rect: Option<RectDocument>,
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SessionFinished {
    #[serde(rename_all = "camelCase")]
    Committed { panel_id: String, rect: RectDocument },
    #[serde(rename_all = "camelCase")]
    Cancelled { panel_id: String, rect: RectDocument },
    Idle,
}

impl From<Option<SessionEnd>> for SessionFinished {
    fn from(end: Option<SessionEnd>) -> Self {
        match end {
            Some(SessionEnd::Committed { panel_id, rect }) => SessionFinished::Committed {
                panel_id: panel_id.to_string(),
                rect: rect.into(),
            },
            Some(SessionEnd::Cancelled { panel_id, restored }) => SessionFinished::Cancelled {
                panel_id: panel_id.to_string(),
                rect: restored.into(),
            },
            None => SessionFinished::Idle,
        }
    }
}

fn check_id(id: &str) -> Result<(), StatusCode> {
    if is_valid_dashboard_id(id) {
        Ok(())
    } else {
        Err(StatusCode::BAD_REQUEST)
    }
}

fn internal_error(e: anyhow::Error) -> StatusCode {
    tracing::error!("Request failed: {:#}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

fn active_snapshot(manager: &LayoutManager) -> EventMessage {
    snapshot_message(&manager.snapshot(manager.active_breakpoint()))
}

/// Run a mutation and answer with the active breakpoint's layout.
async fn mutate_layout(
    state: &AppState,
    id: &str,
    command: impl FnOnce(&mut LayoutManager),
) -> HandlerResult {
    check_id(id)?;
    let snapshot = state
        .dashboard_service
        .execute(id, |manager| {
            command(manager);
            active_snapshot(manager)
        })
        .await
        .map_err(internal_error)?;
    Ok(Json(snapshot).into_response())
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_dashboards(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> HandlerResult {
    let ids = state
        .dashboard_service
        .list_dashboards()
        .await
        .map_err(internal_error)?;
    json_response(&ids, accepts_brotli(&headers)).await
}

/// Full dashboard document
pub async fn get_dashboard(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> HandlerResult {
    check_id(&id)?;
    let document = state
        .dashboard_service
        .inspect(&id, |open| to_document(open.manager.dashboard()))
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    json_response(&document, accepts_brotli(&headers)).await
}

/// Repairs applied when the dashboard was loaded
pub async fn get_diagnostics(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult {
    check_id(&id)?;
    let diagnostics: Vec<DiagnosticDocument> = state
        .dashboard_service
        .inspect(&id, |open| open.diagnostics.iter().map(diagnostic_document).collect())
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(diagnostics).into_response())
}

pub async fn add_panel(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddPanelRequest>,
) -> HandlerResult {
    check_id(&id)?;
    let template = PanelTemplate {
        kind: request.kind,
        title: request.title,
        w: request.w,
        h: request.h,
        data_binding: request.data_binding,
        config: request.config,
    };
    let panel_id = state
        .dashboard_service
        .execute(&id, |manager| manager.add_panel(template))
        .await
        .map_err(internal_error)?;
    Ok((
        StatusCode::CREATED,
        Json(PanelCreated {
            id: panel_id.to_string(),
        }),
    )
        .into_response())
}

pub async fn remove_panel(
    Path((id, panel)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult {
    check_id(&id)?;
    let removed = state
        .dashboard_service
        .execute(&id, |manager| manager.remove_panel(&PanelId::new(panel)))
        .await
        .map_err(internal_error)?;
    if removed {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

pub async fn duplicate_panel(
    Path((id, panel)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult {
    check_id(&id)?;
    let copy = state
        .dashboard_service
        .execute(&id, |manager| manager.duplicate_panel(&PanelId::new(panel)))
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok((
        StatusCode::CREATED,
        Json(PanelCreated {
            id: copy.to_string(),
        }),
    )
        .into_response())
}

pub async fn select_panel(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> HandlerResult {
    check_id(&id)?;
    let selection = request.panel_id.map(PanelId::new);
    let known = state
        .dashboard_service
        .execute(&id, |manager| {
            let known = selection.as_ref().is_none_or(|p| manager.dashboard().contains(p));
            manager.select(selection);
            known
        })
        .await
        .map_err(internal_error)?;
    if known {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

pub async fn reset_layout(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult {
    mutate_layout(&state, &id, LayoutManager::reset_layout).await
}

pub async fn auto_arrange(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult {
    mutate_layout(&state, &id, LayoutManager::auto_arrange).await
}

/// Replace one breakpoint's profile; violating placements are refitted.
pub async fn set_breakpoint_layout(
    Path((id, key)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(profile): Json<ProfileDocument>,
) -> HandlerResult {
    let breakpoint: Breakpoint = key.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    check_id(&id)?;
    let snapshot = state
        .dashboard_service
        .execute(&id, |manager| {
            manager.set_breakpoint_layout(breakpoint, profile.into());
            snapshot_message(&manager.snapshot(breakpoint))
        })
        .await
        .map_err(internal_error)?;
    Ok(Json(snapshot).into_response())
}

pub async fn set_viewport(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ViewportRequest>,
) -> HandlerResult {
    check_id(&id)?;
    if !request.width.is_finite() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let changed = state
        .dashboard_service
        .execute(&id, |manager| {
            let changed = manager.set_viewport_width(request.width).is_some();
            ViewportChanged {
                breakpoint: manager.active_breakpoint(),
                changed,
            }
        })
        .await
        .map_err(internal_error)?;
    Ok(Json(changed).into_response())
}

pub async fn drag_start(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<DragStartRequest>,
) -> HandlerResult {
    check_id(&id)?;
    let panel = PanelId::new(request.panel_id);
    let pointer = PixelPoint::new(request.x, request.y);
    let started = state
        .dashboard_service
        .execute(&id, |manager| {
            manager
                .dashboard()
                .contains(&panel)
                .then(|| manager.begin_drag(&panel, pointer))
        })
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(SessionStarted { started }).into_response())
}

pub async fn resize_start(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResizeStartRequest>,
) -> HandlerResult {
    check_id(&id)?;
    let panel = PanelId::new(request.panel_id);
    let pointer = PixelPoint::new(request.x, request.y);
    let started = state
        .dashboard_service
        .execute(&id, |manager| {
            manager
                .dashboard()
                .contains(&panel)
                .then(|| manager.begin_resize(&panel, request.handle, pointer))
        })
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(SessionStarted { started }).into_response())
}

async fn session_move(
    state: &AppState,
    id: &str,
    kind: SessionKind,
    pointer: PixelPoint,
) -> HandlerResult {
    check_id(id)?;
    let rect = state
        .dashboard_service
        .execute(id, |manager| {
            let active = manager.session().map(|s| s.kind());
            (active == Some(kind)).then(|| manager.update_session(pointer)).flatten()
        })
        .await
        .map_err(internal_error)?;
    Ok(Json(SessionMoved {
        rect: rect.map(RectDocument::from),
    })
    .into_response())
}

async fn session_finish(
    state: &AppState,
    id: &str,
    kind: SessionKind,
    commit: bool,
) -> HandlerResult {
    check_id(id)?;
    let end = state
        .dashboard_service
        .execute(id, |manager| {
            let active = manager.session().map(|s| s.kind());
            if active != Some(kind) {
                return None;
            }
            if commit {
                manager.commit_session()
            } else {
                manager.cancel_session()
            }
        })
        .await
        .map_err(internal_error)?;
    Ok(Json(SessionFinished::from(end)).into_response())
}

pub async fn drag_move(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<PointerRequest>,
) -> HandlerResult {
    let pointer = PixelPoint::new(request.x, request.y);
    session_move(&state, &id, SessionKind::Drag, pointer).await
}

pub async fn drag_end(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult {
    session_finish(&state, &id, SessionKind::Drag, true).await
}

pub async fn drag_cancel(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult {
    session_finish(&state, &id, SessionKind::Drag, false).await
}

pub async fn resize_move(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<PointerRequest>,
) -> HandlerResult {
    let pointer = PixelPoint::new(request.x, request.y);
    session_move(&state, &id, SessionKind::Resize, pointer).await
}

pub async fn resize_end(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult {
    session_finish(&state, &id, SessionKind::Resize, true).await
}

pub async fn resize_cancel(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult {
    session_finish(&state, &id, SessionKind::Resize, false).await
}

/// Stream layout and selection events, starting with the current layout
pub async fn stream_events(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> HandlerResult {
    check_id(&id)?;
    let (initial, rx) = state
        .dashboard_service
        .inspect(&id, |open| (active_snapshot(&open.manager), open.subscribe()))
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(stream_from_receiver(Some(initial), rx).into_response())
}
