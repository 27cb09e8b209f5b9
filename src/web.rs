use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use actix_files::Files;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::board::{BoardView, Session, SubmitOutcome, Submission, TILES};
use crate::error::BoardError;
use crate::form::{parse_submission, ExportSummary, SubmitRequest};
use crate::snapshot::{clear_snapshot, load_snapshot, save_snapshot, FileStore, KeyValueStore};
use crate::view::{CloseTrigger, Rect, ScrollCapture, Viewport};

/// Shared server state. The session is the only mutable board state; each
/// request does its whole mutation and redraw under the lock.
pub struct AppState {
    pub session: Mutex<Session>,
    pub store: Mutex<Box<dyn KeyValueStore>>,
}

impl AppState {
    pub fn new(session: Session, store: Box<dyn KeyValueStore>) -> Self {
        AppState {
            session: Mutex::new(session),
            store: Mutex::new(store),
        }
    }

    fn session(&self) -> Result<MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|_| actix_web::error::ErrorInternalServerError("board session unavailable"))
    }

    fn store(&self) -> Result<MutexGuard<'_, Box<dyn KeyValueStore>>> {
        self.store
            .lock()
            .map_err(|_| actix_web::error::ErrorInternalServerError("snapshot store unavailable"))
    }

    /// Replaces the board and saves it as the last roster. The store is
    /// written while the session lock is still held, so the saved snapshot
    /// is always the board the last submission produced.
    /// Lock order is session, then store.
    pub fn apply_submission(&self, submission: &Submission) -> Result<(SubmitOutcome, BoardView)> {
        let mut session = self.session()?;
        let outcome = session.submit(submission);
        let mut store = self.store()?;
        save_snapshot(&mut **store, &session.snapshot());
        Ok((outcome, session.view().clone()))
    }
}

#[derive(Deserialize)]
pub struct MoveRequest {
    /// Drag payload: badge id or employee id
    badge: String,
    /// Target tile; absent or empty sends the badge back to the pool
    #[serde(default)]
    key: Option<String>,
}

#[derive(Deserialize)]
pub struct CountRequest {
    count: usize,
}

#[derive(Deserialize)]
pub struct CollapseRequest {
    trigger: CloseTrigger,
}

#[derive(Deserialize)]
pub struct KeyRequest {
    key: String,
}

#[derive(Deserialize)]
pub struct RepositionRequest {
    viewport: Viewport,
    anchor: Rect,
}

#[derive(Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    confirmed: bool,
}

#[derive(Deserialize)]
pub struct VolumeQuery {
    #[serde(default)]
    planned_volume: f64,
}

#[derive(Serialize)]
struct RestoreResponse {
    success: bool,
    restore: Option<ScrollCapture>,
}

fn error_response(err: &BoardError) -> HttpResponse {
    let body = serde_json::json!({"success": false, "error": err.user_message()});
    match err {
        BoardError::UnknownBadge(_) | BoardError::UnknownTile(_) => HttpResponse::NotFound().json(body),
        BoardError::Storage(_) | BoardError::Serialization(_) => {
            HttpResponse::InternalServerError().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

// Tile catalog endpoint
async fn get_tiles() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(TILES))
}

// Current board view
async fn get_board(state: web::Data<AppState>) -> Result<HttpResponse> {
    let session = state.session()?;
    Ok(HttpResponse::Ok().json(session.view()))
}

// Roster submission endpoint
async fn submit(req: web::Json<SubmitRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    // Parse before taking the lock; overlapping submissions resolve as last one wins
    let submission = match parse_submission(&req) {
        Ok(submission) => submission,
        Err(e) => {
            if let BoardError::Csv { .. } = e {
                error!("submission rejected: {}", e);
            }
            return Ok(error_response(&e));
        }
    };

    let (outcome, view) = state.apply_submission(&submission)?;

    let warnings: Vec<String> = outcome.notices.iter().map(|n| n.to_string()).collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "outcome": outcome,
        "warnings": warnings,
        "board": view,
    })))
}

// Drag-and-drop endpoint
async fn move_badge(req: web::Json<MoveRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = state.session()?;
    match session.drop_badge(&req.badge, req.key.as_deref()) {
        Ok(view) => Ok(HttpResponse::Ok().json(view)),
        Err(e) => {
            warn!("drop of {} rejected: {}", req.badge, e);
            Ok(error_response(&e))
        }
    }
}

async fn toggle_presence(id: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = state.session()?;
    match session.toggle_presence(&id) {
        Ok(present) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "present": present,
            "actual_hc": session.actual_hc(),
            "board": session.view(),
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

// Manual count edit on one tile
async fn set_count(
    key: web::Path<String>,
    req: web::Json<CountRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut session = state.session()?;
    match session.set_tile_count(&key, req.count) {
        Ok(edit) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "warning": edit.warning(),
            "edit": edit,
            "board": session.view(),
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn expand(req: web::Json<ScrollCapture>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = state.session()?;
    let view = session.expand_unassigned(req.into_inner());
    Ok(HttpResponse::Ok().json(view))
}

async fn collapse(req: web::Json<CollapseRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = state.session()?;
    let restore = session.collapse_unassigned(req.trigger);
    Ok(HttpResponse::Ok().json(RestoreResponse { success: true, restore }))
}

async fn key_press(req: web::Json<KeyRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = state.session()?;
    let restore = session.handle_key(&req.key);
    Ok(HttpResponse::Ok().json(RestoreResponse { success: true, restore }))
}

async fn reposition(req: web::Json<RepositionRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let session = state.session()?;
    match session.reposition_overlay(&req.viewport, &req.anchor) {
        Some(rect) => Ok(HttpResponse::Ok().json(rect)),
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

async fn publish(req: web::Json<PublishRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = state.session()?;
    match session.publish(req.confirmed) {
        Ok(restore) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "restore": restore,
            "board": session.view(),
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn unpublish(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = state.session()?;
    let view = session.unpublish();
    Ok(HttpResponse::Ok().json(view))
}

// Load the last saved roster; a bad snapshot leaves the board untouched
async fn load_last(state: web::Data<AppState>) -> Result<HttpResponse> {
    let loaded = {
        let store = state.store()?;
        load_snapshot(&**store)
    };
    match loaded {
        Ok(snapshot) => {
            let mut session = state.session()?;
            session.restore(snapshot);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "meta": session.meta(),
                "board": session.view(),
            })))
        }
        Err(e) => {
            warn!("snapshot load failed: {}", e);
            Ok(error_response(&e))
        }
    }
}

async fn clear_last(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut store = state.store()?;
    match clear_snapshot(&mut **store) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({"success": true}))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn summary(query: web::Query<VolumeQuery>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let session = state.session()?;
    Ok(HttpResponse::Ok().json(session.summary(query.planned_volume)))
}

// Export download
async fn export(state: web::Data<AppState>) -> Result<HttpResponse> {
    let summary = state.session()?.summary(0.0);
    let export = ExportSummary::new(&summary, chrono::Utc::now());
    let body = export
        .to_json_pretty()
        .map_err(actix_web::error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(export.file_name())],
        })
        .body(body))
}

// HTML page handler
async fn index() -> Result<HttpResponse> {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

/// Registers every route; shared by the server and the API tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/api/tiles", web::get().to(get_tiles))
        .route("/api/board", web::get().to(get_board))
        .route("/api/submit", web::post().to(submit))
        .route("/api/move", web::post().to(move_badge))
        .route("/api/presence/{id}", web::post().to(toggle_presence))
        .route("/api/tiles/{key}/count", web::post().to(set_count))
        .route("/api/view/expand", web::post().to(expand))
        .route("/api/view/collapse", web::post().to(collapse))
        .route("/api/view/key", web::post().to(key_press))
        .route("/api/view/reposition", web::post().to(reposition))
        .route("/api/publish", web::post().to(publish))
        .route("/api/publish", web::delete().to(unpublish))
        .route("/api/snapshot/load", web::post().to(load_last))
        .route("/api/snapshot", web::delete().to(clear_last))
        .route("/api/summary", web::get().to(summary))
        .route("/api/export", web::get().to(export));
}

pub async fn start_server(bind: String, port: u16, data_dir: PathBuf) -> std::io::Result<()> {
    info!("snapshot store in {}", data_dir.display());
    let app_state = web::Data::new(AppState::new(
        Session::new(),
        Box::new(FileStore::new(data_dir)),
    ));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            // roster files can be a few megabytes of CSV text
            .app_data(web::JsonConfig::default().limit(16 * 1024 * 1024))
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static"))
            .configure(configure)
    })
    .bind((bind.as_str(), port))?
    .run()
    .await
}
