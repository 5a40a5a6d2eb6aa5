use actix_web::http::StatusCode;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use log::{info, warn};
use serde::Deserialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::roster::{StaffRequest, StudentRequest};
use crate::timetable::editing;
use crate::timetable::engine::unsupported_slots;
use crate::timetable::{
    compute_stats, EditError, Heuristic, Semester, SlotKey, StaffId, StudentId,
};
use crate::workspace::{RosterError, Workspace};

/// Shared workspace; saved back to `workspace_path` after every change when set
pub struct AppState {
    pub workspace: Mutex<Workspace>,
    pub workspace_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(workspace: Workspace, workspace_path: Option<PathBuf>) -> Self {
        AppState {
            workspace: Mutex::new(workspace),
            workspace_path,
        }
    }
}

#[derive(Deserialize)]
pub struct AssignRequest {
    #[serde(default)]
    heuristic: Heuristic,
}

#[derive(Deserialize)]
pub struct SpecialRequest {
    student_id: StudentId,
    subject: String,
}

#[derive(Deserialize)]
pub struct SupportRequest {
    student_id: StudentId,
    staff_id: StaffId,
}

fn error_response(status: StatusCode, message: impl Display) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({"success": false, "error": message.to_string()}))
}

fn roster_error(err: RosterError) -> HttpResponse {
    let status = match err {
        RosterError::Invalid(_) => StatusCode::BAD_REQUEST,
        RosterError::UnknownStudent(_) | RosterError::UnknownStaff(_) => StatusCode::NOT_FOUND,
    };
    error_response(status, err)
}

fn edit_error(err: EditError) -> HttpResponse {
    let status = match err {
        EditError::UnknownStudent(_) | EditError::UnknownStaff(_) => StatusCode::NOT_FOUND,
        EditError::SlotBlocked(_) | EditError::StaffBusy { .. } | EditError::EmptySubject => {
            StatusCode::BAD_REQUEST
        }
    };
    error_response(status, err)
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, Workspace>> {
    state
        .workspace
        .lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("Workspace lock poisoned"))
}

/// Saves the snapshot; a failed save is logged, the change stays in memory
fn persist(state: &AppState, workspace: &mut Workspace) {
    if let Some(path) = &state.workspace_path {
        if let Err(e) = workspace.save(path) {
            warn!("Failed to save workspace: {}", e);
        }
    }
}

fn parse_semester(raw: u8) -> std::result::Result<Semester, HttpResponse> {
    Semester::new(raw).ok_or_else(|| error_response(StatusCode::BAD_REQUEST, format!("Invalid semester: {}", raw)))
}

fn parse_slot(raw: &str) -> std::result::Result<SlotKey, HttpResponse> {
    raw.parse().map_err(|e: String| error_response(StatusCode::BAD_REQUEST, e))
}

// Student roster endpoints
async fn list_students(state: web::Data<AppState>) -> Result<HttpResponse> {
    let ws = lock(&state)?;
    Ok(HttpResponse::Ok().json(&ws.students))
}

async fn create_student(req: web::Json<StudentRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut ws = lock(&state)?;
    let created = match ws.add_student(req.into_inner()) {
        Ok(student) => student.clone(),
        Err(e) => return Ok(roster_error(e)),
    };
    persist(&state, &mut ws);
    Ok(HttpResponse::Created().json(created))
}

async fn update_student(
    id: web::Path<StudentId>,
    req: web::Json<StudentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut ws = lock(&state)?;
    let updated = match ws.update_student(id.into_inner(), req.into_inner()) {
        Ok(student) => student.clone(),
        Err(e) => return Ok(roster_error(e)),
    };
    persist(&state, &mut ws);
    Ok(HttpResponse::Ok().json(updated))
}

async fn delete_student(id: web::Path<StudentId>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut ws = lock(&state)?;
    if let Err(e) = ws.remove_student(id.into_inner()) {
        return Ok(roster_error(e));
    }
    persist(&state, &mut ws);
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

// Staff roster endpoints
async fn list_staff(state: web::Data<AppState>) -> Result<HttpResponse> {
    let ws = lock(&state)?;
    Ok(HttpResponse::Ok().json(&ws.staff))
}

async fn create_staff(req: web::Json<StaffRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut ws = lock(&state)?;
    let created = match ws.add_staff(req.into_inner()) {
        Ok(member) => member.clone(),
        Err(e) => return Ok(roster_error(e)),
    };
    persist(&state, &mut ws);
    Ok(HttpResponse::Created().json(created))
}

async fn update_staff(
    id: web::Path<StaffId>,
    req: web::Json<StaffRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut ws = lock(&state)?;
    let updated = match ws.update_staff(id.into_inner(), req.into_inner()) {
        Ok(member) => member.clone(),
        Err(e) => return Ok(roster_error(e)),
    };
    persist(&state, &mut ws);
    Ok(HttpResponse::Ok().json(updated))
}

async fn delete_staff(id: web::Path<StaffId>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut ws = lock(&state)?;
    if let Err(e) = ws.remove_staff(id.into_inner()) {
        return Ok(roster_error(e));
    }
    persist(&state, &mut ws);
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

// Attendance endpoints
async fn get_attendance(state: web::Data<AppState>) -> Result<HttpResponse> {
    let ws = lock(&state)?;
    Ok(HttpResponse::Ok().json(&ws.attendance))
}

async fn toggle_attendance(
    path: web::Path<(u8, String, u8)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (grade, day, period) = path.into_inner();
    if !(1..=6).contains(&grade) {
        return Ok(error_response(StatusCode::BAD_REQUEST, format!("Invalid grade: {}", grade)));
    }
    let key = match parse_slot(&format!("{}-{}", day, period)) {
        Ok(key) => key,
        Err(resp) => return Ok(resp),
    };

    let mut ws = lock(&state)?;
    let present = ws.attendance.toggle(grade, key);
    persist(&state, &mut ws);
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "present": present})))
}

// Timetable endpoints
async fn get_timetable(semester: web::Path<u8>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let semester = match parse_semester(semester.into_inner()) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };
    let ws = lock(&state)?;
    let store = ws.timetable.store(semester);
    let unsupported: Vec<String> = unsupported_slots(&store, &ws.students, &ws.attendance)
        .into_iter()
        .map(|key| key.to_string())
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "semester": semester,
        "slots": store,
        "unsupported": unsupported,
    })))
}

async fn get_stats(semester: web::Path<u8>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let semester = match parse_semester(semester.into_inner()) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };
    let ws = lock(&state)?;
    let stats = compute_stats(&ws.timetable.store(semester), &ws.students, &ws.staff);
    Ok(HttpResponse::Ok().json(stats))
}

async fn auto_assign(
    semester: web::Path<u8>,
    req: web::Json<AssignRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let semester = match parse_semester(semester.into_inner()) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };
    let mut ws = lock(&state)?;

    let store = match ws.auto_assign(semester, req.heuristic) {
        Ok(store) => store.clone(),
        Err(e) => return Ok(error_response(StatusCode::CONFLICT, e)),
    };
    info!("Semester {} timetable regenerated ({:?})", semester, req.heuristic);
    persist(&state, &mut ws);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "slots": store,
    })))
}

async fn reset_timetable(semester: web::Path<u8>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let semester = match parse_semester(semester.into_inner()) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };
    let mut ws = lock(&state)?;
    ws.timetable.reset(semester);
    persist(&state, &mut ws);
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

/// Runs one manual edit against a semester cell
fn edit_cell<F>(state: &AppState, semester: u8, slot: &str, edit: F) -> Result<HttpResponse>
where
    F: FnOnce(&mut Workspace, Semester, SlotKey) -> std::result::Result<bool, EditError>,
{
    let semester = match parse_semester(semester) {
        Ok(s) => s,
        Err(resp) => return Ok(resp),
    };
    let key = match parse_slot(slot) {
        Ok(key) => key,
        Err(resp) => return Ok(resp),
    };

    let mut ws = lock(state)?;
    let present = match edit(&mut *ws, semester, key) {
        Ok(present) => present,
        Err(e) => return Ok(edit_error(e)),
    };
    let entries = ws.timetable.store(semester).entries(key).to_vec();
    persist(state, &mut ws);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "present": present,
        "entries": entries,
    })))
}

async fn place_special(
    path: web::Path<(u8, String)>,
    req: web::Json<SpecialRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (semester, slot) = path.into_inner();
    let req = req.into_inner();
    edit_cell(&state, semester, &slot, |ws, semester, key| {
        let Workspace { students, timetable, .. } = ws;
        editing::place_special(timetable.store_mut(semester), key, students, req.student_id, &req.subject)
    })
}

async fn place_support(
    path: web::Path<(u8, String)>,
    req: web::Json<SupportRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (semester, slot) = path.into_inner();
    let req = req.into_inner();
    edit_cell(&state, semester, &slot, |ws, semester, key| {
        let Workspace { students, staff, timetable, .. } = ws;
        editing::place_support(timetable.store_mut(semester), key, students, staff, req.student_id, req.staff_id)
    })
}

async fn toggle_blocked(path: web::Path<(u8, String)>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let (semester, slot) = path.into_inner();
    edit_cell(&state, semester, &slot, |ws, semester, key| {
        Ok(editing::toggle_blocked(ws.timetable.store_mut(semester), key))
    })
}

async fn clear_student(path: web::Path<(u8, String, StudentId)>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let (semester, slot, student_id) = path.into_inner();
    edit_cell(&state, semester, &slot, |ws, semester, key| {
        editing::clear_student(ws.timetable.store_mut(semester), key, student_id)
    })
}

/// Registers every API route; shared by the server and the tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/students", web::get().to(list_students))
        .route("/api/students", web::post().to(create_student))
        .route("/api/students/{id}", web::put().to(update_student))
        .route("/api/students/{id}", web::delete().to(delete_student))
        .route("/api/staff", web::get().to(list_staff))
        .route("/api/staff", web::post().to(create_staff))
        .route("/api/staff/{id}", web::put().to(update_staff))
        .route("/api/staff/{id}", web::delete().to(delete_staff))
        .route("/api/attendance", web::get().to(get_attendance))
        .route("/api/attendance/{grade}/{day}/{period}/toggle", web::post().to(toggle_attendance))
        .route("/api/timetable/{semester}", web::get().to(get_timetable))
        .route("/api/timetable/{semester}/stats", web::get().to(get_stats))
        .route("/api/timetable/{semester}/assign", web::post().to(auto_assign))
        .route("/api/timetable/{semester}/reset", web::post().to(reset_timetable))
        .route("/api/timetable/{semester}/slots/{slot}/special", web::post().to(place_special))
        .route("/api/timetable/{semester}/slots/{slot}/support", web::post().to(place_support))
        .route("/api/timetable/{semester}/slots/{slot}/blocked", web::post().to(toggle_blocked))
        .route(
            "/api/timetable/{semester}/slots/{slot}/students/{student_id}",
            web::delete().to(clear_student),
        );
}

pub async fn start_server(port: u16, app_state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
