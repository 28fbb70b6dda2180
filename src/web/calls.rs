//! Call scheduling routes.
//!
//! Participants never contact each other directly; staff broker every
//! call. The zoom prefix is historical, kept for deployed clients.
use crate::calls;
use crate::calls::CallError;
use crate::db::get_db_pool;
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(request_call)
        .service(my_requests)
        .service(admin_queue)
        .service(advance_call)
        .service(reject_call);
}

fn map_call_error(e: CallError) -> Error {
    let message = e.to_string();
    match e {
        CallError::Validation(_) => error::ErrorBadRequest(message),
        CallError::NotFound => error::ErrorNotFound(message),
        CallError::Conflict => error::ErrorConflict(message),
        CallError::Db(e) => {
            log::error!("Call request query failed: {}", e);
            error::ErrorInternalServerError("DB error")
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequestData {
    target_role: String,
    topic: String,
    message: String,
    /// Naive local timestamp, e.g. 2026-03-01T15:00:00.
    proposed_date: chrono::NaiveDateTime,
    csrf_token: String,
}

/// POST /api/zoom/request - Ask staff to broker a call.
#[post("/api/zoom/request")]
pub async fn request_call(
    client: ClientCtx,
    cookies: actix_session::Session,
    data: web::Json<CallRequestData>,
) -> Result<impl Responder, Error> {
    let requester_id = client.require_login()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    if let Err(e) = crate::rate_limit::check_call_request_rate_limit(requester_id) {
        return Err(error::ErrorTooManyRequests(format!(
            "Too many call requests. Please wait {} seconds.",
            e.retry_after_seconds
        )));
    }

    let call = calls::create_call_request(
        requester_id,
        &data.target_role,
        &data.topic,
        &data.message,
        data.proposed_date,
    )
    .await
    .map_err(map_call_error)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "callId": call.id,
        "status": call.status.as_str(),
    })))
}

/// GET /api/zoom/requests/my
#[get("/api/zoom/requests/my")]
pub async fn my_requests(client: ClientCtx) -> Result<impl Responder, Error> {
    let requester_id = client.require_login()?;

    let requests = calls::my_call_requests(requester_id).await.map_err(|e| {
        log::error!("Call request listing failed: {}", e);
        error::ErrorInternalServerError("DB error")
    })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "requests": requests })))
}

/// GET /api/zoom/admin/queue - Requests still needing staff action.
#[get("/api/zoom/admin/queue")]
pub async fn admin_queue(client: ClientCtx) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let requests = calls::admin_call_queue().await.map_err(|e| {
        log::error!("Call queue listing failed: {}", e);
        error::ErrorInternalServerError("DB error")
    })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "requests": requests })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceCallData {
    /// Username of the counterparty staff attach while approving or
    /// scheduling.
    #[serde(default)]
    target_username: Option<String>,
    #[serde(default)]
    note: Option<String>,
    csrf_token: String,
}

/// POST /api/zoom/admin/advance/{id}
///
/// Steps a request along pending -> approved -> scheduled -> completed.
#[post("/api/zoom/admin/advance/{call_id}")]
pub async fn advance_call(
    client: ClientCtx,
    cookies: actix_session::Session,
    call_id: web::Path<i32>,
    data: web::Json<AdvanceCallData>,
) -> Result<impl Responder, Error> {
    let admin_id = client.require_staff()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    // Look up the counterparty by username
    let target_user_id = match data.target_username.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Some(
            crate::user::get_user_id_from_username(get_db_pool(), name)
                .await
                .ok_or_else(|| error::ErrorBadRequest(format!("User '{}' not found", name)))?,
        ),
        _ => None,
    };

    let status = calls::advance_call(admin_id, *call_id, target_user_id, data.note.as_deref())
        .await
        .map_err(map_call_error)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "status": status.as_str() })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectCallData {
    #[serde(default)]
    note: Option<String>,
    csrf_token: String,
}

/// POST /api/zoom/admin/reject/{id} - Decline a pending request.
#[post("/api/zoom/admin/reject/{call_id}")]
pub async fn reject_call(
    client: ClientCtx,
    cookies: actix_session::Session,
    call_id: web::Path<i32>,
    data: web::Json<RejectCallData>,
) -> Result<impl Responder, Error> {
    let admin_id = client.require_staff()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    calls::reject_call(admin_id, *call_id, data.note.as_deref())
        .await
        .map_err(map_call_error)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
