//! Notification inbox routes.
//!
//! The client polls these on page load and keeps a socket open for live
//! updates; both views are fed from the same rows.
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use crate::notifications::{self, NotificationView};
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_notifications)
        .service(mark_read)
        .service(mark_all_read);
}

const DEFAULT_PAGE: u64 = 50;
const MAX_PAGE: u64 = 200;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboxQuery {
    show_read: Option<bool>,
    limit: Option<u64>,
}

/// GET /api/notifications - The caller's inbox, newest first.
#[get("/api/notifications")]
pub async fn list_notifications(
    client: ClientCtx,
    query: web::Query<InboxQuery>,
) -> Result<impl Responder, Error> {
    let user_id = client.require_login()?;

    let show_read = query.show_read.unwrap_or(false);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE).min(MAX_PAGE);

    let rows = notifications::get_user_notifications(user_id, limit, show_read)
        .await
        .map_err(|e| {
            log::error!("Notification listing failed: {}", e);
            error::ErrorInternalServerError("DB error")
        })?;
    let unread = notifications::count_unread_notifications(user_id)
        .await
        .map_err(|e| {
            log::error!("Unread count failed: {}", e);
            error::ErrorInternalServerError("DB error")
        })?;

    let items: Vec<NotificationView> = rows.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "notifications": items,
        "unreadCount": unread,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkReadData {
    csrf_token: String,
}

/// POST /api/notifications/{id}/read
///
/// A no-op for ids the caller does not own.
#[post("/api/notifications/{id}/read")]
pub async fn mark_read(
    client: ClientCtx,
    cookies: actix_session::Session,
    notification_id: web::Path<i32>,
    data: web::Json<MarkReadData>,
) -> Result<impl Responder, Error> {
    let user_id = client.require_login()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    notifications::mark_notification_read(*notification_id, user_id)
        .await
        .map_err(|e| {
            log::error!("Mark-read failed: {}", e);
            error::ErrorInternalServerError("DB error")
        })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// POST /api/notifications/read-all
#[post("/api/notifications/read-all")]
pub async fn mark_all_read(
    client: ClientCtx,
    cookies: actix_session::Session,
    data: web::Json<MarkReadData>,
) -> Result<impl Responder, Error> {
    let user_id = client.require_login()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    notifications::mark_all_read(user_id)
        .await
        .map_err(|e| {
            log::error!("Mark-all-read failed: {}", e);
            error::ErrorInternalServerError("DB error")
        })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
