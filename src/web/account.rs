//! Session introspection.
use crate::middleware::ClientCtx;
use actix_web::{error, get, Error, HttpResponse, Responder};
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_me);
}

/// GET /api/auth/me
///
/// The client's boot probe: who is logged in, the CSRF token to echo back
/// on mutations, and the unread badge count. The top-level userType field
/// duplicates user.role for clients that predate the role field.
#[get("/api/auth/me")]
pub async fn view_me(client: ClientCtx) -> Result<impl Responder, Error> {
    let user = client
        .get_user()
        .ok_or_else(|| error::ErrorUnauthorized("Login required"))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": user,
        "userType": user.role.as_str(),
        "csrfToken": client.get_csrf_token(),
        "unreadNotifications": client.get_unread_notifications(),
    })))
}
