//! Session teardown for `POST /api/auth/logout`.
use crate::session::{get_sess, remove_session};
use actix_web::{post, Error, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_logout);
}

/// Succeeds whether or not the caller held a live session. The cookies are
/// cleared even when the server-side record is already gone.
#[post("/api/auth/logout")]
pub async fn post_logout(cookies: actix_session::Session) -> Result<impl Responder, Error> {
    let token = cookies.get::<String>("token").unwrap_or_else(|e| {
        log::error!("Logout could not read the session cookie: {}", e);
        None
    });

    if let Some(token) = token {
        match Uuid::parse_str(&token) {
            Ok(uuid) => {
                if let Err(e) = remove_session(get_sess(), uuid).await {
                    log::error!("Logout could not drop session {}: {}", uuid, e);
                }
            }
            Err(e) => log::warn!("Logout saw a malformed session token: {}", e),
        }
    }

    cookies.remove("logged_in");
    cookies.remove("token");

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
