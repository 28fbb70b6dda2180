//! Navigation gating for the client shell.
use crate::gate;
use crate::middleware::ClientCtx;
use actix_web::{get, web, Error, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(check_route_access);
}

#[derive(Deserialize)]
struct RouteQuery {
    path: String,
}

/// GET /api/route-access?path=/founder/dashboard
///
/// The client asks before rendering a navigation target. Guests are a
/// valid viewer here; the decision for them is usually a login redirect.
#[get("/api/route-access")]
pub async fn check_route_access(
    client: ClientCtx,
    query: web::Query<RouteQuery>,
) -> Result<impl Responder, Error> {
    let viewer = client.get_user().map(|user| gate::Viewer {
        role: user.role,
        verification_status: user.verification_status,
    });

    let decision = gate::resolve_path(&query.path, viewer);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "access": decision,
        "redirectTo": decision.redirect_to(),
    })))
}
