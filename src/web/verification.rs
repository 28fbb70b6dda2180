//! Founder document verification routes.
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use crate::orm::users::Role;
use crate::verification;
use crate::verification::VerificationError;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(document_checklist)
        .service(submit_documents)
        .service(verification_status)
        .service(admin_pending)
        .service(review_documents);
}

fn map_verification_error(e: VerificationError) -> Error {
    let message = e.to_string();
    match e {
        VerificationError::Validation(_) => error::ErrorBadRequest(message),
        VerificationError::NotFound => error::ErrorNotFound(message),
        VerificationError::Conflict => error::ErrorConflict(message),
        VerificationError::Db(e) => {
            log::error!("Verification query failed: {}", e);
            error::ErrorInternalServerError("DB error")
        }
    }
}

/// GET /api/verification/checklist - The canonical document slots.
#[get("/api/verification/checklist")]
pub async fn document_checklist() -> Result<impl Responder, Error> {
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "documents": verification::DOCUMENT_KEYS,
        "required": verification::REQUIRED_DOCUMENT_KEYS,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpload {
    document_type: String,
    file_path: String,
}

#[derive(Deserialize)]
pub struct SubmitDocumentsData {
    documents: Vec<DocumentUpload>,
    csrf_token: String,
}

/// POST /api/verification/documents - Submit or replace documents.
///
/// Resubmission after a rejection goes through the same door; an already
/// approved founder cannot reopen the gate.
#[post("/api/verification/documents")]
pub async fn submit_documents(
    client: ClientCtx,
    cookies: actix_session::Session,
    data: web::Json<SubmitDocumentsData>,
) -> Result<impl Responder, Error> {
    let founder_id = client.require_role(Role::Founder)?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    let documents: Vec<(String, String)> = data
        .documents
        .iter()
        .map(|d| (d.document_type.clone(), d.file_path.clone()))
        .collect();

    verification::submit_documents(founder_id, &documents)
        .await
        .map_err(map_verification_error)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// GET /api/verification/status - The caller's own gate state.
#[get("/api/verification/status")]
pub async fn verification_status(client: ClientCtx) -> Result<impl Responder, Error> {
    let founder_id = client.require_role(Role::Founder)?;

    let view = verification::founder_verification(founder_id)
        .await
        .map_err(|e| {
            log::error!("Verification status lookup failed: {}", e);
            error::ErrorInternalServerError("DB error")
        })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "verification": view })))
}

/// GET /api/verification/admin/pending - Founders awaiting review.
#[get("/api/verification/admin/pending")]
pub async fn admin_pending(client: ClientCtx) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let founders = verification::admin_pending_verifications()
        .await
        .map_err(|e| {
            log::error!("Pending verification listing failed: {}", e);
            error::ErrorInternalServerError("DB error")
        })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "founders": founders })))
}

#[derive(Deserialize)]
pub struct ReviewData {
    approve: bool,
    #[serde(default)]
    reason: Option<String>,
    csrf_token: String,
}

/// POST /api/verification/admin/review/{founder_id}
///
/// Approves or rejects the founder's whole document set. Rejection
/// requires a reason the founder will see.
#[post("/api/verification/admin/review/{founder_id}")]
pub async fn review_documents(
    client: ClientCtx,
    cookies: actix_session::Session,
    founder_id: web::Path<i32>,
    data: web::Json<ReviewData>,
) -> Result<impl Responder, Error> {
    let admin_id = client.require_staff()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    verification::review_documents(admin_id, *founder_id, data.approve, data.reason.as_deref())
        .await
        .map_err(map_verification_error)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
