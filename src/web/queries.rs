//! Investor query routes.
//!
//! Every exchange between an investor and a founder passes through the
//! admin review queue. Handlers here expose the three participant
//! surfaces: investor submission and history, the founder inbox and
//! response, and the admin approval queues.
use crate::mediation;
use crate::mediation::MediationError;
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use crate::orm::users::Role;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(express_interest)
        .service(submit_interest_form)
        .service(my_queries)
        .service(founder_responses)
        .service(respond_to_request)
        .service(admin_investor_queries)
        .service(admin_founder_responses)
        .service(admin_query_detail)
        .service(approve_investor_query)
        .service(approve_founder_response)
        .service(reject_query);
}

fn map_mediation_error(e: MediationError) -> Error {
    let message = e.to_string();
    match e {
        MediationError::Validation(_) => error::ErrorBadRequest(message),
        MediationError::NotFound => error::ErrorNotFound(message),
        MediationError::Forbidden => error::ErrorForbidden(message),
        MediationError::Conflict | MediationError::Duplicate => error::ErrorConflict(message),
        MediationError::Db(e) => {
            log::error!("Mediation query failed: {}", e);
            error::ErrorInternalServerError("DB error")
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressInterestData {
    product_id: i32,
    /// Echo of the product name for the client's optimistic UI. The product
    /// row is authoritative, so this is never read server side.
    #[serde(default)]
    #[allow(dead_code)]
    product_name: Option<String>,
    primary_intent: String,
    #[serde(default)]
    intent_detail: Option<String>,
    #[serde(default)]
    areas_of_interest: Vec<String>,
    original_question: String,
    csrf_token: String,
}

/// POST /api/query/investor/express-interest
///
/// Opens a query against an approved product. The question goes to the
/// admin queue, not the founder.
#[post("/api/query/investor/express-interest")]
pub async fn express_interest(
    client: ClientCtx,
    cookies: actix_session::Session,
    data: web::Json<ExpressInterestData>,
) -> Result<impl Responder, Error> {
    let investor_id = client.require_role(Role::Investor)?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    if let Err(e) = crate::rate_limit::check_query_rate_limit(investor_id) {
        return Err(error::ErrorTooManyRequests(format!(
            "Too many queries. Please wait {} seconds.",
            e.retry_after_seconds
        )));
    }

    let query = mediation::submit_investor_query(
        investor_id,
        data.product_id,
        &data.primary_intent,
        data.intent_detail.as_deref(),
        &data.areas_of_interest,
        &data.original_question,
    )
    .await
    .map_err(map_mediation_error)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "queryId": query.id,
        "status": query.status.as_str(),
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestFormData {
    product_id: i32,
    message: String,
    csrf_token: String,
}

/// POST /api/matchmaking/interest-forms
///
/// The lightweight "tell me more" form. Stored as a regular query under a
/// General Interest intent so it rides the same review pipeline.
#[post("/api/matchmaking/interest-forms")]
pub async fn submit_interest_form(
    client: ClientCtx,
    cookies: actix_session::Session,
    data: web::Json<InterestFormData>,
) -> Result<impl Responder, Error> {
    let investor_id = client.require_role(Role::Investor)?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    if let Err(e) = crate::rate_limit::check_query_rate_limit(investor_id) {
        return Err(error::ErrorTooManyRequests(format!(
            "Too many queries. Please wait {} seconds.",
            e.retry_after_seconds
        )));
    }

    let query = mediation::submit_investor_query(
        investor_id,
        data.product_id,
        "General Interest",
        None,
        &[],
        &data.message,
    )
    .await
    .map_err(map_mediation_error)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "queryId": query.id,
    })))
}

/// GET /api/query/investor/my
#[get("/api/query/investor/my")]
pub async fn my_queries(client: ClientCtx) -> Result<impl Responder, Error> {
    let investor_id = client.require_role(Role::Investor)?;

    let queries = mediation::investor_queries(investor_id).await.map_err(|e| {
        log::error!("Investor query listing failed: {}", e);
        error::ErrorInternalServerError("DB error")
    })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "queries": queries })))
}

/// GET /api/query/founder/responses
///
/// The founder inbox. Only queries an admin has forwarded show up, and
/// each carries the approved question text, never the original.
#[get("/api/query/founder/responses")]
pub async fn founder_responses(client: ClientCtx) -> Result<impl Responder, Error> {
    let founder_id = client.require_role(Role::Founder)?;

    let queries = mediation::founder_queries(founder_id).await.map_err(|e| {
        log::error!("Founder query listing failed: {}", e);
        error::ErrorInternalServerError("DB error")
    })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "queries": queries })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FounderResponseData {
    query_id: i32,
    #[serde(default)]
    founder_selected_topics: Vec<String>,
    /// The response text. The field keeps the name deployed clients send.
    founder_original_question: String,
    csrf_token: String,
}

/// POST /api/query/founder/respond-to-request
#[post("/api/query/founder/respond-to-request")]
pub async fn respond_to_request(
    client: ClientCtx,
    cookies: actix_session::Session,
    data: web::Json<FounderResponseData>,
) -> Result<impl Responder, Error> {
    let founder_id = client.require_verified_founder()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    mediation::submit_founder_response(
        founder_id,
        data.query_id,
        &data.founder_selected_topics,
        &data.founder_original_question,
    )
    .await
    .map_err(map_mediation_error)?;

    // Advisory only. Redaction is an admin editing text, not a scanner.
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "filterNotice": "Personal contact information will be filtered before your reply is delivered.",
    })))
}

/// GET /api/query/admin/investor-queries - Stage one review queue.
#[get("/api/query/admin/investor-queries")]
pub async fn admin_investor_queries(client: ClientCtx) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let queries = mediation::admin_investor_queue().await.map_err(|e| {
        log::error!("Admin queue listing failed: {}", e);
        error::ErrorInternalServerError("DB error")
    })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "queries": queries })))
}

/// GET /api/query/admin/founder-responses - Stage two review queue.
#[get("/api/query/admin/founder-responses")]
pub async fn admin_founder_responses(client: ClientCtx) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let queries = mediation::admin_response_queue().await.map_err(|e| {
        log::error!("Admin queue listing failed: {}", e);
        error::ErrorInternalServerError("DB error")
    })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "queries": queries })))
}

/// GET /api/query/admin/detail/{id} - One query with both original texts.
#[get("/api/query/admin/detail/{query_id}")]
pub async fn admin_query_detail(
    client: ClientCtx,
    query_id: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let query = mediation::admin_query_detail(*query_id)
        .await
        .map_err(|e| {
            log::error!("Admin query lookup failed: {}", e);
            error::ErrorInternalServerError("DB error")
        })?
        .ok_or_else(|| error::ErrorNotFound("No such query."))?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "query": query })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalData {
    approved_text: String,
    csrf_token: String,
}

/// POST /api/query/admin/approve-investor-query/{id}
///
/// Forwards the admin's edited question text to the founder. What the
/// founder sees is exactly this text.
#[post("/api/query/admin/approve-investor-query/{query_id}")]
pub async fn approve_investor_query(
    client: ClientCtx,
    cookies: actix_session::Session,
    query_id: web::Path<i32>,
    data: web::Json<ApprovalData>,
) -> Result<impl Responder, Error> {
    let admin_id = client.require_staff()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    mediation::approve_investor_query(admin_id, *query_id, &data.approved_text)
        .await
        .map_err(map_mediation_error)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// POST /api/query/admin/approve-founder-response/{id}
///
/// Delivers the admin's edited response text to the investor and closes
/// the loop.
#[post("/api/query/admin/approve-founder-response/{query_id}")]
pub async fn approve_founder_response(
    client: ClientCtx,
    cookies: actix_session::Session,
    query_id: web::Path<i32>,
    data: web::Json<ApprovalData>,
) -> Result<impl Responder, Error> {
    let admin_id = client.require_staff()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    mediation::approve_founder_response(admin_id, *query_id, &data.approved_text)
        .await
        .map_err(map_mediation_error)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct RejectData {
    csrf_token: String,
}

/// POST /api/query/admin/reject/{id}
///
/// Works from either review stage. The side waiting on the admin is
/// notified; the counterparty never learns the exchange existed.
#[post("/api/query/admin/reject/{query_id}")]
pub async fn reject_query(
    client: ClientCtx,
    cookies: actix_session::Session,
    query_id: web::Path<i32>,
    data: web::Json<RejectData>,
) -> Result<impl Responder, Error> {
    let admin_id = client.require_staff()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    mediation::reject_query(admin_id, *query_id)
        .await
        .map_err(map_mediation_error)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
