//! Error response envelopes.
//!
//! Handlers signal failure through actix error helpers, which produce plain
//! text bodies. The client expects every response to be JSON with a
//! `success` flag, so these handlers rewrap error bodies on the way out.
//! Responses that are already JSON pass through untouched.
use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpResponse, Result};

pub fn render_400<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>>
where
    B: MessageBody + 'static,
{
    envelope(res, "Bad request.")
}

pub fn render_404<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>>
where
    B: MessageBody + 'static,
{
    envelope(res, "Not found.")
}

/// Internal errors are logged at the point of failure. The original body may
/// carry implementation detail, so the client always gets the canned text.
pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>>
where
    B: MessageBody + 'static,
{
    let (req, res) = res.into_parts();
    let json = HttpResponse::build(res.status()).json(serde_json::json!({
        "success": false,
        "message": "Something went wrong on our end. Please try again later.",
    }));
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, json).map_into_right_body::<B>(),
    ))
}

fn is_json<B>(res: &ServiceResponse<B>) -> bool {
    res.headers()
        .get(header::CONTENT_TYPE)
        .map(|ct| ct.as_bytes().starts_with(b"application/json"))
        .unwrap_or(false)
}

/// Rewraps a non-JSON error body as `{"success": false, "message": ...}`,
/// keeping the handler's message text when there is one.
fn envelope<B>(res: ServiceResponse<B>, fallback: &'static str) -> Result<ErrorHandlerResponse<B>>
where
    B: MessageBody + 'static,
{
    if is_json(&res) {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let (req, res) = res.into_parts();
    let status = res.status();
    let body = res.into_body();

    let fut = async move {
        let bytes = actix_web::body::to_bytes(body)
            .await
            .ok()
            .unwrap_or_default();
        let message = match std::str::from_utf8(&bytes) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_owned(),
            _ => fallback.to_owned(),
        };
        let json = HttpResponse::build(status).json(serde_json::json!({
            "success": false,
            "message": message,
        }));
        Ok::<_, actix_web::Error>(ServiceResponse::new(req, json).map_into_right_body::<B>())
    };

    Ok(ErrorHandlerResponse::Future(Box::pin(fut)))
}
