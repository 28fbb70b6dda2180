//! Product catalog and review routes.
use crate::middleware::csrf::validate_csrf_token;
use crate::middleware::ClientCtx;
use crate::orm::users::Role;
use crate::products;
use crate::products::{ProductError, ProductInput};
use actix_web::{error, get, post, put, web, Error, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_catalog)
        .service(my_products)
        .service(create_product)
        .service(update_product)
        .service(submit_product)
        .service(admin_pending_products)
        .service(approve_product)
        .service(reject_product);
}

fn map_product_error(e: ProductError) -> Error {
    let message = e.to_string();
    match e {
        ProductError::Validation(_) => error::ErrorBadRequest(message),
        ProductError::NotFound => error::ErrorNotFound(message),
        ProductError::Forbidden => error::ErrorForbidden(message),
        ProductError::Conflict => error::ErrorConflict(message),
        ProductError::Db(e) => {
            log::error!("Product query failed: {}", e);
            error::ErrorInternalServerError("DB error")
        }
    }
}

#[derive(Deserialize)]
struct CatalogQuery {
    page: Option<u32>,
}

/// GET /api/products - The public catalog of approved products.
///
/// Paginated in memory off the cached approved set. Pages are 1-based;
/// an out-of-range page returns an empty list, not an error.
#[get("/api/products")]
pub async fn view_catalog(query: web::Query<CatalogQuery>) -> Result<impl Responder, Error> {
    let items = crate::cache::get_catalog().await.map_err(|e| {
        log::error!("Catalog load failed: {}", e);
        error::ErrorInternalServerError("DB error")
    })?;

    let page_size = crate::app_config::limits().catalog_page_size;
    let page = query.page.unwrap_or(1).max(1) as usize;
    let total = items.len();
    let start = (page - 1).saturating_mul(page_size);
    let products: Vec<_> = items.into_iter().skip(start).take(page_size).collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "products": products,
        "page": page,
        "pageSize": page_size,
        "total": total,
    })))
}

/// GET /api/products/mine - The founder's own listings, drafts included.
#[get("/api/products/mine")]
pub async fn my_products(client: ClientCtx) -> Result<impl Responder, Error> {
    let founder_id = client.require_role(Role::Founder)?;

    let products = products::founder_products(founder_id).await.map_err(|e| {
        log::error!("Product listing failed: {}", e);
        error::ErrorInternalServerError("DB error")
    })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "products": products })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    name: String,
    category: String,
    summary: String,
    description: String,
    #[serde(default)]
    business_model: Option<String>,
    #[serde(default)]
    pricing: Option<String>,
    /// Comma-separated tag list.
    #[serde(default)]
    tags: Option<String>,
    #[serde(default)]
    benefits: Option<String>,
    csrf_token: String,
}

impl ProductData {
    fn to_input(&self) -> ProductInput {
        ProductInput {
            name: self.name.clone(),
            category: self.category.clone(),
            summary: self.summary.clone(),
            description: self.description.clone(),
            business_model: self.business_model.clone(),
            pricing: self.pricing.clone(),
            tags: self.tags.clone(),
            benefits: self.benefits.clone(),
        }
    }
}

/// POST /api/products - Create a draft listing.
///
/// Drafts sit outside the verification gate; only submission for review
/// requires an approved founder.
#[post("/api/products")]
pub async fn create_product(
    client: ClientCtx,
    cookies: actix_session::Session,
    data: web::Json<ProductData>,
) -> Result<impl Responder, Error> {
    let founder_id = client.require_role(Role::Founder)?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    let product = products::create_product(founder_id, data.to_input())
        .await
        .map_err(map_product_error)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "productId": product.id,
        "status": product.status.as_str(),
    })))
}

/// PUT /api/products/{id} - Edit a draft or rejected listing.
#[put("/api/products/{product_id}")]
pub async fn update_product(
    client: ClientCtx,
    cookies: actix_session::Session,
    product_id: web::Path<i32>,
    data: web::Json<ProductData>,
) -> Result<impl Responder, Error> {
    let founder_id = client.require_role(Role::Founder)?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    products::update_product(founder_id, *product_id, data.to_input())
        .await
        .map_err(map_product_error)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct SubmitData {
    csrf_token: String,
}

/// POST /api/products/{id}/submit - Send a draft to the review queue.
#[post("/api/products/{product_id}/submit")]
pub async fn submit_product(
    client: ClientCtx,
    cookies: actix_session::Session,
    product_id: web::Path<i32>,
    data: web::Json<SubmitData>,
) -> Result<impl Responder, Error> {
    let founder_id = client.require_verified_founder()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    products::submit_product(founder_id, *product_id)
        .await
        .map_err(map_product_error)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// GET /api/products/admin/pending - Listings awaiting review.
#[get("/api/products/admin/pending")]
pub async fn admin_pending_products(client: ClientCtx) -> Result<impl Responder, Error> {
    client.require_staff()?;

    let products = products::admin_pending_products().await.map_err(|e| {
        log::error!("Pending product listing failed: {}", e);
        error::ErrorInternalServerError("DB error")
    })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "products": products })))
}

/// POST /api/products/admin/approve/{id}
#[post("/api/products/admin/approve/{product_id}")]
pub async fn approve_product(
    client: ClientCtx,
    cookies: actix_session::Session,
    product_id: web::Path<i32>,
    data: web::Json<SubmitData>,
) -> Result<impl Responder, Error> {
    let admin_id = client.require_staff()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    products::approve_product(admin_id, *product_id)
        .await
        .map_err(map_product_error)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct RejectProductData {
    reason: String,
    csrf_token: String,
}

/// POST /api/products/admin/reject/{id} - Reject with a reason the founder
/// will see.
#[post("/api/products/admin/reject/{product_id}")]
pub async fn reject_product(
    client: ClientCtx,
    cookies: actix_session::Session,
    product_id: web::Path<i32>,
    data: web::Json<RejectProductData>,
) -> Result<impl Responder, Error> {
    let admin_id = client.require_staff()?;
    validate_csrf_token(&cookies, &data.csrf_token)?;

    products::reject_product(admin_id, *product_id, &data.reason)
        .await
        .map_err(map_product_error)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
