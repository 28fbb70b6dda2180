//! Product listings and their review lifecycle
//!
//! Founders draft listings freely; publishing is gated twice. Submission
//! requires the founder to have passed document verification, and only an
//! admin approval makes a listing visible to investors. The catalog read
//! path serves approved listings only and is cached in `crate::cache`.

use crate::db::get_db_pool;
use crate::notifications::dispatcher;
use crate::orm::products;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, DbErr, Set};
use serde::Serialize;
use std::collections::HashMap;

/// Product operation errors.
#[derive(Debug)]
pub enum ProductError {
    /// Input failed validation; nothing was written
    Validation(&'static str),
    /// Product does not exist
    NotFound,
    /// Caller does not own this product
    Forbidden,
    /// Product is not in a status that allows this operation
    Conflict,
    /// Database error
    Db(DbErr),
}

impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductError::Validation(msg) => write!(f, "{}", msg),
            ProductError::NotFound => write!(f, "Product not found."),
            ProductError::Forbidden => write!(f, "You do not own this product."),
            ProductError::Conflict => {
                write!(f, "This product changed state. Refresh and try again.")
            }
            ProductError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for ProductError {}

impl From<DbErr> for ProductError {
    fn from(e: DbErr) -> Self {
        ProductError::Db(e)
    }
}

/// Editable listing fields, shared by create and update.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub category: String,
    pub summary: String,
    pub description: String,
    pub business_model: Option<String>,
    pub pricing: Option<String>,
    pub tags: Option<String>,
    pub benefits: Option<String>,
}

/// Approved listing as shown in the investor catalog.
///
/// Deliberately carries no founder identity; introductions go through the
/// mediated query pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub summary: String,
    pub description: String,
    pub business_model: Option<String>,
    pub pricing: Option<String>,
    pub tags: Vec<String>,
    pub benefits: Option<String>,
    pub interest_count: i32,
    pub created_at: chrono::NaiveDateTime,
}

/// Listing as shown to its owning founder.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub summary: String,
    pub description: String,
    pub business_model: Option<String>,
    pub pricing: Option<String>,
    pub tags: Vec<String>,
    pub benefits: Option<String>,
    pub status: &'static str,
    pub interest_count: i32,
    pub rejection_reason: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

/// Listing as shown in the admin review queue.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProductView {
    pub id: i32,
    pub founder_id: i32,
    pub founder_name: String,
    pub name: String,
    pub category: String,
    pub summary: String,
    pub description: String,
    pub business_model: Option<String>,
    pub pricing: Option<String>,
    pub tags: Vec<String>,
    pub benefits: Option<String>,
    pub status: &'static str,
    pub created_at: chrono::NaiveDateTime,
}

/// Split the stored comma-separated tag string into display tags.
pub fn split_tags(tags: &Option<String>) -> Vec<String> {
    tags.as_deref()
        .map(|t| {
            t.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn validate_input(input: &ProductInput) -> Result<(), ProductError> {
    if input.name.trim().is_empty() {
        return Err(ProductError::Validation("A product name is required."));
    }
    if input.name.len() > 255 {
        return Err(ProductError::Validation("The product name is too long."));
    }
    if input.category.trim().is_empty() {
        return Err(ProductError::Validation("A category is required."));
    }
    if input.summary.trim().is_empty() {
        return Err(ProductError::Validation("A summary is required."));
    }
    if input.summary.len() > 255 {
        return Err(ProductError::Validation("The summary is too long."));
    }
    if input.description.trim().is_empty() {
        return Err(ProductError::Validation("A description is required."));
    }
    if input.description.len() > crate::app_config::limits().max_message_length {
        return Err(ProductError::Validation("The description is too long."));
    }
    Ok(())
}

/// Create a draft listing. Drafts are founder-private and do not require
/// passed verification; submission for review does.
pub async fn create_product(
    founder_id: i32,
    input: ProductInput,
) -> Result<products::Model, ProductError> {
    validate_input(&input)?;

    let db = get_db_pool();
    let now = Utc::now().naive_utc();

    let product = products::ActiveModel {
        founder_id: Set(founder_id),
        name: Set(input.name.trim().to_string()),
        category: Set(input.category.trim().to_string()),
        summary: Set(input.summary.trim().to_string()),
        description: Set(input.description.trim().to_string()),
        business_model: Set(input.business_model),
        pricing: Set(input.pricing),
        tags: Set(input.tags),
        benefits: Set(input.benefits),
        status: Set(products::ProductStatus::Draft),
        interest_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(product)
}

/// Update a listing's editable fields. Allowed only while the listing is a
/// draft or was rejected; listings under review or live stay frozen.
pub async fn update_product(
    founder_id: i32,
    product_id: i32,
    input: ProductInput,
) -> Result<(), ProductError> {
    validate_input(&input)?;

    let db = get_db_pool();

    let product = products::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(ProductError::NotFound)?;

    if product.founder_id != founder_id {
        return Err(ProductError::Forbidden);
    }
    if !matches!(
        product.status,
        products::ProductStatus::Draft | products::ProductStatus::Rejected
    ) {
        return Err(ProductError::Conflict);
    }

    let mut active: products::ActiveModel = product.into();
    active.name = Set(input.name.trim().to_string());
    active.category = Set(input.category.trim().to_string());
    active.summary = Set(input.summary.trim().to_string());
    active.description = Set(input.description.trim().to_string());
    active.business_model = Set(input.business_model);
    active.pricing = Set(input.pricing);
    active.tags = Set(input.tags);
    active.benefits = Set(input.benefits);
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(db).await?;

    Ok(())
}

/// Submit a draft or rejected listing for admin review.
///
/// Clears any previous rejection feedback. Admins are notified after the
/// status lands.
pub async fn submit_product(founder_id: i32, product_id: i32) -> Result<(), ProductError> {
    let db = get_db_pool();

    let product = products::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(ProductError::NotFound)?;

    if product.founder_id != founder_id {
        return Err(ProductError::Forbidden);
    }
    if !matches!(
        product.status,
        products::ProductStatus::Draft | products::ProductStatus::Rejected
    ) {
        return Err(ProductError::Conflict);
    }

    let now = Utc::now().naive_utc();

    let result = products::Entity::update_many()
        .col_expr(
            products::Column::Status,
            Expr::value(products::ProductStatus::Pending.to_value()),
        )
        .col_expr(
            products::Column::RejectionReason,
            Expr::value(Option::<String>::None),
        )
        .col_expr(products::Column::ReviewerId, Expr::value(Option::<i32>::None))
        .col_expr(products::Column::UpdatedAt, Expr::value(now))
        .filter(products::Column::Id.eq(product_id))
        .filter(products::Column::Status.eq(product.status.to_value()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ProductError::Conflict);
    }

    if let Err(e) =
        dispatcher::notify_product_submitted(product_id, founder_id, &product.name).await
    {
        log::warn!(
            "Failed to notify admins of product {} submission: {}",
            product_id,
            e
        );
    }

    Ok(())
}

/// Admin approves a pending listing, making it catalog-visible.
pub async fn approve_product(admin_id: i32, product_id: i32) -> Result<(), ProductError> {
    let db = get_db_pool();

    let product = products::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(ProductError::NotFound)?;

    let now = Utc::now().naive_utc();

    let result = products::Entity::update_many()
        .col_expr(
            products::Column::Status,
            Expr::value(products::ProductStatus::Approved.to_value()),
        )
        .col_expr(products::Column::ReviewerId, Expr::value(admin_id))
        .col_expr(
            products::Column::RejectionReason,
            Expr::value(Option::<String>::None),
        )
        .col_expr(products::Column::UpdatedAt, Expr::value(now))
        .filter(products::Column::Id.eq(product_id))
        .filter(products::Column::Status.eq(products::ProductStatus::Pending.to_value()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ProductError::Conflict);
    }

    crate::cache::invalidate_catalog();

    if let Err(e) =
        dispatcher::notify_product_reviewed(product.founder_id, product_id, &product.name, true, None)
            .await
    {
        log::warn!(
            "Failed to notify founder of product {} approval: {}",
            product_id,
            e
        );
    }

    Ok(())
}

/// Admin rejects a pending listing with feedback for the founder.
pub async fn reject_product(
    admin_id: i32,
    product_id: i32,
    reason: &str,
) -> Result<(), ProductError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ProductError::Validation("A rejection reason is required."));
    }

    let db = get_db_pool();

    let product = products::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(ProductError::NotFound)?;

    let now = Utc::now().naive_utc();

    let result = products::Entity::update_many()
        .col_expr(
            products::Column::Status,
            Expr::value(products::ProductStatus::Rejected.to_value()),
        )
        .col_expr(products::Column::ReviewerId, Expr::value(admin_id))
        .col_expr(
            products::Column::RejectionReason,
            Expr::value(Some(reason.to_string())),
        )
        .col_expr(products::Column::UpdatedAt, Expr::value(now))
        .filter(products::Column::Id.eq(product_id))
        .filter(products::Column::Status.eq(products::ProductStatus::Pending.to_value()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ProductError::Conflict);
    }

    if let Err(e) = dispatcher::notify_product_reviewed(
        product.founder_id,
        product_id,
        &product.name,
        false,
        Some(reason),
    )
    .await
    {
        log::warn!(
            "Failed to notify founder of product {} rejection: {}",
            product_id,
            e
        );
    }

    Ok(())
}

/// All approved listings, newest first. Backing load for the catalog cache.
pub async fn load_catalog() -> Result<Vec<CatalogItem>, DbErr> {
    let db = get_db_pool();

    let rows = products::Entity::find()
        .filter(products::Column::Status.eq(products::ProductStatus::Approved.to_value()))
        .order_by_desc(products::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|p| CatalogItem {
            id: p.id,
            name: p.name,
            category: p.category,
            summary: p.summary,
            description: p.description,
            business_model: p.business_model,
            pricing: p.pricing,
            tags: split_tags(&p.tags),
            benefits: p.benefits,
            interest_count: p.interest_count,
            created_at: p.created_at,
        })
        .collect())
}

/// A founder's own listings, any status, newest first.
pub async fn founder_products(founder_id: i32) -> Result<Vec<ProductView>, DbErr> {
    let db = get_db_pool();

    let rows = products::Entity::find()
        .filter(products::Column::FounderId.eq(founder_id))
        .order_by_desc(products::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|p| ProductView {
            id: p.id,
            name: p.name,
            category: p.category,
            summary: p.summary,
            description: p.description,
            business_model: p.business_model,
            pricing: p.pricing,
            tags: split_tags(&p.tags),
            benefits: p.benefits,
            status: p.status.as_str(),
            interest_count: p.interest_count,
            rejection_reason: p.rejection_reason,
            created_at: p.created_at,
            updated_at: p.updated_at,
        })
        .collect())
}

/// Listings waiting for review, oldest first.
pub async fn admin_pending_products() -> Result<Vec<AdminProductView>, DbErr> {
    let db = get_db_pool();

    let rows = products::Entity::find()
        .filter(products::Column::Status.eq(products::ProductStatus::Pending.to_value()))
        .order_by_asc(products::Column::CreatedAt)
        .all(db)
        .await?;

    let mut founder_ids: Vec<i32> = rows.iter().map(|p| p.founder_id).collect();
    founder_ids.sort_unstable();
    founder_ids.dedup();

    let founder_names: HashMap<i32, String> = crate::orm::users::Entity::find()
        .filter(crate::orm::users::Column::Id.is_in(founder_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    Ok(rows
        .into_iter()
        .map(|p| AdminProductView {
            id: p.id,
            founder_id: p.founder_id,
            founder_name: founder_names.get(&p.founder_id).cloned().unwrap_or_default(),
            name: p.name,
            category: p.category,
            summary: p.summary,
            description: p.description,
            business_model: p.business_model,
            pricing: p.pricing,
            tags: split_tags(&p.tags),
            benefits: p.benefits,
            status: p.status.as_str(),
            created_at: p.created_at,
        })
        .collect())
}
