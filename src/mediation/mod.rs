//! Admin-mediated query pipeline between investors and founders
//!
//! Every investor question and every founder answer passes through an
//! administrator before the counterparty sees it. The record keeps both the
//! raw text and the admin-approved text for each side; only the approved
//! text ever crosses the boundary. Status is the single source of truth for
//! what may happen next, and every transition re-checks it at write time.
//!
//! Lifecycle:
//!
//! ```text
//! PendingAdminReview -> ForwardedToFounder -> PendingResponseReview -> DeliveredToInvestor
//!        |                                           |
//!        +------------------> Rejected <-------------+
//! ```

use crate::db::get_db_pool;
use crate::notifications::dispatcher;
use crate::orm::query_topics::TopicSide;
use crate::orm::{products, queries, query_topics, users};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, DbErr, Set};
use serde::Serialize;
use std::collections::HashMap;

/// Primary intents an investor may declare when expressing interest.
/// "Other" requires an accompanying free-text detail.
pub const PRIMARY_INTENTS: &[&str] = &[
    "Equity Investment",
    "Debt Financing",
    "Partnership",
    "Acquisition Interest",
    "General Interest",
    "Other",
];

/// Mediation operation errors.
#[derive(Debug)]
pub enum MediationError {
    /// Input failed validation; nothing was written
    Validation(&'static str),
    /// Record or product does not exist (or is not visible to the caller)
    NotFound,
    /// Caller is not a party to this record
    Forbidden,
    /// Record is not in the status this transition requires
    Conflict,
    /// The investor already has an undecided query on this product
    Duplicate,
    /// Database error
    Db(DbErr),
}

impl std::fmt::Display for MediationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediationError::Validation(msg) => write!(f, "{}", msg),
            MediationError::NotFound => write!(f, "Record not found."),
            MediationError::Forbidden => write!(f, "You are not a party to this record."),
            MediationError::Conflict => {
                write!(f, "This record changed state. Refresh and try again.")
            }
            MediationError::Duplicate => {
                write!(f, "You already have an open query for this product.")
            }
            MediationError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for MediationError {}

impl From<DbErr> for MediationError {
    fn from(e: DbErr) -> Self {
        MediationError::Db(e)
    }
}

/// What the founder is allowed to see of a query record.
///
/// Carries the admin-approved question only. The investor's identity and raw
/// question never appear here.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FounderQueryView {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub primary_intent: String,
    pub intent_detail: Option<String>,
    pub areas_of_interest: Vec<String>,
    pub approved_question: String,
    pub founder_selected_topics: Vec<String>,
    pub founder_original_question: Option<String>,
    pub status: &'static str,
    pub question_approved_at: Option<chrono::NaiveDateTime>,
    pub responded_at: Option<chrono::NaiveDateTime>,
}

/// What the investor sees of their own query records.
///
/// The founder's raw reply is never present; `approved_response` is filled
/// only once the record reaches `DeliveredToInvestor`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorQueryView {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub primary_intent: String,
    pub intent_detail: Option<String>,
    pub areas_of_interest: Vec<String>,
    pub original_question: String,
    pub approved_response: Option<String>,
    pub status: &'static str,
    pub created_at: chrono::NaiveDateTime,
    pub response_approved_at: Option<chrono::NaiveDateTime>,
}

/// Full record as shown in the admin review queues.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQueryView {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub investor_id: i32,
    pub investor_name: String,
    pub founder_id: i32,
    pub founder_name: String,
    pub primary_intent: String,
    pub intent_detail: Option<String>,
    pub areas_of_interest: Vec<String>,
    pub original_question: String,
    pub approved_question: Option<String>,
    pub founder_selected_topics: Vec<String>,
    pub original_response: Option<String>,
    pub approved_response: Option<String>,
    pub status: &'static str,
    pub reviewer_id: Option<i32>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

/// Collapse a raw topic list into a sorted, deduplicated set.
/// Whitespace-only entries vanish.
pub fn normalize_topics(topics: &[String]) -> Vec<String> {
    let mut out: Vec<String> = topics
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Check an intent against the allowed set, with the "Other" detail rule.
fn validate_intent(primary_intent: &str, intent_detail: Option<&str>) -> Result<(), MediationError> {
    if !PRIMARY_INTENTS.contains(&primary_intent) {
        return Err(MediationError::Validation("Unknown primary intent."));
    }
    if primary_intent == "Other"
        && intent_detail.map(|d| d.trim().is_empty()).unwrap_or(true)
    {
        return Err(MediationError::Validation(
            "A short description is required when the intent is Other.",
        ));
    }
    Ok(())
}

/// Trim a free-text field and enforce presence plus the configured cap.
fn validate_text<'a>(text: &'a str, missing: &'static str) -> Result<&'a str, MediationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(MediationError::Validation(missing));
    }
    if text.len() > crate::app_config::limits().max_message_length {
        return Err(MediationError::Validation("Text is too long."));
    }
    Ok(text)
}

fn validate_topic_count(topics: &[String]) -> Result<(), MediationError> {
    if topics.len() > crate::app_config::limits().max_topics {
        return Err(MediationError::Validation("Too many topics selected."));
    }
    Ok(())
}

/// Investor submits a question about a product.
///
/// The product must be approved and visible in the catalog. Creates the
/// record in `PendingAdminReview`, stores the interest topics, and bumps the
/// product's interest counter. Admins are notified after commit.
pub async fn submit_investor_query(
    investor_id: i32,
    product_id: i32,
    primary_intent: &str,
    intent_detail: Option<&str>,
    areas_of_interest: &[String],
    original_question: &str,
) -> Result<queries::Model, MediationError> {
    validate_intent(primary_intent, intent_detail)?;
    let original_question = validate_text(original_question, "A question is required.")?;
    let topics = normalize_topics(areas_of_interest);
    validate_topic_count(&topics)?;

    let db = get_db_pool();

    let product = products::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(MediationError::NotFound)?;

    // Unapproved products are invisible to investors, so treat them as absent.
    if product.status != products::ProductStatus::Approved {
        return Err(MediationError::NotFound);
    }

    // One undecided query per investor and product. Delivered or rejected
    // records don't block a follow-up.
    let open = queries::Entity::find()
        .filter(queries::Column::InvestorId.eq(investor_id))
        .filter(queries::Column::ProductId.eq(product_id))
        .filter(queries::Column::Status.is_in([
            queries::QueryStatus::PendingAdminReview.to_value(),
            queries::QueryStatus::ForwardedToFounder.to_value(),
            queries::QueryStatus::PendingResponseReview.to_value(),
        ]))
        .one(db)
        .await?;
    if open.is_some() {
        return Err(MediationError::Duplicate);
    }

    let now = Utc::now().naive_utc();

    let txn = db.begin().await?;

    let query = queries::ActiveModel {
        product_id: Set(product_id),
        investor_id: Set(investor_id),
        founder_id: Set(product.founder_id),
        primary_intent: Set(primary_intent.to_string()),
        intent_detail: Set(intent_detail.map(|d| d.trim().to_string())),
        original_question: Set(original_question.to_string()),
        status: Set(queries::QueryStatus::PendingAdminReview),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for topic in &topics {
        query_topics::ActiveModel {
            query_id: Set(query.id),
            side: Set(TopicSide::Interest),
            topic: Set(topic.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    products::Entity::update_many()
        .col_expr(
            products::Column::InterestCount,
            Expr::col(products::Column::InterestCount).add(1),
        )
        .filter(products::Column::Id.eq(product_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(e) = dispatcher::notify_new_investor_query(query.id, investor_id, &product.name).await
    {
        log::warn!("Failed to notify admins of query {}: {}", query.id, e);
    }

    Ok(query)
}

/// Admin approves the investor's question, supplying the text the founder
/// will actually see.
///
/// The record must still be in `PendingAdminReview` when the write lands;
/// otherwise nothing changes and the caller gets a conflict.
pub async fn approve_investor_query(
    admin_id: i32,
    query_id: i32,
    approved_text: &str,
) -> Result<(), MediationError> {
    let approved_text = validate_text(approved_text, "Approved text is required.")?;

    let db = get_db_pool();

    let query = queries::Entity::find_by_id(query_id)
        .one(db)
        .await?
        .ok_or(MediationError::NotFound)?;

    let now = Utc::now().naive_utc();

    let result = queries::Entity::update_many()
        .col_expr(
            queries::Column::ApprovedQuestion,
            Expr::value(approved_text.to_string()),
        )
        .col_expr(
            queries::Column::Status,
            Expr::value(queries::QueryStatus::ForwardedToFounder.to_value()),
        )
        .col_expr(queries::Column::ReviewerId, Expr::value(admin_id))
        .col_expr(queries::Column::QuestionApprovedAt, Expr::value(now))
        .col_expr(queries::Column::UpdatedAt, Expr::value(now))
        .filter(queries::Column::Id.eq(query_id))
        .filter(
            queries::Column::Status
                .eq(queries::QueryStatus::PendingAdminReview.to_value()),
        )
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(MediationError::Conflict);
    }

    let product_name = product_name_for(query.product_id).await?;
    if let Err(e) =
        dispatcher::notify_query_forwarded(query.founder_id, query_id, &product_name).await
    {
        log::warn!("Failed to notify founder for query {}: {}", query_id, e);
    }

    Ok(())
}

/// Founder answers a forwarded question.
///
/// Only the founder the record addresses may respond, and only while the
/// record sits in `ForwardedToFounder`. Replaces the response topic set.
pub async fn submit_founder_response(
    founder_id: i32,
    query_id: i32,
    selected_topics: &[String],
    response_text: &str,
) -> Result<(), MediationError> {
    let response_text = validate_text(response_text, "A response is required.")?;
    let topics = normalize_topics(selected_topics);
    validate_topic_count(&topics)?;

    let db = get_db_pool();

    let query = queries::Entity::find_by_id(query_id)
        .one(db)
        .await?
        .ok_or(MediationError::NotFound)?;

    if query.founder_id != founder_id {
        return Err(MediationError::Forbidden);
    }
    if query.status != queries::QueryStatus::ForwardedToFounder {
        return Err(MediationError::Conflict);
    }

    let now = Utc::now().naive_utc();

    let txn = db.begin().await?;

    let result = queries::Entity::update_many()
        .col_expr(
            queries::Column::OriginalResponse,
            Expr::value(response_text.to_string()),
        )
        .col_expr(
            queries::Column::Status,
            Expr::value(queries::QueryStatus::PendingResponseReview.to_value()),
        )
        .col_expr(queries::Column::RespondedAt, Expr::value(now))
        .col_expr(queries::Column::UpdatedAt, Expr::value(now))
        .filter(queries::Column::Id.eq(query_id))
        .filter(
            queries::Column::Status
                .eq(queries::QueryStatus::ForwardedToFounder.to_value()),
        )
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        // Lost a race with another writer since the read above.
        return Err(MediationError::Conflict);
    }

    query_topics::Entity::delete_many()
        .filter(query_topics::Column::QueryId.eq(query_id))
        .filter(query_topics::Column::Side.eq(TopicSide::Response.to_value()))
        .exec(&txn)
        .await?;

    for topic in &topics {
        query_topics::ActiveModel {
            query_id: Set(query_id),
            side: Set(TopicSide::Response),
            topic: Set(topic.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    let product_name = product_name_for(query.product_id).await?;
    if let Err(e) = dispatcher::notify_founder_response(query_id, founder_id, &product_name).await {
        log::warn!(
            "Failed to notify admins of response to query {}: {}",
            query_id,
            e
        );
    }

    Ok(())
}

/// Admin approves the founder's response, supplying the text the investor
/// will actually see. Terminal delivery step.
pub async fn approve_founder_response(
    admin_id: i32,
    query_id: i32,
    approved_text: &str,
) -> Result<(), MediationError> {
    let approved_text = validate_text(approved_text, "Approved text is required.")?;

    let db = get_db_pool();

    let query = queries::Entity::find_by_id(query_id)
        .one(db)
        .await?
        .ok_or(MediationError::NotFound)?;

    let now = Utc::now().naive_utc();

    let result = queries::Entity::update_many()
        .col_expr(
            queries::Column::ApprovedResponse,
            Expr::value(approved_text.to_string()),
        )
        .col_expr(
            queries::Column::Status,
            Expr::value(queries::QueryStatus::DeliveredToInvestor.to_value()),
        )
        .col_expr(queries::Column::ReviewerId, Expr::value(admin_id))
        .col_expr(queries::Column::ResponseApprovedAt, Expr::value(now))
        .col_expr(queries::Column::UpdatedAt, Expr::value(now))
        .filter(queries::Column::Id.eq(query_id))
        .filter(
            queries::Column::Status
                .eq(queries::QueryStatus::PendingResponseReview.to_value()),
        )
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(MediationError::Conflict);
    }

    let product_name = product_name_for(query.product_id).await?;
    if let Err(e) =
        dispatcher::notify_response_delivered(query.investor_id, query_id, &product_name).await
    {
        log::warn!("Failed to notify investor for query {}: {}", query_id, e);
    }

    Ok(())
}

/// Admin rejects a record sitting in either review queue. Terminal.
///
/// The party whose text was under review gets a generic rejection signal;
/// no review detail crosses to the other side.
pub async fn reject_query(admin_id: i32, query_id: i32) -> Result<(), MediationError> {
    let db = get_db_pool();

    let query = queries::Entity::find_by_id(query_id)
        .one(db)
        .await?
        .ok_or(MediationError::NotFound)?;

    let question_stage = match query.status {
        queries::QueryStatus::PendingAdminReview => true,
        queries::QueryStatus::PendingResponseReview => false,
        _ => return Err(MediationError::Conflict),
    };

    let now = Utc::now().naive_utc();

    let result = queries::Entity::update_many()
        .col_expr(
            queries::Column::Status,
            Expr::value(queries::QueryStatus::Rejected.to_value()),
        )
        .col_expr(queries::Column::ReviewerId, Expr::value(admin_id))
        .col_expr(queries::Column::RejectedAt, Expr::value(now))
        .col_expr(queries::Column::UpdatedAt, Expr::value(now))
        .filter(queries::Column::Id.eq(query_id))
        .filter(queries::Column::Status.eq(query.status.to_value()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(MediationError::Conflict);
    }

    let recipient = if question_stage {
        query.investor_id
    } else {
        query.founder_id
    };

    let product_name = product_name_for(query.product_id).await?;
    if let Err(e) =
        dispatcher::notify_query_rejected(recipient, query_id, &product_name, question_stage).await
    {
        log::warn!(
            "Failed to send rejection notice for query {}: {}",
            query_id,
            e
        );
    }

    Ok(())
}

/// Queries forwarded to this founder, newest approval first.
///
/// Records the admin has not yet approved are absent by construction.
pub async fn founder_queries(founder_id: i32) -> Result<Vec<FounderQueryView>, DbErr> {
    let db = get_db_pool();

    let records = queries::Entity::find()
        .filter(queries::Column::FounderId.eq(founder_id))
        .filter(queries::Column::QuestionApprovedAt.is_not_null())
        .order_by_desc(queries::Column::QuestionApprovedAt)
        .all(db)
        .await?;

    let product_names = product_names_for(&records).await?;
    let topics = topics_for(&records).await?;

    Ok(records
        .into_iter()
        .map(|q| {
            let (interest, response) = topics.get(&q.id).cloned().unwrap_or_default();
            FounderQueryView {
                id: q.id,
                product_id: q.product_id,
                product_name: product_names
                    .get(&q.product_id)
                    .cloned()
                    .unwrap_or_default(),
                primary_intent: q.primary_intent,
                intent_detail: q.intent_detail,
                areas_of_interest: interest,
                approved_question: q.approved_question.unwrap_or_default(),
                founder_selected_topics: response,
                founder_original_question: q.original_response,
                status: q.status.as_str(),
                question_approved_at: q.question_approved_at,
                responded_at: q.responded_at,
            }
        })
        .collect())
}

/// This investor's own records, newest first.
pub async fn investor_queries(investor_id: i32) -> Result<Vec<InvestorQueryView>, DbErr> {
    let db = get_db_pool();

    let records = queries::Entity::find()
        .filter(queries::Column::InvestorId.eq(investor_id))
        .order_by_desc(queries::Column::CreatedAt)
        .all(db)
        .await?;

    let product_names = product_names_for(&records).await?;
    let topics = topics_for(&records).await?;

    Ok(records
        .into_iter()
        .map(|q| {
            let (interest, _) = topics.get(&q.id).cloned().unwrap_or_default();
            let delivered = q.status == queries::QueryStatus::DeliveredToInvestor;
            InvestorQueryView {
                id: q.id,
                product_id: q.product_id,
                product_name: product_names
                    .get(&q.product_id)
                    .cloned()
                    .unwrap_or_default(),
                primary_intent: q.primary_intent,
                intent_detail: q.intent_detail,
                areas_of_interest: interest,
                original_question: q.original_question,
                approved_response: if delivered { q.approved_response } else { None },
                status: q.status.as_str(),
                created_at: q.created_at,
                response_approved_at: q.response_approved_at,
            }
        })
        .collect())
}

/// Investor-side review queue: records waiting for first admin approval,
/// oldest first.
pub async fn admin_investor_queue() -> Result<Vec<AdminQueryView>, DbErr> {
    admin_queue(queries::QueryStatus::PendingAdminReview).await
}

/// Founder-side review queue: responses waiting for admin approval,
/// oldest first.
pub async fn admin_response_queue() -> Result<Vec<AdminQueryView>, DbErr> {
    admin_queue(queries::QueryStatus::PendingResponseReview).await
}

async fn admin_queue(status: queries::QueryStatus) -> Result<Vec<AdminQueryView>, DbErr> {
    let db = get_db_pool();

    let records = queries::Entity::find()
        .filter(queries::Column::Status.eq(status.to_value()))
        .order_by_asc(queries::Column::CreatedAt)
        .all(db)
        .await?;

    build_admin_views(records).await
}

/// Full record lookup for the admin detail page.
pub async fn admin_query_detail(query_id: i32) -> Result<Option<AdminQueryView>, DbErr> {
    let db = get_db_pool();

    let record = match queries::Entity::find_by_id(query_id).one(db).await? {
        Some(record) => record,
        None => return Ok(None),
    };

    Ok(build_admin_views(vec![record]).await?.into_iter().next())
}

async fn build_admin_views(records: Vec<queries::Model>) -> Result<Vec<AdminQueryView>, DbErr> {
    let db = get_db_pool();

    let product_names = product_names_for(&records).await?;
    let topics = topics_for(&records).await?;

    let mut user_ids: Vec<i32> = records
        .iter()
        .flat_map(|q| [q.investor_id, q.founder_id])
        .collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let user_names: HashMap<i32, String> = users::Entity::find()
        .filter(users::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    Ok(records
        .into_iter()
        .map(|q| {
            let (interest, response) = topics.get(&q.id).cloned().unwrap_or_default();
            AdminQueryView {
                id: q.id,
                product_id: q.product_id,
                product_name: product_names
                    .get(&q.product_id)
                    .cloned()
                    .unwrap_or_default(),
                investor_id: q.investor_id,
                investor_name: user_names.get(&q.investor_id).cloned().unwrap_or_default(),
                founder_id: q.founder_id,
                founder_name: user_names.get(&q.founder_id).cloned().unwrap_or_default(),
                primary_intent: q.primary_intent,
                intent_detail: q.intent_detail,
                areas_of_interest: interest,
                original_question: q.original_question,
                approved_question: q.approved_question,
                founder_selected_topics: response,
                original_response: q.original_response,
                approved_response: q.approved_response,
                status: q.status.as_str(),
                reviewer_id: q.reviewer_id,
                created_at: q.created_at,
                updated_at: q.updated_at,
            }
        })
        .collect())
}

async fn product_name_for(product_id: i32) -> Result<String, DbErr> {
    let db = get_db_pool();
    Ok(products::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .map(|p| p.name)
        .unwrap_or_default())
}

async fn product_names_for(records: &[queries::Model]) -> Result<HashMap<i32, String>, DbErr> {
    let db = get_db_pool();

    let mut product_ids: Vec<i32> = records.iter().map(|q| q.product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    Ok(products::Entity::find()
        .filter(products::Column::Id.is_in(product_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect())
}

/// Topic rows for a record batch, split into (interest, response) sets.
async fn topics_for(
    records: &[queries::Model],
) -> Result<HashMap<i32, (Vec<String>, Vec<String>)>, DbErr> {
    let db = get_db_pool();

    let query_ids: Vec<i32> = records.iter().map(|q| q.id).collect();

    let rows = query_topics::Entity::find()
        .filter(query_topics::Column::QueryId.is_in(query_ids))
        .order_by_asc(query_topics::Column::Topic)
        .all(db)
        .await?;

    let mut map: HashMap<i32, (Vec<String>, Vec<String>)> = HashMap::new();
    for row in rows {
        let entry = map.entry(row.query_id).or_default();
        match row.side {
            TopicSide::Interest => entry.0.push(row.topic),
            TopicSide::Response => entry.1.push(row.topic),
        }
    }

    Ok(map)
}
