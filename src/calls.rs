//! Video-call requests, the secondary mediated workflow
//!
//! A user asks to speak with someone of a given role; admins walk the
//! request through `pending -> approved -> scheduled -> completed` one step
//! at a time, optionally attaching a counterparty and a scheduling note.
//! Rejection is possible from `pending` only.

use crate::db::get_db_pool;
use crate::notifications::dispatcher;
use crate::orm::call_requests::{self, CallStatus};
use crate::orm::users;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, DbErr, Set};
use serde::Serialize;
use std::collections::HashMap;

/// Call request operation errors.
#[derive(Debug)]
pub enum CallError {
    /// Input failed validation; nothing was written
    Validation(&'static str),
    /// Call request does not exist
    NotFound,
    /// Request is not in a status that allows this operation
    Conflict,
    /// Database error
    Db(DbErr),
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::Validation(msg) => write!(f, "{}", msg),
            CallError::NotFound => write!(f, "Call request not found."),
            CallError::Conflict => {
                write!(f, "This call request changed state. Refresh and try again.")
            }
            CallError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for CallError {}

impl From<DbErr> for CallError {
    fn from(e: DbErr) -> Self {
        CallError::Db(e)
    }
}

/// A request as its owner sees it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallView {
    pub id: i32,
    pub target_role: String,
    pub topic: String,
    pub message: String,
    pub proposed_date: chrono::NaiveDateTime,
    pub status: &'static str,
    pub admin_note: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

/// A request as shown in the admin call queue.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCallView {
    pub id: i32,
    pub requester_id: i32,
    pub requester_name: String,
    pub target_role: String,
    pub target_user_id: Option<i32>,
    pub topic: String,
    pub message: String,
    pub proposed_date: chrono::NaiveDateTime,
    pub status: &'static str,
    pub admin_note: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

/// Create a call request in `pending`. Admins are notified.
pub async fn create_call_request(
    requester_id: i32,
    target_role: &str,
    topic: &str,
    message: &str,
    proposed_date: chrono::NaiveDateTime,
) -> Result<call_requests::Model, CallError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(CallError::Validation("A topic is required."));
    }
    let message = message.trim();
    if message.is_empty() {
        return Err(CallError::Validation("A message is required."));
    }
    if message.len() > crate::app_config::limits().max_message_length {
        return Err(CallError::Validation("The message is too long."));
    }
    let target_role = target_role.trim().to_lowercase();
    if users::Role::from_str(&target_role).is_none() {
        return Err(CallError::Validation("Unknown target role."));
    }
    let now = Utc::now().naive_utc();
    if proposed_date <= now {
        return Err(CallError::Validation("The proposed date must be in the future."));
    }

    let db = get_db_pool();

    let call = call_requests::ActiveModel {
        requester_id: Set(requester_id),
        target_role: Set(target_role),
        topic: Set(topic.to_string()),
        message: Set(message.to_string()),
        proposed_date: Set(proposed_date),
        status: Set(CallStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    if let Err(e) = dispatcher::notify_call_requested(call.id, requester_id, topic).await {
        log::warn!("Failed to notify admins of call request {}: {}", call.id, e);
    }

    Ok(call)
}

/// The requester's own call requests, newest first.
pub async fn my_call_requests(requester_id: i32) -> Result<Vec<CallView>, DbErr> {
    let db = get_db_pool();

    let rows = call_requests::Entity::find()
        .filter(call_requests::Column::RequesterId.eq(requester_id))
        .order_by_desc(call_requests::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|c| CallView {
            id: c.id,
            target_role: c.target_role,
            topic: c.topic,
            message: c.message,
            proposed_date: c.proposed_date,
            status: c.status.as_str(),
            admin_note: c.admin_note,
            created_at: c.created_at,
            updated_at: c.updated_at,
        })
        .collect())
}

/// Every request still moving through the pipeline, oldest first.
pub async fn admin_call_queue() -> Result<Vec<AdminCallView>, DbErr> {
    let db = get_db_pool();

    let rows = call_requests::Entity::find()
        .filter(call_requests::Column::Status.is_in(vec![
            CallStatus::Pending.to_value(),
            CallStatus::Approved.to_value(),
            CallStatus::Scheduled.to_value(),
        ]))
        .order_by_asc(call_requests::Column::CreatedAt)
        .all(db)
        .await?;

    let mut requester_ids: Vec<i32> = rows.iter().map(|c| c.requester_id).collect();
    requester_ids.sort_unstable();
    requester_ids.dedup();

    let names: HashMap<i32, String> = users::Entity::find()
        .filter(users::Column::Id.is_in(requester_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    Ok(rows
        .into_iter()
        .map(|c| AdminCallView {
            id: c.id,
            requester_id: c.requester_id,
            requester_name: names.get(&c.requester_id).cloned().unwrap_or_default(),
            target_role: c.target_role,
            target_user_id: c.target_user_id,
            topic: c.topic,
            message: c.message,
            proposed_date: c.proposed_date,
            status: c.status.as_str(),
            admin_note: c.admin_note,
            created_at: c.created_at,
        })
        .collect())
}

/// Admin advances a request one step along the pipeline, optionally
/// attaching a counterparty and a note. Returns the status it landed on.
pub async fn advance_call(
    admin_id: i32,
    call_id: i32,
    target_user_id: Option<i32>,
    note: Option<&str>,
) -> Result<CallStatus, CallError> {
    let db = get_db_pool();

    let call = call_requests::Entity::find_by_id(call_id)
        .one(db)
        .await?
        .ok_or(CallError::NotFound)?;

    let next = call.status.next().ok_or(CallError::Conflict)?;
    let now = Utc::now().naive_utc();

    let mut update = call_requests::Entity::update_many()
        .col_expr(call_requests::Column::Status, Expr::value(next.to_value()))
        .col_expr(call_requests::Column::ReviewerId, Expr::value(admin_id))
        .col_expr(call_requests::Column::UpdatedAt, Expr::value(now));

    if let Some(target) = target_user_id {
        update = update.col_expr(call_requests::Column::TargetUserId, Expr::value(Some(target)));
    }
    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        update = update.col_expr(
            call_requests::Column::AdminNote,
            Expr::value(Some(note.to_string())),
        );
    }

    let result = update
        .filter(call_requests::Column::Id.eq(call_id))
        .filter(call_requests::Column::Status.eq(call.status.to_value()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(CallError::Conflict);
    }

    if let Err(e) =
        dispatcher::notify_call_updated(call.requester_id, call_id, &call.topic, next.as_str())
            .await
    {
        log::warn!("Failed to notify requester of call {} update: {}", call_id, e);
    }

    Ok(next)
}

/// Admin rejects a pending request. Terminal.
pub async fn reject_call(
    admin_id: i32,
    call_id: i32,
    note: Option<&str>,
) -> Result<(), CallError> {
    let db = get_db_pool();

    let call = call_requests::Entity::find_by_id(call_id)
        .one(db)
        .await?
        .ok_or(CallError::NotFound)?;

    if call.status != CallStatus::Pending {
        return Err(CallError::Conflict);
    }

    let now = Utc::now().naive_utc();

    let mut update = call_requests::Entity::update_many()
        .col_expr(
            call_requests::Column::Status,
            Expr::value(CallStatus::Rejected.to_value()),
        )
        .col_expr(call_requests::Column::ReviewerId, Expr::value(admin_id))
        .col_expr(call_requests::Column::UpdatedAt, Expr::value(now));

    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        update = update.col_expr(
            call_requests::Column::AdminNote,
            Expr::value(Some(note.to_string())),
        );
    }

    let result = update
        .filter(call_requests::Column::Id.eq(call_id))
        .filter(call_requests::Column::Status.eq(CallStatus::Pending.to_value()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(CallError::Conflict);
    }

    if let Err(e) =
        dispatcher::notify_call_updated(call.requester_id, call_id, &call.topic, "rejected").await
    {
        log::warn!(
            "Failed to notify requester of call {} rejection: {}",
            call_id,
            e
        );
    }

    Ok(())
}
