//! Founder document verification gate
//!
//! Founders submit a document checklist; an admin reviews the set and moves
//! the user-level `verification_status` through
//! `not_submitted -> pending_verification -> approved | rejected`. A
//! rejected founder resubmits and returns to `pending_verification`. The
//! status never regresses on its own, and everything the full founder
//! dashboard can do stays locked until it reads `approved`.

use crate::db::get_db_pool;
use crate::notifications::dispatcher;
use crate::orm::founder_documents::{self, DocumentStatus};
use crate::orm::users::{self, VerificationStatus};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, DbErr, Set};
use serde::Serialize;

/// Document checklist shown on the founder onboarding dashboard.
/// Keys are stable identifiers; the client maps them to display labels.
pub const DOCUMENT_KEYS: &[&str] = &[
    "identity_proof",
    "business_registration",
    "pitch_deck",
    "business_plan",
    "financial_statements",
    "tax_registration",
    "bank_statement",
    "proof_of_address",
    "shareholder_agreement",
    "product_demo",
    "team_profile",
];

/// Keys that must be present before a submission is accepted.
pub const REQUIRED_DOCUMENT_KEYS: &[&str] = &["identity_proof", "business_registration"];

/// Verification operation errors.
#[derive(Debug)]
pub enum VerificationError {
    /// Input failed validation; nothing was written
    Validation(&'static str),
    /// User does not exist or is not a founder
    NotFound,
    /// Verification is not in a state that allows this operation
    Conflict,
    /// Database error
    Db(DbErr),
}

impl std::fmt::Display for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationError::Validation(msg) => write!(f, "{}", msg),
            VerificationError::NotFound => write!(f, "Founder not found."),
            VerificationError::Conflict => {
                write!(f, "Verification changed state. Refresh and try again.")
            }
            VerificationError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for VerificationError {}

impl From<DbErr> for VerificationError {
    fn from(e: DbErr) -> Self {
        VerificationError::Db(e)
    }
}

/// One submitted document, as the founder and the reviewer both see it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub doc_key: String,
    pub file_path: String,
    pub status: &'static str,
    pub rejection_reason: Option<String>,
    pub submitted_at: chrono::NaiveDateTime,
    pub reviewed_at: Option<chrono::NaiveDateTime>,
}

/// A founder's verification state: the user-level summary plus every
/// submitted document row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationView {
    pub verification_status: &'static str,
    pub documents: Vec<DocumentView>,
}

/// An entry in the admin verification queue.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingFounderView {
    pub founder_id: i32,
    pub founder_name: String,
    pub email: String,
    pub submitted_at: Option<chrono::NaiveDateTime>,
    pub documents: Vec<DocumentView>,
}

fn view_of(doc: founder_documents::Model) -> DocumentView {
    DocumentView {
        doc_key: doc.doc_key,
        file_path: doc.file_path,
        status: doc.status.as_str(),
        rejection_reason: doc.rejection_reason,
        submitted_at: doc.submitted_at,
        reviewed_at: doc.reviewed_at,
    }
}

/// Founder submits (or resubmits) verification documents.
///
/// `documents` maps document keys to stored file paths. Each key is
/// upserted: a resubmitted document replaces the old row's path and resets
/// its per-document status to pending. The user-level status moves to
/// `pending_verification` unless it is already `approved`, which is final.
pub async fn submit_documents(
    founder_id: i32,
    documents: &[(String, String)],
) -> Result<(), VerificationError> {
    if documents.is_empty() {
        return Err(VerificationError::Validation(
            "At least one document is required.",
        ));
    }
    for (key, path) in documents {
        if !DOCUMENT_KEYS.contains(&key.as_str()) {
            return Err(VerificationError::Validation("Unknown document type."));
        }
        if path.trim().is_empty() {
            return Err(VerificationError::Validation("A file is required for each document."));
        }
    }

    let db = get_db_pool();

    let user = users::Entity::find_by_id(founder_id)
        .one(db)
        .await?
        .ok_or(VerificationError::NotFound)?;

    if user.role != users::Role::Founder {
        return Err(VerificationError::NotFound);
    }
    if user.verification_status == VerificationStatus::Approved {
        return Err(VerificationError::Conflict);
    }

    // The first submission must carry the mandatory documents; later ones
    // may patch any subset because the earlier rows are still on file.
    let existing: Vec<String> = founder_documents::Entity::find()
        .filter(founder_documents::Column::UserId.eq(founder_id))
        .all(db)
        .await?
        .into_iter()
        .map(|d| d.doc_key)
        .collect();

    for required in REQUIRED_DOCUMENT_KEYS {
        let supplied = documents.iter().any(|(k, _)| k == required)
            || existing.iter().any(|k| k == required);
        if !supplied {
            return Err(VerificationError::Validation(
                "Identity proof and business registration are required.",
            ));
        }
    }

    let now = Utc::now().naive_utc();

    let txn = db.begin().await?;

    for (key, path) in documents {
        let current = founder_documents::Entity::find()
            .filter(founder_documents::Column::UserId.eq(founder_id))
            .filter(founder_documents::Column::DocKey.eq(key.clone()))
            .one(&txn)
            .await?;

        match current {
            Some(row) => {
                let mut active: founder_documents::ActiveModel = row.into();
                active.file_path = Set(path.clone());
                active.status = Set(DocumentStatus::Pending);
                active.reviewer_id = Set(None);
                active.rejection_reason = Set(None);
                active.submitted_at = Set(now);
                active.reviewed_at = Set(None);
                active.update(&txn).await?;
            }
            None => {
                founder_documents::ActiveModel {
                    user_id: Set(founder_id),
                    doc_key: Set(key.clone()),
                    file_path: Set(path.clone()),
                    status: Set(DocumentStatus::Pending),
                    submitted_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }
    }

    if user.verification_status != VerificationStatus::PendingVerification {
        let result = users::Entity::update_many()
            .col_expr(
                users::Column::VerificationStatus,
                Expr::value(VerificationStatus::PendingVerification.to_value()),
            )
            .filter(users::Column::Id.eq(founder_id))
            .filter(
                users::Column::VerificationStatus
                    .eq(user.verification_status.to_value()),
            )
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(VerificationError::Conflict);
        }
    }

    txn.commit().await?;

    if let Err(e) = dispatcher::notify_documents_submitted(founder_id, &user.name).await {
        log::warn!(
            "Failed to notify admins of document submission by {}: {}",
            founder_id,
            e
        );
    }

    Ok(())
}

/// Admin approves or rejects a founder's submitted document set.
///
/// Rejection requires feedback text; the founder sees it on the
/// resubmission screen. Every on-file document row gets stamped with the
/// review outcome.
pub async fn review_documents(
    admin_id: i32,
    founder_id: i32,
    approve: bool,
    reason: Option<&str>,
) -> Result<(), VerificationError> {
    let reason = reason.map(|r| r.trim()).filter(|r| !r.is_empty());
    if !approve && reason.is_none() {
        return Err(VerificationError::Validation(
            "Feedback is required when rejecting documents.",
        ));
    }

    let db = get_db_pool();

    let user = users::Entity::find_by_id(founder_id)
        .one(db)
        .await?
        .ok_or(VerificationError::NotFound)?;

    if user.role != users::Role::Founder {
        return Err(VerificationError::NotFound);
    }
    if user.verification_status != VerificationStatus::PendingVerification {
        return Err(VerificationError::Conflict);
    }

    let now = Utc::now().naive_utc();
    let new_status = if approve {
        VerificationStatus::Approved
    } else {
        VerificationStatus::Rejected
    };
    let doc_status = if approve {
        DocumentStatus::Approved
    } else {
        DocumentStatus::Rejected
    };

    let txn = db.begin().await?;

    let result = users::Entity::update_many()
        .col_expr(
            users::Column::VerificationStatus,
            Expr::value(new_status.to_value()),
        )
        .filter(users::Column::Id.eq(founder_id))
        .filter(
            users::Column::VerificationStatus
                .eq(VerificationStatus::PendingVerification.to_value()),
        )
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(VerificationError::Conflict);
    }

    founder_documents::Entity::update_many()
        .col_expr(
            founder_documents::Column::Status,
            Expr::value(doc_status.to_value()),
        )
        .col_expr(founder_documents::Column::ReviewerId, Expr::value(admin_id))
        .col_expr(
            founder_documents::Column::RejectionReason,
            Expr::value(reason.map(|r| r.to_string())),
        )
        .col_expr(founder_documents::Column::ReviewedAt, Expr::value(now))
        .filter(founder_documents::Column::UserId.eq(founder_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(e) = dispatcher::notify_documents_reviewed(founder_id, approve, reason).await {
        log::warn!(
            "Failed to notify founder {} of document review: {}",
            founder_id,
            e
        );
    }

    Ok(())
}

/// A founder's own verification state.
pub async fn founder_verification(founder_id: i32) -> Result<VerificationView, DbErr> {
    let db = get_db_pool();

    let status = users::Entity::find_by_id(founder_id)
        .one(db)
        .await?
        .map(|u| u.verification_status)
        .unwrap_or_default();

    let documents = founder_documents::Entity::find()
        .filter(founder_documents::Column::UserId.eq(founder_id))
        .order_by_asc(founder_documents::Column::DocKey)
        .all(db)
        .await?;

    Ok(VerificationView {
        verification_status: status.as_str(),
        documents: documents.into_iter().map(view_of).collect(),
    })
}

/// Founders awaiting review, with their document sets. Oldest wait first.
pub async fn admin_pending_verifications() -> Result<Vec<PendingFounderView>, DbErr> {
    let db = get_db_pool();

    let founders = users::Entity::find()
        .filter(users::Column::Role.eq(users::Role::Founder.to_value()))
        .filter(
            users::Column::VerificationStatus
                .eq(VerificationStatus::PendingVerification.to_value()),
        )
        .all(db)
        .await?;

    let mut views = Vec::with_capacity(founders.len());
    for founder in founders {
        let documents = founder_documents::Entity::find()
            .filter(founder_documents::Column::UserId.eq(founder.id))
            .order_by_asc(founder_documents::Column::DocKey)
            .all(db)
            .await?;

        views.push(PendingFounderView {
            founder_id: founder.id,
            founder_name: founder.name,
            email: founder.email,
            submitted_at: documents.iter().map(|d| d.submitted_at).max(),
            documents: documents.into_iter().map(view_of).collect(),
        });
    }

    views.sort_by_key(|v| v.submitted_at);

    Ok(views)
}
