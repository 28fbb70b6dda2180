//! Notification dispatch for domain events
//!
//! Each event helper builds the title, message, and target URL for one kind
//! of event and hands it to `create_notification`. Callers invoke these after
//! their own transaction commits and treat failures as log-and-continue; a
//! lost notification must never unwind a completed state change.

use super::{create_notification, NotificationType};
use crate::db::get_db_pool;
use crate::orm::users;
use sea_orm::{entity::*, query::*, DbErr};

/// Create the same notification for every administrator account, then hint
/// connected staff dashboards that the named review queue changed.
async fn notify_admins(
    notification_type: NotificationType,
    title: &str,
    message: &str,
    url: &str,
    queue: &str,
    actor_id: Option<i32>,
    source_kind: Option<&str>,
    source_id: Option<i32>,
) -> Result<(), DbErr> {
    let db = get_db_pool();

    let admins = users::Entity::find()
        .filter(users::Column::Role.is_in(vec![
            users::Role::Admin.to_value(),
            users::Role::Superadmin.to_value(),
        ]))
        .all(db)
        .await?;

    for admin in admins {
        create_notification(
            admin.id,
            notification_type,
            title.to_string(),
            message.to_string(),
            Some(url.to_string()),
            actor_id,
            source_kind.map(|s| s.to_string()),
            source_id,
        )
        .await?;
    }

    if let Some(hub) = crate::web::notifications_ws::push_hub() {
        crate::web::notifications_ws::nudge_queue(hub, queue);
    }

    Ok(())
}

/// An investor submitted a question; the review queue grew.
pub async fn notify_new_investor_query(
    query_id: i32,
    investor_id: i32,
    product_name: &str,
) -> Result<(), DbErr> {
    notify_admins(
        NotificationType::QueryReceived,
        "New investor query",
        &format!("An investor asked a question about \"{}\".", product_name),
        "/admin/queries",
        "queries",
        Some(investor_id),
        Some("query"),
        Some(query_id),
    )
    .await
}

/// An approved question reached the founder's inbox.
pub async fn notify_query_forwarded(
    founder_id: i32,
    query_id: i32,
    product_name: &str,
) -> Result<(), DbErr> {
    create_notification(
        founder_id,
        NotificationType::QueryForwarded,
        "New investor question".to_string(),
        format!(
            "An investor question about \"{}\" is waiting for your answer.",
            product_name
        ),
        Some("/founder/queries".to_string()),
        None,
        Some("query".to_string()),
        Some(query_id),
    )
    .await?;
    Ok(())
}

/// A founder answered; the response review queue grew.
pub async fn notify_founder_response(
    query_id: i32,
    founder_id: i32,
    product_name: &str,
) -> Result<(), DbErr> {
    notify_admins(
        NotificationType::ResponseReceived,
        "Founder response received",
        &format!(
            "A founder answered a query about \"{}\" and the response needs review.",
            product_name
        ),
        "/admin/queries",
        "queries",
        Some(founder_id),
        Some("query"),
        Some(query_id),
    )
    .await
}

/// An approved response reached the investor.
pub async fn notify_response_delivered(
    investor_id: i32,
    query_id: i32,
    product_name: &str,
) -> Result<(), DbErr> {
    create_notification(
        investor_id,
        NotificationType::ResponseDelivered,
        "Answer received".to_string(),
        format!("The founder of \"{}\" answered your question.", product_name),
        Some("/investor/queries".to_string()),
        None,
        Some("query".to_string()),
        Some(query_id),
    )
    .await?;
    Ok(())
}

/// A query was rejected at one of the review hops. The party whose text was
/// under review gets told; the wording never reveals the reviewer.
pub async fn notify_query_rejected(
    recipient_id: i32,
    query_id: i32,
    product_name: &str,
    question_stage: bool,
) -> Result<(), DbErr> {
    let (title, message, url) = if question_stage {
        (
            "Query not forwarded",
            format!(
                "Your question about \"{}\" was reviewed and will not be forwarded.",
                product_name
            ),
            "/investor/queries",
        )
    } else {
        (
            "Response not delivered",
            format!(
                "Your answer about \"{}\" was reviewed and will not be delivered.",
                product_name
            ),
            "/founder/queries",
        )
    };

    create_notification(
        recipient_id,
        NotificationType::QueryRejected,
        title.to_string(),
        message,
        Some(url.to_string()),
        None,
        Some("query".to_string()),
        Some(query_id),
    )
    .await?;
    Ok(())
}

/// A founder uploaded verification documents.
pub async fn notify_documents_submitted(founder_id: i32, founder_name: &str) -> Result<(), DbErr> {
    notify_admins(
        NotificationType::DocumentsSubmitted,
        "Verification documents submitted",
        &format!("{} submitted documents for verification.", founder_name),
        "/admin/verification",
        "verification",
        Some(founder_id),
        Some("verification"),
        Some(founder_id),
    )
    .await
}

/// An administrator finished reviewing a founder's documents.
pub async fn notify_documents_reviewed(
    founder_id: i32,
    approved: bool,
    reason: Option<&str>,
) -> Result<(), DbErr> {
    let (notification_type, title, message) = if approved {
        (
            NotificationType::DocumentsApproved,
            "Documents approved",
            "Your verification documents were approved. You can now publish products and answer investor queries.".to_string(),
        )
    } else {
        (
            NotificationType::DocumentsRejected,
            "Documents rejected",
            match reason {
                Some(reason) => format!(
                    "Your verification documents were rejected: {}. Please submit them again.",
                    reason
                ),
                None => {
                    "Your verification documents were rejected. Please submit them again.".to_string()
                }
            },
        )
    };

    create_notification(
        founder_id,
        notification_type,
        title.to_string(),
        message,
        Some("/founder/verification".to_string()),
        None,
        Some("verification".to_string()),
        Some(founder_id),
    )
    .await?;
    Ok(())
}

/// A founder submitted a product for review.
pub async fn notify_product_submitted(
    product_id: i32,
    founder_id: i32,
    product_name: &str,
) -> Result<(), DbErr> {
    notify_admins(
        NotificationType::ProductSubmitted,
        "Product submitted for review",
        &format!("\"{}\" is waiting for catalog review.", product_name),
        "/admin/products",
        "products",
        Some(founder_id),
        Some("product"),
        Some(product_id),
    )
    .await
}

/// An administrator finished reviewing a product.
pub async fn notify_product_reviewed(
    founder_id: i32,
    product_id: i32,
    product_name: &str,
    approved: bool,
    reason: Option<&str>,
) -> Result<(), DbErr> {
    let (notification_type, title, message) = if approved {
        (
            NotificationType::ProductApproved,
            "Product approved",
            format!("\"{}\" is now listed in the catalog.", product_name),
        )
    } else {
        (
            NotificationType::ProductRejected,
            "Product rejected",
            match reason {
                Some(reason) => format!("\"{}\" was not approved: {}", product_name, reason),
                None => format!("\"{}\" was not approved.", product_name),
            },
        )
    };

    create_notification(
        founder_id,
        notification_type,
        title.to_string(),
        message,
        Some("/founder/products".to_string()),
        None,
        Some("product".to_string()),
        Some(product_id),
    )
    .await?;
    Ok(())
}

/// Someone asked for a call; administrators schedule these by hand.
pub async fn notify_call_requested(
    call_id: i32,
    requester_id: i32,
    topic: &str,
) -> Result<(), DbErr> {
    notify_admins(
        NotificationType::CallRequested,
        "Call requested",
        &format!("A call was requested: \"{}\".", topic),
        "/admin/calls",
        "calls",
        Some(requester_id),
        Some("call"),
        Some(call_id),
    )
    .await
}

/// A call request moved to a new status; tell the person who asked.
pub async fn notify_call_updated(
    requester_id: i32,
    call_id: i32,
    topic: &str,
    status_label: &str,
) -> Result<(), DbErr> {
    create_notification(
        requester_id,
        NotificationType::CallUpdated,
        "Call request updated".to_string(),
        format!("Your call request \"{}\" is now {}.", topic, status_label),
        Some("/calls".to_string()),
        None,
        Some("call".to_string()),
        Some(call_id),
    )
    .await?;
    Ok(())
}
