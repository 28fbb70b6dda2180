//! In-app notifications with best-effort socket push
//!
//! The database row is the durable copy. The WebSocket push that follows a
//! create is fire-and-forget; a missed delivery never rolls anything back.

pub mod dispatcher;
pub mod types;

use crate::db::get_db_pool;
use crate::orm::notifications;
use sea_orm::{entity::*, query::*, sea_query::Expr, DbErr, Set};
use serde::Serialize;

pub use types::NotificationType;

/// A notification as the owner's client renders it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: i32,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub url: Option<String>,
    pub is_read: bool,
    pub created_at: chrono::NaiveDateTime,
}

impl From<notifications::Model> for NotificationView {
    fn from(row: notifications::Model) -> Self {
        Self {
            id: row.id,
            notification_type: row.kind,
            title: row.title,
            message: row.message,
            url: row.url,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

/// Records a notification and returns its id. The socket push that
/// follows the insert is best-effort.
pub async fn create_notification(
    user_id: i32,
    notification_type: NotificationType,
    title: String,
    message: String,
    url: Option<String>,
    actor_id: Option<i32>,
    source_kind: Option<String>,
    source_id: Option<i32>,
) -> Result<i32, DbErr> {
    let db = get_db_pool();

    let notification = notifications::ActiveModel {
        user_id: Set(user_id),
        kind: Set(notification_type.as_str().to_string()),
        title: Set(title.clone()),
        message: Set(message.clone()),
        url: Set(url.clone()),
        actor_id: Set(actor_id),
        source_kind: Set(source_kind),
        source_id: Set(source_id),
        is_read: Set(false),
        ..Default::default()
    };

    let result = notification.insert(db).await?;

    crate::cache::invalidate_unread_count(user_id);

    // Push to connected clients; silently a no-op when the user is offline.
    if let Some(hub) = crate::web::notifications_ws::push_hub() {
        crate::web::notifications_ws::push_user_alert(
            hub,
            user_id,
            result.id,
            notification_type.as_str(),
            &title,
            &message,
            url.as_deref(),
        );
    }

    Ok(result.id)
}

/// Live unread total for the badge. On the request path this hides behind
/// `cache::get_unread_count`.
pub async fn count_unread_notifications(user_id: i32) -> Result<i64, DbErr> {
    let db = get_db_pool();

    let count = notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(user_id))
        .filter(notifications::Column::IsRead.eq(false))
        .count(db)
        .await?;

    Ok(count as i64)
}

fn set_read_now() -> UpdateMany<notifications::Entity> {
    notifications::Entity::update_many()
        .col_expr(notifications::Column::IsRead, Expr::value(true))
        .col_expr(
            notifications::Column::ReadAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
}

/// Marks one row read. The update is scoped to the owner, so an id
/// belonging to someone else is a silent no-op.
pub async fn mark_notification_read(notification_id: i32, user_id: i32) -> Result<(), DbErr> {
    let db = get_db_pool();

    set_read_now()
        .filter(notifications::Column::Id.eq(notification_id))
        .filter(notifications::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    crate::cache::invalidate_unread_count(user_id);

    Ok(())
}

/// Clears the whole badge for one user.
pub async fn mark_all_read(user_id: i32) -> Result<(), DbErr> {
    let db = get_db_pool();

    set_read_now()
        .filter(notifications::Column::UserId.eq(user_id))
        .filter(notifications::Column::IsRead.eq(false))
        .exec(db)
        .await?;

    crate::cache::invalidate_unread_count(user_id);

    Ok(())
}

/// The newest rows for one user, optionally including already-read ones.
pub async fn get_user_notifications(
    user_id: i32,
    limit: u64,
    show_read: bool,
) -> Result<Vec<notifications::Model>, DbErr> {
    let db = get_db_pool();

    let mut query = notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(user_id))
        .order_by_desc(notifications::Column::CreatedAt)
        .limit(limit);

    if !show_read {
        query = query.filter(notifications::Column::IsRead.eq(false));
    }

    query.all(db).await
}
