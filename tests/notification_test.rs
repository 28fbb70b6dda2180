/// Covers the notification inbox: event rows written by the dispatcher,
/// unread counting, and owner-scoped mark-read.
mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use matchdeck::notifications::{self, NotificationType};
use matchdeck::orm::notifications as notification_orm;
use sea_orm::entity::*;

#[actix_rt::test]
#[serial]
async fn test_create_notification() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let founder = create_test_founder(&db, "notified_founder")
        .await
        .expect("Failed to create founder");
    let admin = create_test_admin(&db, "notifier")
        .await
        .expect("Failed to create admin");

    let id = notifications::create_notification(
        founder.id,
        NotificationType::QueryForwarded,
        "New investor question".to_string(),
        "An investor asked about Analytics Suite.".to_string(),
        Some("/founder/queries".to_string()),
        Some(admin.id),
        Some("query".to_string()),
        Some(42),
    )
    .await
    .expect("Failed to create notification");

    let row = notification_orm::Entity::find_by_id(id)
        .one(&db)
        .await
        .expect("Failed to load notification")
        .expect("Notification missing");
    assert_eq!(row.user_id, founder.id);
    assert_eq!(row.kind, "query_forwarded");
    assert_eq!(row.title, "New investor question");
    assert_eq!(row.url.as_deref(), Some("/founder/queries"));
    assert_eq!(row.actor_id, Some(admin.id));
    assert!(!row.is_read);
    assert!(row.read_at.is_none());

    let unread = notifications::count_unread_notifications(founder.id)
        .await
        .expect("Failed to count");
    assert_eq!(unread, 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_mark_notification_read() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_investor(&db, "reader")
        .await
        .expect("Failed to create user");
    let other = create_test_investor(&db, "not_the_reader")
        .await
        .expect("Failed to create user");

    let id = notifications::create_notification(
        user.id,
        NotificationType::ResponseDelivered,
        "Your question was answered".to_string(),
        "The founder's reply is ready.".to_string(),
        None,
        None,
        None,
        None,
    )
    .await
    .expect("Failed to create notification");

    // Someone else marking it does nothing
    notifications::mark_notification_read(id, other.id)
        .await
        .expect("Mark read failed");
    assert_eq!(
        notifications::count_unread_notifications(user.id)
            .await
            .expect("count"),
        1
    );

    notifications::mark_notification_read(id, user.id)
        .await
        .expect("Mark read failed");

    let row = notification_orm::Entity::find_by_id(id)
        .one(&db)
        .await
        .expect("Failed to load notification")
        .expect("Notification missing");
    assert!(row.is_read);
    assert!(row.read_at.is_some());
    assert_eq!(
        notifications::count_unread_notifications(user.id)
            .await
            .expect("count"),
        0
    );

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_mark_all_read() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_investor(&db, "busy_reader")
        .await
        .expect("Failed to create user");

    for i in 0..3 {
        notifications::create_notification(
            user.id,
            NotificationType::CallUpdated,
            format!("Call update {}", i),
            "Your call request moved forward.".to_string(),
            None,
            None,
            None,
            None,
        )
        .await
        .expect("Failed to create notification");
    }

    assert_eq!(
        notifications::count_unread_notifications(user.id)
            .await
            .expect("count"),
        3
    );

    notifications::mark_all_read(user.id)
        .await
        .expect("Mark all read failed");

    assert_eq!(
        notifications::count_unread_notifications(user.id)
            .await
            .expect("count"),
        0
    );

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_listing_respects_unread_filter_and_limit() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_investor(&db, "list_reader")
        .await
        .expect("Failed to create user");

    let mut ids = Vec::new();
    for i in 0..3 {
        let id = notifications::create_notification(
            user.id,
            NotificationType::ProductApproved,
            format!("Notification {}", i),
            "Body".to_string(),
            None,
            None,
            None,
            None,
        )
        .await
        .expect("Failed to create notification");
        ids.push(id);
    }

    notifications::mark_notification_read(ids[0], user.id)
        .await
        .expect("Mark read failed");

    let unread_only = notifications::get_user_notifications(user.id, 50, false)
        .await
        .expect("Failed to list");
    assert_eq!(unread_only.len(), 2);
    assert!(unread_only.iter().all(|n| !n.is_read));

    let everything = notifications::get_user_notifications(user.id, 50, true)
        .await
        .expect("Failed to list");
    assert_eq!(everything.len(), 3);

    let capped = notifications::get_user_notifications(user.id, 1, true)
        .await
        .expect("Failed to list");
    assert_eq!(capped.len(), 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
