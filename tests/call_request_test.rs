/// Integration tests for the call request lifecycle
///
/// Requests move pending -> approved -> scheduled -> completed one step at a
/// time, and can only be rejected while still pending.
mod common;
use serial_test::serial;

use chrono::{Duration, Utc};
use common::*;
use matchdeck::calls::{self, CallError};
use matchdeck::orm::call_requests::CallStatus;

fn next_week() -> chrono::NaiveDateTime {
    Utc::now().naive_utc() + Duration::days(7)
}

#[actix_rt::test]
#[serial]
async fn test_create_and_list_call_requests() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let investor = create_test_investor(&db, "caller")
        .await
        .expect("Failed to create investor");
    let admin = create_test_admin(&db, "call_admin")
        .await
        .expect("Failed to create admin");

    let call = calls::create_call_request(
        investor.id,
        "Mentor",
        "Pricing strategy",
        "Would like 30 minutes on pricing.",
        next_week(),
    )
    .await
    .expect("Failed to create call request");

    assert_eq!(call.status, CallStatus::Pending);
    // Roles are normalized on the way in
    assert_eq!(call.target_role, "mentor");

    let mine = calls::my_call_requests(investor.id)
        .await
        .expect("Failed to load call requests");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].status, "pending");
    assert_eq!(mine[0].topic, "Pricing strategy");

    let queue = calls::admin_call_queue()
        .await
        .expect("Failed to load call queue");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].requester_name, "caller");

    // The request landed in the admin inbox
    let unread = matchdeck::notifications::count_unread_notifications(admin.id)
        .await
        .expect("Failed to count notifications");
    assert_eq!(unread, 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_call_request_validation() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let investor = create_test_investor(&db, "picky_caller")
        .await
        .expect("Failed to create investor");

    let result =
        calls::create_call_request(investor.id, "mentor", "  ", "A message", next_week()).await;
    assert!(matches!(result, Err(CallError::Validation(_))));

    let result =
        calls::create_call_request(investor.id, "mentor", "Topic", "   ", next_week()).await;
    assert!(matches!(result, Err(CallError::Validation(_))));

    let result =
        calls::create_call_request(investor.id, "wizard", "Topic", "A message", next_week()).await;
    assert!(matches!(result, Err(CallError::Validation(_))));

    let yesterday = Utc::now().naive_utc() - Duration::days(1);
    let result =
        calls::create_call_request(investor.id, "mentor", "Topic", "A message", yesterday).await;
    assert!(matches!(result, Err(CallError::Validation(_))));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_advance_walks_the_lifecycle_one_step_at_a_time() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let investor = create_test_investor(&db, "lifecycle_caller")
        .await
        .expect("Failed to create investor");
    let mentor = create_test_user(
        &db,
        "attached_mentor",
        "password123",
        matchdeck::orm::users::Role::Mentor,
    )
    .await
    .expect("Failed to create mentor");
    let admin = create_test_admin(&db, "call_admin2")
        .await
        .expect("Failed to create admin");

    let call = calls::create_call_request(
        investor.id,
        "mentor",
        "Fundraising",
        "Seed round prep.",
        next_week(),
    )
    .await
    .expect("Failed to create call request");

    let status = calls::advance_call(admin.id, call.id, None, None)
        .await
        .expect("Failed to advance call");
    assert_eq!(status, CallStatus::Approved);

    // Attaching a counterparty and a note while scheduling
    let status = calls::advance_call(admin.id, call.id, Some(mentor.id), Some("Zoom link sent"))
        .await
        .expect("Failed to advance call");
    assert_eq!(status, CallStatus::Scheduled);

    let queue = calls::admin_call_queue()
        .await
        .expect("Failed to load call queue");
    let row = queue.iter().find(|c| c.id == call.id).expect("call missing");
    assert_eq!(row.target_user_id, Some(mentor.id));
    assert_eq!(row.admin_note.as_deref(), Some("Zoom link sent"));

    let status = calls::advance_call(admin.id, call.id, None, None)
        .await
        .expect("Failed to advance call");
    assert_eq!(status, CallStatus::Completed);

    // Completed is terminal
    let result = calls::advance_call(admin.id, call.id, None, None).await;
    assert!(matches!(result, Err(CallError::Conflict)));

    // The requester heard about every step
    let unread = matchdeck::notifications::count_unread_notifications(investor.id)
        .await
        .expect("Failed to count notifications");
    assert_eq!(unread, 3);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_reject_only_from_pending() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let investor = create_test_investor(&db, "rejected_caller")
        .await
        .expect("Failed to create investor");
    let admin = create_test_admin(&db, "call_admin3")
        .await
        .expect("Failed to create admin");

    let call = calls::create_call_request(
        investor.id,
        "admin",
        "Account question",
        "Need help with my account.",
        next_week(),
    )
    .await
    .expect("Failed to create call request");

    calls::reject_call(admin.id, call.id, Some("No availability this month."))
        .await
        .expect("Failed to reject call");

    let mine = calls::my_call_requests(investor.id)
        .await
        .expect("Failed to load call requests");
    assert_eq!(mine[0].status, "rejected");
    assert_eq!(
        mine[0].admin_note.as_deref(),
        Some("No availability this month.")
    );

    // Rejected is terminal
    let result = calls::advance_call(admin.id, call.id, None, None).await;
    assert!(matches!(result, Err(CallError::Conflict)));
    let result = calls::reject_call(admin.id, call.id, None).await;
    assert!(matches!(result, Err(CallError::Conflict)));

    // An approved call can no longer be rejected
    let second = calls::create_call_request(
        investor.id,
        "admin",
        "Another topic",
        "More help needed.",
        next_week(),
    )
    .await
    .expect("Failed to create call request");
    calls::advance_call(admin.id, second.id, None, None)
        .await
        .expect("Failed to advance call");
    let result = calls::reject_call(admin.id, second.id, None).await;
    assert!(matches!(result, Err(CallError::Conflict)));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
