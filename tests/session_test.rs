/// Integration tests for database-backed session handling
mod common;
use serial_test::serial;

use chrono::{Duration, Utc};
use common::*;
use matchdeck::orm::{sessions, users::Role};
use matchdeck::session::{self, get_sess};
use sea_orm::{entity::*, ActiveValue::Set};
use uuid::Uuid;

#[actix_rt::test]
#[serial]
async fn test_session_roundtrip() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "session_user", "password123", Role::Investor)
        .await
        .expect("Failed to create user");

    let token = session::new_session(get_sess(), user.id)
        .await
        .expect("Failed to create session");

    let resolved = session::authenticate_by_uuid(get_sess(), token)
        .await
        .expect("Session did not resolve");
    assert_eq!(resolved.user_id, user.id);
    assert!(!resolved.is_expired());

    // The row exists for other processes too
    let row = sessions::Entity::find_by_id(token.to_string())
        .one(&db)
        .await
        .expect("Failed to load session")
        .expect("Session row missing");
    assert_eq!(row.user_id, user.id);

    session::remove_session(get_sess(), token)
        .await
        .expect("Failed to remove session");
    assert!(session::authenticate_by_uuid(get_sess(), token)
        .await
        .is_none());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_cold_cache_falls_back_to_database() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "cold_user", "password123", Role::Investor)
        .await
        .expect("Failed to create user");

    let token = session::new_session(get_sess(), user.id)
        .await
        .expect("Failed to create session");

    // Simulate a restart: the cache forgets, the database remembers
    get_sess().clear();

    let resolved = session::authenticate_by_uuid(get_sess(), token)
        .await
        .expect("Session did not resolve from the database");
    assert_eq!(resolved.user_id, user.id);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_expire_sessions_reaps_only_stale_rows() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "sweeper", "password123", Role::Investor)
        .await
        .expect("Failed to create user");

    let live = session::new_session(get_sess(), user.id)
        .await
        .expect("Failed to create session");

    // Backdated row, as the sweeper would find after two idle weeks
    let stale = Uuid::new_v4();
    let past = Utc::now().naive_utc() - Duration::days(1);
    sessions::ActiveModel {
        id: Set(stale.to_string()),
        user_id: Set(user.id),
        created_at: Set(past - Duration::days(14)),
        expires_at: Set(past),
    }
    .insert(&db)
    .await
    .expect("Failed to insert stale session");

    let reaped = session::expire_sessions(get_sess())
        .await
        .expect("Failed to expire sessions");
    assert_eq!(reaped, 1);

    assert!(session::authenticate_by_uuid(get_sess(), stale)
        .await
        .is_none());
    assert!(session::authenticate_by_uuid(get_sess(), live)
        .await
        .is_some());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
