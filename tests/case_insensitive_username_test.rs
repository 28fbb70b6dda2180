/// Usernames are stored lowercased; any case mix at login or registration
/// must resolve to the same account.
mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use matchdeck::orm::users::Role;
use matchdeck::web::login::{login, LoginResultStatus};

#[actix_rt::test]
#[serial]
async fn test_login_accepts_any_case() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    create_test_user(&db, "CamelCaseUser", "password123", Role::Investor)
        .await
        .expect("Failed to create test user");

    for attempt in ["camelcaseuser", "CAMELCASEUSER", "CamelCaseUser"] {
        let result = login(attempt, "password123")
            .await
            .expect("Login function failed");
        assert!(
            matches!(result.result, LoginResultStatus::Success),
            "login failed for {}",
            attempt
        );
    }

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_login_trims_surrounding_whitespace() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    create_test_user(&db, "spacey", "password123", Role::Investor)
        .await
        .expect("Failed to create test user");

    let result = login("  spacey  ", "password123")
        .await
        .expect("Login function failed");
    assert!(matches!(result.result, LoginResultStatus::Success));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_duplicate_handle_is_refused_regardless_of_case() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    create_test_user(&db, "DupHandle", "password123", Role::Investor)
        .await
        .expect("Failed to create test user");

    // Handles are stored lowercased, so any case mix lands on the same
    // unique key and the insert must fail.
    let second = create_test_user(&db, "dUPhANDLE", "password456", Role::Founder).await;
    assert!(second.is_err());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_username_lookup_ignores_case() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");

    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "LookupTarget", "password123", Role::Founder)
        .await
        .expect("Failed to create test user");

    let found = matchdeck::user::get_user_id_from_username(&db, "lookuptarget").await;
    assert_eq!(found, Some(user.id));

    let found = matchdeck::user::get_user_id_from_username(&db, "LOOKUPTARGET").await;
    assert_eq!(found, Some(user.id));

    let found = matchdeck::user::get_user_id_from_username(&db, "someone_else").await;
    assert_eq!(found, None);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
