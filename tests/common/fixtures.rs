//! Row factories the suites share: accounts in each role, listings, and
//! readback helpers for asserting on fresh state.
#![allow(dead_code)]
#![allow(clippy::needless_update)]

use chrono::Utc;
use matchdeck::orm::{products, users};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// An inserted account plus the plaintext password, for driving login.
pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub password: String,
}

fn hash_password(password: &str) -> Result<String, DbErr> {
    // Must go through the secret-keyed hasher or login will never verify.
    matchdeck::session::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))
}

async fn insert_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    role: users::Role,
    verification_status: users::VerificationStatus,
) -> Result<users::Model, DbErr> {
    let now = Utc::now().naive_utc();

    let user = users::ActiveModel {
        name: Set(username.to_string()),
        // Handles are stored lowercased; lookups lowercase their input
        username: Set(username.to_lowercase()),
        email: Set(format!("{}@test.com", username.to_lowercase())),
        password: Set(hash_password(password)?),
        role: Set(role),
        verification_status: Set(verification_status),
        failed_login_attempts: Set(0),
        locked_until: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    user.insert(db).await
}

/// Create a test user with known credentials and the given role
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    role: users::Role,
) -> Result<TestUser, DbErr> {
    let model = insert_user(
        db,
        username,
        password,
        role,
        users::VerificationStatus::NotSubmitted,
    )
    .await?;

    Ok(TestUser {
        id: model.id,
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Create an investor account
pub async fn create_test_investor(
    db: &DatabaseConnection,
    username: &str,
) -> Result<users::Model, DbErr> {
    insert_user(
        db,
        username,
        "password123",
        users::Role::Investor,
        users::VerificationStatus::NotSubmitted,
    )
    .await
}

/// Create an admin account
pub async fn create_test_admin(
    db: &DatabaseConnection,
    username: &str,
) -> Result<users::Model, DbErr> {
    insert_user(
        db,
        username,
        "password123",
        users::Role::Admin,
        users::VerificationStatus::NotSubmitted,
    )
    .await
}

/// Create a founder who has not submitted verification documents yet
pub async fn create_test_founder(
    db: &DatabaseConnection,
    username: &str,
) -> Result<users::Model, DbErr> {
    insert_user(
        db,
        username,
        "password123",
        users::Role::Founder,
        users::VerificationStatus::NotSubmitted,
    )
    .await
}

/// Create a founder with an arbitrary verification status
pub async fn create_founder_with_status(
    db: &DatabaseConnection,
    username: &str,
    status: users::VerificationStatus,
) -> Result<users::Model, DbErr> {
    insert_user(db, username, "password123", users::Role::Founder, status).await
}

/// Create a founder who already passed document verification
pub async fn create_verified_founder(
    db: &DatabaseConnection,
    username: &str,
) -> Result<users::Model, DbErr> {
    create_founder_with_status(db, username, users::VerificationStatus::Approved).await
}

/// An account already at the attempt ceiling. Negative minutes backdate the
/// lock so it reads as expired.
pub async fn create_locked_test_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    minutes_until_unlock: i64,
) -> Result<TestUser, DbErr> {
    let now = Utc::now().naive_utc();
    let lock_until = now + chrono::Duration::minutes(minutes_until_unlock);
    let max_attempts = matchdeck::app_config::security().max_failed_logins as i32;

    let user = users::ActiveModel {
        name: Set(username.to_string()),
        username: Set(username.to_lowercase()),
        email: Set(format!("{}@test.com", username.to_lowercase())),
        password: Set(hash_password(password)?),
        role: Set(users::Role::Investor),
        verification_status: Set(users::VerificationStatus::NotSubmitted),
        failed_login_attempts: Set(max_attempts),
        locked_until: Set(Some(lock_until)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(TestUser {
        id: user.id,
        username: username.to_string(),
        password: password.to_string(),
    })
}

pub async fn get_failed_attempts(db: &DatabaseConnection, user_id: i32) -> Result<i32, DbErr> {
    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("User not found".to_string()))?;

    Ok(user.failed_login_attempts)
}

/// True while `locked_until` is still in the future.
pub async fn is_user_locked(db: &DatabaseConnection, user_id: i32) -> Result<bool, DbErr> {
    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("User not found".to_string()))?;

    if let Some(locked_until) = user.locked_until {
        Ok(locked_until > Utc::now().naive_utc())
    } else {
        Ok(false)
    }
}

/// Reload a user row after an operation that may have changed it
pub async fn reload_user(db: &DatabaseConnection, user_id: i32) -> Result<users::Model, DbErr> {
    users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("User not found".to_string()))
}

/// Insert a product listing directly with the given status
pub async fn create_test_product(
    db: &DatabaseConnection,
    founder_id: i32,
    name: &str,
    status: products::ProductStatus,
) -> Result<products::Model, DbErr> {
    let now = Utc::now().naive_utc();

    products::ActiveModel {
        founder_id: Set(founder_id),
        name: Set(name.to_string()),
        category: Set("SaaS".to_string()),
        summary: Set(format!("{} in one line", name)),
        description: Set(format!("{} is a longer description used by tests.", name)),
        business_model: Set(Some("Subscription".to_string())),
        pricing: Set(None),
        tags: Set(Some("b2b, analytics".to_string())),
        benefits: Set(None),
        status: Set(status),
        interest_count: Set(0),
        reviewer_id: Set(None),
        rejection_reason: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Reload a product row after an operation that may have changed it
pub async fn reload_product(
    db: &DatabaseConnection,
    product_id: i32,
) -> Result<products::Model, DbErr> {
    products::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("Product not found".to_string()))
}

