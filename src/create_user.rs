use crate::db::get_db_pool;
use crate::orm::users;
use crate::orm::users::{Role, VerificationStatus};
use crate::session::{get_argon2, get_sess};
use crate::user::Profile;
use actix_web::{error, post, web, Error, HttpRequest, HttpResponse};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    PasswordHasher,
};
use chrono::Utc;
use sea_orm::{entity::*, query::*, DbErr};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

#[derive(Deserialize, Validate)]
pub struct RegisterData {
    #[validate(length(min = 1, max = 255))]
    name: String,
    #[validate(length(min = 3, max = 64))]
    username: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 8, max = 1000))]
    password: String,
    /// Account role. The legacy client sends `userType` instead; both are
    /// accepted, but when both appear they must agree.
    role: Option<String>,
    #[serde(rename = "userType")]
    user_type: Option<String>,
}

/// Resolves the requested role from the `role` field and the legacy
/// `userType` alias. Divergent values are refused rather than silently
/// picking a winner. Staff roles cannot be self-assigned.
pub fn resolve_role(role: Option<&str>, user_type: Option<&str>) -> Result<Role, &'static str> {
    let value = match (role, user_type) {
        (Some(r), Some(t)) if !r.eq_ignore_ascii_case(t) => {
            return Err("role and userType disagree");
        }
        (Some(r), _) => r,
        (None, Some(t)) => t,
        (None, None) => return Err("role is required"),
    };

    let role = Role::from_str(&value.to_lowercase()).ok_or("unknown role")?;
    if role.is_staff() {
        return Err("this role cannot be chosen at registration");
    }
    Ok(role)
}

async fn insert_new_user(
    name: &str,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<users::Model, DbErr> {
    let db = get_db_pool();
    let now = Utc::now().naive_utc();

    users::ActiveModel {
        name: Set(name.to_owned()),
        username: Set(username.to_owned()),
        email: Set(email.to_owned()),
        password: Set(password_hash.to_owned()),
        role: Set(role),
        verification_status: Set(VerificationStatus::NotSubmitted),
        failed_login_attempts: Set(0),
        locked_until: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

#[post("/api/auth/register")]
pub async fn register_post(
    req: HttpRequest,
    cookies: actix_session::Session,
    data: web::Json<RegisterData>,
) -> Result<HttpResponse, Error> {
    // No session exists yet, so the brake is keyed by source address.
    let ip = crate::ip::extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string());
    if let Err(e) = crate::rate_limit::check_registration_rate_limit(&ip) {
        log::warn!("Rate limit exceeded for registration: ip={}", ip);
        return Err(error::ErrorTooManyRequests(format!(
            "Too many registration attempts. Please wait {} seconds.",
            e.retry_after_seconds
        )));
    }

    data.validate().map_err(|e| {
        log::debug!("Registration validation failed: {}", e);
        error::ErrorBadRequest("Invalid registration data")
    })?;

    let role = resolve_role(data.role.as_deref(), data.user_type.as_deref())
        .map_err(error::ErrorBadRequest)?;

    let name = data.name.trim();
    let username = data.username.trim().to_lowercase();
    let email = data.email.trim().to_lowercase();

    // Refuse duplicate handles up front for a friendly message. The unique
    // index still backstops races.
    let taken = users::Entity::find()
        .filter(users::Column::Username.eq(username.clone()))
        .count(get_db_pool())
        .await
        .map_err(|e| {
            log::error!("Registration lookup failed: {}", e);
            error::ErrorInternalServerError("Failed to create account")
        })?;
    if taken > 0 {
        return Err(error::ErrorConflict("Username is already registered."));
    }

    let password_hash = get_argon2()
        .hash_password(data.password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            error::ErrorInternalServerError("Failed to create account")
        })?
        .to_string();

    let user = insert_new_user(name, &username, &email, &password_hash, role)
        .await
        .map_err(|e| {
            log::error!("Failed to create user: {}", e);
            error::ErrorInternalServerError("Failed to create account")
        })?;

    log::info!(
        "New user registered: {} (user_id: {}, role: {})",
        username,
        user.id,
        role.as_str()
    );

    // Log the new account in immediately.
    let token = crate::session::new_session(get_sess(), user.id)
        .await
        .map_err(|e| {
            log::error!("Failed to create session: {}", e);
            error::ErrorInternalServerError("Failed to create account")
        })?
        .to_string();

    cookies
        .insert("logged_in", true)
        .map_err(|_| error::ErrorInternalServerError("middleware error"))?;
    cookies
        .insert("token", token)
        .map_err(|_| error::ErrorInternalServerError("middleware error"))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": Profile::from(user),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_role_accepts_either_field() {
        assert_eq!(resolve_role(Some("founder"), None), Ok(Role::Founder));
        assert_eq!(resolve_role(None, Some("investor")), Ok(Role::Investor));
        assert_eq!(
            resolve_role(Some("mentor"), Some("Mentor")),
            Ok(Role::Mentor)
        );
    }

    #[test]
    fn resolve_role_rejects_divergent_fields() {
        assert!(resolve_role(Some("founder"), Some("investor")).is_err());
    }

    #[test]
    fn resolve_role_rejects_staff_and_unknown() {
        assert!(resolve_role(Some("admin"), None).is_err());
        assert!(resolve_role(Some("superadmin"), None).is_err());
        assert!(resolve_role(Some("astronaut"), None).is_err());
        assert!(resolve_role(None, None).is_err());
    }
}
