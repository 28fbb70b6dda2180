//! Credential checks and session issue for `POST /api/auth/login`.
//!
//! Failed attempts count against the account as well as the rate limiter.
//! Once `security.max_failed_logins` is reached the account locks for
//! `security.lockout_duration_minutes`, correct password or not.
use crate::db::get_db_pool;
use crate::orm::users;
use crate::session;
use crate::session::{get_argon2, get_sess};
use crate::user::Profile;
use actix_web::{error, post, web, Error, HttpRequest, HttpResponse, Responder};
use argon2::password_hash::{PasswordHash, PasswordVerifier};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{entity::*, query::*, DbErr};
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login);
}

#[derive(Deserialize)]
pub struct LoginData {
    username: String,
    password: String,
}

#[derive(Debug)]
pub enum LoginResultStatus {
    Success,
    BadName,
    BadPassword,
    AccountLocked,
}

pub struct LoginResult {
    pub result: LoginResultStatus,
    pub user: Option<users::Model>,
}

impl LoginResult {
    fn success(user: users::Model) -> Self {
        Self {
            result: LoginResultStatus::Success,
            user: Some(user),
        }
    }
    fn fail(result: LoginResultStatus) -> Self {
        Self { result, user: None }
    }
}

/// Zeroes the failure counter and lock deadline.
async fn clear_lockout(db: &sea_orm::DatabaseConnection, user: users::Model) -> Result<(), DbErr> {
    let mut row: users::ActiveModel = user.into();
    row.failed_login_attempts = Set(0);
    row.locked_until = Set(None);
    row.update(db).await?;
    Ok(())
}

/// Checks credentials and maintains the per-account failure counter.
///
/// Usernames are matched after trimming and lowercasing, the same
/// normalization registration applies.
pub async fn login(username: &str, pass: &str) -> Result<LoginResult, DbErr> {
    let security = crate::app_config::security();
    let max_failed = security.max_failed_logins as i32;

    let db = get_db_pool();
    let user = users::Entity::find()
        .filter(users::Column::Username.eq(username.trim().to_lowercase()))
        .one(db)
        .await?;

    let mut user = match user {
        Some(user) => user,
        None => return Ok(LoginResult::fail(LoginResultStatus::BadName)),
    };

    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now().naive_utc() {
            return Ok(LoginResult::fail(LoginResultStatus::AccountLocked));
        }
        // The lock deadline has passed; the account gets a fresh counter.
        clear_lockout(db, user.clone()).await?;
        user.failed_login_attempts = 0;
        user.locked_until = None;
    }

    let hash = match PasswordHash::new(&user.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Unreadable password hash for user_id={}: {}", user.id, e);
            return Ok(LoginResult::fail(LoginResultStatus::BadPassword));
        }
    };

    if get_argon2()
        .verify_password(pass.as_bytes(), &hash)
        .is_err()
    {
        let attempts = user.failed_login_attempts + 1;
        let mut row: users::ActiveModel = user.clone().into();
        row.failed_login_attempts = Set(attempts);

        if attempts >= max_failed {
            let deadline = Utc::now().naive_utc()
                + chrono::Duration::minutes(security.lockout_duration_minutes as i64);
            row.locked_until = Set(Some(deadline));
            log::warn!(
                "Locking user_id={} after {} failed login attempts",
                user.id,
                attempts
            );
        }

        row.update(db).await?;
        return Ok(LoginResult::fail(LoginResultStatus::BadPassword));
    }

    if user.failed_login_attempts > 0 || user.locked_until.is_some() {
        clear_lockout(db, user.clone()).await?;
    }

    Ok(LoginResult::success(user))
}

#[post("/api/auth/login")]
pub async fn post_login(
    req: HttpRequest,
    cookies: actix_session::Session,
    data: web::Json<LoginData>,
) -> Result<impl Responder, Error> {
    let ip = crate::ip::extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string());
    if let Err(e) = crate::rate_limit::check_login_rate_limit(&ip, &data.username) {
        log::warn!("Login rate limit hit: ip={}", ip);
        return Err(error::ErrorTooManyRequests(format!(
            "Too many login attempts. Please wait {} seconds.",
            e.retry_after_seconds
        )));
    }

    let outcome = login(&data.username, &data.password).await.map_err(|e| {
        log::error!("Login query failed: {}", e);
        error::ErrorInternalServerError("DB error")
    })?;

    let user = match outcome.result {
        LoginResultStatus::Success => match outcome.user {
            Some(user) => user,
            None => return Err(error::ErrorInternalServerError("DB error")),
        },
        LoginResultStatus::AccountLocked => {
            log::warn!("Login attempt on locked account: {}", data.username);
            return Err(error::ErrorForbidden(format!(
                "Account locked due to too many failed login attempts. Please try again in {} minutes.",
                crate::app_config::security().lockout_duration_minutes
            )));
        }
        // One refusal for unknown names and wrong passwords, so callers
        // cannot probe which usernames exist.
        LoginResultStatus::BadName | LoginResultStatus::BadPassword => {
            log::debug!("Login refused ({:?}) for {}", outcome.result, data.username);
            return Err(error::ErrorUnauthorized("Invalid username or password."));
        }
    };

    let token = session::new_session(get_sess(), user.id)
        .await
        .map_err(|e| {
            log::error!("Session create failed: {}", e);
            error::ErrorInternalServerError("DB error")
        })?
        .to_string();

    cookies
        .insert("logged_in", true)
        .and_then(|_| cookies.insert("token", token))
        .map_err(|_| error::ErrorInternalServerError("middleware error"))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": Profile::from(user),
    })))
}
