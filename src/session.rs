use crate::db::get_db_pool;
use crate::orm::sessions;
use crate::user::Profile;
use argon2::Argon2;
use chrono::{NaiveDateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use sea_orm::{entity::*, query::*, DbErr};
use uuid::Uuid;

/// In-memory view of a database session row.
#[derive(Copy, Clone, Debug)]
pub struct Session {
    pub user_id: i32,
    pub expires_at: NaiveDateTime,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().naive_utc()
    }
}

/// Write-through cache over the sessions table, keyed by token.
pub type SessionMap = DashMap<Uuid, Session>;

static SESSION_CACHE: OnceCell<SessionMap> = OnceCell::new();
static ARGON2_SECRET: OnceCell<Vec<u8>> = OnceCell::new();

/// Prepares the session cache and the password hashing secret.
/// Requires the SALT environment variable.
pub fn init() {
    SESSION_CACHE
        .set(DashMap::new())
        .expect("session::init() called more than once.");
    ARGON2_SECRET
        .set(
            std::env::var("SALT")
                .expect("SALT must be set for password hashing.")
                .into_bytes(),
        )
        .expect("session::init() called more than once.");
}

pub fn get_sess() -> &'static SessionMap {
    SESSION_CACHE
        .get()
        .expect("Session cache is not initialized.")
}

/// Argon2id hasher keyed with the application secret. Hashes produced with
/// one SALT value never verify under another.
pub fn get_argon2() -> Argon2<'static> {
    let secret = ARGON2_SECRET
        .get()
        .expect("Argon2 secret is not initialized.");
    Argon2::new_with_secret(
        secret,
        argon2::Algorithm::default(),
        argon2::Version::default(),
        argon2::Params::default(),
    )
    .expect("Failed to construct Argon2.")
}

pub fn hash_password(pass: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::{rand_core::OsRng, SaltString};
    use argon2::PasswordHasher;

    Ok(get_argon2()
        .hash_password(pass.as_bytes(), &SaltString::generate(&mut OsRng))?
        .to_string())
}

/// Creates a session row and caches it. Returns the new token.
pub async fn new_session(ses_map: &SessionMap, user_id: i32) -> Result<Uuid, DbErr> {
    let uuid = Uuid::new_v4();
    let now = Utc::now().naive_utc();
    let lifetime_days = crate::app_config::security().session_lifetime_days;
    let session = Session {
        user_id,
        expires_at: now + chrono::Duration::days(lifetime_days as i64),
    };

    sessions::ActiveModel {
        id: Set(uuid.to_string()),
        user_id: Set(user_id),
        created_at: Set(now),
        expires_at: Set(session.expires_at),
    }
    .insert(get_db_pool())
    .await?;

    ses_map.insert(uuid, session);
    Ok(uuid)
}

/// Resolves a token to a live session, checking the cache before the
/// database. Expired sessions are evicted, not returned.
pub async fn authenticate_by_uuid(ses_map: &SessionMap, uuid: Uuid) -> Option<Session> {
    if let Some(session) = ses_map.get(&uuid) {
        if session.is_expired() {
            drop(session);
            if let Err(e) = remove_session(ses_map, uuid).await {
                log::error!("Failed to remove expired session: {}", e);
            }
            return None;
        }
        return Some(*session);
    }

    // Cache miss. Another process may have created the row, or we restarted.
    let row = sessions::Entity::find_by_id(uuid.to_string())
        .one(get_db_pool())
        .await
        .unwrap_or_else(|e| {
            log::error!("Session lookup failed: {}", e);
            None
        })?;

    let session = Session {
        user_id: row.user_id,
        expires_at: row.expires_at,
    };
    if session.is_expired() {
        return None;
    }

    ses_map.insert(uuid, session);
    Some(session)
}

/// Pulls the `token` cookie and resolves it to a session.
pub async fn authenticate_by_cookie(cookies: &actix_session::Session) -> Option<(Uuid, Session)> {
    let uuid = match cookies.get::<String>("token") {
        Ok(Some(token)) => match Uuid::parse_str(&token) {
            Ok(uuid) => uuid,
            Err(_) => return None,
        },
        _ => return None,
    };

    authenticate_by_uuid(get_sess(), uuid)
        .await
        .map(|session| (uuid, session))
}

/// Resolves the cookie session all the way to a user profile.
/// None for guests, bad tokens, and expired or orphaned sessions.
pub async fn authenticate_client_by_session(cookies: &actix_session::Session) -> Option<Profile> {
    let (_, session) = authenticate_by_cookie(cookies).await?;
    match Profile::get_by_id(get_db_pool(), session.user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            log::error!("Profile lookup failed for session user: {}", e);
            None
        }
    }
}

/// Deletes one session from the database and the cache.
pub async fn remove_session(ses_map: &SessionMap, uuid: Uuid) -> Result<(), DbErr> {
    sessions::Entity::delete_by_id(uuid.to_string())
        .exec(get_db_pool())
        .await?;
    ses_map.remove(&uuid);
    Ok(())
}

/// Reaps expired sessions. Run from the periodic maintenance task.
pub async fn expire_sessions(ses_map: &SessionMap) -> Result<u64, DbErr> {
    let now = Utc::now().naive_utc();
    let res = sessions::Entity::delete_many()
        .filter(sessions::Column::ExpiresAt.lte(now))
        .exec(get_db_pool())
        .await?;
    ses_map.retain(|_, session| !session.is_expired());
    if res.rows_affected > 0 {
        log::debug!("Expired {} session(s)", res.rows_affected);
    }
    Ok(res.rows_affected)
}
