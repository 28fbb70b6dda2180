//! Session-bound CSRF tokens.
//!
//! Cookie sessions leave state-changing requests forgeable from other
//! origins, so every mutating endpoint demands a token that only same-origin
//! scripts can read. The token is minted on first use of a session, handed
//! to the client by `GET /api/auth/me`, and echoed back as a `csrfToken`
//! field in the JSON body of every mutating request.

use actix_session::Session;
use actix_web::{error, Error};
use rand::{distributions::Alphanumeric, Rng};

const TOKEN_LEN: usize = 32;
const SESSION_SLOT: &str = "csrf_token";

fn mint_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Token for this session, minting one on first use.
pub fn get_or_create_csrf_token(session: &Session) -> Result<String, Error> {
    if let Ok(Some(token)) = session.get::<String>(SESSION_SLOT) {
        return Ok(token);
    }

    let token = mint_token();
    session
        .insert(SESSION_SLOT, token.clone())
        .map_err(|_| error::ErrorInternalServerError("Could not persist CSRF token"))?;
    Ok(token)
}

/// Compare a token from a request body against the session's token.
///
/// Mutating handlers call this before touching anything.
pub fn validate_csrf_token(session: &Session, provided: &str) -> Result<(), Error> {
    let expected = session
        .get::<String>(SESSION_SLOT)
        .map_err(|_| error::ErrorInternalServerError("Could not read CSRF token"))?
        .ok_or_else(|| error::ErrorForbidden("No CSRF token in session"))?;

    if provided != expected {
        log::warn!("Rejected a request carrying a mismatched CSRF token");
        return Err(error::ErrorForbidden("CSRF token mismatch"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_tokens_are_unique_and_sized() {
        let a = mint_token();
        let b = mint_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert_eq!(b.len(), TOKEN_LEN);
        assert_ne!(a, b);
    }
}
