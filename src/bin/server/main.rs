use actix::Actor;
use actix_session::config::PersistentSession;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::{Key, SameSite};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::{DefaultHeaders, ErrorHandlers, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use matchdeck::db::{get_db_pool, init_db};
use matchdeck::middleware::ClientCtx;
use matchdeck::web::notifications_ws::PushHub;
use std::time::Duration;

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(300);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().expect("DotEnv failed to initialize.");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    // Module init order: config before anything that reads it.
    matchdeck::app_config::init();
    matchdeck::session::init();
    init_db(std::env::var("DATABASE_URL").expect("DATABASE_URL must be set.")).await;
    matchdeck::rate_limit::init_rate_limits();

    let signing_key = session_signing_key();

    let push_hub = PushHub::new().start();
    matchdeck::web::notifications_ws::init_push_hub(push_hub.clone());

    actix_web::rt::spawn(maintenance_loop());

    let bind = matchdeck::app_config::server().bind;
    log::info!("Listening on http://{}", bind);

    HttpServer::new(move || {
        // wrap() layers run in reverse declaration order, so the session
        // middleware below executes before ClientCtx can read it.
        App::new()
            .app_data(Data::new(get_db_pool()))
            .app_data(Data::new(push_hub.clone()))
            .wrap(security_headers())
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::BAD_REQUEST, matchdeck::web::error::render_400)
                    .handler(StatusCode::NOT_FOUND, matchdeck::web::error::render_404)
                    .handler(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        matchdeck::web::error::render_500,
                    ),
            )
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), signing_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(false) // dev runs plain HTTP
                    .session_lifecycle(PersistentSession::default())
                    .build(),
            )
            .wrap(Logger::new("%a %{User-Agent}i"))
            .configure(matchdeck::web::configure)
    })
    .bind(bind)?
    .run()
    .await
}

/// Cookie signing key from `SECRET_KEY`, or a throwaway random key when the
/// variable is unset or shorter than the 64 bytes actix requires. A throwaway
/// key logs out every session on restart, so it only warns instead of failing.
fn session_signing_key() -> Key {
    match std::env::var("SECRET_KEY") {
        Ok(key) if key.len() >= 64 => Key::from(key.as_bytes()),
        other => {
            if let Ok(short) = other {
                log::warn!(
                    "SECRET_KEY is {} bytes but must be at least 64. Using a random key; sessions will not survive a restart.",
                    short.len()
                );
            } else {
                log::warn!(
                    "SECRET_KEY is not set. Using a random key; sessions will not survive a restart."
                );
            }
            Key::generate()
        }
    }
}

fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::X_FRAME_OPTIONS, "DENY"))
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add(("X-XSS-Protection", "0"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
        .add((
            "Permissions-Policy",
            "geolocation=(), microphone=(), camera=()",
        ))
}

/// Periodic in-process housekeeping: drops idle rate-limit windows and reaps
/// expired session rows. Runs for the life of the server.
async fn maintenance_loop() {
    let mut interval = actix_web::rt::time::interval(MAINTENANCE_INTERVAL);
    loop {
        interval.tick().await;
        matchdeck::rate_limit::sweep_stale();
        match matchdeck::session::expire_sessions(matchdeck::session::get_sess()).await {
            Ok(reaped) if reaped > 0 => log::info!("Reaped {} expired sessions", reaped),
            Ok(_) => log::debug!("Maintenance sweep completed"),
            Err(e) => log::warn!("Session expiry sweep failed: {}", e),
        }
    }
}
