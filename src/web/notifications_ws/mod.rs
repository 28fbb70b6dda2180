//! Live notification channel over WebSockets.
//!
//! Clients open `GET /notifications.ws` after logging in. Every stored
//! notification row is also pushed down this channel as a JSON frame, and
//! staff sockets additionally receive review-queue refresh hints so open
//! dashboards can refetch without polling. Delivery is best-effort: the
//! database row stays authoritative and a closed socket is never an error.

pub mod hub;
pub mod message;
pub mod socket;

use crate::middleware::ClientCtx;
use actix::Addr;
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use once_cell::sync::OnceCell;
use std::time::Duration;

pub use hub::PushHub;
pub use message::{AlertPayload, QueueNudge, UserAlert};

/// How often sockets ping their client.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// Quiet period after which a client is presumed gone.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

static PUSH_HUB: OnceCell<Addr<PushHub>> = OnceCell::new();

/// Store the hub address for code running outside the actix data graph.
pub fn init_push_hub(hub: Addr<PushHub>) {
    PUSH_HUB.set(hub).expect("Push hub already initialized");
}

/// Hub address, or None when no server is running (tests, CLI tools).
pub fn push_hub() -> Option<&'static Addr<PushHub>> {
    PUSH_HUB.get()
}

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(open_notification_socket);
}

/// Upgrades an authenticated request onto the push channel.
#[get("/notifications.ws")]
pub async fn open_notification_socket(
    req: HttpRequest,
    stream: web::Payload,
    client: ClientCtx,
    hub: web::Data<Addr<PushHub>>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;

    ws::start(
        socket::PushSocket::new(user_id, client.is_staff(), hub.get_ref().clone()),
        &req,
        stream,
    )
}

/// Hand a freshly stored notification to the hub for live delivery.
pub fn push_user_alert(
    hub: &Addr<PushHub>,
    user_id: i32,
    notification_id: i32,
    notification_type: &str,
    title: &str,
    body: &str,
    url: Option<&str>,
) {
    hub.do_send(UserAlert {
        user_id,
        alert: AlertPayload {
            id: notification_id,
            notification_type: notification_type.to_owned(),
            title: title.to_owned(),
            message: body.to_owned(),
            url: url.map(str::to_owned),
            created_at: chrono::Utc::now().to_rfc3339(),
        },
    });
}

/// Tell staff dashboards that one of the review queues changed.
pub fn nudge_queue(hub: &Addr<PushHub>, queue: &str) {
    hub.do_send(QueueNudge {
        queue: queue.to_owned(),
    });
}
