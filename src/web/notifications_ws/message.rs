//! Actor messages exchanged between push sockets and the hub.

use actix::prelude::*;
use serde::Serialize;

/// Socket registration, sent once after the WS handshake completes.
pub struct Subscribe {
    /// Channel the hub uses to reach this socket.
    pub pipe: Recipient<Frame>,
    pub user_id: i32,
    /// Staff sockets also receive review-queue refresh hints.
    pub staff: bool,
}

impl Message for Subscribe {
    /// Hub-assigned socket id, echoed back in `Unsubscribe`.
    type Result = usize;
}

pub struct Unsubscribe {
    pub socket_id: usize,
}

impl Message for Unsubscribe {
    type Result = ();
}

/// Raw text frame relayed down one socket.
pub struct Frame(pub String);

impl Message for Frame {
    type Result = ();
}

/// Push one stored notification to every socket its user has open.
#[derive(Clone)]
pub struct UserAlert {
    pub user_id: i32,
    pub alert: AlertPayload,
}

impl Message for UserAlert {
    type Result = ();
}

/// Tell staff dashboards that one review queue changed.
#[derive(Clone)]
pub struct QueueNudge {
    /// One of "queries", "products", "verification", "calls".
    pub queue: String,
}

impl Message for QueueNudge {
    type Result = ();
}

/// Client-facing body of a pushed notification.
#[derive(Clone, Serialize)]
pub struct AlertPayload {
    pub id: i32,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub url: Option<String>,
    pub created_at: String,
}
