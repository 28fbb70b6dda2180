//! Hub actor that fans stored notifications out to open sockets.

use super::message::{Frame, QueueNudge, Subscribe, Unsubscribe, UserAlert};
use actix::prelude::*;
use rand::{rngs::ThreadRng, Rng};
use std::collections::{HashMap, HashSet};

struct Socket {
    pipe: Recipient<Frame>,
    user_id: i32,
    staff: bool,
}

/// Fan-out point for the live notification channel.
///
/// Sockets register after their handshake. The hub keys them by a random id
/// and groups them per user, so one account can hold several tabs open.
pub struct PushHub {
    rng: ThreadRng,
    sockets: HashMap<usize, Socket>,
    /// User id -> socket ids. An entry leaves when its last socket closes.
    user_index: HashMap<i32, HashSet<usize>>,
}

impl PushHub {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            sockets: HashMap::new(),
            user_index: HashMap::new(),
        }
    }

    fn relay_to_user(&self, user_id: i32, frame: &str) {
        if let Some(ids) = self.user_index.get(&user_id) {
            for id in ids {
                if let Some(socket) = self.sockets.get(id) {
                    socket.pipe.do_send(Frame(frame.to_owned()));
                }
            }
        }
    }

    fn relay_to_staff(&self, frame: &str) {
        for socket in self.sockets.values().filter(|s| s.staff) {
            socket.pipe.do_send(Frame(frame.to_owned()));
        }
    }
}

impl Default for PushHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for PushHub {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        ctx.set_mailbox_capacity(64);
        log::info!("Notification push hub online.");
    }
}

/// Handler for Subscribe.
impl Handler<Subscribe> for PushHub {
    type Result = usize;

    fn handle(&mut self, msg: Subscribe, _: &mut Context<Self>) -> Self::Result {
        let socket_id = self.rng.gen::<usize>();

        self.user_index
            .entry(msg.user_id)
            .or_insert_with(HashSet::new)
            .insert(socket_id);
        self.sockets.insert(
            socket_id,
            Socket {
                pipe: msg.pipe,
                user_id: msg.user_id,
                staff: msg.staff,
            },
        );

        log::debug!(
            "Push socket opened for user {} ({} open in total)",
            msg.user_id,
            self.sockets.len()
        );

        socket_id
    }
}

/// Handler for Unsubscribe.
impl Handler<Unsubscribe> for PushHub {
    type Result = ();

    fn handle(&mut self, msg: Unsubscribe, _: &mut Context<Self>) {
        if let Some(socket) = self.sockets.remove(&msg.socket_id) {
            if let Some(ids) = self.user_index.get_mut(&socket.user_id) {
                ids.remove(&msg.socket_id);
                if ids.is_empty() {
                    self.user_index.remove(&socket.user_id);
                }
            }

            log::debug!(
                "Push socket closed for user {} ({} still open)",
                socket.user_id,
                self.sockets.len()
            );
        }
    }
}

/// Handler for UserAlert.
impl Handler<UserAlert> for PushHub {
    type Result = ();

    fn handle(&mut self, msg: UserAlert, _: &mut Context<Self>) {
        let envelope = serde_json::json!({
            "type": "notification",
            "data": msg.alert,
        });

        match serde_json::to_string(&envelope) {
            Ok(frame) => self.relay_to_user(msg.user_id, &frame),
            Err(err) => log::warn!("Alert frame failed to serialize: {}", err),
        }
    }
}

/// Handler for QueueNudge.
impl Handler<QueueNudge> for PushHub {
    type Result = ();

    fn handle(&mut self, msg: QueueNudge, _: &mut Context<Self>) {
        // Queue names are fixed strings, safe to splice into JSON directly.
        let frame = format!(
            "{{\"type\":\"queue_changed\",\"data\":{{\"queue\":\"{}\"}}}}",
            msg.queue
        );
        self.relay_to_staff(&frame);
    }
}

impl Supervised for PushHub {
    fn restarting(&mut self, _: &mut Context<PushHub>) {
        log::warn!("Restarting the push hub.");
    }
}
