//! Per-client socket actor for the push channel.

use super::hub::PushHub;
use super::message::{Frame, Subscribe, Unsubscribe};
use super::{CLIENT_TIMEOUT, HEARTBEAT_INTERVAL};
use actix::*;
use actix_web_actors::ws;
use std::time::Instant;

/// One browser tab on the push channel.
///
/// Frames from the hub pass through verbatim. Client traffic is limited to
/// keep-alives; the channel is server-push only.
pub struct PushSocket {
    socket_id: usize,
    user_id: i32,
    staff: bool,
    last_seen: Instant,
    hub: Addr<PushHub>,
}

impl PushSocket {
    pub fn new(user_id: i32, staff: bool, hub: Addr<PushHub>) -> Self {
        Self {
            socket_id: 0,
            user_id,
            staff,
            last_seen: Instant::now(),
            hub,
        }
    }

    fn subscribe(&self, ctx: &mut ws::WebsocketContext<Self>) {
        self.hub
            .send(Subscribe {
                pipe: ctx.address().recipient(),
                user_id: self.user_id,
                staff: self.staff,
            })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(socket_id) => act.socket_id = socket_id,
                    Err(err) => {
                        log::warn!("Push hub rejected a subscription: {:?}", err);
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }
}

impl Actor for PushSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.subscribe(ctx);

        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if act.last_seen.elapsed() > CLIENT_TIMEOUT {
                log::debug!("Push socket for user {} timed out", act.user_id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.hub.do_send(Unsubscribe {
            socket_id: self.socket_id,
        });
        Running::Stop
    }
}

/// Frames relayed from the hub go straight to the client.
impl Handler<Frame> for PushSocket {
    type Result = ();

    fn handle(&mut self, msg: Frame, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for PushSocket {
    fn handle(&mut self, item: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let frame = match item {
            Ok(frame) => frame,
            Err(_) => return ctx.stop(),
        };

        match frame {
            ws::Message::Ping(payload) => {
                self.last_seen = Instant::now();
                ctx.pong(&payload);
            }
            ws::Message::Pong(_) => self.last_seen = Instant::now(),
            ws::Message::Text(text) => {
                // Clients without frame-level ping access send a literal "ping".
                if text.trim() == "ping" {
                    self.last_seen = Instant::now();
                    ctx.text(r#"{"type":"pong"}"#);
                }
            }
            ws::Message::Close(reason) => {
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Continuation(_) => ctx.stop(),
            ws::Message::Binary(_) | ws::Message::Nop => (),
        }
    }
}
