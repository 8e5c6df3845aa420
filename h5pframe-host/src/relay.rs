//! Host-to-guest token delivery. Fire-and-forget: nothing is acknowledged,
//! queued or replayed.

use crate::message::HostMessage;
use serde_json::Value;
use tokio::sync::mpsc;

/// The guest's window as seen from the host.
pub trait GuestWindow: Send + Sync {
    fn post_message(&self, message: Value);
}

/// A guest window backed by a channel. Messages posted after the receiver is
/// gone are lost.
#[derive(Debug, Clone)]
pub struct ChannelWindow {
    tx: mpsc::UnboundedSender<Value>,
}

impl ChannelWindow {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl GuestWindow for ChannelWindow {
    fn post_message(&self, message: Value) {
        if self.tx.send(message).is_err() {
            tracing::debug!("guest window closed, message dropped");
        }
    }
}

/// Post `{type: "TOKEN_CHANGED", token}` into the guest.
pub fn push_token(window: &dyn GuestWindow, token: Option<&str>) {
    let message = HostMessage::TokenChanged {
        token: token.map(str::to_string),
    };
    match serde_json::to_value(&message) {
        Ok(value) => window.post_message(value),
        Err(e) => tracing::warn!(error = %e, "could not encode token message"),
    }
}
