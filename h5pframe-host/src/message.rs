//! Wire shapes exchanged between host and guest windows.
//!
//! Guest messages are not tagged: the branch is chosen by which keys are
//! present, and one message may match several branches.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const HEIGHT_KEY: &str = "iFrameHeight";
pub const STATEMENT_KEY: &str = "statement";
pub const EDITOR_STATUS_KEY: &str = "h5pEditorStatus";

/// A window message as the host's listener receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub origin: String,
    pub data: Value,
}

impl RawMessage {
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }
}

/// One recognized branch of a guest message.
#[derive(Debug, Clone, PartialEq)]
pub enum GuestEvent {
    Height(f64),
    Statement(Value),
    EditorSuccess(Value),
    EditorError(Value),
}

/// Every branch `data` matches, in the order height, statement, editor status.
pub fn sniff(data: &Value) -> Vec<GuestEvent> {
    let Some(obj) = data.as_object() else {
        return Vec::new();
    };

    let mut events = Vec::new();
    if let Some(height) = obj.get(HEIGHT_KEY).and_then(Value::as_f64) {
        events.push(GuestEvent::Height(height));
    }
    if let Some(statement) = obj.get(STATEMENT_KEY) {
        events.push(GuestEvent::Statement(statement.clone()));
    }
    match obj.get(EDITOR_STATUS_KEY).and_then(Value::as_str) {
        Some("success") => events.push(GuestEvent::EditorSuccess(
            obj.get("data").cloned().unwrap_or_else(|| Value::Object(Default::default())),
        )),
        Some("error") => events.push(GuestEvent::EditorError(
            obj.get("error").cloned().unwrap_or(Value::Null),
        )),
        _ => {}
    }
    events
}

/// Messages the host posts into the guest window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    #[serde(rename = "TOKEN_CHANGED")]
    TokenChanged { token: Option<String> },
}
