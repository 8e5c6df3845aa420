#![allow(dead_code)]

use h5pframe_doc::{extract_boot_data, BootData};
use h5pframe_host::{Address, BlobStore, BridgeError, GuestWindow, HostCallbacks};
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

pub const HOST: &str = "https://host.example";

/// Records every callback invocation.
#[derive(Default)]
pub struct Recorder {
    pub submits: Mutex<Vec<(Value, Option<String>)>>,
    pub errors: Mutex<Vec<BridgeError>>,
    pub telemetry: Mutex<Vec<Value>>,
}

impl Recorder {
    pub fn submits(&self) -> Vec<(Value, Option<String>)> {
        self.submits.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<BridgeError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn telemetry(&self) -> Vec<Value> {
        self.telemetry.lock().unwrap().clone()
    }
}

impl HostCallbacks for Recorder {
    fn on_submit(&self, content: Value, id: Option<String>) {
        self.submits.lock().unwrap().push((content, id));
    }

    fn on_error(&self, error: BridgeError) {
        self.errors.lock().unwrap().push(error);
    }

    fn on_telemetry(&self, statement: Value) {
        self.telemetry.lock().unwrap().push(statement);
    }
}

/// Stands in for the editor bootstrap running inside the iframe: boots from the
/// published document and builds AJAX URLs with whatever token it holds.
pub struct FakeGuest {
    pub boot: BootData,
    ajax_path: String,
    token: Mutex<Option<String>>,
}

impl FakeGuest {
    pub fn load(store: &BlobStore, address: &Address) -> Self {
        let html = store.resolve(address).expect("address should be live");
        let boot = extract_boot_data(&html).expect("document should carry boot data");
        let ajax_path = boot
            .settings
            .extra
            .get("editor")
            .and_then(|e| e.get("ajaxPath"))
            .and_then(Value::as_str)
            .unwrap_or("/ajax?action=")
            .to_string();
        let token = boot.token.clone();
        Self {
            boot,
            ajax_path,
            token: Mutex::new(token),
        }
    }

    /// Mirrors `withToken` in the editor bootstrap.
    pub fn ajax_url(&self, action: &str) -> String {
        let url = format!("{}{}", self.ajax_path, action);
        match self.token.lock().unwrap().as_deref() {
            Some(token) if !token.is_empty() => {
                let sep = if url.contains('?') { '&' } else { '?' };
                format!("{}{}_token={}", url, sep, token)
            }
            _ => url,
        }
    }
}

impl GuestWindow for FakeGuest {
    fn post_message(&self, message: Value) {
        if message.get("type").and_then(Value::as_str) == Some("TOKEN_CHANGED") {
            *self.token.lock().unwrap() = message
                .get("token")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
    }
}

/// Let the frame task drain its queue. With a paused clock the runtime only
/// advances time once every task is idle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
