use crate::message::{sniff, GuestEvent, RawMessage};
use serde_json::Value;

/// Key the settings nonce is merged under in submitted content.
pub const NONCE_KEY: &str = "nonce";

/// Which message origins the router trusts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Only messages whose origin equals the host page's origin.
    SameOrigin(String),
    /// No origin check at all.
    Unchecked,
}

impl OriginPolicy {
    pub fn allows(&self, origin: &str) -> bool {
        match self {
            OriginPolicy::SameOrigin(host) => host == origin,
            OriginPolicy::Unchecked => true,
        }
    }
}

/// Why a message produced no events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    OriginRejected,
    Unrecognized,
}

/// An event ready for dispatch to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutedEvent {
    Height(f64),
    Telemetry(Value),
    Submit { content: Value, id: Option<String> },
    GuestError(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    Ignored(IgnoreReason),
    Dispatched(Vec<RoutedEvent>),
}

/// Classifies guest messages for one mounted generation.
#[derive(Debug, Clone)]
pub struct Router {
    policy: OriginPolicy,
    min_height: f64,
    nonce: String,
    correlation_id: Option<String>,
}

impl Router {
    pub fn new(
        policy: OriginPolicy,
        min_height: f64,
        nonce: impl Into<String>,
        correlation_id: Option<String>,
    ) -> Self {
        Self {
            policy,
            min_height,
            nonce: nonce.into(),
            correlation_id,
        }
    }

    pub fn route(&self, message: &RawMessage) -> Routed {
        if !self.policy.allows(&message.origin) {
            tracing::debug!(origin = %message.origin, "dropping message from foreign origin");
            return Routed::Ignored(IgnoreReason::OriginRejected);
        }

        let events: Vec<RoutedEvent> = sniff(&message.data)
            .into_iter()
            .filter_map(|event| self.accept(event))
            .collect();

        if events.is_empty() {
            Routed::Ignored(IgnoreReason::Unrecognized)
        } else {
            Routed::Dispatched(events)
        }
    }

    fn accept(&self, event: GuestEvent) -> Option<RoutedEvent> {
        match event {
            GuestEvent::Height(h) if h.is_finite() && h > self.min_height => {
                Some(RoutedEvent::Height(h))
            }
            GuestEvent::Height(h) => {
                tracing::trace!(height = h, "height below threshold");
                None
            }
            GuestEvent::Statement(statement) => Some(RoutedEvent::Telemetry(statement)),
            GuestEvent::EditorSuccess(data) => Some(RoutedEvent::Submit {
                content: self.correlate(data),
                id: self.correlation_id.clone(),
            }),
            GuestEvent::EditorError(error) => Some(RoutedEvent::GuestError(error)),
        }
    }

    /// Merge the settings nonce into submitted content. Non-object content has
    /// nowhere to carry it and passes through unchanged.
    fn correlate(&self, mut data: Value) -> Value {
        if let Some(obj) = data.as_object_mut() {
            obj.insert(NONCE_KEY.to_string(), Value::String(self.nonce.clone()));
        }
        data
    }
}
