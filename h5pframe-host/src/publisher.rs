//! Turns synthesized documents into navigable addresses for the iframe.

use crate::error::{BridgeError, BridgeResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// An opaque iframe navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where addresses come from.
pub trait AddressBackend: Send + Sync {
    fn create(&self, html: &str) -> BridgeResult<Address>;
    fn revoke(&self, address: &Address);
}

/// Page-scoped in-memory documents behind `blob:` addresses.
pub struct BlobStore {
    origin: String,
    blobs: DashMap<String, Arc<str>>,
    /// Live plus in-flight addresses. Reserved before insert so concurrent
    /// creators cannot overshoot `max_live`.
    reserved: AtomicUsize,
    max_live: Option<usize>,
}

impl BlobStore {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            blobs: DashMap::new(),
            reserved: AtomicUsize::new(0),
            max_live: None,
        }
    }

    pub fn with_capacity_limit(origin: impl Into<String>, max_live: usize) -> Self {
        Self {
            max_live: Some(max_live),
            ..Self::new(origin)
        }
    }

    /// Fetch the document behind a live address.
    pub fn resolve(&self, address: &Address) -> Option<Arc<str>> {
        self.blobs.get(address.as_str()).map(|b| Arc::clone(b.value()))
    }

    pub fn live_count(&self) -> usize {
        self.blobs.len()
    }
}

impl AddressBackend for BlobStore {
    fn create(&self, html: &str) -> BridgeResult<Address> {
        let max = self.max_live.unwrap_or(usize::MAX);
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .map_err(|n| {
                BridgeError::AddressCreation(format!("blob store is full ({} live addresses)", n))
            })?;
        let url = format!("blob:{}/{}", self.origin, Uuid::new_v4());
        self.blobs.insert(url.clone(), Arc::from(html));
        Ok(Address(url))
    }

    fn revoke(&self, address: &Address) {
        if self.blobs.remove(address.as_str()).is_some() {
            self.reserved.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Self-contained `data:` URLs. Nothing to release on revoke.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUrlBackend;

impl AddressBackend for DataUrlBackend {
    fn create(&self, html: &str) -> BridgeResult<Address> {
        Ok(Address(format!(
            "data:text/html;charset=utf-8;base64,{}",
            STANDARD.encode(html)
        )))
    }

    fn revoke(&self, _address: &Address) {}
}

/// Holds at most one live address; publishing a new one revokes the old.
pub struct Publisher {
    backend: Arc<dyn AddressBackend>,
    current: Option<Address>,
}

impl Publisher {
    pub fn new(backend: Arc<dyn AddressBackend>) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    /// The previous address is revoked before the new one is created, so a
    /// failure leaves nothing to navigate to.
    pub fn publish(&mut self, html: &str) -> BridgeResult<Address> {
        self.revoke();
        match self.backend.create(html) {
            Ok(address) => {
                tracing::info!(address = %truncate(address.as_str()), "published guest document");
                self.current = Some(address.clone());
                Ok(address)
            }
            Err(e) => {
                tracing::warn!(error = %e, "address creation failed");
                Err(e)
            }
        }
    }

    pub fn revoke(&mut self) {
        if let Some(old) = self.current.take() {
            tracing::debug!(address = %truncate(old.as_str()), "revoking address");
            self.backend.revoke(&old);
        }
    }

    pub fn current(&self) -> Option<&Address> {
        self.current.as_ref()
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.revoke();
    }
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(64) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
