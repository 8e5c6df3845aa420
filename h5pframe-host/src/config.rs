use crate::error::{BridgeError, BridgeResult};
use crate::layout::LayoutPolicy;
use crate::publisher::BlobStore;
use crate::router::OriginPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for one embedded frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Coalescing window for guest height reports.
    #[serde(default = "default_height_debounce_ms")]
    pub height_debounce_ms: u64,
    /// Reveal the frame after this long even if the guest never reports a height.
    #[serde(default = "default_ready_grace_period_ms")]
    pub ready_grace_period_ms: u64,
    /// Heights at or below this are ignored.
    #[serde(default = "default_min_accepted_height")]
    pub min_accepted_height: f64,
    /// Container height while the guest is not ready. Must stay non-zero or the
    /// guest's resize observer may never fire.
    #[serde(default = "default_placeholder_height")]
    pub placeholder_height: f64,
    /// Container height after the grace period reveals a guest that never
    /// reported its own height.
    #[serde(default = "default_reveal_height")]
    pub reveal_height: f64,
    /// Accept guest messages from any origin.
    ///
    /// `allowSameOrigin` is accepted as an alias: despite its name, that flag has
    /// always meant "skip the origin check entirely".
    #[serde(default, alias = "allowSameOrigin")]
    pub skip_origin_check: bool,
    /// Upper bound on live blob addresses in a shared store. `None` is unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_live_addresses: Option<usize>,
}

fn default_height_debounce_ms() -> u64 {
    150
}

fn default_ready_grace_period_ms() -> u64 {
    3000
}

fn default_min_accepted_height() -> f64 {
    10.0
}

fn default_placeholder_height() -> f64 {
    1.0
}

fn default_reveal_height() -> f64 {
    150.0
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            height_debounce_ms: default_height_debounce_ms(),
            ready_grace_period_ms: default_ready_grace_period_ms(),
            min_accepted_height: default_min_accepted_height(),
            placeholder_height: default_placeholder_height(),
            reveal_height: default_reveal_height(),
            skip_origin_check: false,
            max_live_addresses: None,
        }
    }
}

impl BridgeConfig {
    pub fn from_yaml_str(yaml: &str) -> BridgeResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()
    }

    pub fn from_json_str(json: &str) -> BridgeResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    fn validate(self) -> BridgeResult<Self> {
        if self.placeholder_height.is_nan() || self.placeholder_height <= 0.0 {
            return Err(BridgeError::Config(format!(
                "placeholderHeight must be positive, got {}",
                self.placeholder_height
            )));
        }
        if !self.reveal_height.is_finite() || self.reveal_height <= 0.0 {
            return Err(BridgeError::Config(format!(
                "revealHeight must be a positive number, got {}",
                self.reveal_height
            )));
        }
        if !self.min_accepted_height.is_finite() || self.min_accepted_height < 0.0 {
            return Err(BridgeError::Config(format!(
                "minAcceptedHeight must be a non-negative number, got {}",
                self.min_accepted_height
            )));
        }
        if self.max_live_addresses == Some(0) {
            return Err(BridgeError::Config(
                "maxLiveAddresses must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn layout_policy(&self) -> LayoutPolicy {
        LayoutPolicy {
            debounce: Duration::from_millis(self.height_debounce_ms),
            grace_period: Duration::from_millis(self.ready_grace_period_ms),
            placeholder_height: self.placeholder_height,
            reveal_height: self.reveal_height,
        }
    }

    /// A blob store for `origin`, bounded by `maxLiveAddresses` when set.
    pub fn blob_store(&self, origin: &str) -> BlobStore {
        match self.max_live_addresses {
            Some(max) => BlobStore::with_capacity_limit(origin, max),
            None => BlobStore::new(origin),
        }
    }

    pub fn origin_policy(&self, host_origin: &str) -> OriginPolicy {
        if self.skip_origin_check {
            OriginPolicy::Unchecked
        } else {
            OriginPolicy::SameOrigin(host_origin.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config = BridgeConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_yaml_overrides() {
        let config = BridgeConfig::from_yaml_str(
            "heightDebounceMs: 50\nreadyGracePeriodMs: 1000\nmaxLiveAddresses: 4\n",
        )
        .unwrap();
        assert_eq!(config.height_debounce_ms, 50);
        assert_eq!(config.ready_grace_period_ms, 1000);
        assert_eq!(config.max_live_addresses, Some(4));
        assert_eq!(config.layout_policy().debounce, Duration::from_millis(50));
    }

    #[test]
    fn test_blob_store_honors_capacity() {
        use crate::publisher::AddressBackend;

        let config = BridgeConfig::from_yaml_str("maxLiveAddresses: 1").unwrap();
        let store = config.blob_store("https://host.example");
        store.create("<p>a</p>").unwrap();
        assert!(matches!(
            store.create("<p>b</p>"),
            Err(BridgeError::AddressCreation(_))
        ));
    }

    // The legacy flag name reads like a restriction but disables the check.
    #[test]
    fn test_allow_same_origin_alias_skips_the_origin_check() {
        let config = BridgeConfig::from_json_str(r#"{"allowSameOrigin": true}"#).unwrap();
        assert!(config.skip_origin_check);
        assert_eq!(
            config.origin_policy("https://host.example"),
            OriginPolicy::Unchecked
        );
    }

    #[test]
    fn test_origin_check_is_on_by_default() {
        let config = BridgeConfig::default();
        assert_eq!(
            config.origin_policy("https://host.example"),
            OriginPolicy::SameOrigin("https://host.example".to_string())
        );
    }

    #[test]
    fn test_zero_placeholder_is_rejected() {
        let result = BridgeConfig::from_yaml_str("placeholderHeight: 0");
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_reveal_height_is_configurable() {
        let config = BridgeConfig::from_yaml_str("revealHeight: 320").unwrap();
        assert_eq!(config.layout_policy().reveal_height, 320.0);
        assert_eq!(BridgeConfig::default().reveal_height, 150.0);
        assert!(matches!(
            BridgeConfig::from_yaml_str("revealHeight: 0"),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = BridgeConfig::from_json_str(r#"{"maxLiveAddresses": 0}"#);
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }
}
