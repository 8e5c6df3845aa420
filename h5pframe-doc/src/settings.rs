use crate::error::{DocError, DocResult};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Settings handed to the frame by its owner.
///
/// Fields the synthesizer does not interpret (`l10n`, `editor`, `user`, ...) are
/// kept in `extra` and embedded into the guest document unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub core: CoreAssets,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub contents: Contents,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded_js: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded_css: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Runtime scripts and styles shared by every content type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreAssets {
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
}

/// One piece of content: its parameters as JSON text and the library that renders it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub json_content: String,
    pub library: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentEntry {
    pub fn new(json_content: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            json_content: json_content.into(),
            library: library.into(),
            ..Self::default()
        }
    }

    /// Parses `json_content`. `key` only labels the error.
    pub fn params(&self, key: &str) -> DocResult<Value> {
        serde_json::from_str(&self.json_content).map_err(|e| DocError::MalformedContent {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Content entries in the order the settings declared them.
///
/// Only the first entry is ever rendered; the rest ride along in the
/// embedded settings untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contents(Vec<(String, ContentEntry)>);

impl Contents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, or replaces the value in place if the key already exists.
    pub fn insert(&mut self, key: impl Into<String>, entry: ContentEntry) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = entry,
            None => self.0.push((key, entry)),
        }
    }

    /// The entry that gets rendered.
    pub fn first(&self) -> Option<(&str, &ContentEntry)> {
        self.0.first().map(|(k, e)| (k.as_str(), e))
    }

    pub fn get(&self, key: &str) -> Option<&ContentEntry> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContentEntry)> {
        self.0.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ContentEntry)> for Contents {
    fn from_iter<I: IntoIterator<Item = (K, ContentEntry)>>(iter: I) -> Self {
        let mut contents = Contents::new();
        for (key, entry) in iter {
            contents.insert(key, entry);
        }
        contents
    }
}

impl Serialize for Contents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, entry) in &self.0 {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

struct ContentsVisitor;

impl<'de> Visitor<'de> for ContentsVisitor {
    type Value = Contents;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of content id to content entry")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut contents = Contents::new();
        while let Some((key, entry)) = access.next_entry::<String, ContentEntry>()? {
            contents.insert(key, entry);
        }
        Ok(contents)
    }
}

impl<'de> Deserialize<'de> for Contents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ContentsVisitor)
    }
}

impl Settings {
    /// Parse settings from JSON text
    pub fn from_json_str(json: &str) -> DocResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse settings from YAML text
    pub fn from_yaml_str(yaml: &str) -> DocResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
