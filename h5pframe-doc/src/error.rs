use thiserror::Error;

pub type DocResult<T> = Result<T, DocError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocError {
    #[error("Settings contain no content entries")]
    MissingContent,

    #[error("Malformed content payload for '{key}': {reason}")]
    MalformedContent { key: String, reason: String },

    #[error("Document has no embedded boot data block")]
    MissingBootData,

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("YAML error: {0}")]
    YamlError(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl From<serde_json::Error> for DocError {
    fn from(err: serde_json::Error) -> Self {
        DocError::Deserialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for DocError {
    fn from(err: serde_yaml::Error) -> Self {
        DocError::YamlError(err.to_string())
    }
}

impl From<std::fmt::Error> for DocError {
    fn from(err: std::fmt::Error) -> Self {
        DocError::Render(err.to_string())
    }
}
