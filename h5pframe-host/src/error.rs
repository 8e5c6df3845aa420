use h5pframe_doc::DocError;
use serde_json::Value;
use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Failures surfaced to the host through its error callback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error(transparent)]
    Document(#[from] DocError),

    #[error("Could not create a navigable address: {0}")]
    AddressCreation(String),

    /// Forwarded verbatim from the guest's `h5pEditorStatus: "error"` message.
    #[error("Guest reported an error: {0}")]
    GuestReported(Value),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Frame host has shut down")]
    Closed,
}

impl From<serde_yaml::Error> for BridgeError {
    fn from(err: serde_yaml::Error) -> Self {
        BridgeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Config(err.to_string())
    }
}
