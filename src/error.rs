//! Error types for the dialog bridge

use thiserror::Error;

/// Failures that cross the runtime boundary.
///
/// An unset identifier on a [`DialogProxy`](crate::dialog::DialogProxy) is not
/// represented here: that case is reported through the UI console and answered
/// with a safe default instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("HTMLDialogElement with id=\"{id}\" does not exist")]
    ElementNotFound { id: String },

    #[error("Failed to load module: {0}")]
    ModuleLoad(String),

    #[error("Unknown bridge function: {0}")]
    UnknownFunction(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("UI runtime is not reachable: channel closed")]
    TransportClosed,

    #[error("Bridge call timed out after {0}ms")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("No callable registered for {module}.{method}")]
    UnknownCallable { module: String, method: String },

    #[error("Callable failed: {0}")]
    Callable(String),

    #[error("Dialog id is fixed at construction and cannot be rebound")]
    IdentifierFixed,

    #[error("Module connection has been disposed")]
    Disposed,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BridgeError {
    /// True for the hard lookup failure raised inside the bridge module.
    pub fn is_element_not_found(&self) -> bool {
        matches!(self, BridgeError::ElementNotFound { .. })
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
