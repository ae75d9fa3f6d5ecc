// Error types for bidi-rs

use crate::protocol::events::EventKind;
use crate::protocol::target::Target;
use thiserror::Error;

/// Result type alias for bidi-rs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when using bidi-rs
#[derive(Debug, Error)]
pub enum Error {
    /// A value or event payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// An inbound message could not be dispatched
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A subscription could not be registered or removed
    #[error("Subscription error: {0}")]
    Subscription(#[from] SubscriptionError),

    /// Transport-level error reported by the external channel
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument provided to method
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }
}

/// Errors produced while decoding wire JSON into values or event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The `type` discriminant (or event shape) is not one this client knows
    ///
    /// Also returned for remote-only input shapes such as shared references,
    /// which the runtime never sends to the client.
    #[error("unknown variant '{found}'")]
    UnknownVariant { found: String },

    /// A protocol-mandated field is absent
    #[error("missing field '{field}'")]
    MissingField { field: String },

    /// A field is present but has the wrong JSON shape
    #[error("expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },
}

impl DecodeError {
    pub(crate) fn unknown_variant(found: impl Into<String>) -> Self {
        DecodeError::UnknownVariant {
            found: found.into(),
        }
    }

    pub(crate) fn missing_field(field: impl Into<String>) -> Self {
        DecodeError::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn shape(expected: impl Into<String>, found: &serde_json::Value) -> Self {
        DecodeError::ShapeMismatch {
            expected: expected.into(),
            found: json_shape(found).to_string(),
        }
    }

    /// Classifies a serde error raised while decoding a payload struct.
    ///
    /// serde_json does not expose structured error kinds, so the message
    /// prefixes produced by serde's derive are matched here.
    pub(crate) fn from_serde(err: &serde_json::Error) -> Self {
        let message = err.to_string();
        if let Some(rest) = message.strip_prefix("missing field `") {
            let field = rest.split('`').next().unwrap_or_default();
            return DecodeError::missing_field(field);
        }
        if let Some(rest) = message.strip_prefix("unknown variant `") {
            let found = rest.split('`').next().unwrap_or_default();
            return DecodeError::unknown_variant(found);
        }
        if let Some(rest) = message.strip_prefix("invalid type: ") {
            let (found, expected) = match rest.split_once(", expected ") {
                Some((found, expected)) => (found, expected),
                None => (rest, "a different shape"),
            };
            let expected = expected.split(" at line ").next().unwrap_or(expected);
            return DecodeError::ShapeMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            };
        }
        DecodeError::ShapeMismatch {
            expected: "a valid payload".to_string(),
            found: message,
        }
    }
}

/// Short name of a JSON value's shape, used in error messages.
pub(crate) fn json_shape(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Errors raised at the inbound message boundary.
///
/// None of these stop the event stream; the router hands them to its
/// error sink and moves on to the next message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The message is not valid JSON or is not an event envelope
    #[error("malformed message: {0}")]
    Malformed(String),

    /// The wire method is not in the event catalog
    #[error("no catalog entry for method '{method}'")]
    NoCatalogEntry { method: String },

    /// The payload for a known method failed to decode
    #[error("failed to decode '{method}': {source}")]
    Decode {
        method: String,
        #[source]
        source: DecodeError,
    },
}

/// Errors from subscription bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// The target cannot receive the given event kind on any path
    #[error("{target} cannot receive '{kind}'")]
    UnsupportedCapability { kind: EventKind, target: Target },

    /// The listener handle is not (or no longer) registered
    #[error("unknown listener handle {0}")]
    UnknownHandle(u64),
}

/// Opaque failure reported by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        TransportError(message.into())
    }
}
