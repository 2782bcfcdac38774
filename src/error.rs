//! Error types for actionwire.

use thiserror::Error;

use crate::binding::ParamType;

/// Main error type for all invocation operations.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A declared parameter could not be produced from request data.
    #[error("Failed to bind parameter `{name}` as {ty}: {reason}")]
    Binding {
        /// Parameter name.
        name: String,
        /// Declared parameter type.
        ty: ParamType,
        /// What went wrong.
        reason: String,
    },

    /// No action with this name is registered for the controller.
    #[error("Action not found: {0}")]
    MethodNotFound(String),

    /// The argument count does not match the action's signature.
    #[error("Arity mismatch calling {method}: expected {expected} arguments, got {got}")]
    ArityMismatch {
        /// Action name.
        method: String,
        /// Arguments the action accepts.
        expected: String,
        /// Arguments supplied.
        got: usize,
    },

    /// The final value of a variadic call was not a sequence.
    #[error("Variadic parameter `{param}` of {method} was bound to a non-sequence value")]
    NotASequence {
        /// Action name.
        method: String,
        /// Name of the variadic parameter.
        param: String,
    },

    /// A bound value does not fit the action's argument type.
    #[error("Cannot convert {found} value into {expected}")]
    Conversion {
        /// Type the action expected.
        expected: ParamType,
        /// Kind of the value that was supplied.
        found: &'static str,
    },

    /// A bound integer does not fit the action's argument type.
    #[error("Value {value} is out of range for {expected}")]
    OutOfRange {
        /// Type the action expected.
        expected: ParamType,
        /// The value that was supplied.
        value: String,
    },

    /// Invalid action registration (bad names, duplicates).
    #[error("Registration error: {0}")]
    Registration(String),

    /// I/O error on a live connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Live connection closed by the peer.
    #[error("Connection closed")]
    ConnectionClosed,
}

impl ActionError {
    /// Build a binding error.
    pub fn binding(name: &str, ty: &ParamType, reason: impl Into<String>) -> Self {
        Self::Binding {
            name: name.to_string(),
            ty: ty.clone(),
            reason: reason.into(),
        }
    }

    /// Attribute a binding error raised during argument extraction to the
    /// parameter `param`. Other errors are returned unchanged.
    pub(crate) fn for_param(self, param: &str) -> Self {
        match self {
            Self::Binding { name, ty, reason } if name.is_empty() => Self::Binding {
                name: param.to_string(),
                ty,
                reason,
            },
            other => other,
        }
    }

    /// Whether this error is a server-side fault rather than bad user input.
    ///
    /// Only binding errors are caused by the request itself; dispatch errors
    /// mean the route metadata and the controller disagree.
    pub fn is_internal(&self) -> bool {
        !matches!(self, Self::Binding { .. })
    }

    /// HTTP status the surrounding pipeline should answer with.
    pub fn status_code(&self) -> u16 {
        if self.is_internal() {
            500
        } else {
            400
        }
    }
}

/// Result type alias using ActionError.
pub type Result<T> = std::result::Result<T, ActionError>;
