//! Processable responses and action outcomes.
//!
//! An action may return anything implementing [`IntoOutcome`]. Values that
//! are a [`Response`] are captured into the handler context's result slot;
//! plain values and absent returns are ignored.
//!
//! # Example
//!
//! ```
//! use actionwire::response::{IntoOutcome, Outcome, PlainText, Reply, Response};
//!
//! assert!(matches!(PlainText::new("hi").into_outcome(), Outcome::Response(_)));
//! assert!(matches!("hi".into_outcome(), Outcome::Ignored));
//! assert!(matches!(().into_outcome(), Outcome::Nothing));
//!
//! let mut reply = Reply::new();
//! PlainText::new("hi").apply(&mut reply).unwrap();
//! assert_eq!(reply.body(), b"hi");
//! ```

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::codec::MsgPackCodec;
use crate::error::Result;

/// A value the response pipeline knows how to render.
pub trait Response: fmt::Debug + Send + 'static {
    /// Write status, headers and body into the reply.
    fn apply(&self, reply: &mut Reply) -> Result<()>;
}

impl Response for Box<dyn Response> {
    fn apply(&self, reply: &mut Reply) -> Result<()> {
        (**self).apply(reply)
    }
}

/// Classification of an action's return value.
#[derive(Debug)]
pub enum Outcome {
    /// A processable response, stored in the result slot.
    Response(Box<dyn Response>),
    /// A value with no meaning to the response pipeline.
    Ignored,
    /// No value at all.
    Nothing,
}

impl Outcome {
    /// Whether this outcome carries a response.
    pub fn is_response(&self) -> bool {
        matches!(self, Outcome::Response(_))
    }
}

/// Conversion of an action's return value into an [`Outcome`].
pub trait IntoOutcome {
    /// Classify the value.
    fn into_outcome(self) -> Outcome;
}

impl<T: Response> IntoOutcome for T {
    fn into_outcome(self) -> Outcome {
        Outcome::Response(Box::new(self))
    }
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome {
        Outcome::Nothing
    }
}

impl<T: IntoOutcome> IntoOutcome for Option<T> {
    fn into_outcome(self) -> Outcome {
        match self {
            Some(value) => value.into_outcome(),
            None => Outcome::Nothing,
        }
    }
}

macro_rules! impl_ignored_outcome {
    ($($t:ty),*) => {
        $(
            impl IntoOutcome for $t {
                fn into_outcome(self) -> Outcome {
                    Outcome::Ignored
                }
            }
        )*
    };
}

impl_ignored_outcome!(
    String,
    &'static str,
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    serde_json::Value
);

/// Rendered output of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Reply {
    /// Create an empty `200` reply.
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Set the status code.
    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Value of a header (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set a header, replacing any existing value.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Set the body.
    pub fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }
}

impl Default for Reply {
    fn default() -> Self {
        Self::new()
    }
}

/// `text/plain` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainText(pub String);

impl PlainText {
    /// Create from text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl Response for PlainText {
    fn apply(&self, reply: &mut Reply) -> Result<()> {
        reply.set_header("Content-Type", "text/plain; charset=utf-8");
        reply.set_body(Bytes::from(self.0.clone()));
        Ok(())
    }
}

/// `application/json` response.
#[derive(Debug, Clone)]
pub struct RenderJson<T>(pub T);

impl<T: Serialize + fmt::Debug + Send + 'static> Response for RenderJson<T> {
    fn apply(&self, reply: &mut Reply) -> Result<()> {
        let data = serde_json::to_vec(&self.0)?;
        reply.set_header("Content-Type", "application/json");
        reply.set_body(Bytes::from(data));
        Ok(())
    }
}

/// `application/msgpack` response.
#[derive(Debug, Clone)]
pub struct RenderMsgPack<T>(pub T);

impl<T: Serialize + fmt::Debug + Send + 'static> Response for RenderMsgPack<T> {
    fn apply(&self, reply: &mut Reply) -> Result<()> {
        let data = MsgPackCodec::encode(&self.0)?;
        reply.set_header("Content-Type", "application/msgpack");
        reply.set_body(Bytes::from(data));
        Ok(())
    }
}

/// `302 Found` redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect(pub String);

impl Redirect {
    /// Redirect to a location.
    pub fn to(location: impl Into<String>) -> Self {
        Self(location.into())
    }
}

impl Response for Redirect {
    fn apply(&self, reply: &mut Reply) -> Result<()> {
        reply.set_status(302);
        reply.set_header("Location", &self.0);
        Ok(())
    }
}

/// Error page with a status code and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResult {
    /// HTTP status.
    pub status: u16,
    /// Message shown to the client.
    pub message: String,
}

impl ErrorResult {
    /// Create an error result.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl Response for ErrorResult {
    fn apply(&self, reply: &mut Reply) -> Result<()> {
        reply.set_status(self.status);
        reply.set_header("Content-Type", "text/plain; charset=utf-8");
        reply.set_body(Bytes::from(self.message.clone()));
        Ok(())
    }
}
