//! Request parameters and the default binder.
//!
//! [`Params`] collects the loosely-typed data of one request: query, form and
//! path values plus an optional body. [`ParamsBinder`] converts it into typed
//! [`Value`]s on demand, one parameter at a time.
//!
//! Lookup precedence for a name is path, then form, then query. Body fields
//! are consulted when none of those carry the name.
//!
//! # Example
//!
//! ```
//! use actionwire::binding::{Binder, ParamType, Params, ParamsBinder, Value};
//! use actionwire::config::BinderConfig;
//!
//! let params = Params::new()
//!     .with_query("name", "Ada")
//!     .with_query("times", "3");
//! let binder = ParamsBinder::new(params, BinderConfig::default());
//!
//! assert_eq!(binder.bind("name", &ParamType::String).unwrap(), Value::Str("Ada".into()));
//! assert_eq!(binder.bind("times", &ParamType::Int { bits: 64 }).unwrap(), Value::Int(3));
//! // Missing input produces the zero value.
//! assert_eq!(binder.bind("missing", &ParamType::Int { bits: 64 }).unwrap(), Value::Int(0));
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;

use bytes::Bytes;

use super::{Binder, ParamType, Value};
use crate::codec::MsgPackCodec;
use crate::config::BinderConfig;
use crate::error::{ActionError, Result};

/// Request body as received from the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Parsed JSON document.
    Json(serde_json::Value),
    /// Undecoded MessagePack document.
    MsgPack(Bytes),
}

/// Loosely-typed request data.
#[derive(Debug, Clone, Default)]
pub struct Params {
    query: HashMap<String, Vec<String>>,
    form: HashMap<String, Vec<String>>,
    path: HashMap<String, Vec<String>>,
    body: Option<Body>,
}

impl Params {
    /// Create empty params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query value. Repeated names accumulate.
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        push(&mut self.query, name, value);
        self
    }

    /// Add a form value. Repeated names accumulate.
    pub fn with_form(mut self, name: &str, value: &str) -> Self {
        push(&mut self.form, name, value);
        self
    }

    /// Add a path (route) value.
    pub fn with_path(mut self, name: &str, value: &str) -> Self {
        push(&mut self.path, name, value);
        self
    }

    /// Set the request body.
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Add every pair of an `application/x-www-form-urlencoded` query string.
    pub fn with_query_string(mut self, raw: &str) -> Result<Self> {
        for (name, value) in parse_urlencoded(raw)? {
            push(&mut self.query, &name, &value);
        }
        Ok(self)
    }

    /// Add every pair of an `application/x-www-form-urlencoded` form body.
    pub fn with_form_string(mut self, raw: &str) -> Result<Self> {
        for (name, value) in parse_urlencoded(raw)? {
            push(&mut self.form, &name, &value);
        }
        Ok(self)
    }

    /// All values for a name, from the highest-precedence source that has it.
    pub fn values(&self, name: &str) -> Option<&[String]> {
        [&self.path, &self.form, &self.query]
            .into_iter()
            .find_map(|source| source.get(name))
            .map(|v| v.as_slice())
    }

    /// First value for a name.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    /// The request body.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Values keyed `name[0]`, `name[1]`, ... ordered by index.
    fn indexed(&self, name: &str) -> Vec<&str> {
        let prefix = format!("{}[", name);
        let mut found: HashMap<usize, &str> = HashMap::new();

        // Iterate lowest precedence first so higher sources overwrite.
        for source in [&self.query, &self.form, &self.path] {
            for (key, values) in source {
                let index = key
                    .strip_prefix(&prefix)
                    .and_then(|rest| rest.strip_suffix(']'))
                    .and_then(|digits| digits.parse::<usize>().ok());
                if let (Some(index), Some(first)) = (index, values.first()) {
                    found.insert(index, first.as_str());
                }
            }
        }

        let mut ordered: Vec<_> = found.into_iter().collect();
        ordered.sort_by_key(|(index, _)| *index);
        ordered.into_iter().map(|(_, v)| v).collect()
    }
}

fn push(source: &mut HashMap<String, Vec<String>>, name: &str, value: &str) {
    source
        .entry(name.to_string())
        .or_default()
        .push(value.to_string());
}

fn parse_urlencoded(raw: &str) -> Result<Vec<(String, String)>> {
    serde_urlencoded::from_str(raw)
        .map_err(|e| ActionError::binding("<query>", &ParamType::String, e.to_string()))
}

/// Default [`Binder`] over request [`Params`].
pub struct ParamsBinder {
    params: Params,
    config: BinderConfig,
    /// Body decoded into a JSON tree on first use.
    decoded_body: OnceLock<std::result::Result<Option<serde_json::Value>, String>>,
}

impl ParamsBinder {
    /// Create a binder over the given params.
    pub fn new(params: Params, config: BinderConfig) -> Self {
        Self {
            params,
            config,
            decoded_body: OnceLock::new(),
        }
    }

    /// The underlying params.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The binding policy.
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    fn json_body(&self) -> Result<Option<&serde_json::Value>> {
        let decoded = self.decoded_body.get_or_init(|| match &self.params.body {
            None => Ok(None),
            Some(Body::Json(value)) => Ok(Some(value.clone())),
            Some(Body::MsgPack(bytes)) => MsgPackCodec::decode::<serde_json::Value>(bytes)
                .map(Some)
                .map_err(|e| e.to_string()),
        });

        match decoded {
            Ok(body) => Ok(body.as_ref()),
            Err(reason) if self.config.strict => Err(ActionError::binding(
                "<body>",
                &ParamType::Json,
                reason.clone(),
            )),
            Err(reason) => {
                tracing::warn!("Ignoring undecodable request body: {}", reason);
                Ok(None)
            }
        }
    }

    fn body_field(&self, name: &str) -> Result<Option<&serde_json::Value>> {
        Ok(self.json_body()?.and_then(|body| body.get(name)))
    }

    fn has_input(&self, name: &str) -> Result<bool> {
        if self.params.values(name).is_some()
            || self.params.values(&format!("{}[]", name)).is_some()
            || !self.params.indexed(name).is_empty()
        {
            return Ok(true);
        }
        Ok(self.body_field(name)?.is_some())
    }

    /// Handle input that cannot be converted to the declared type.
    fn malformed(&self, name: &str, ty: &ParamType, reason: String) -> Result<Value> {
        if self.config.strict {
            return Err(ActionError::binding(name, ty, reason));
        }
        tracing::warn!(
            "Failed to bind {} as {}: {}; using zero value",
            name,
            ty,
            reason
        );
        Ok(Value::zero(ty))
    }

    fn convert(&self, name: &str, ty: &ParamType, raw: &str) -> Result<Value> {
        match ty {
            ParamType::Connection => Err(connection_not_bindable(name)),
            ParamType::Seq(inner) => Ok(Value::Seq(vec![self.convert(name, inner, raw)?])),
            ParamType::Optional(inner) if !is_scalar(inner) => self.convert(name, inner, raw),
            // Malformed input for an optional is reported on the outer type,
            // so the lenient fallback is `Null` rather than the inner zero.
            ParamType::Optional(inner) => {
                parse_text(inner, raw).or_else(|reason| self.malformed(name, ty, reason))
            }
            _ => parse_text(ty, raw).or_else(|reason| self.malformed(name, ty, reason)),
        }
    }

    fn convert_json(&self, name: &str, ty: &ParamType, json: &serde_json::Value) -> Result<Value> {
        let converted = match ty {
            ParamType::Connection => return Err(connection_not_bindable(name)),
            ParamType::Seq(inner) => match json {
                serde_json::Value::Array(items) => return self.seq_from_json(name, inner, items),
                _ => None,
            },
            ParamType::Optional(_) if json.is_null() => Some(Value::Null),
            ParamType::Optional(inner) if !is_scalar(inner) => {
                return self.convert_json(name, inner, json);
            }
            ParamType::Optional(inner) => scalar_from_json(inner, json),
            scalar => scalar_from_json(scalar, json),
        };

        match converted {
            Some(value) => Ok(value),
            None => self.malformed(name, ty, format!("unexpected JSON value {}", json)),
        }
    }

    fn seq_from_json(
        &self,
        name: &str,
        inner: &ParamType,
        items: &[serde_json::Value],
    ) -> Result<Value> {
        self.check_seq_len(name, inner, items.len())?;
        items
            .iter()
            .map(|item| self.convert_json(name, inner, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Seq)
    }

    fn check_seq_len(&self, name: &str, inner: &ParamType, len: usize) -> Result<()> {
        if len > self.config.max_seq_len {
            return Err(ActionError::binding(
                name,
                &ParamType::Seq(Box::new(inner.clone())),
                format!(
                    "{} elements exceed the limit of {}",
                    len, self.config.max_seq_len
                ),
            ));
        }
        Ok(())
    }

    fn bind_scalar(&self, name: &str, ty: &ParamType) -> Result<Value> {
        if let Some(raw) = self.params.first(name) {
            return self.convert(name, ty, raw);
        }
        match self.body_field(name)? {
            Some(json) => self.convert_json(name, ty, json),
            None => Ok(Value::zero(ty)),
        }
    }

    fn bind_seq(&self, name: &str, inner: &ParamType) -> Result<Value> {
        let mut raws: Vec<&str> = Vec::new();
        if let Some(values) = self.params.values(name) {
            raws.extend(values.iter().map(|s| s.as_str()));
        }
        if let Some(values) = self.params.values(&format!("{}[]", name)) {
            raws.extend(values.iter().map(|s| s.as_str()));
        }
        if raws.is_empty() {
            raws = self.params.indexed(name);
        }

        if raws.is_empty() {
            if let Some(serde_json::Value::Array(items)) = self.body_field(name)? {
                return self.seq_from_json(name, inner, items);
            }
            return Ok(Value::Seq(Vec::new()));
        }

        self.check_seq_len(name, inner, raws.len())?;
        raws.into_iter()
            .map(|raw| self.convert(name, inner, raw))
            .collect::<Result<Vec<_>>>()
            .map(Value::Seq)
    }

    /// Bind a `Json` parameter, or an optional one (`ty` is then `json?`).
    fn bind_json(&self, name: &str, ty: &ParamType) -> Result<Value> {
        if let Some(field) = self.body_field(name)? {
            return Ok(Value::Json(field.clone()));
        }
        if let Some(raw) = self.params.first(name) {
            return self.convert(name, ty, raw);
        }
        Ok(Value::Json(
            self.json_body()?
                .cloned()
                .unwrap_or(serde_json::Value::Null),
        ))
    }
}

impl Binder for ParamsBinder {
    fn bind(&self, name: &str, ty: &ParamType) -> Result<Value> {
        match ty {
            ParamType::Connection => Err(connection_not_bindable(name)),
            ParamType::Optional(inner) => {
                if !self.has_input(name)? {
                    return Ok(Value::Null);
                }
                match inner.as_ref() {
                    ParamType::Seq(element) => self.bind_seq(name, element),
                    ParamType::Json => self.bind_json(name, ty),
                    ParamType::Optional(_) => self.bind(name, inner),
                    _ => self.bind_scalar(name, ty),
                }
            }
            ParamType::Seq(inner) => self.bind_seq(name, inner),
            ParamType::Json => self.bind_json(name, ty),
            scalar => self.bind_scalar(name, scalar),
        }
    }
}

fn connection_not_bindable(name: &str) -> ActionError {
    ActionError::binding(
        name,
        &ParamType::Connection,
        "connections are never bound from request data",
    )
}

/// Types converted from a single textual or JSON value.
fn is_scalar(ty: &ParamType) -> bool {
    !matches!(
        ty,
        ParamType::Seq(_) | ParamType::Optional(_) | ParamType::Connection
    )
}

/// Parse one textual value as a scalar type.
fn parse_text(ty: &ParamType, raw: &str) -> std::result::Result<Value, String> {
    match ty {
        ParamType::String => Ok(Value::Str(raw.to_string())),
        ParamType::Int { .. } => {
            let value = raw.trim().parse::<i64>().map_err(|e| e.to_string())?;
            if ty.fits_int(value) {
                Ok(Value::Int(value))
            } else {
                Err(format!("{} is out of range for {}", value, ty))
            }
        }
        ParamType::Uint { .. } => {
            let value = raw.trim().parse::<u64>().map_err(|e| e.to_string())?;
            if ty.fits_uint(value) {
                Ok(Value::Uint(value))
            } else {
                Err(format!("{} is out of range for {}", value, ty))
            }
        }
        ParamType::Float => raw
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| e.to_string()),
        ParamType::Bool => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| format!("invalid boolean {:?}", raw)),
        ParamType::Bytes => Ok(Value::Bytes(Bytes::copy_from_slice(raw.as_bytes()))),
        ParamType::Json => serde_json::from_str(raw)
            .map(Value::Json)
            .map_err(|e| e.to_string()),
        other => Err(format!("{} is not bound from a single value", other)),
    }
}

/// Convert one JSON value to a scalar type. `None` when it does not fit.
fn scalar_from_json(ty: &ParamType, json: &serde_json::Value) -> Option<Value> {
    match (ty, json) {
        (ParamType::String, serde_json::Value::String(s)) => Some(Value::Str(s.clone())),
        (ParamType::String, other) if other.is_number() || other.is_boolean() => {
            Some(Value::Str(other.to_string()))
        }
        (ParamType::Int { .. }, other) => other
            .as_i64()
            .filter(|i| ty.fits_int(*i))
            .map(Value::Int),
        (ParamType::Uint { .. }, other) => other
            .as_u64()
            .filter(|u| ty.fits_uint(*u))
            .map(Value::Uint),
        (ParamType::Float, other) => other.as_f64().map(Value::Float),
        (ParamType::Bool, serde_json::Value::Bool(b)) => Some(Value::Bool(*b)),
        (ParamType::Bool, serde_json::Value::String(s)) => parse_bool(s).map(Value::Bool),
        (ParamType::Bytes, serde_json::Value::String(s)) => {
            Some(Value::Bytes(Bytes::copy_from_slice(s.as_bytes())))
        }
        (ParamType::Json, other) => Some(Value::Json(other.clone())),
        _ => None,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}
