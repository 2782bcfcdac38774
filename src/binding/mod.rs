//! Binding module - converting request data into typed arguments.
//!
//! Provides:
//! - [`Binder`] - the parameter-binding service consumed by the invoker
//! - [`ParamType`] / [`Value`] - declared types and bound values
//! - [`FromValue`] - typed extraction used by registered actions
//! - [`ParamsBinder`] - default binder over query/form/path values and a body
//!
//! # Example
//!
//! ```
//! use actionwire::binding::{Binder, ParamType, Value};
//! use actionwire::error::Result;
//!
//! /// Binder that answers every parameter with its own name.
//! struct EchoBinder;
//!
//! impl Binder for EchoBinder {
//!     fn bind(&self, name: &str, _ty: &ParamType) -> Result<Value> {
//!         Ok(Value::Str(name.to_string()))
//!     }
//! }
//!
//! assert_eq!(EchoBinder.bind("id", &ParamType::String).unwrap(), Value::Str("id".into()));
//! ```

mod params;
mod value;

pub use params::{Body, Params, ParamsBinder};
pub use value::{FromValue, Json, LiveConnection, ParamType, Value};

use crate::error::Result;

/// Parameter-binding service.
///
/// Produces a value of the declared type for a named parameter, or fails.
/// Whether missing or malformed input yields a zero value or an error is the
/// binder's own policy; the invoker accepts whatever comes back.
pub trait Binder: Send + Sync {
    /// Bind the parameter `name` as `ty`.
    fn bind(&self, name: &str, ty: &ParamType) -> Result<Value>;
}
