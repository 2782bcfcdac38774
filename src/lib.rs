//! # actionwire
//!
//! Controller action invocation for request-dispatching web frameworks.
//!
//! Once routing has picked a controller instance and an action, this crate
//! binds the action's declared parameters from the request, calls the
//! action, and captures its return value if it is a processable response.
//!
//! ## Architecture
//!
//! - **Action table**: per controller type, maps action names to a
//!   [`MethodDescriptor`] and a typed callable, built once at registration
//! - **Binder**: resolves one argument per parameter from path, form,
//!   query and body values
//! - **Filter chain**: filters run in order; the [`ActionInvoker`] is the
//!   terminal filter
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use actionwire::{
//!     invoke, ActionTable, BinderConfig, Controller, HandlerContext, Params, PlainText, Result,
//! };
//!
//! struct Greeter;
//!
//! impl Greeter {
//!     fn greet(&mut self, name: String, times: i64) -> PlainText {
//!         PlainText::new(format!("Hello {}", name).repeat(times as usize))
//!     }
//! }
//!
//! impl Controller for Greeter {
//!     fn register_actions(actions: &mut ActionTable<Self>) -> Result<()> {
//!         actions.register("greet", &["name", "times"], Greeter::greet)
//!     }
//! }
//!
//! let actions = Arc::new(ActionTable::for_controller().unwrap());
//! let params = Params::new().with_query_string("name=Ada&times=2").unwrap();
//! let mut ctx = HandlerContext::for_action(Greeter, actions, "greet")
//!     .unwrap()
//!     .with_params(params, BinderConfig::default());
//!
//! invoke(&mut ctx).unwrap();
//! assert!(ctx.result().is_some());
//! ```

pub mod action;
pub mod binding;
pub mod codec;
pub mod config;
pub mod connection;
pub mod context;
pub mod error;
pub mod filter;
pub mod invoker;
pub mod response;

pub use action::{ActionTable, Controller, MethodDescriptor, MethodParam};
pub use binding::{Binder, Body, FromValue, Json, LiveConnection, ParamType, Params, ParamsBinder, Value};
pub use config::BinderConfig;
pub use connection::ConnectionHandle;
pub use context::{HandlerContext, Request};
pub use error::{ActionError, Result};
pub use filter::{run_filters, Filter, FilterChain};
pub use invoker::{invoke, ActionInvoker};
pub use response::{
    ErrorResult, IntoOutcome, Outcome, PlainText, Redirect, RenderJson, RenderMsgPack, Reply,
    Response,
};
