//! Per-request handler context.
//!
//! A [`HandlerContext`] bundles everything one invocation needs: the
//! controller instance, the shared action table, the resolved method
//! descriptor, the request, the parameter binder and the result slot.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use actionwire::action::{ActionTable, Controller};
//! use actionwire::binding::{Params, ParamsBinder};
//! use actionwire::config::BinderConfig;
//! use actionwire::context::{HandlerContext, Request};
//! use actionwire::error::Result;
//!
//! struct Home;
//!
//! impl Controller for Home {
//!     fn register_actions(actions: &mut ActionTable<Self>) -> Result<()> {
//!         actions.register("index", &[], |_: &mut Home| {})
//!     }
//! }
//!
//! let actions = Arc::new(ActionTable::<Home>::for_controller().unwrap());
//! let binder = ParamsBinder::new(Params::new(), BinderConfig::default());
//! let ctx = HandlerContext::for_action(Home, actions, "index")
//!     .unwrap()
//!     .with_request(Request::new("/"))
//!     .with_binder(Arc::new(binder));
//! assert_eq!(ctx.method().name(), "index");
//! assert!(ctx.result().is_none());
//! ```

use std::sync::Arc;

use crate::action::{ActionTable, MethodDescriptor};
use crate::binding::{Binder, Params, ParamsBinder};
use crate::config::BinderConfig;
use crate::connection::ConnectionHandle;
use crate::error::{ActionError, Result};
use crate::response::Response;

/// The request as seen by the invoker.
#[derive(Debug, Clone, Default)]
pub struct Request {
    path: String,
    connection: Option<ConnectionHandle>,
}

impl Request {
    /// Create a request for a path, without a live connection.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            connection: None,
        }
    }

    /// Attach the live connection established for this request.
    pub fn with_connection(mut self, connection: ConnectionHandle) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Request path.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The attached live connection, if any.
    #[inline]
    pub fn connection(&self) -> Option<&ConnectionHandle> {
        self.connection.as_ref()
    }
}

/// State of one request flowing through the filter chain.
pub struct HandlerContext<H> {
    /// Controller instance, owned for the duration of the request.
    pub(crate) controller: H,
    /// Shared action table of the controller type.
    pub(crate) actions: Arc<ActionTable<H>>,
    /// Resolved signature of the target action.
    pub(crate) method: Arc<MethodDescriptor>,
    pub(crate) request: Request,
    pub(crate) binder: Arc<dyn Binder>,
    /// Result slot, read by the response pipeline.
    pub(crate) result: Option<Box<dyn Response>>,
}

impl<H: 'static> HandlerContext<H> {
    /// Create a context for an already resolved method.
    ///
    /// Starts with an empty request and a binder over empty params.
    pub fn new(controller: H, actions: Arc<ActionTable<H>>, method: Arc<MethodDescriptor>) -> Self {
        Self {
            controller,
            actions,
            method,
            request: Request::default(),
            binder: Arc::new(ParamsBinder::new(Params::new(), BinderConfig::default())),
            result: None,
        }
    }

    /// Create a context for the registered action `name`.
    pub fn for_action(controller: H, actions: Arc<ActionTable<H>>, name: &str) -> Result<Self> {
        let method = actions
            .descriptor(name)
            .ok_or_else(|| ActionError::MethodNotFound(name.to_string()))?;
        Ok(Self::new(controller, actions, method))
    }

    /// Set the request.
    pub fn with_request(mut self, request: Request) -> Self {
        self.request = request;
        self
    }

    /// Set the parameter binder.
    pub fn with_binder(mut self, binder: Arc<dyn Binder>) -> Self {
        self.binder = binder;
        self
    }

    /// Bind parameters from request params with the given policy.
    pub fn with_params(self, params: Params, config: BinderConfig) -> Self {
        self.with_binder(Arc::new(ParamsBinder::new(params, config)))
    }

    /// The controller instance.
    pub fn controller(&self) -> &H {
        &self.controller
    }

    /// Mutable access to the controller instance.
    pub fn controller_mut(&mut self) -> &mut H {
        &mut self.controller
    }

    /// Consume the context, returning the controller.
    pub fn into_controller(self) -> H {
        self.controller
    }

    /// The action table.
    pub fn actions(&self) -> &ActionTable<H> {
        &self.actions
    }

    /// The resolved method descriptor.
    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    /// The request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The parameter binder.
    pub fn binder(&self) -> &dyn Binder {
        self.binder.as_ref()
    }

    /// The captured response, if any.
    pub fn result(&self) -> Option<&dyn Response> {
        self.result.as_deref()
    }

    /// Store a response in the result slot.
    pub fn set_result(&mut self, response: Box<dyn Response>) {
        self.result = Some(response);
    }

    /// Take the captured response, leaving the slot empty.
    pub fn take_result(&mut self) -> Option<Box<dyn Response>> {
        self.result.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Controller;
    use crate::response::PlainText;
    use tokio::io::duplex;

    struct Home {
        visits: u32,
    }

    impl Controller for Home {
        fn register_actions(actions: &mut ActionTable<Self>) -> Result<()> {
            actions.register("index", &[], |h: &mut Home| {
                h.visits += 1;
            })
        }
    }

    fn actions() -> Arc<ActionTable<Home>> {
        Arc::new(ActionTable::for_controller().unwrap())
    }

    #[test]
    fn test_request_connection() {
        let request = Request::new("/chat");
        assert_eq!(request.path(), "/chat");
        assert!(request.connection().is_none());

        let (stream, _peer) = duplex(16);
        let conn = ConnectionHandle::new(stream);
        let request = request.with_connection(conn.clone());
        assert!(request.connection().unwrap().same_as(&conn));
    }

    #[test]
    fn test_for_action_resolves_descriptor() {
        let ctx = HandlerContext::for_action(Home { visits: 0 }, actions(), "index").unwrap();
        assert_eq!(ctx.method().name(), "index");
        assert_eq!(ctx.controller().visits, 0);
    }

    #[test]
    fn test_for_action_unknown_name() {
        let err = HandlerContext::for_action(Home { visits: 0 }, actions(), "missing")
            .err()
            .unwrap();
        assert!(matches!(err, ActionError::MethodNotFound(ref n) if n == "missing"));
    }

    #[test]
    fn test_result_slot() {
        let mut ctx = HandlerContext::for_action(Home { visits: 0 }, actions(), "index").unwrap();
        assert!(ctx.result().is_none());

        ctx.set_result(Box::new(PlainText::new("hi")));
        assert!(ctx.result().is_some());
        assert!(ctx.take_result().is_some());
        assert!(ctx.result().is_none());
    }

    #[test]
    fn test_controller_access() {
        let mut ctx = HandlerContext::for_action(Home { visits: 0 }, actions(), "index").unwrap();
        ctx.controller_mut().visits = 5;
        assert_eq!(ctx.into_controller().visits, 5);
    }
}
