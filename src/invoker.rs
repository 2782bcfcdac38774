//! Action invocation.
//!
//! [`invoke`] turns a resolved (controller, method descriptor, request)
//! triple into one call of the target action:
//! 1. Resolve the action's callable by name
//! 2. Bind one argument per declared parameter, in order
//! 3. Spread the last argument of a variadic action
//! 4. Call, and capture the return value if it is a response
//!
//! Connection parameters are bound straight from the request's live
//! connection; the binder is never asked for them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use actionwire::action::{ActionTable, Controller};
//! use actionwire::binding::Params;
//! use actionwire::config::BinderConfig;
//! use actionwire::context::HandlerContext;
//! use actionwire::error::Result;
//! use actionwire::invoker::invoke;
//! use actionwire::response::{PlainText, Reply};
//!
//! struct Greeter;
//!
//! impl Greeter {
//!     fn greet(&mut self, name: String, times: i64) -> PlainText {
//!         PlainText::new(format!("Hello {} x{}", name, times))
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
//! let params = Params::new().with_query("name", "Ada").with_query("times", "3");
//! let mut ctx = HandlerContext::for_action(Greeter, actions, "greet")
//!     .unwrap()
//!     .with_params(params, BinderConfig::default());
//!
//! invoke(&mut ctx).unwrap();
//!
//! let mut reply = Reply::new();
//! ctx.result().unwrap().apply(&mut reply).unwrap();
//! assert_eq!(reply.body(), b"Hello Ada x3");
//! ```

use crate::action::MethodDescriptor;
use crate::binding::{Binder, ParamType, Value};
use crate::connection::ConnectionHandle;
use crate::context::HandlerContext;
use crate::error::{ActionError, Result};
use crate::filter::{Filter, FilterChain};
use crate::response::Outcome;

/// Terminal filter that invokes the resolved action.
///
/// It accepts the chain continuation like every other filter but never
/// calls it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionInvoker;

impl<H: 'static> Filter<H> for ActionInvoker {
    fn call(&self, ctx: &mut HandlerContext<H>, _chain: FilterChain<'_, H>) -> Result<()> {
        invoke(ctx)
    }
}

/// Bind arguments, call the resolved action, and capture its response.
///
/// # Errors
///
/// - Binding errors from the binder, unchanged; the action is not called.
/// - [`ActionError::MethodNotFound`] when no action has the descriptor's name.
/// - [`ActionError::ArityMismatch`] or [`ActionError::Conversion`] when the
///   descriptor and the registered action disagree.
/// - [`ActionError::NotASequence`] when a variadic action's last argument
///   is not bound to a sequence.
pub fn invoke<H: 'static>(ctx: &mut HandlerContext<H>) -> Result<()> {
    let method = ctx.method.clone();
    let actions = ctx.actions.clone();

    let Some(callable) = actions.callable(method.name()) else {
        tracing::warn!("No action registered for {}", method);
        return Err(ActionError::MethodNotFound(method.name().to_string()));
    };

    let mut args = bind_arguments(&method, ctx.binder.as_ref(), ctx.request.connection())?;
    if method.is_variadic() {
        args = spread_variadic(&method, args)?;
    }

    tracing::debug!("Invoking {} with {} arguments", method, args.len());

    match callable.call(&mut ctx.controller, args)? {
        Outcome::Response(response) => {
            tracing::debug!("Action {} produced {:?}", method.name(), response);
            ctx.result = Some(response);
        }
        Outcome::Ignored => {
            tracing::debug!(
                "Action {} returned a value that is not a response; result unchanged",
                method.name()
            );
        }
        Outcome::Nothing => {}
    }

    Ok(())
}

/// Produce one value per declared parameter, in declared order.
fn bind_arguments(
    method: &MethodDescriptor,
    binder: &dyn Binder,
    connection: Option<&ConnectionHandle>,
) -> Result<Vec<Value>> {
    let mut args = Vec::with_capacity(method.arity());

    for param in method.params() {
        let value = if param.ty == ParamType::Connection {
            Value::Connection(connection.cloned())
        } else {
            tracing::trace!("Binding: {} as {}", param.name, param.ty);
            binder.bind(&param.name, &param.ty)?
        };
        args.push(value);
    }

    Ok(args)
}

/// Replace the last argument with the elements of its sequence.
fn spread_variadic(method: &MethodDescriptor, mut args: Vec<Value>) -> Result<Vec<Value>> {
    let (last, param) = match (args.pop(), method.params().last()) {
        (Some(last), Some(param)) => (last, param),
        _ => {
            return Err(ActionError::ArityMismatch {
                method: method.name().to_string(),
                expected: "at least 1".to_string(),
                got: 0,
            })
        }
    };

    match last {
        Value::Seq(items) => {
            args.extend(items);
            Ok(args)
        }
        _ => Err(ActionError::NotASequence {
            method: method.name().to_string(),
            param: param.name.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionTable, Controller, MethodParam};
    use crate::binding::LiveConnection;
    use crate::response::{PlainText, Reply, Response};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::io::duplex;

    /// Controller recording every call it receives.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        connection: Option<Option<u64>>,
    }

    impl Recorder {
        fn greet(&mut self, name: String, times: i64) {
            self.calls.push(format!("greet({}, {})", name, times));
        }

        fn reply(&mut self, text: String) -> PlainText {
            self.calls.push(format!("reply({})", text));
            PlainText::new(text)
        }

        fn plain(&mut self) -> String {
            self.calls.push("plain()".to_string());
            "not a response".to_string()
        }

        fn maybe(&mut self, found: bool) -> Option<PlainText> {
            found.then(|| PlainText::new("found"))
        }

        fn stream(&mut self, conn: LiveConnection) {
            self.connection = Some(conn.handle().map(|h| h.id()));
        }

        fn log_all(&mut self, tags: Vec<String>) {
            self.calls.push(format!("log_all({})", tags.join(", ")));
        }

        fn tagged(&mut self, prefix: String, tags: Vec<String>) {
            for tag in tags {
                self.calls.push(format!("{}{}", prefix, tag));
            }
        }

        fn batch(&mut self, tags: Vec<String>) {
            self.calls.push(format!("batch({})", tags.len()));
        }
    }

    impl Controller for Recorder {
        fn register_actions(actions: &mut ActionTable<Self>) -> Result<()> {
            actions.register("greet", &["name", "times"], Recorder::greet)?;
            actions.register("reply", &["text"], Recorder::reply)?;
            actions.register("plain", &[], Recorder::plain)?;
            actions.register("maybe", &["found"], Recorder::maybe)?;
            actions.register("stream", &["conn"], Recorder::stream)?;
            actions.register_variadic("log_all", &["tags"], Recorder::log_all)?;
            actions.register_variadic("tagged", &["prefix", "tags"], Recorder::tagged)?;
            actions.register("batch", &["tags"], Recorder::batch)?;
            Ok(())
        }
    }

    /// Binder returning canned values and counting lookups.
    #[derive(Default)]
    struct ScriptedBinder {
        values: Vec<(&'static str, Value)>,
        lookups: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedBinder {
        fn with(mut self, name: &'static str, value: Value) -> Self {
            self.values.push((name, value));
            self
        }
    }

    impl Binder for ScriptedBinder {
        fn bind(&self, name: &str, ty: &ParamType) -> Result<Value> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(name.to_string());
            Ok(self
                .values
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| Value::zero(ty)))
        }
    }

    struct FailingBinder;

    impl Binder for FailingBinder {
        fn bind(&self, name: &str, ty: &ParamType) -> Result<Value> {
            Err(ActionError::binding(name, ty, "bad input"))
        }
    }

    fn context(action: &str, binder: Arc<dyn Binder>) -> HandlerContext<Recorder> {
        let actions = Arc::new(ActionTable::for_controller().unwrap());
        HandlerContext::for_action(Recorder::default(), actions, action)
            .unwrap()
            .with_binder(binder)
    }

    fn strings(items: &[&str]) -> Value {
        Value::Seq(items.iter().map(|s| Value::Str(s.to_string())).collect())
    }

    fn body_of(response: &dyn Response) -> Vec<u8> {
        let mut reply = Reply::new();
        response.apply(&mut reply).unwrap();
        reply.body().to_vec()
    }

    #[test]
    fn test_arguments_in_declared_order() {
        let binder = Arc::new(
            ScriptedBinder::default()
                .with("times", Value::Int(3))
                .with("name", Value::Str("Ada".into())),
        );
        let mut ctx = context("greet", binder.clone());

        invoke(&mut ctx).unwrap();

        assert_eq!(ctx.controller().calls, vec!["greet(Ada, 3)"]);
        assert_eq!(*binder.seen.lock().unwrap(), vec!["name", "times"]);
    }

    #[test]
    fn test_connection_bypasses_binder() {
        let (stream, _peer) = duplex(16);
        let conn = ConnectionHandle::new(stream);
        let binder = Arc::new(ScriptedBinder::default().with("conn", Value::Str("fake".into())));
        let mut ctx = context("stream", binder.clone())
            .with_request(crate::context::Request::new("/ws").with_connection(conn.clone()));

        invoke(&mut ctx).unwrap();

        assert_eq!(ctx.controller().connection, Some(Some(conn.id())));
        assert_eq!(binder.lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_absent_connection_is_passed_as_none() {
        let binder = Arc::new(ScriptedBinder::default());
        let mut ctx = context("stream", binder.clone());

        invoke(&mut ctx).unwrap();

        assert_eq!(ctx.controller().connection, Some(None));
        assert_eq!(binder.lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_variadic_spreads_sequence() {
        let binder = Arc::new(ScriptedBinder::default().with("tags", strings(&["a", "b", "c"])));
        let mut ctx = context("log_all", binder);

        invoke(&mut ctx).unwrap();

        assert_eq!(ctx.controller().calls, vec!["log_all(a, b, c)"]);
    }

    #[test]
    fn test_variadic_with_fixed_prefix() {
        let binder = Arc::new(
            ScriptedBinder::default()
                .with("prefix", Value::Str("#".into()))
                .with("tags", strings(&["x", "y"])),
        );
        let mut ctx = context("tagged", binder);

        invoke(&mut ctx).unwrap();

        assert_eq!(ctx.controller().calls, vec!["#x", "#y"]);
    }

    #[test]
    fn test_variadic_empty_sequence() {
        let binder = Arc::new(ScriptedBinder::default());
        let mut ctx = context("log_all", binder);

        invoke(&mut ctx).unwrap();

        assert_eq!(ctx.controller().calls, vec!["log_all()"]);
    }

    #[test]
    fn test_variadic_non_sequence_is_fatal() {
        let binder = Arc::new(ScriptedBinder::default().with("tags", Value::Str("a".into())));
        let mut ctx = context("log_all", binder);

        let err = invoke(&mut ctx).unwrap_err();

        assert!(matches!(err, ActionError::NotASequence { ref param, .. } if param == "tags"));
        assert!(err.is_internal());
        assert!(ctx.controller().calls.is_empty());
    }

    #[test]
    fn test_non_variadic_sequence_passed_as_aggregate() {
        let binder = Arc::new(ScriptedBinder::default().with("tags", strings(&["a", "b", "c"])));
        let mut ctx = context("batch", binder);

        invoke(&mut ctx).unwrap();

        assert_eq!(ctx.controller().calls, vec!["batch(3)"]);
    }

    #[test]
    fn test_response_is_captured() {
        let binder = Arc::new(ScriptedBinder::default().with("text", Value::Str("hi".into())));
        let mut ctx = context("reply", binder);

        invoke(&mut ctx).unwrap();

        assert_eq!(body_of(ctx.result().unwrap()), b"hi");
    }

    #[test]
    fn test_plain_value_leaves_result_untouched() {
        let mut ctx = context("plain", Arc::new(ScriptedBinder::default()));
        invoke(&mut ctx).unwrap();
        assert_eq!(ctx.controller().calls, vec!["plain()"]);
        assert!(ctx.result().is_none());

        let mut ctx = context("plain", Arc::new(ScriptedBinder::default()));
        ctx.set_result(Box::new(PlainText::new("before")));
        invoke(&mut ctx).unwrap();
        assert_eq!(body_of(ctx.result().unwrap()), b"before");
    }

    #[test]
    fn test_absent_return_leaves_result_untouched() {
        let mut ctx = context("maybe", Arc::new(ScriptedBinder::default()));
        ctx.set_result(Box::new(PlainText::new("before")));

        invoke(&mut ctx).unwrap();
        assert_eq!(body_of(ctx.result().unwrap()), b"before");

        let binder = Arc::new(ScriptedBinder::default().with("found", Value::Bool(true)));
        let mut ctx = context("maybe", binder);
        invoke(&mut ctx).unwrap();
        assert_eq!(body_of(ctx.result().unwrap()), b"found");
    }

    #[test]
    fn test_binding_error_prevents_call() {
        let mut ctx = context("greet", Arc::new(FailingBinder));

        let err = invoke(&mut ctx).unwrap_err();

        assert!(matches!(err, ActionError::Binding { ref name, .. } if name == "name"));
        assert!(!err.is_internal());
        assert!(ctx.controller().calls.is_empty());
    }

    #[test]
    fn test_unknown_method_is_fatal() {
        let actions = Arc::new(ActionTable::for_controller().unwrap());
        let method = Arc::new(MethodDescriptor::new("missing", vec![]));
        let mut ctx = HandlerContext::new(Recorder::default(), actions, method);

        let err = invoke(&mut ctx).unwrap_err();
        assert!(matches!(err, ActionError::MethodNotFound(ref n) if n == "missing"));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_descriptor_arity_mismatch_is_fatal() {
        let actions = Arc::new(ActionTable::for_controller().unwrap());
        let method = Arc::new(MethodDescriptor::new(
            "greet",
            vec![MethodParam::new("name", ParamType::String)],
        ));
        let mut ctx = HandlerContext::new(Recorder::default(), actions, method)
            .with_binder(Arc::new(ScriptedBinder::default()));

        let err = invoke(&mut ctx).unwrap_err();
        assert!(matches!(err, ActionError::ArityMismatch { got: 1, .. }));
        assert!(ctx.controller().calls.is_empty());
    }

    #[test]
    fn test_variadic_descriptor_without_params() {
        let actions = Arc::new(ActionTable::for_controller().unwrap());
        let method = Arc::new(MethodDescriptor::variadic("log_all", vec![]));
        let mut ctx = HandlerContext::new(Recorder::default(), actions, method);

        let err = invoke(&mut ctx).unwrap_err();
        assert!(matches!(err, ActionError::ArityMismatch { .. }));
    }

    fn after(ctx: &mut HandlerContext<Recorder>, chain: FilterChain<'_, Recorder>) -> Result<()> {
        ctx.controller_mut().calls.push("after".to_string());
        chain.next(ctx)
    }

    #[test]
    fn test_invoker_is_terminal_filter() {
        let binder = Arc::new(
            ScriptedBinder::default()
                .with("name", Value::Str("Ada".into()))
                .with("times", Value::Int(1)),
        );
        let filters: Vec<Arc<dyn Filter<Recorder>>> = vec![
            Arc::new(ActionInvoker),
            Arc::new(after),
        ];
        let mut ctx = context("greet", binder);

        crate::filter::run_filters(&filters, &mut ctx).unwrap();

        assert_eq!(ctx.controller().calls, vec!["greet(Ada, 1)"]);
    }

    #[test]
    fn test_exactly_one_call_per_invocation() {
        let binder = Arc::new(
            ScriptedBinder::default()
                .with("name", Value::Str("Ada".into()))
                .with("times", Value::Int(2)),
        );
        let mut ctx = context("greet", binder);

        invoke(&mut ctx).unwrap();
        invoke(&mut ctx).unwrap();

        assert_eq!(ctx.controller().calls.len(), 2);
    }
}
