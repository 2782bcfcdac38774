//! Action table for dispatching calls by action name.
//!
//! The table maps action names to their [`MethodDescriptor`] and a typed
//! [`Callable`]. It is built once per controller type and shared read-only
//! across requests.
//!
//! # Example
//!
//! ```
//! use actionwire::action::ActionTable;
//! use actionwire::binding::ParamType;
//! use actionwire::response::PlainText;
//!
//! struct Greeter;
//!
//! let mut table = ActionTable::<Greeter>::new();
//! table
//!     .register("greet", &["name", "times"], |_: &mut Greeter, name: String, times: i64| {
//!         PlainText::new(name.repeat(times as usize))
//!     })
//!     .unwrap();
//!
//! let desc = table.descriptor("greet").unwrap();
//! assert_eq!(desc.params()[1].ty, ParamType::Int { bits: 64 });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::callable::{ActionFn, Callable, TypedAction, VariadicAction, VariadicActionFn};
use super::{Controller, MethodDescriptor, MethodParam};
use crate::binding::{FromValue, ParamType};
use crate::error::{ActionError, Result};

/// Entry for a registered action.
struct ActionEntry<H> {
    /// Shared signature metadata.
    descriptor: Arc<MethodDescriptor>,
    /// Typed call wrapper.
    callable: Box<dyn Callable<H>>,
}

/// Table mapping action names to callables for controller type `H`.
pub struct ActionTable<H> {
    actions: HashMap<String, ActionEntry<H>>,
}

impl<H: 'static> ActionTable<H> {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Build the table of a controller type.
    pub fn for_controller() -> Result<Self>
    where
        H: Controller,
    {
        let mut table = Self::new();
        H::register_actions(&mut table)?;
        tracing::debug!(
            "Registered {} actions for {}",
            table.len(),
            std::any::type_name::<H>()
        );
        Ok(table)
    }

    /// Register a fixed-arity action.
    ///
    /// # Arguments
    ///
    /// * `name` - Action name
    /// * `param_names` - One binding name per parameter, in order
    /// * `action` - Function taking `(&mut H, A1, ..., An)`
    pub fn register<F, Args>(&mut self, name: &str, param_names: &[&str], action: F) -> Result<()>
    where
        F: ActionFn<H, Args>,
        Args: 'static,
    {
        let params = self.validate(name, param_names, F::param_types())?;
        let descriptor = Arc::new(MethodDescriptor::new(name, params));
        self.insert(descriptor.clone(), Box::new(TypedAction::new(descriptor, action)));
        Ok(())
    }

    /// Register a variadic action.
    ///
    /// The last name in `param_names` belongs to the trailing `Vec<T>`
    /// parameter, which is declared as a sequence of `T`.
    pub fn register_variadic<F, Args, T>(
        &mut self,
        name: &str,
        param_names: &[&str],
        action: F,
    ) -> Result<()>
    where
        F: VariadicActionFn<H, Args, T>,
        Args: 'static,
        T: FromValue + 'static,
    {
        let mut types = F::fixed_param_types();
        types.push(ParamType::Seq(Box::new(T::param_type())));

        let params = self.validate(name, param_names, types)?;
        let descriptor = Arc::new(MethodDescriptor::variadic(name, params));
        self.insert(descriptor.clone(), Box::new(VariadicAction::new(descriptor, action)));
        Ok(())
    }

    fn validate(
        &self,
        name: &str,
        param_names: &[&str],
        types: Vec<ParamType>,
    ) -> Result<Vec<MethodParam>> {
        if name.is_empty() {
            return Err(ActionError::Registration(
                "action name must not be empty".to_string(),
            ));
        }
        if self.actions.contains_key(name) {
            return Err(ActionError::Registration(format!(
                "action {} is already registered",
                name
            )));
        }
        if param_names.len() != types.len() {
            return Err(ActionError::Registration(format!(
                "action {} takes {} parameters but {} names were given",
                name,
                types.len(),
                param_names.len()
            )));
        }
        for (i, param) in param_names.iter().enumerate() {
            if param.is_empty() {
                return Err(ActionError::Registration(format!(
                    "parameter {} of action {} has an empty name",
                    i, name
                )));
            }
            if param_names[..i].contains(param) {
                return Err(ActionError::Registration(format!(
                    "parameter {} of action {} is declared twice",
                    param, name
                )));
            }
        }

        Ok(param_names
            .iter()
            .zip(types)
            .map(|(param, ty)| MethodParam::new(param, ty))
            .collect())
    }

    fn insert(&mut self, descriptor: Arc<MethodDescriptor>, callable: Box<dyn Callable<H>>) {
        tracing::trace!("Registering action {}", descriptor);
        self.actions.insert(
            descriptor.name().to_string(),
            ActionEntry {
                descriptor,
                callable,
            },
        );
    }

    /// Get the callable for an action.
    pub fn callable(&self, name: &str) -> Option<&dyn Callable<H>> {
        self.actions.get(name).map(|e| e.callable.as_ref())
    }

    /// Get the descriptor of an action.
    pub fn descriptor(&self, name: &str) -> Option<Arc<MethodDescriptor>> {
        self.actions.get(name).map(|e| e.descriptor.clone())
    }

    /// Whether an action is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<H: 'static> Default for ActionTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{LiveConnection, Value};
    use crate::response::PlainText;

    struct Greeter;

    impl Greeter {
        fn greet(&mut self, name: String, times: i64) -> PlainText {
            PlainText::new(format!("{} x{}", name, times))
        }

        fn index(&mut self) {}
    }

    impl Controller for Greeter {
        fn register_actions(actions: &mut ActionTable<Self>) -> Result<()> {
            actions.register("greet", &["name", "times"], Greeter::greet)?;
            actions.register("index", &[], Greeter::index)?;
            Ok(())
        }
    }

    #[test]
    fn test_register_method() {
        let table = ActionTable::<Greeter>::for_controller().unwrap();

        assert!(table.callable("greet").is_some());
        assert!(table.contains("index"));
        assert_eq!(table.names(), vec!["greet", "index"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_descriptor_from_signature() {
        let table = ActionTable::<Greeter>::for_controller().unwrap();
        let desc = table.descriptor("greet").unwrap();

        assert_eq!(desc.name(), "greet");
        assert!(!desc.is_variadic());
        assert_eq!(
            desc.params(),
            &[
                MethodParam::new("name", ParamType::String),
                MethodParam::new("times", ParamType::Int { bits: 64 }),
            ]
        );
    }

    #[test]
    fn test_register_variadic() {
        let mut table = ActionTable::<Greeter>::new();
        table
            .register_variadic(
                "log_all",
                &["conn", "tags"],
                |_: &mut Greeter, _conn: LiveConnection, _tags: Vec<String>| {},
            )
            .unwrap();

        let desc = table.descriptor("log_all").unwrap();
        assert!(desc.is_variadic());
        assert_eq!(desc.params()[0].ty, ParamType::Connection);
        assert_eq!(
            desc.params()[1].ty,
            ParamType::Seq(Box::new(ParamType::String))
        );
    }

    #[test]
    fn test_registration_errors() {
        let mut table = ActionTable::<Greeter>::new();

        let err = table
            .register("greet", &["name"], Greeter::greet)
            .unwrap_err();
        assert!(matches!(err, ActionError::Registration(_)));

        let err = table
            .register("greet", &["name", "name"], Greeter::greet)
            .unwrap_err();
        assert!(matches!(err, ActionError::Registration(_)));

        let err = table.register("", &[], Greeter::index).unwrap_err();
        assert!(matches!(err, ActionError::Registration(_)));

        table.register("index", &[], Greeter::index).unwrap();
        let err = table.register("index", &[], Greeter::index).unwrap_err();
        assert!(matches!(err, ActionError::Registration(_)));
        assert!(!table.is_empty());
    }

    #[test]
    fn test_callable_dispatch() {
        let table = ActionTable::<Greeter>::for_controller().unwrap();
        let mut greeter = Greeter;

        let outcome = table
            .callable("greet")
            .unwrap()
            .call(&mut greeter, vec![Value::Str("Ada".into()), Value::Int(3)])
            .unwrap();
        assert!(outcome.is_response());
    }

    #[test]
    fn test_action_not_found() {
        let table = ActionTable::<Greeter>::new();

        assert!(table.callable("nonexistent").is_none());
        assert!(table.descriptor("nonexistent").is_none());
        assert!(table.is_empty());
    }
}
