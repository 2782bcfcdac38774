//! Type-erased action callables.
//!
//! Registration turns a plain Rust function or closure into a
//! [`Callable`]: the wrapper already knows how to extract each argument from
//! a bound [`Value`], so no signature inspection happens per request.

use std::marker::PhantomData;
use std::sync::Arc;

use super::{MethodDescriptor, MethodParam};
use crate::binding::{FromValue, ParamType, Value};
use crate::error::{ActionError, Result};
use crate::response::{IntoOutcome, Outcome};

/// An action bound to its controller type, callable with bound arguments.
pub trait Callable<H>: Send + Sync + 'static {
    /// Call the action on `controller` with positional arguments.
    fn call(&self, controller: &mut H, args: Vec<Value>) -> Result<Outcome>;
}

/// Functions usable as fixed-arity actions.
///
/// Implemented for `Fn(&mut H, A1, ..., An) -> R` with up to eight
/// parameters, where every `Ai: FromValue` and `R: IntoOutcome`.
pub trait ActionFn<H, Args>: Send + Sync + 'static {
    /// Declared types of the parameters, in order.
    fn param_types() -> Vec<ParamType>;

    /// Extract arguments and call.
    fn invoke(&self, method: &MethodDescriptor, controller: &mut H, args: Vec<Value>)
        -> Result<Outcome>;
}

/// Functions usable as variadic actions.
///
/// Implemented for `Fn(&mut H, A1, ..., An, Vec<T>) -> R` with up to seven
/// fixed parameters. Every argument past the fixed prefix is extracted as a
/// `T` and gathered into the trailing `Vec<T>`.
pub trait VariadicActionFn<H, Args, T>: Send + Sync + 'static {
    /// Declared types of the fixed parameters, in order.
    fn fixed_param_types() -> Vec<ParamType>;

    /// Extract arguments and call.
    fn invoke(&self, method: &MethodDescriptor, controller: &mut H, args: Vec<Value>)
        -> Result<Outcome>;
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

/// Positional arguments walked alongside the parameters they bind.
///
/// Arguments past the last declared parameter belong to it (the variadic
/// tail).
struct ArgCursor<'a> {
    values: std::vec::IntoIter<Value>,
    params: &'a [MethodParam],
    position: usize,
}

impl<'a> ArgCursor<'a> {
    fn new(method: &'a MethodDescriptor, values: Vec<Value>) -> Self {
        Self {
            values: values.into_iter(),
            params: method.params(),
            position: 0,
        }
    }

    fn next<T: FromValue>(&mut self) -> Result<T> {
        let params = self.params;
        let param = params.get(self.position).or_else(|| params.last());
        self.position += 1;

        let value = self.values.next().unwrap_or(Value::Null);
        T::from_value(value).map_err(|e| match param {
            Some(param) => e.for_param(&param.name),
            None => e,
        })
    }

    fn rest<T: FromValue>(mut self) -> Result<Vec<T>> {
        let mut items = Vec::with_capacity(self.values.len());
        while !self.values.as_slice().is_empty() {
            items.push(self.next()?);
        }
        Ok(items)
    }
}

macro_rules! impl_action_fn {
    (@fixed $($ty:ident $var:ident),*) => {
        impl<H, F, R, $($ty,)*> ActionFn<H, ($($ty,)*)> for F
        where
            F: Fn(&mut H, $($ty),*) -> R + Send + Sync + 'static,
            R: IntoOutcome,
            $($ty: FromValue,)*
        {
            fn param_types() -> Vec<ParamType> {
                vec![$($ty::param_type()),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn invoke(
                &self,
                method: &MethodDescriptor,
                controller: &mut H,
                args: Vec<Value>,
            ) -> Result<Outcome> {
                let expected = count!($($ty)*);
                if args.len() != expected {
                    return Err(ActionError::ArityMismatch {
                        method: method.name().to_string(),
                        expected: expected.to_string(),
                        got: args.len(),
                    });
                }

                let mut args = ArgCursor::new(method, args);
                $(let $var: $ty = args.next()?;)*
                Ok((self)(controller, $($var),*).into_outcome())
            }
        }
    };
    ($($ty:ident $var:ident),*) => {
        impl_action_fn!(@fixed $($ty $var),*);

        impl<H, F, R, T, $($ty,)*> VariadicActionFn<H, ($($ty,)*), T> for F
        where
            F: Fn(&mut H, $($ty,)* Vec<T>) -> R + Send + Sync + 'static,
            R: IntoOutcome,
            T: FromValue,
            $($ty: FromValue,)*
        {
            fn fixed_param_types() -> Vec<ParamType> {
                vec![$($ty::param_type()),*]
            }

            #[allow(unused_mut)]
            fn invoke(
                &self,
                method: &MethodDescriptor,
                controller: &mut H,
                args: Vec<Value>,
            ) -> Result<Outcome> {
                let fixed = count!($($ty)*);
                if args.len() < fixed {
                    return Err(ActionError::ArityMismatch {
                        method: method.name().to_string(),
                        expected: format!("at least {}", fixed),
                        got: args.len(),
                    });
                }

                let mut args = ArgCursor::new(method, args);
                $(let $var: $ty = args.next()?;)*
                let rest = args.rest::<T>()?;
                Ok((self)(controller, $($var,)* rest).into_outcome())
            }
        }
    };
}

impl_action_fn!();
impl_action_fn!(A1 a1);
impl_action_fn!(A1 a1, A2 a2);
impl_action_fn!(A1 a1, A2 a2, A3 a3);
impl_action_fn!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_action_fn!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_action_fn!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_action_fn!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
impl_action_fn!(@fixed A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8);

/// Fixed-arity action wrapper.
pub(crate) struct TypedAction<F, Args> {
    method: Arc<MethodDescriptor>,
    action: F,
    _phantom: PhantomData<fn(Args)>,
}

impl<F, Args> TypedAction<F, Args> {
    pub(crate) fn new(method: Arc<MethodDescriptor>, action: F) -> Self {
        Self {
            method,
            action,
            _phantom: PhantomData,
        }
    }
}

impl<H, F, Args> Callable<H> for TypedAction<F, Args>
where
    H: 'static,
    F: ActionFn<H, Args>,
    Args: 'static,
{
    fn call(&self, controller: &mut H, args: Vec<Value>) -> Result<Outcome> {
        self.action.invoke(&self.method, controller, args)
    }
}

/// Variadic action wrapper.
pub(crate) struct VariadicAction<F, Args, T> {
    method: Arc<MethodDescriptor>,
    action: F,
    _phantom: PhantomData<fn(Args, T)>,
}

impl<F, Args, T> VariadicAction<F, Args, T> {
    pub(crate) fn new(method: Arc<MethodDescriptor>, action: F) -> Self {
        Self {
            method,
            action,
            _phantom: PhantomData,
        }
    }
}

impl<H, F, Args, T> Callable<H> for VariadicAction<F, Args, T>
where
    H: 'static,
    F: VariadicActionFn<H, Args, T>,
    Args: 'static,
    T: 'static,
{
    fn call(&self, controller: &mut H, args: Vec<Value>) -> Result<Outcome> {
        self.action.invoke(&self.method, controller, args)
    }
}
