//! Method descriptors.
//!
//! A [`MethodDescriptor`] is the route-level metadata of one action: its
//! name, its ordered parameters and whether the last parameter is variadic.
//! Descriptors are built once at registration and shared behind `Arc`.

use std::fmt;

use crate::binding::ParamType;

/// A declared action parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParam {
    /// Parameter name, used as the binding key.
    pub name: String,
    /// Declared type.
    pub ty: ParamType,
}

impl MethodParam {
    /// Create a parameter.
    pub fn new(name: &str, ty: ParamType) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

/// Immutable description of an action's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    name: String,
    params: Vec<MethodParam>,
    variadic: bool,
}

impl MethodDescriptor {
    /// Describe a fixed-arity action.
    pub fn new(name: &str, params: Vec<MethodParam>) -> Self {
        Self {
            name: name.to_string(),
            params,
            variadic: false,
        }
    }

    /// Describe an action whose last parameter is variadic.
    ///
    /// The last parameter is expected to be bound to a sequence, whose
    /// elements are spread into individual trailing arguments.
    pub fn variadic(name: &str, params: Vec<MethodParam>) -> Self {
        Self {
            name: name.to_string(),
            params,
            variadic: true,
        }
    }

    /// Action name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in declared order.
    #[inline]
    pub fn params(&self) -> &[MethodParam] {
        &self.params
    }

    /// Whether the last parameter is variadic.
    #[inline]
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Number of declared parameters.
    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if self.variadic && i == last {
                let element = param.ty.element().unwrap_or(&param.ty);
                write!(f, "{}: ...{}", param.name, element)?;
            } else {
                write!(f, "{}: {}", param.name, param.ty)?;
            }
        }
        f.write_str(")")
    }
}
