//! Action module - controllers, descriptors and the dispatch table.
//!
//! Provides:
//! - [`Controller`] - request-scoped handler types exposing actions
//! - [`ActionTable`] - maps action names to typed callables
//! - [`MethodDescriptor`] - the signature metadata of one action
//!
//! # Example
//!
//! ```
//! use actionwire::action::{ActionTable, Controller};
//! use actionwire::error::Result;
//! use actionwire::response::PlainText;
//!
//! struct Pages;
//!
//! impl Pages {
//!     fn show(&mut self, slug: String) -> PlainText {
//!         PlainText::new(slug)
//!     }
//! }
//!
//! impl Controller for Pages {
//!     fn register_actions(actions: &mut ActionTable<Self>) -> Result<()> {
//!         actions.register("show", &["slug"], Pages::show)
//!     }
//! }
//!
//! let table = ActionTable::<Pages>::for_controller().unwrap();
//! assert!(table.contains("show"));
//! ```

mod callable;
mod descriptor;
mod table;

pub use callable::{ActionFn, Callable, VariadicActionFn};
pub use descriptor::{MethodDescriptor, MethodParam};
pub use table::ActionTable;

use crate::error::Result;

/// A request-scoped handler type whose methods are actions.
///
/// One instance is created per request; the action table describing its
/// methods is built once and shared.
pub trait Controller: Send + Sized + 'static {
    /// Register every action of this controller.
    fn register_actions(actions: &mut ActionTable<Self>) -> Result<()>;
}
