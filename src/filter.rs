//! Filter chain.
//!
//! Filters run in order around an action. Each receives the context and the
//! rest of the chain, and decides whether to continue by calling
//! [`FilterChain::next`]. The [`ActionInvoker`](crate::invoker::ActionInvoker)
//! sits at the end of the chain and never continues it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use actionwire::context::HandlerContext;
//! use actionwire::filter::{run_filters, Filter, FilterChain};
//! use actionwire::invoker::ActionInvoker;
//! use actionwire::response::ErrorResult;
//! # use actionwire::action::{ActionTable, Controller};
//! # use actionwire::error::Result;
//! # struct Admin;
//! # impl Controller for Admin {
//! #     fn register_actions(actions: &mut ActionTable<Self>) -> Result<()> {
//! #         actions.register("index", &[], |_: &mut Admin| {})
//! #     }
//! # }
//!
//! /// Short-circuits every request with a 403.
//! fn deny(ctx: &mut HandlerContext<Admin>, _chain: FilterChain<'_, Admin>) -> Result<()> {
//!     ctx.set_result(Box::new(ErrorResult::new(403, "forbidden")));
//!     Ok(())
//! }
//!
//! let filters: Vec<Arc<dyn Filter<Admin>>> = vec![Arc::new(deny), Arc::new(ActionInvoker)];
//! let actions = Arc::new(ActionTable::for_controller().unwrap());
//! let mut ctx = HandlerContext::for_action(Admin, actions, "index").unwrap();
//! run_filters(&filters, &mut ctx).unwrap();
//! assert!(ctx.result().is_some());
//! ```

use std::sync::Arc;

use crate::context::HandlerContext;
use crate::error::Result;

/// A step in the request-processing chain.
pub trait Filter<H>: Send + Sync {
    /// Process the request, optionally continuing with `chain.next(ctx)`.
    fn call(&self, ctx: &mut HandlerContext<H>, chain: FilterChain<'_, H>) -> Result<()>;
}

impl<H, F> Filter<H> for F
where
    F: Fn(&mut HandlerContext<H>, FilterChain<'_, H>) -> Result<()> + Send + Sync,
{
    fn call(&self, ctx: &mut HandlerContext<H>, chain: FilterChain<'_, H>) -> Result<()> {
        self(ctx, chain)
    }
}

/// The filters remaining after the current one.
pub struct FilterChain<'a, H> {
    filters: &'a [Arc<dyn Filter<H>>],
}

impl<'a, H> FilterChain<'a, H> {
    /// Create a chain over the given filters.
    pub fn new(filters: &'a [Arc<dyn Filter<H>>]) -> Self {
        Self { filters }
    }

    /// Run the next filter. An exhausted chain completes successfully.
    pub fn next(self, ctx: &mut HandlerContext<H>) -> Result<()> {
        match self.filters.split_first() {
            Some((filter, rest)) => filter.call(ctx, FilterChain { filters: rest }),
            None => Ok(()),
        }
    }

    /// Number of filters not yet run.
    pub fn remaining(&self) -> usize {
        self.filters.len()
    }
}

impl<H> Clone for FilterChain<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for FilterChain<'_, H> {}

/// Run a full filter chain on a context.
pub fn run_filters<H>(filters: &[Arc<dyn Filter<H>>], ctx: &mut HandlerContext<H>) -> Result<()> {
    FilterChain::new(filters).next(ctx)
}
