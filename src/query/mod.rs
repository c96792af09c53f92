//! Relational query side of binding.
//!
//! The binder only talks to a query through [`ProjectionListOwner`].
//! [`SelectExpression`] is the in-memory implementation: it keeps the
//! member mapping produced by server-mode binding and the ordered list of
//! fragments the store projects.

mod mapping;
mod parameters;
mod select;

pub use mapping::ProjectionMapping;
pub use parameters::ParameterValues;
pub use select::{ProjectionExpression, ProjectionListOwner, SelectExpression};
