//! Shaping trees.
//!
//! A shaping tree describes how a query's logical result is built from the
//! values a store returns: object constructions, member initializations,
//! entity shapers and scalar leaves. Binding rewrites the leaves into
//! references to a relational projection.

mod expression;
mod member;

pub use expression::{
    BinaryOp, EntityShaperExpr, IncludeExpr, MemberAssignment, MemberInitExpr, NewExpr,
    ParameterExpr, ProjectionBindingExpr, ProjectionTarget, ShapeExpr,
};
pub use member::{MemberInfo, ProjectionMember};
