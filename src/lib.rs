//! shapebind - projection binding for query shaping trees.
//!
//! A query's *shaping tree* describes how result objects are built from the
//! values a store returns. [`ProjectionBinder`] rewrites that tree against a
//! relational query so each leaf reads a value from the query's projection:
//!
//! - In server mode every leaf is translated to a store fragment and recorded
//!   under its member path (`Customer.Name`), so the store computes the whole
//!   result.
//! - If any node cannot be translated, binding restarts in client-eval mode:
//!   translatable leaves become deduplicated projection slots and everything
//!   else is evaluated in process once rows come back.
//!
//! ```
//! use shapebind::query::SelectExpression;
//! use shapebind::shaping::{MemberInfo, ShapeExpr};
//! use shapebind::sql::SqlTranslator;
//! use shapebind::types::DataType;
//! use shapebind::{BindMode, ProjectionBinder};
//!
//! let shaper = ShapeExpr::new_object(
//!     "CustomerView",
//!     [
//!         (MemberInfo::new("CustomerView", "Id"), ShapeExpr::column("c", "Id", DataType::Int64)),
//!         (MemberInfo::new("CustomerView", "Name"), ShapeExpr::column("c", "Name", DataType::String)),
//!     ],
//! );
//!
//! let translator = SqlTranslator::new();
//! let mut select = SelectExpression::new();
//! let bound = ProjectionBinder::new(&translator).bind(&mut select, &shaper)?;
//!
//! assert_eq!(bound.mode, BindMode::Server);
//! assert_eq!(select.projection_mapping().len(), 2);
//! # Ok::<(), shapebind::ShapeError>(())
//! ```

pub mod binder;
pub mod error;
pub mod query;
pub mod shaping;
pub mod sql;
pub mod types;

pub use binder::{BindMode, BinderConfig, BoundShaper, ClientEvalPolicy, ProjectionBinder};
pub use error::{Result, ShapeError};
