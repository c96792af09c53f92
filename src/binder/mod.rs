//! Projection binder.
//!
//! The binder rewrites a shaping tree so that its leaves reference a query's
//! projection instead of raw expressions:
//! - Server mode addresses every leaf by member path
//! - Client-eval mode, the fallback, addresses leaves by projection slot
//!   and leaves untranslatable computation in the tree
//!
//! The output is a shaper ready for materialization.

mod client_pass;
mod config;
mod projection_binder;
mod server_pass;
mod validate;

pub use config::{BinderConfig, ClientEvalPolicy};
pub use projection_binder::{BindMode, BoundShaper, ProjectionBinder};
