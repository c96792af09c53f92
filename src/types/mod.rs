//! Core value and identity types.

mod query_id;
mod value;

pub use query_id::QueryId;
pub use value::{DataType, Value};
