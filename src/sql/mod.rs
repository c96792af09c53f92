//! Store fragments and scalar translation.

mod expression;
mod translator;

pub use expression::{EntityProjection, SqlExpression};
pub use translator::{ScalarTranslator, SqlTranslator, DEFAULT_STORE_FUNCTIONS};
