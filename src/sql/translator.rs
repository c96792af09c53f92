//! Scalar translation into store fragments.

use std::collections::HashSet;

use crate::shaping::ShapeExpr;

use super::expression::SqlExpression;

/// Functions every store understands.
pub const DEFAULT_STORE_FUNCTIONS: &[&str] = &[
    "ABS", "COALESCE", "LENGTH", "LOWER", "ROUND", "TRIM", "UPPER",
];

/// Translates one scalar sub-tree into a store fragment.
///
/// Returns `None` when the store cannot evaluate the expression. Translation
/// must be deterministic and free of side effects: the binder may translate
/// the same node once per pass.
pub trait ScalarTranslator {
    fn translate(&self, expr: &ShapeExpr) -> Option<SqlExpression>;
}

impl<F> ScalarTranslator for F
where
    F: Fn(&ShapeExpr) -> Option<SqlExpression>,
{
    fn translate(&self, expr: &ShapeExpr) -> Option<SqlExpression> {
        self(expr)
    }
}

/// Relational scalar translator.
///
/// Columns, literals and parameters of store types translate directly,
/// binary operations translate when both operands do, and calls translate
/// when the function is store-evaluable and every argument translates.
#[derive(Debug, Clone)]
pub struct SqlTranslator {
    /// Upper-cased store function names.
    functions: HashSet<String>,
}

impl Default for SqlTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlTranslator {
    /// Creates a translator knowing [`DEFAULT_STORE_FUNCTIONS`].
    #[must_use]
    pub fn new() -> Self {
        SqlTranslator {
            functions: DEFAULT_STORE_FUNCTIONS.iter().map(|f| (*f).to_string()).collect(),
        }
    }

    /// Creates a translator that knows no functions.
    #[must_use]
    pub fn without_functions() -> Self {
        SqlTranslator {
            functions: HashSet::new(),
        }
    }

    /// Registers a store-evaluable function.
    #[must_use]
    pub fn with_function(mut self, name: &str) -> Self {
        self.functions.insert(name.to_ascii_uppercase());
        self
    }

    /// Returns true if `name` is evaluated by the store.
    #[must_use]
    pub fn is_store_function(&self, name: &str) -> bool {
        self.functions.contains(&name.to_ascii_uppercase())
    }
}

impl ScalarTranslator for SqlTranslator {
    fn translate(&self, expr: &ShapeExpr) -> Option<SqlExpression> {
        match expr {
            ShapeExpr::Column {
                table,
                name,
                data_type,
            } if data_type.is_store_type() => Some(SqlExpression::Column {
                table: table.clone(),
                name: name.clone(),
                data_type: data_type.clone(),
            }),
            ShapeExpr::Constant { value, data_type } if data_type.is_store_type() => {
                Some(SqlExpression::Constant {
                    value: value.clone(),
                    data_type: data_type.clone(),
                })
            }
            ShapeExpr::Parameter(parameter) if parameter.data_type.is_store_type() => {
                Some(SqlExpression::Parameter {
                    name: parameter.name.clone(),
                    data_type: parameter.data_type.clone(),
                })
            }
            ShapeExpr::Binary {
                left,
                op,
                right,
                data_type,
            } => {
                let left = self.translate(left)?;
                let right = self.translate(right)?;
                Some(SqlExpression::Binary {
                    left: Box::new(left),
                    op: *op,
                    right: Box::new(right),
                    data_type: data_type.clone(),
                })
            }
            ShapeExpr::Call {
                function,
                arguments,
                data_type,
            } if self.is_store_function(function) => {
                let arguments = arguments
                    .iter()
                    .map(|argument| self.translate(argument))
                    .collect::<Option<Vec<_>>>()?;
                Some(SqlExpression::Function {
                    name: function.to_ascii_uppercase(),
                    arguments,
                    data_type: data_type.clone(),
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaping::BinaryOp;
    use crate::types::{DataType, Value};

    #[test]
    fn test_translates_columns_and_store_functions() {
        let translator = SqlTranslator::new();
        let upper = ShapeExpr::call(
            "upper",
            vec![ShapeExpr::column("c", "Name", DataType::String)],
            DataType::String,
        );
        let fragment = translator.translate(&upper).expect("UPPER is a store function");
        assert_eq!(fragment.to_string(), "UPPER(\"c\".\"Name\")");
    }

    #[test]
    fn test_client_only_function_is_untranslatable() {
        let translator = SqlTranslator::new();
        let format = ShapeExpr::call(
            "FormatAddress",
            vec![ShapeExpr::column("c", "City", DataType::String)],
            DataType::String,
        );
        assert!(translator.translate(&format).is_none());

        let registered = SqlTranslator::new().with_function("FormatAddress");
        assert!(registered.translate(&format).is_some());
    }

    #[test]
    fn test_binary_needs_both_operands() {
        let translator = SqlTranslator::new();
        let ok = ShapeExpr::binary(
            ShapeExpr::column("o", "Quantity", DataType::Int64),
            BinaryOp::Mul,
            ShapeExpr::constant(Value::Int64(2)),
            DataType::Int64,
        );
        assert!(translator.translate(&ok).is_some());

        let object_operand = ShapeExpr::binary(
            ShapeExpr::column("o", "Quantity", DataType::Int64),
            BinaryOp::Eq,
            ShapeExpr::parameter("__filter_0", DataType::Object("Filter".into())),
            DataType::Bool,
        );
        assert!(translator.translate(&object_operand).is_none());
    }

    #[test]
    fn test_closure_translator() {
        let reject_all = |_: &ShapeExpr| -> Option<SqlExpression> { None };
        assert!(reject_all
            .translate(&ShapeExpr::constant(Value::Bool(true)))
            .is_none());
    }
}
