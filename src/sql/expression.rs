//! Store-evaluable expression fragments.

use std::fmt;

use crate::shaping::BinaryOp;
use crate::types::{DataType, Value};

/// Fragment the store can evaluate as part of a projection.
///
/// Equality is structural; projection lists deduplicate on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlExpression {
    /// Column reference.
    Column {
        table: String,
        name: String,
        data_type: DataType,
    },

    /// Literal.
    Constant { value: Value, data_type: DataType },

    /// Query parameter pushed to the store.
    Parameter { name: String, data_type: DataType },

    /// Binary operation.
    Binary {
        left: Box<SqlExpression>,
        op: BinaryOp,
        right: Box<SqlExpression>,
        data_type: DataType,
    },

    /// Store function call.
    Function {
        name: String,
        arguments: Vec<SqlExpression>,
        data_type: DataType,
    },

    /// All columns materializing one entity.
    Entity(EntityProjection),
}

impl SqlExpression {
    /// Creates a column reference.
    #[must_use]
    pub fn column(table: impl Into<String>, name: impl Into<String>, data_type: DataType) -> Self {
        SqlExpression::Column {
            table: table.into(),
            name: name.into(),
            data_type,
        }
    }

    /// Returns the type this fragment produces.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            SqlExpression::Column { data_type, .. }
            | SqlExpression::Constant { data_type, .. }
            | SqlExpression::Parameter { data_type, .. }
            | SqlExpression::Binary { data_type, .. }
            | SqlExpression::Function { data_type, .. } => data_type.clone(),
            SqlExpression::Entity(_) => DataType::ValueBuffer,
        }
    }
}

impl fmt::Display for SqlExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlExpression::Column { table, name, .. } => write!(f, "\"{table}\".\"{name}\""),
            SqlExpression::Constant { value, .. } => write!(f, "{value}"),
            SqlExpression::Parameter { name, .. } => write!(f, "@{name}"),
            SqlExpression::Binary { left, op, right, .. } => {
                write!(f, "({left} {} {right})", op.as_str())
            }
            SqlExpression::Function { name, arguments, .. } => {
                write!(f, "{name}(")?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str(")")
            }
            SqlExpression::Entity(entity) => write!(f, "{entity}"),
        }
    }
}

/// Columns of one table that together materialize an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityProjection {
    pub entity_type: String,
    /// Table alias the columns are read from.
    pub table: String,
    /// (`column_name`, type), in materialization order.
    pub columns: Vec<(String, DataType)>,
}

impl EntityProjection {
    /// Creates an entity projection over `table`.
    #[must_use]
    pub fn new(
        entity_type: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<(String, DataType)>,
    ) -> Self {
        EntityProjection {
            entity_type: entity_type.into(),
            table: table.into(),
            columns,
        }
    }
}

impl fmt::Display for EntityProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (column, _)) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "\"{}\".\"{column}\"", self.table)?;
        }
        Ok(())
    }
}
