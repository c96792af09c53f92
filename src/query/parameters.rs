//! Runtime parameter store.

use std::collections::HashMap;

use crate::error::{Result, ShapeError};
use crate::shaping::ParameterExpr;
use crate::types::Value;

/// Parameter values of one query execution, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ParameterValues {
    values: HashMap<String, Value>,
}

impl ParameterValues {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        ParameterValues {
            values: HashMap::new(),
        }
    }

    /// Sets a parameter value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Gets a value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Number of stored parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no parameter is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolves a parameter lookup left in a shaper by client evaluation.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is absent or its value does not
    /// have the lookup's type. Null satisfies every type.
    pub fn resolve(&self, parameter: &ParameterExpr) -> Result<Value> {
        let value = self
            .values
            .get(&parameter.name)
            .ok_or_else(|| ShapeError::MissingParameter(parameter.name.clone()))?;

        if !value.conforms_to(&parameter.data_type) {
            return Err(ShapeError::TypeError {
                expected: parameter.data_type.to_string(),
                actual: value
                    .data_type()
                    .map_or_else(|| "NULL".to_string(), |t| t.to_string()),
            });
        }

        Ok(value.clone())
    }
}

impl FromIterator<(String, Value)> for ParameterValues {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        ParameterValues {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn lookup(name: &str, data_type: DataType) -> ParameterExpr {
        ParameterExpr {
            name: name.into(),
            data_type,
        }
    }

    #[test]
    fn test_resolve_typed_value() {
        let mut params = ParameterValues::new();
        params.set("__city_0", Value::String("Redmond".into()));

        let value = params.resolve(&lookup("__city_0", DataType::String)).unwrap();
        assert_eq!(value.as_string(), Some("Redmond"));
    }

    #[test]
    fn test_resolve_missing_and_mistyped() {
        let mut params = ParameterValues::new();
        params.set("__limit_0", Value::Int64(10));

        assert!(matches!(
            params.resolve(&lookup("__city_0", DataType::String)),
            Err(ShapeError::MissingParameter(name)) if name == "__city_0"
        ));

        let err = params.resolve(&lookup("__limit_0", DataType::String)).unwrap_err();
        assert_eq!(err.to_string(), "Type error: expected STRING, got INT64");
    }

    #[test]
    fn test_null_satisfies_any_type() {
        let params: ParameterValues = [("__address_0".to_string(), Value::Null)].into_iter().collect();
        let value = params
            .resolve(&lookup("__address_0", DataType::Object("Address".into())))
            .unwrap();
        assert!(value.is_null());
    }
}
