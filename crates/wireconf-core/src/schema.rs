//! Schema validation of raw config documents
//!
//! Validates a document against the JSON Schema rendered from a
//! [`ConfigSpec`], catching structural mistakes (a list field holding a
//! string, a component given as a scalar) before any component is built.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::spec::ConfigSpec;
use crate::value::{to_json, Value};

/// Compiled schema for validating config documents
#[derive(Debug, Clone)]
pub struct Schema {
    /// The JSON Schema as a serde_json::Value
    schema: serde_json::Value,
    /// Compiled JSON Schema validator (wrapped in Arc for Clone)
    compiled: Arc<jsonschema::Validator>,
}

impl Schema {
    /// Compile the schema of a set of field declarations
    pub fn from_spec(spec: &ConfigSpec) -> Result<Self> {
        Self::from_value(spec.json_schema())
    }

    /// Compile a schema from a serde_json::Value
    pub fn from_value(schema: serde_json::Value) -> Result<Self> {
        let compiled = jsonschema::validator_for(&schema)
            .map_err(|e| Error::parse(format!("Invalid JSON Schema: {}", e)))?;
        Ok(Self {
            schema,
            compiled: Arc::new(compiled),
        })
    }

    /// Validate a document against this schema
    ///
    /// Returns Ok(()) if valid, or an error describing the first failure.
    pub fn validate(&self, value: &Value) -> Result<()> {
        let json_value = to_json(value);

        let mut errors = self.compiled.iter_errors(&json_value);
        if let Some(error) = errors.next() {
            let path = error.instance_path.to_string();
            let message = error.to_string();
            return Err(Error::validation(
                if path.is_empty() { "<root>" } else { path.as_str() },
                message,
            ));
        }
        Ok(())
    }

    /// Validate and collect all errors (instead of failing on first)
    pub fn validate_collect(&self, value: &Value) -> Vec<ValidationError> {
        let json_value = to_json(value);

        self.compiled
            .iter_errors(&json_value)
            .map(|e| ValidationError {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }

    /// Get the raw schema value
    pub fn as_value(&self) -> &serde_json::Value {
        &self.schema
    }
}

/// A single validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the invalid value (e.g., "/inputs/0")
    pub path: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}
