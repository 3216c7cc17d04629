//! Field declarations
//!
//! A [`ConfigSpec`] lists the fields a config document may contain and how
//! each one is shaped. Declarations decide how a raw document is structured
//! into a [`Field`] tree, and they render to JSON Schema for validation and
//! documentation.

use indexmap::IndexMap;
use serde_json::json;
use serde_yaml::Mapping;

use crate::field::Field;
use crate::scope::ComponentKind;
use crate::value::{string_keyed, Value};

/// Structural shape of a component field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// A single component config
    Scalar,
    /// An array of component configs
    List,
    /// A map of component configs, keyed by the textual form of each key
    Map,
}

/// What a declared field holds
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Component config(s) of one component family
    Component {
        component: &'static str,
        shape: FieldShape,
        schema: serde_json::Value,
    },
    /// An object grouping nested fields
    Object(Vec<FieldSpec>),
}

/// A declared config field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub description: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    fn component_field<K: ComponentKind>(name: impl Into<String>, shape: FieldShape) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: FieldKind::Component {
                component: K::NAME,
                shape,
                schema: K::schema(),
            },
        }
    }

    /// Declare a field holding one component config
    pub fn component<K: ComponentKind>(name: impl Into<String>) -> Self {
        Self::component_field::<K>(name, FieldShape::Scalar)
    }

    /// Declare a field holding an array of component configs
    pub fn component_list<K: ComponentKind>(name: impl Into<String>) -> Self {
        Self::component_field::<K>(name, FieldShape::List)
    }

    /// Declare a field holding a map of component configs
    pub fn component_map<K: ComponentKind>(name: impl Into<String>) -> Self {
        Self::component_field::<K>(name, FieldShape::Map)
    }

    /// Declare an object field with nested children
    pub fn object(name: impl Into<String>, children: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: FieldKind::Object(children),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The component shape, or `None` for object fields
    pub fn shape(&self) -> Option<FieldShape> {
        match &self.kind {
            FieldKind::Component { shape, .. } => Some(*shape),
            FieldKind::Object(_) => None,
        }
    }

    fn structure(&self, value: Value) -> Field {
        match (&self.kind, value) {
            (FieldKind::Component { shape: FieldShape::List, .. }, Value::Sequence(items)) => {
                Field::Sequence(items.into_iter().map(Field::Node).collect())
            }
            (FieldKind::Component { shape: FieldShape::Map, .. }, Value::Mapping(entries)) => {
                match string_keyed(entries) {
                    Ok(entries) => Field::Mapping(
                        entries
                            .into_iter()
                            .map(|(k, v)| (k, Field::Node(v)))
                            .collect(),
                    ),
                    Err(entries) => Field::Node(Value::Mapping(entries)),
                }
            }
            (FieldKind::Object(children), Value::Mapping(entries)) => {
                structure_mapping(children, entries)
            }
            // Scalars, and mismatches left for the accessor to report
            (_, value) => Field::Node(value),
        }
    }

    fn json_schema(&self) -> serde_json::Value {
        let mut schema = match &self.kind {
            FieldKind::Component { shape, schema, .. } => match shape {
                FieldShape::Scalar => schema.clone(),
                FieldShape::List => json!({ "type": "array", "items": schema }),
                FieldShape::Map => json!({ "type": "object", "additionalProperties": schema }),
            },
            FieldKind::Object(children) => object_schema(children),
        };
        if !self.description.is_empty() {
            if let Some(obj) = schema.as_object_mut() {
                obj.insert("description".into(), self.description.clone().into());
            }
        }
        schema
    }
}

/// The set of fields declared for a config document
#[derive(Debug, Clone, Default)]
pub struct ConfigSpec {
    fields: Vec<FieldSpec>,
}

impl ConfigSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field declaration
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Find a declaration by path segments, descending through object fields
    pub fn find<S: AsRef<str>>(&self, segments: &[S]) -> Option<&FieldSpec> {
        let (first, rest) = segments.split_first()?;
        let mut current = self.fields.iter().find(|f| f.name == first.as_ref())?;
        for segment in rest {
            current = match &current.kind {
                FieldKind::Object(children) => {
                    children.iter().find(|f| f.name == segment.as_ref())?
                }
                FieldKind::Component { .. } => return None,
            };
        }
        Some(current)
    }

    /// Structure a raw document into a field tree
    ///
    /// List and map component fields are split into per-element nodes,
    /// everything else stays a raw node. A null document is an empty tree.
    pub fn structure(&self, value: Value) -> Field {
        match value {
            Value::Null => Field::Mapping(IndexMap::new()),
            Value::Mapping(entries) => structure_mapping(&self.fields, entries),
            other => Field::Node(other),
        }
    }

    /// Render the declarations as a JSON Schema
    pub fn json_schema(&self) -> serde_json::Value {
        object_schema(&self.fields)
    }
}

/// Structure the entries of an object, leaving it raw if a key is a collection
fn structure_mapping(fields: &[FieldSpec], entries: Mapping) -> Field {
    let entries = match string_keyed(entries) {
        Ok(entries) => entries,
        Err(entries) => return Field::Node(Value::Mapping(entries)),
    };
    Field::Mapping(
        entries
            .into_iter()
            .map(|(key, value)| {
                let field = match fields.iter().find(|f| f.name == key) {
                    Some(spec) => spec.structure(value),
                    None => Field::Node(value),
                };
                (key, field)
            })
            .collect(),
    )
}

fn object_schema(fields: &[FieldSpec]) -> serde_json::Value {
    let properties: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|f| (f.name.clone(), f.json_schema()))
        .collect();
    json!({ "type": "object", "properties": properties })
}
