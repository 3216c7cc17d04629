//! Generic field values and decoding into component configs
//!
//! A parsed config tree is made of [`Field`]s. Component fields hold raw
//! document nodes until an accessor decodes them, list and map component
//! fields hold one node per element, and programmatically built trees may
//! hold already-typed configs that skip decoding entirely.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::scope::ComponentKind;
use crate::value::{self, Value};

/// A type-erased, already decoded component config
#[derive(Clone)]
pub struct TypedConfig {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl TypedConfig {
    pub fn new<C: Any + Send + Sync>(conf: C) -> Self {
        Self {
            inner: Arc::new(conf),
            type_name: std::any::type_name::<C>(),
        }
    }

    /// Borrow the config if it is a `C`
    pub fn downcast_ref<C: Any>(&self) -> Option<&C> {
        self.inner.downcast_ref::<C>()
    }

    /// Rust type name of the stored config
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for TypedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedConfig").field(&self.type_name).finish()
    }
}

/// A value in a parsed config tree
#[derive(Debug, Clone)]
pub enum Field {
    /// A raw document node, decoded on access
    Node(Value),
    /// A config built in code
    Typed(TypedConfig),
    /// Elements of a list field
    Sequence(Vec<Field>),
    /// Entries of a map field, or the children of an object
    Mapping(IndexMap<String, Field>),
}

impl Field {
    /// Wrap an already-typed config
    pub fn typed<C: Any + Send + Sync>(conf: C) -> Self {
        Field::Typed(TypedConfig::new(conf))
    }

    /// Name of the observed kind of value, as reported in shape errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Field::Node(v) => value::kind_name(v),
            Field::Typed(t) => t.type_name(),
            Field::Sequence(_) => "array",
            Field::Mapping(_) => "object",
        }
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Field::Node(value)
    }
}

impl From<Vec<Field>> for Field {
    fn from(fields: Vec<Field>) -> Self {
        Field::Sequence(fields)
    }
}

impl From<IndexMap<String, Field>> for Field {
    fn from(fields: IndexMap<String, Field>) -> Self {
        Field::Mapping(fields)
    }
}

/// Decode a field into the config of component kind `K`
///
/// Document nodes are deserialized, typed configs of the right type are
/// passed through unchanged. Collections are never accepted here; list and
/// map accessors iterate them before decoding each element.
pub fn decode<K: ComponentKind>(field: &Field) -> Result<K::Config> {
    match field {
        Field::Node(node) => {
            log::trace!("Decoding {} config from {} node", K::NAME, value::kind_name(node));
            serde_yaml::from_value(node.clone()).map_err(|e| Error::decode(e.to_string()))
        }
        Field::Typed(typed) => typed
            .downcast_ref::<K::Config>()
            .cloned()
            .ok_or_else(|| Error::unexpected_shape("object", typed.type_name())),
        Field::Sequence(_) | Field::Mapping(_) => {
            Err(Error::unexpected_shape("object", field.kind_name()))
        }
    }
}
