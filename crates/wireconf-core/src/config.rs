//! Parsed configuration tree
//!
//! [`ParsedConfig`] holds a structured [`Field`] tree together with the
//! component factory used to build components out of it. The tree is shared
//! and never mutated after parsing, so a config can be cloned and accessed
//! from several places at once.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::field::Field;
use crate::schema::Schema;
use crate::scope::Scope;
use crate::spec::ConfigSpec;
use crate::value::{self, Value};

/// Options for parsing config documents
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Validate the document against the schema of the declared fields
    /// before structuring it
    pub validate: bool,
}

/// A parsed config document bound to a component factory
pub struct ParsedConfig<M: ?Sized> {
    /// Structured field tree
    root: Arc<Field>,
    /// Segments prepended to every lookup (see [`ParsedConfig::namespace`])
    prefix: Vec<String>,
    /// Factory scope at the namespace path
    scope: Scope<M>,
}

impl<M: ?Sized> Clone for ParsedConfig<M> {
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
            prefix: self.prefix.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl<M: ?Sized> ParsedConfig<M> {
    /// Create a config from an already structured field tree
    ///
    /// Use this to build configs programmatically, including trees that
    /// hold typed configs rather than document nodes.
    pub fn from_field(root: Field, factory: Arc<M>) -> Self {
        Self {
            root: Arc::new(root),
            prefix: Vec::new(),
            scope: Scope::new(factory),
        }
    }

    /// Create a config from a raw document, structured by `spec`
    pub fn from_value(spec: &ConfigSpec, value: Value, factory: Arc<M>) -> Self {
        Self::from_field(spec.structure(value), factory)
    }

    /// Create a config from a raw document with options
    pub fn from_value_with_options(
        spec: &ConfigSpec,
        value: Value,
        factory: Arc<M>,
        options: &ParseOptions,
    ) -> Result<Self> {
        if options.validate {
            Schema::from_spec(spec)?.validate(&value)?;
        }
        Ok(Self::from_value(spec, value, factory))
    }

    /// Load a config from a YAML string
    pub fn from_yaml(spec: &ConfigSpec, yaml: &str, factory: Arc<M>) -> Result<Self> {
        Self::from_yaml_with_options(spec, yaml, factory, &ParseOptions::default())
    }

    /// Load a config from a YAML string with options
    pub fn from_yaml_with_options(
        spec: &ConfigSpec,
        yaml: &str,
        factory: Arc<M>,
        options: &ParseOptions,
    ) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|e| Error::parse(e.to_string()))?;
        Self::from_value_with_options(spec, value, factory, options)
    }

    /// Load a config from a JSON string
    pub fn from_json(spec: &ConfigSpec, json: &str, factory: Arc<M>) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| Error::parse(e.to_string()))?;
        Ok(Self::from_value(spec, value, factory))
    }

    /// Load a config from a YAML or JSON file, chosen by extension
    pub fn from_file(
        spec: &ConfigSpec,
        path: impl AsRef<Path>,
        factory: Arc<M>,
        options: &ParseOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read file '{}': {}", path.display(), e))
        })?;

        let value: Value = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                serde_json::from_str::<Value>(&content).map_err(|e| Error::parse(e.to_string()))
            }
            _ => serde_yaml::from_str::<Value>(&content).map_err(|e| Error::parse(e.to_string())),
        }
        .map_err(|e| e.with_path(path.display().to_string()))?;

        log::debug!("Loaded config from '{}'", path.display());
        Self::from_value_with_options(spec, value, factory, options)
    }

    /// Resolve the field at `path`, relative to the namespace
    ///
    /// Mapping and sequence fields are walked by key and index. Once a raw
    /// document node is reached, the remaining segments are looked up inside
    /// the node and the result is returned as a new node.
    pub fn field<S: AsRef<str>>(&self, path: &[S]) -> Option<Cow<'_, Field>> {
        let full: Vec<&str> = self
            .prefix
            .iter()
            .map(String::as_str)
            .chain(path.iter().map(|s| s.as_ref()))
            .collect();

        let mut current: &Field = &self.root;
        for (i, segment) in full.iter().enumerate() {
            current = match current {
                Field::Mapping(map) => map.get(*segment)?,
                Field::Sequence(seq) => seq.get(segment.parse::<usize>().ok()?)?,
                Field::Node(node) => {
                    let nested = value::lookup(node, &full[i..])?;
                    return Some(Cow::Owned(Field::Node(nested.clone())));
                }
                Field::Typed(_) => return None,
            };
        }
        Some(Cow::Borrowed(current))
    }

    /// Check whether a field exists at `path`
    pub fn contains<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.field(path).is_some()
    }

    /// A view of this config rooted at `path`
    ///
    /// Lookups through the view are relative to `path`, and components built
    /// from it are scoped under `path`.
    pub fn namespace<S: AsRef<str>>(&self, path: &[S]) -> Self {
        let mut prefix = self.prefix.clone();
        prefix.extend(path.iter().map(|s| s.as_ref().to_string()));
        Self {
            root: Arc::clone(&self.root),
            prefix,
            scope: self.scope.into_path(path),
        }
    }

    /// The factory scope at this config's namespace
    pub fn scope(&self) -> &Scope<M> {
        &self.scope
    }
}
