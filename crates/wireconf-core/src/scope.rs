//! Path-scoped component construction
//!
//! A [`Scope`] pairs a component factory with the config path components are
//! being built at. Scopes are immutable: narrowing one returns a new scope,
//! so list elements and map entries each get their own stable child path.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{BoxError, Error, Result};

/// A family of runtime components built from one kind of config
///
/// Implemented by a marker type per component family (inputs, outputs,
/// processors, ...). Accessors are generic over this trait so the same
/// resolution rules apply to every family.
pub trait ComponentKind: 'static {
    /// Name of the family, used in logs and errors (e.g. "input")
    const NAME: &'static str;

    /// Decoded configuration of one component
    type Config: DeserializeOwned + Clone + Send + Sync + 'static;

    /// The runtime component built from a config
    type Component;

    /// The implementation label of a config, used by [`crate::Registry`]
    /// to pick a constructor
    fn type_label(conf: &Self::Config) -> &str;

    /// JSON Schema describing one config, used when rendering field schemas
    fn schema() -> serde_json::Value {
        serde_json::json!({ "type": "object" })
    }
}

/// Builds components of kind `K` at a given config path
pub trait Factory<K: ComponentKind> {
    /// Build one component from a decoded config
    fn build(
        &self,
        path: &ComponentPath,
        conf: K::Config,
    ) -> std::result::Result<K::Component, BoxError>;
}

/// Immutable config path of a component (e.g. `input.broker.inputs.0`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ComponentPath {
    segments: Arc<[String]>,
}

impl ComponentPath {
    /// The empty root path
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path with `segments` appended
    pub fn join<S: AsRef<str>>(&self, segments: &[S]) -> Self {
        if segments.is_empty() {
            return self.clone();
        }
        let joined: Vec<String> = self
            .segments
            .iter()
            .cloned()
            .chain(segments.iter().map(|s| s.as_ref().to_string()))
            .collect();
        Self {
            segments: joined.into(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// A factory narrowed to a config path
pub struct Scope<M: ?Sized> {
    factory: Arc<M>,
    path: ComponentPath,
}

impl<M: ?Sized> Clone for Scope<M> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            path: self.path.clone(),
        }
    }
}

impl<M: ?Sized> Scope<M> {
    /// Create a scope at the root path
    pub fn new(factory: Arc<M>) -> Self {
        Self {
            factory,
            path: ComponentPath::root(),
        }
    }

    /// Derive a child scope for a sub-path
    pub fn into_path<S: AsRef<str>>(&self, segments: &[S]) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            path: self.path.join(segments),
        }
    }

    pub fn path(&self) -> &ComponentPath {
        &self.path
    }

    pub fn factory(&self) -> &Arc<M> {
        &self.factory
    }

    /// Build one component of kind `K` at this scope's path
    pub fn instantiate<K>(&self, conf: K::Config) -> Result<Owned<K>>
    where
        K: ComponentKind,
        M: Factory<K>,
    {
        log::debug!("Instantiating {} at '{}'", K::NAME, self.path);
        <M as Factory<K>>::build(&self.factory, &self.path, conf)
            .map(Owned::new)
            .map_err(Error::instantiation)
    }
}

impl<M: ?Sized> fmt::Debug for Scope<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").field("path", &self.path).finish()
    }
}

/// A runtime component exclusively owned by the caller
///
/// Starting and stopping the component is the caller's responsibility.
pub struct Owned<K: ComponentKind> {
    component: K::Component,
}

impl<K: ComponentKind> Owned<K> {
    pub fn new(component: K::Component) -> Self {
        Self { component }
    }

    pub fn into_inner(self) -> K::Component {
        self.component
    }
}

impl<K: ComponentKind> Deref for Owned<K> {
    type Target = K::Component;

    fn deref(&self) -> &Self::Target {
        &self.component
    }
}

impl<K: ComponentKind> fmt::Debug for Owned<K>
where
    K::Component: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Owned").field(&self.component).finish()
    }
}
