//! Component constructor registry
//!
//! A [`Registry`] maps implementation labels (the `type` of a component
//! config) to constructors, and acts as a [`Factory`] by dispatching each
//! config to the constructor registered for its label.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{BoxError, Error, Result};
use crate::scope::{ComponentKind, ComponentPath, Factory};

/// Builds components of kind `K` for one implementation label
pub trait Constructor<K: ComponentKind>: Send + Sync {
    /// Build a component from its decoded config
    fn construct(
        &self,
        path: &ComponentPath,
        conf: K::Config,
    ) -> std::result::Result<K::Component, BoxError>;

    /// Label this constructor is registered under
    fn name(&self) -> &str;
}

/// A simple function-based constructor
pub struct FnConstructor<F> {
    name: String,
    func: F,
}

impl<F> FnConstructor<F> {
    /// Create a new function-based constructor
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<K, F> Constructor<K> for FnConstructor<F>
where
    K: ComponentKind,
    F: Fn(&ComponentPath, K::Config) -> std::result::Result<K::Component, BoxError> + Send + Sync,
{
    fn construct(
        &self,
        path: &ComponentPath,
        conf: K::Config,
    ) -> std::result::Result<K::Component, BoxError> {
        (self.func)(path, conf)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Registry of constructors for one component kind
pub struct Registry<K: ComponentKind> {
    constructors: HashMap<String, Arc<dyn Constructor<K>>>,
}

impl<K: ComponentKind> Clone for Registry<K> {
    fn clone(&self) -> Self {
        Self {
            constructors: self.constructors.clone(),
        }
    }
}

impl<K: ComponentKind> Default for Registry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ComponentKind> Registry<K> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register a constructor, replacing any with the same name
    pub fn register(&mut self, constructor: Arc<dyn Constructor<K>>) {
        self.constructors
            .insert(constructor.name().to_string(), constructor);
    }

    /// Register a constructor with optional force overwrite.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(Error)` if force=false and a constructor with the same name exists
    pub fn register_with_force(
        &mut self,
        constructor: Arc<dyn Constructor<K>>,
        force: bool,
    ) -> Result<()> {
        let name = constructor.name().to_string();
        if self.constructors.contains_key(&name) {
            if !force {
                return Err(Error::already_registered(K::NAME, name));
            }
            log::warn!("Overriding registered {} constructor '{}'", K::NAME, name);
        }
        self.constructors.insert(name, constructor);
        Ok(())
    }

    /// Register a function as a constructor
    pub fn register_fn<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&ComponentPath, K::Config) -> std::result::Result<K::Component, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.register(Arc::new(FnConstructor::new(name, func)));
    }

    /// Get a constructor by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Constructor<K>>> {
        self.constructors.get(name)
    }

    /// Check if a constructor is registered
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<K: ComponentKind> Factory<K> for Registry<K> {
    fn build(
        &self,
        path: &ComponentPath,
        conf: K::Config,
    ) -> std::result::Result<K::Component, BoxError> {
        let label = K::type_label(&conf);
        let constructor = self
            .constructors
            .get(label)
            .ok_or_else(|| Error::unknown_component(K::NAME, label).with_path(path.to_string()))?;
        constructor.construct(path, conf)
    }
}
