//! Component field accessors
//!
//! Each accessor resolves a field, decodes it into component config(s) and
//! builds the component(s) through a scope narrowed to the field's path.
//! Collection accessors are fail-fast: the first element that fails to
//! decode or build aborts the call, and no partial collection is returned.
//! All elements are decoded before any component is built, so a malformed
//! element never leaves freshly built siblings behind.
//!
//! ```rust
//! use std::sync::Arc;
//! use serde::Deserialize;
//! use wireconf_core::{ComponentKind, ConfigSpec, FieldSpec, ParsedConfig, Registry};
//!
//! #[derive(Clone, Deserialize)]
//! struct InputConfig {
//!     #[serde(rename = "type")]
//!     kind: String,
//! }
//!
//! enum Input {}
//!
//! impl ComponentKind for Input {
//!     const NAME: &'static str = "input";
//!     type Config = InputConfig;
//!     type Component = String;
//!
//!     fn type_label(conf: &InputConfig) -> &str {
//!         &conf.kind
//!     }
//! }
//!
//! let mut inputs = Registry::<Input>::new();
//! inputs.register_fn("stdin", |path, _conf| Ok(format!("stdin at {}", path)));
//!
//! let spec = ConfigSpec::new().field(FieldSpec::component_list::<Input>("inputs"));
//! let config = ParsedConfig::from_yaml(&spec, "inputs: [{ type: stdin }]", Arc::new(inputs)).unwrap();
//!
//! let built = config.field_component_list::<Input>(&["inputs"]).unwrap();
//! assert_eq!(*built[0], "stdin at inputs.0");
//! ```

use std::borrow::Cow;

use indexmap::IndexMap;

use crate::config::ParsedConfig;
use crate::error::{Error, Position, Result};
use crate::field::{decode, Field};
use crate::scope::{ComponentKind, Factory, Owned};
use crate::value::{string_keyed, Value};

impl<M: ?Sized> ParsedConfig<M> {
    fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Result<Cow<'_, Field>> {
        self.field(path).ok_or_else(|| Error::field_not_found(path))
    }

    /// Build the single component declared at `path`
    ///
    /// Factory failures are returned as-is, without positional context.
    pub fn field_component<K>(&self, path: &[impl AsRef<str>]) -> Result<Owned<K>>
    where
        K: ComponentKind,
        M: Factory<K>,
    {
        let field = self.resolve(path)?;
        let conf = decode::<K>(&field)?;
        self.scope().into_path(path).instantiate::<K>(conf)
    }

    /// Build every component of the list declared at `path`, in order
    pub fn field_component_list<K>(&self, path: &[impl AsRef<str>]) -> Result<Vec<Owned<K>>>
    where
        K: ComponentKind,
        M: Factory<K>,
    {
        let field = self.resolve(path)?;
        let configs = match &*field {
            Field::Sequence(items) => {
                decode_all::<K, _, _>(items.iter().map(Cow::Borrowed).enumerate())?
            }
            Field::Node(Value::Sequence(items)) => decode_all::<K, _, _>(
                items
                    .iter()
                    .map(|v| Cow::Owned(Field::Node(v.clone())))
                    .enumerate(),
            )?,
            other => return Err(Error::unexpected_shape("array", other.kind_name())),
        };

        let scope = self.scope().into_path(path);
        configs
            .into_iter()
            .map(|(i, conf)| {
                scope
                    .into_path(&[i.to_string()])
                    .instantiate::<K>(conf)
                    .map_err(|e| Error::instantiation_at(Position::Index(i), e))
            })
            .collect()
    }

    /// Build every component of the map declared at `path`, keyed as in the
    /// document
    pub fn field_component_map<K>(
        &self,
        path: &[impl AsRef<str>],
    ) -> Result<IndexMap<String, Owned<K>>>
    where
        K: ComponentKind,
        M: Factory<K>,
    {
        let field = self.resolve(path)?;
        let configs = match &*field {
            Field::Mapping(entries) => decode_all::<K, _, _>(
                entries
                    .iter()
                    .map(|(k, v)| (k.as_str(), Cow::Borrowed(v))),
            )?,
            Field::Node(Value::Mapping(entries)) => {
                let entries = string_keyed(entries.clone())
                    .map_err(|_| Error::decode("map keys must be scalars"))?;
                decode_all::<K, _, _>(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k, Cow::Owned(Field::Node(v)))),
                )?
            }
            other => return Err(Error::unexpected_shape("object", other.kind_name())),
        };

        let scope = self.scope().into_path(path);
        configs
            .into_iter()
            .map(|(key, conf)| {
                let built = scope
                    .into_path(&[key.as_str()])
                    .instantiate::<K>(conf)
                    .map_err(|e| Error::instantiation_at(Position::Key(key.clone()), e))?;
                Ok((key, built))
            })
            .collect()
    }
}

/// A position within a collection field
trait ElementPosition {
    type Owned;

    fn position(&self) -> Position;
    fn into_owned(self) -> Self::Owned;
}

impl ElementPosition for usize {
    type Owned = usize;

    fn position(&self) -> Position {
        Position::Index(*self)
    }

    fn into_owned(self) -> usize {
        self
    }
}

impl ElementPosition for &str {
    type Owned = String;

    fn position(&self) -> Position {
        Position::Key(self.to_string())
    }

    fn into_owned(self) -> String {
        self.to_string()
    }
}

impl ElementPosition for String {
    type Owned = String;

    fn position(&self) -> Position {
        Position::Key(self.clone())
    }

    fn into_owned(self) -> String {
        self
    }
}

/// Decode every element, stopping at the first failure
fn decode_all<'a, K, P, I>(elements: I) -> Result<Vec<(P::Owned, K::Config)>>
where
    K: ComponentKind,
    P: ElementPosition,
    I: IntoIterator<Item = (P, Cow<'a, Field>)>,
{
    elements
        .into_iter()
        .map(|(at, field)| {
            let conf = decode::<K>(&field).map_err(|e| Error::decode_at(at.position(), e))?;
            Ok((at.into_owned(), conf))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BoxError, ErrorKind};
    use crate::scope::ComponentPath;
    use crate::spec::{ConfigSpec, FieldSpec};
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use std::error::Error as _;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct InputConfig {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        address: Option<String>,
    }

    #[derive(Debug)]
    struct TestInput {
        path: String,
        conf: InputConfig,
    }

    enum Input {}

    impl ComponentKind for Input {
        const NAME: &'static str = "input";
        type Config = InputConfig;
        type Component = TestInput;

        fn type_label(conf: &InputConfig) -> &str {
            &conf.kind
        }
    }

    /// Records every build request and refuses configs of type "broken"
    #[derive(Default)]
    struct Manager {
        built: Mutex<Vec<String>>,
    }

    impl Manager {
        fn built(&self) -> Vec<String> {
            self.built.lock().unwrap().clone()
        }
    }

    impl Factory<Input> for Manager {
        fn build(
            &self,
            path: &ComponentPath,
            conf: InputConfig,
        ) -> std::result::Result<TestInput, BoxError> {
            self.built.lock().unwrap().push(path.to_string());
            match conf.kind.as_str() {
                "broken" => Err("failed to connect".into()),
                "nested" => Err(Box::new(Error::field_not_found(&["inputs"]))),
                _ => Ok(TestInput {
                    path: path.to_string(),
                    conf,
                }),
            }
        }
    }

    fn spec() -> ConfigSpec {
        ConfigSpec::new()
            .field(FieldSpec::component::<Input>("input"))
            .field(FieldSpec::component_list::<Input>("inputs"))
            .field(FieldSpec::component_map::<Input>("named"))
            .field(FieldSpec::object(
                "broker",
                vec![FieldSpec::component_list::<Input>("inputs")],
            ))
    }

    fn parse(yaml: &str) -> (ParsedConfig<Manager>, Arc<Manager>) {
        let manager = Arc::new(Manager::default());
        let config = ParsedConfig::from_yaml(&spec(), yaml, Arc::clone(&manager)).unwrap();
        (config, manager)
    }

    fn input(kind: &str) -> InputConfig {
        InputConfig {
            kind: kind.into(),
            address: None,
        }
    }

    #[test]
    fn test_scalar_field() {
        let (config, manager) = parse("input:\n  type: kafka\n  address: localhost:9092\n");

        let built = config.field_component::<Input>(&["input"]).unwrap();

        assert_eq!(built.path, "input");
        assert_eq!(built.conf.address.as_deref(), Some("localhost:9092"));
        assert_eq!(manager.built(), vec!["input".to_string()]);
    }

    #[test]
    fn test_scalar_field_not_found() {
        let (config, manager) = parse("input: { type: stdin }");

        let err = config.field_component::<Input>(&["foo"]).unwrap_err();

        assert_eq!(err.kind, ErrorKind::FieldNotFound);
        assert_eq!(err.to_string(), "field 'foo' was not found in the config");
        assert!(manager.built().is_empty());
    }

    #[test]
    fn test_not_found_joins_path() {
        let (config, _) = parse("broker: {}");

        let err = config
            .field_component_list::<Input>(&["broker", "inputs"])
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("field 'broker.inputs' was not found in the config"));
    }

    #[test]
    fn test_scalar_decode_error() {
        let (config, manager) = parse("input: { address: nowhere }");

        let err = config.field_component::<Input>(&["input"]).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Decode { at: None });
        assert!(manager.built().is_empty());
    }

    #[test]
    fn test_scalar_instantiation_error_is_unwrapped() {
        let (config, _) = parse("input: { type: broken }");

        let err = config.field_component::<Input>(&["input"]).unwrap_err();

        assert_eq!(err.to_string(), "failed to connect");
        assert_eq!(err.kind, ErrorKind::Instantiation { at: None });
    }

    #[test]
    fn test_nested_field_errors_pass_through() {
        let (config, _) = parse("input: { type: nested }");

        let err = config.field_component::<Input>(&["input"]).unwrap_err();

        assert_eq!(err.kind, ErrorKind::FieldNotFound);
        assert_eq!(err.path, Some("inputs".into()));
    }

    #[test]
    fn test_each_call_builds_fresh_component() {
        let (config, manager) = parse("input: { type: stdin }");

        let first = config.field_component::<Input>(&["input"]).unwrap();
        let second = config.field_component::<Input>(&["input"]).unwrap();

        assert_eq!(first.conf, second.conf);
        assert_eq!(manager.built().len(), 2);
    }

    #[test]
    fn test_list_field() {
        let (config, manager) =
            parse("inputs: [{ type: a }, { type: b }, { type: c }]");

        let built = config.field_component_list::<Input>(&["inputs"]).unwrap();

        let kinds: Vec<&str> = built.iter().map(|i| i.conf.kind.as_str()).collect();
        assert_eq!(kinds, vec!["a", "b", "c"]);
        assert_eq!(
            manager.built(),
            vec!["inputs.0", "inputs.1", "inputs.2"]
        );
    }

    #[test]
    fn test_empty_list_field() {
        let (config, manager) = parse("inputs: []");

        let built = config.field_component_list::<Input>(&["inputs"]).unwrap();

        assert!(built.is_empty());
        assert!(manager.built().is_empty());
    }

    #[test]
    fn test_list_field_wrong_shape() {
        let (config, _) = parse("bar: x
inputs: { type: a }");

        let err = config.field_component_list::<Input>(&["bar"]).unwrap_err();
        assert_eq!(err.to_string(), "unexpected value, expected array, got string");
        assert_eq!(
            err.kind,
            ErrorKind::UnexpectedShape {
                expected: "array".into(),
                got: "string".into()
            }
        );

        let err = config.field_component_list::<Input>(&["inputs"]).unwrap_err();
        assert_eq!(err.to_string(), "unexpected value, expected array, got object");
    }

    #[test]
    fn test_list_decode_error_is_fail_fast() {
        let (config, manager) = parse("inputs: [{ type: a }, { address: x }, { type: c }]");

        let err = config.field_component_list::<Input>(&["inputs"]).unwrap_err();

        assert!(err.to_string().starts_with("value 1: "));
        assert!(!err.to_string().contains("value 0:"));
        assert!(!err.to_string().contains("value 2:"));
        assert_eq!(err.position(), Some(&Position::Index(1)));
        assert!(err.source().is_some());
        assert!(manager.built().is_empty());
    }

    #[test]
    fn test_list_element_wrong_shape() {
        let (config, _) = parse("inputs: [{ type: a }, [1, 2]]");

        let err = config.field_component_list::<Input>(&["inputs"]).unwrap_err();
        assert!(err.to_string().starts_with("value 1: "));
    }

    #[test]
    fn test_list_instantiation_error() {
        let (config, manager) =
            parse("inputs: [{ type: a }, { type: broken }, { type: c }]");

        let err = config.field_component_list::<Input>(&["inputs"]).unwrap_err();

        assert_eq!(err.to_string(), "input 1: failed to connect");
        assert_eq!(err.kind, ErrorKind::Instantiation { at: Some(Position::Index(1)) });
        assert_eq!(manager.built(), vec!["inputs.0", "inputs.1"]);
    }

    #[test]
    fn test_list_from_undeclared_field() {
        let (config, manager) = parse("extra: [{ type: a }]");

        let built = config.field_component_list::<Input>(&["extra"]).unwrap();

        assert_eq!(built.len(), 1);
        assert_eq!(manager.built(), vec!["extra.0"]);
    }

    #[test]
    fn test_list_in_object_field() {
        let (config, manager) = parse("broker:\n  inputs:\n    - type: a\n    - type: b\n");

        let built = config
            .field_component_list::<Input>(&["broker", "inputs"])
            .unwrap();

        assert_eq!(built.len(), 2);
        assert_eq!(manager.built(), vec!["broker.inputs.0", "broker.inputs.1"]);
    }

    #[test]
    fn test_map_field() {
        let (config, manager) = parse("named: { foo: { type: a }, bar: { type: b } }");

        let built = config.field_component_map::<Input>(&["named"]).unwrap();

        let keys: Vec<&str> = built.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["foo", "bar"]);
        assert_eq!(built["bar"].conf.kind, "b");
        assert_eq!(built["foo"].path, "named.foo");
        assert_eq!(manager.built(), vec!["named.foo", "named.bar"]);
    }

    #[test]
    fn test_map_field_scalar_keys() {
        let (config, manager) = parse("named: { 1: { type: a }, 2: { type: b } }");

        let built = config.field_component_map::<Input>(&["named"]).unwrap();

        let keys: Vec<&str> = built.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["1", "2"]);
        assert_eq!(built["2"].conf.kind, "b");
        assert_eq!(manager.built(), vec!["named.1", "named.2"]);
    }

    #[test]
    fn test_undeclared_map_with_collection_key() {
        let (config, manager) = parse("extra:\n  ? [1, 2]\n  : { type: a }\n");

        let err = config.field_component_map::<Input>(&["extra"]).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Decode { at: None });
        assert!(manager.built().is_empty());
    }

    #[test]
    fn test_map_field_wrong_shape() {
        let (config, _) = parse("named: [{ type: a }]");

        let err = config.field_component_map::<Input>(&["named"]).unwrap_err();
        assert_eq!(err.to_string(), "unexpected value, expected object, got array");
    }

    #[test]
    fn test_map_decode_error() {
        let (config, manager) = parse("named: { a: { type: ok }, b: { address: x } }");

        let err = config.field_component_map::<Input>(&["named"]).unwrap_err();

        assert!(err.to_string().starts_with("value b: "));
        assert_eq!(err.position(), Some(&Position::Key("b".into())));
        assert!(manager.built().is_empty());
    }

    #[test]
    fn test_map_instantiation_error() {
        let (config, _) = parse("named: { a: { type: ok }, b: { type: broken } }");

        let err = config.field_component_map::<Input>(&["named"]).unwrap_err();
        assert_eq!(err.to_string(), "input b: failed to connect");
    }

    #[test]
    fn test_typed_config_bypasses_decoding() {
        let manager = Arc::new(Manager::default());
        let conf = InputConfig {
            kind: "http_server".into(),
            address: Some("0.0.0.0:4195".into()),
        };
        let mut named = IndexMap::new();
        named.insert("web".to_string(), Field::typed(conf.clone()));
        let mut root = IndexMap::new();
        root.insert("input".to_string(), Field::typed(conf.clone()));
        root.insert(
            "inputs".to_string(),
            Field::Sequence(vec![Field::typed(input("a")), Field::typed(input("b"))]),
        );
        root.insert("named".to_string(), Field::Mapping(named));
        let config = ParsedConfig::from_field(Field::Mapping(root), Arc::clone(&manager));

        let single = config.field_component::<Input>(&["input"]).unwrap();
        assert_eq!(single.conf, conf);

        let list = config.field_component_list::<Input>(&["inputs"]).unwrap();
        assert_eq!(list[1].conf, input("b"));

        let map = config.field_component_map::<Input>(&["named"]).unwrap();
        assert_eq!(map["web"].conf, conf);
        assert_eq!(manager.built(), vec!["input", "inputs.0", "inputs.1", "named.web"]);
    }

    #[test]
    fn test_typed_config_of_wrong_type() {
        let mut root = IndexMap::new();
        root.insert("input".to_string(), Field::typed("not a config"));
        let config = ParsedConfig::from_field(Field::Mapping(root), Arc::new(Manager::default()));

        let err = config.field_component::<Input>(&["input"]).unwrap_err();
        assert_eq!(err.to_string(), "unexpected value, expected object, got &str");
    }

    #[test]
    fn test_namespace_scopes_components() {
        let (config, manager) = parse("broker:\n  inputs: [{ type: a }]\n");
        let broker = config.namespace(&["broker"]);

        let built = broker.field_component_list::<Input>(&["inputs"]).unwrap();
        assert_eq!(built[0].path, "broker.inputs.0");

        let err = broker.field_component::<Input>(&["input"]).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("field 'input' was not found in the config"));
        assert_eq!(manager.built(), vec!["broker.inputs.0"]);
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_configs_and_components_cross_threads() {
        assert_send_sync::<ParsedConfig<Manager>>();
        assert_send_sync::<Owned<Input>>();
        assert_send_sync::<Error>();
    }

    #[test]
    fn test_concurrent_list_access() {
        let (config, manager) = parse("inputs: [{ type: a }, { type: b }]");
        let shared = config.clone();

        let (left, right) = std::thread::scope(|s| {
            let left = s.spawn(|| config.field_component_list::<Input>(&["inputs"]));
            let right = s.spawn(move || shared.field_component_list::<Input>(&["inputs"]));
            (left.join().unwrap(), right.join().unwrap())
        });

        for built in [left.unwrap(), right.unwrap()] {
            let kinds: Vec<&str> = built.iter().map(|i| i.conf.kind.as_str()).collect();
            assert_eq!(kinds, vec!["a", "b"]);
            assert_eq!(built[1].path, "inputs.1");
        }

        let mut paths = manager.built();
        paths.sort();
        assert_eq!(paths, vec!["inputs.0", "inputs.0", "inputs.1", "inputs.1"]);
    }
}
