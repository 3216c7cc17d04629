//! wireconf-core: Typed component fields for configuration documents
//!
//! This crate turns component fields of a parsed configuration document
//! (a single component, a list of components, or a map of components)
//! into runtime components built by a path-scoped factory.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde::Deserialize;
//! use wireconf_core::{ComponentKind, ConfigSpec, FieldSpec, ParsedConfig, Registry};
//!
//! #[derive(Clone, Deserialize)]
//! struct OutputConfig {
//!     #[serde(rename = "type")]
//!     kind: String,
//!     #[serde(default)]
//!     path: String,
//! }
//!
//! enum Output {}
//!
//! impl ComponentKind for Output {
//!     const NAME: &'static str = "output";
//!     type Config = OutputConfig;
//!     type Component = String;
//!
//!     fn type_label(conf: &OutputConfig) -> &str {
//!         &conf.kind
//!     }
//! }
//!
//! let mut outputs = Registry::<Output>::new();
//! outputs.register_fn("file", |_path, conf: OutputConfig| Ok(format!("file:{}", conf.path)));
//!
//! let spec = ConfigSpec::new().field(FieldSpec::component::<Output>("output"));
//! let yaml = r#"
//! output:
//!   type: file
//!   path: /tmp/out.log
//! "#;
//!
//! let config = ParsedConfig::from_yaml(&spec, yaml, Arc::new(outputs)).unwrap();
//! let output = config.field_component::<Output>(&["output"]).unwrap();
//! assert_eq!(*output, "file:/tmp/out.log");
//! ```

pub mod error;
pub mod field;
pub mod registry;
pub mod schema;
pub mod scope;
pub mod spec;
pub mod value;

mod accessor;
mod config;

pub use config::{ParseOptions, ParsedConfig};
pub use error::{BoxError, Error, ErrorKind, Position, Result};
pub use field::{Field, TypedConfig};
pub use registry::{Constructor, FnConstructor, Registry};
pub use schema::Schema;
pub use scope::{ComponentKind, ComponentPath, Factory, Owned, Scope};
pub use spec::{ConfigSpec, FieldShape, FieldSpec};
pub use value::Value;
