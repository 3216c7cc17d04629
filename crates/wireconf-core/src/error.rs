//! Error types for wireconf
//!
//! Errors are structured: a kind, the config path they relate to, an optional
//! help message and, for wrapped failures, the underlying cause. Collection
//! accessors wrap element failures with the element's index or key.

use std::fmt;
use std::sync::Arc;

/// Result type alias for wireconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by component factories
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for wireconf operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Path in the config where the error occurred (e.g., "input.broker")
    pub path: Option<String>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause message, for errors that don't wrap another error
    pub cause: Option<String>,
    /// Wrapped lower-level error
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

/// Position of an element within a list or map field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    Index(usize),
    Key(String),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Index(i) => write!(f, "{}", i),
            Position::Key(k) => write!(f, "{}", k),
        }
    }
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Error parsing a YAML/JSON document
    Parse,
    /// The requested field does not exist in the parsed config
    FieldNotFound,
    /// The field exists but has the wrong structure for the accessor
    UnexpectedShape { expected: String, got: String },
    /// A value could not be decoded into a component config
    Decode { at: Option<Position> },
    /// The factory failed to build a component
    Instantiation { at: Option<Position> },
    /// No constructor is registered for a component type
    UnknownComponent { kind: String, name: String },
    /// A constructor with the same name is already registered
    AlreadyRegistered { kind: String, name: String },
    /// The document does not match the declared fields
    Validation,
    /// A config file could not be read
    Io,
}

impl Error {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            help: None,
            cause: None,
            source: None,
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Parse)
        }
    }

    /// Create an I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Io)
        }
    }

    /// Create a field not found error for a path given as segments
    pub fn field_not_found<S: AsRef<str>>(segments: &[S]) -> Self {
        Self {
            path: Some(join_path(segments)),
            ..Self::new(ErrorKind::FieldNotFound)
        }
    }

    /// Create an unexpected shape error
    pub fn unexpected_shape(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnexpectedShape {
            expected: expected.into(),
            got: got.into(),
        })
    }

    /// Create a decode error from a deserializer message
    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Decode { at: None })
        }
    }

    /// Wrap an element's decode failure with its position
    pub fn decode_at(at: Position, source: Error) -> Self {
        Self {
            source: Some(Arc::new(source)),
            ..Self::new(ErrorKind::Decode { at: Some(at) })
        }
    }

    /// Convert a factory failure into an error
    ///
    /// Errors that already are wireconf errors (for example from a component
    /// that resolves its own nested fields) are returned unchanged.
    pub fn instantiation(source: BoxError) -> Self {
        match source.downcast::<Error>() {
            Ok(err) => *err,
            Err(source) => Self {
                source: Some(Arc::from(source)),
                ..Self::new(ErrorKind::Instantiation { at: None })
            },
        }
    }

    /// Wrap an element's instantiation failure with its position
    pub fn instantiation_at(at: Position, source: Error) -> Self {
        Self {
            source: Some(Arc::new(source)),
            ..Self::new(ErrorKind::Instantiation { at: Some(at) })
        }
    }

    /// Create an unknown component error
    pub fn unknown_component(kind: impl Into<String>, name: impl Into<String>) -> Self {
        let kind = kind.into();
        let name = name.into();
        Self {
            help: Some(format!(
                "Register a {} constructor named '{}' or check for typos",
                kind, name
            )),
            ..Self::new(ErrorKind::UnknownComponent { kind, name })
        }
    }

    /// Create a constructor already registered error
    pub fn already_registered(kind: impl Into<String>, name: impl Into<String>) -> Self {
        let kind = kind.into();
        let name = name.into();
        Self {
            help: Some(format!(
                "Use register_with_force(..., true) to override the '{}' {}",
                name, kind
            )),
            ..Self::new(ErrorKind::AlreadyRegistered { kind, name })
        }
    }

    /// Create a validation error
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        let p = path.into();
        Self {
            path: if p.is_empty() || p == "<root>" {
                None
            } else {
                Some(p)
            },
            help: Some("Fix the value to match the declared fields".into()),
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Validation)
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Returns the position annotation of a collection element error
    pub fn position(&self) -> Option<&Position> {
        match &self.kind {
            ErrorKind::Decode { at } | ErrorKind::Instantiation { at } => at.as_ref(),
            _ => None,
        }
    }

    /// Writes the single-line message, including wrapped causes
    fn write_message(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Parse => write!(f, "parse error")?,
            ErrorKind::FieldNotFound => write!(
                f,
                "field '{}' was not found in the config",
                self.path.as_deref().unwrap_or_default()
            )?,
            ErrorKind::UnexpectedShape { expected, got } => {
                write!(f, "unexpected value, expected {}, got {}", expected, got)?
            }
            ErrorKind::Decode { at: Some(at) } => write!(f, "value {}", at)?,
            ErrorKind::Instantiation { at: Some(at) } => write!(f, "input {}", at)?,
            ErrorKind::Decode { at: None } => write!(f, "failed to decode config")?,
            ErrorKind::Instantiation { at: None } => {}
            ErrorKind::UnknownComponent { kind, name } => {
                write!(f, "{} type '{}' was not recognised", kind, name)?
            }
            ErrorKind::AlreadyRegistered { kind, name } => {
                write!(f, "{} '{}' is already registered", kind, name)?
            }
            ErrorKind::Validation => write!(f, "validation error")?,
            ErrorKind::Io => write!(f, "I/O error")?,
        }

        let headline_empty = matches!(self.kind, ErrorKind::Instantiation { at: None });
        let sep = if headline_empty { "" } else { ": " };
        if let Some(source) = &self.source {
            match source.downcast_ref::<Error>() {
                Some(inner) => {
                    f.write_str(sep)?;
                    inner.write_message(f)?;
                }
                None => write!(f, "{}{}", sep, source)?,
            }
        } else if let Some(cause) = &self.cause {
            write!(f, "{}{}", sep, cause)?;
        }
        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_message(f)?;

        // Path context, unless the message already names it
        if let Some(path) = &self.path {
            if self.kind != ErrorKind::FieldNotFound {
                write!(f, "\n  Path: {}", path)?;
            }
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Join path segments with '.'
pub(crate) fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join(".")
}
