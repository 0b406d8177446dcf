//! Error types for the execution engine.
//!
//! There are two layers here:
//!
//! - [`Error`] is what resolvers and middleware produce. It is a sum of the
//!   two failure severities we care about: a domain error whose message is
//!   meant for the client, and an unexpected error whose detail is redacted
//!   unless the schema opts into exposing it.
//! - [`ServerError`] is what ends up in the response, with the position in
//!   the query and the path in the response attached.

use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
};

use async_graphql_parser::Pos;
use async_graphql_value::ConstValue;
use query_path::QueryPath;
use serde::{Deserialize, Serialize};

/// An alias for `Result<T, ServerError>`.
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// The severity of a resolver failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    /// A domain error raised deliberately by a resolver or by coercion. The
    /// message is surfaced to the client verbatim.
    #[default]
    Query,
    /// Anything else. The message is replaced with a generic one unless
    /// `include_exception_details` is enabled on the schema.
    Unexpected,
}

/// An error raised while resolving a field.
#[derive(Debug, Clone, Default)]
pub struct Error {
    pub message: String,
    pub kind: ErrorKind,
    /// Extra values attached to the error, surfaced under `extensions`.
    pub extensions: Option<BTreeMap<String, ConstValue>>,
}

impl Error {
    /// Create a domain error. Use this for failures the client should see.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Query,
            extensions: None,
        }
    }

    /// Create an unexpected error. The message is treated as internal detail.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Unexpected,
            extensions: None,
        }
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: ConstValue) -> Self {
        self.extensions
            .get_or_insert_with(Default::default)
            .insert(key.into(), value);
        self
    }

    /// Convert into a [`ServerError`] located at `pos`.
    pub fn into_server_error(self, pos: Pos) -> ServerError {
        ServerError {
            message: self.message,
            locations: vec![pos.into()],
            path: QueryPath::empty(),
            extensions: self.extensions.unwrap_or_default(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::unexpected(err.to_string())
    }
}

/// A line/column position in the query source.
///
/// `async_graphql_parser::Pos` is our internal representation; this type
/// pins down the serialized shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub line: usize,
    pub column: usize,
}

impl From<Pos> for ErrorLocation {
    fn from(pos: Pos) -> Self {
        ErrorLocation {
            line: pos.line,
            column: pos.column,
        }
    }
}

/// An error in the response, as described by the GraphQL spec: a message,
/// source locations, the response path it applies to and free-form
/// extensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ErrorLocation>,
    #[serde(default, skip_serializing_if = "QueryPath::is_empty")]
    pub path: QueryPath,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, ConstValue>,
}

impl ServerError {
    pub fn new(message: impl Into<String>, pos: Option<Pos>) -> Self {
        Self {
            message: message.into(),
            locations: pos.map(|pos| vec![pos.into()]).unwrap_or_default(),
            path: QueryPath::empty(),
            extensions: Default::default(),
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: QueryPath) -> Self {
        self.path = path;
        self
    }
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ServerError {}

impl From<async_graphql_parser::Error> for ServerError {
    fn from(err: async_graphql_parser::Error) -> Self {
        let positions = err.positions();
        ServerError {
            message: err.to_string(),
            locations: positions.into_iter().map(Into::into).collect(),
            path: QueryPath::empty(),
            extensions: Default::default(),
        }
    }
}

/// Post-processes every error before it is added to the response.
///
/// The default implementation is the identity; hosts can install their own
/// handler on the schema to redact, rewrite or annotate errors.
pub trait ErrorHandler: Send + Sync + 'static {
    fn on_error(&self, error: ServerError) -> ServerError {
        error
    }
}

/// The no-op handler installed by default.
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {}

/// An error coercing an input value against its declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputValueError {
    message: String,
}

impl InputValueError {
    pub fn custom(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// An error scoped to a specific expected type.
    pub fn ty_custom(ty: &str, message: impl Display) -> Self {
        Self {
            message: format!("Invalid value for {ty}: {message}"),
        }
    }

    pub fn expected_type(ty: &str, actual: &ConstValue) -> Self {
        Self {
            message: format!("Expected a {ty}, found {actual}"),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prefix the message with the path of the input field it applies to.
    #[must_use]
    pub fn at(self, segment: impl Display) -> Self {
        Self {
            message: format!("{segment}: {}", self.message),
        }
    }
}

impl Display for InputValueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<InputValueError> for Error {
    fn from(err: InputValueError) -> Self {
        Error::new(err.message)
    }
}

/// An alias for the result of input coercion.
pub type InputValueResult<T> = std::result::Result<T, InputValueError>;

/// Errors raised while finalizing a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("No directive named `{0}` is defined in the schema")]
    UnknownDirective(String),
    #[error("The registry has no type named `{0}`")]
    UnknownType(String),
    #[error("Invalid default value for directive argument `{directive}.{argument}`: {message}")]
    InvalidDirectiveArgument {
        directive: String,
        argument: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_serialization() {
        let error = ServerError {
            message: "query error 1".to_string(),
            locations: vec![ErrorLocation { line: 1, column: 3 }],
            path: QueryPath::empty().child("error1"),
            extensions: Default::default(),
        };

        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({
                "message": "query error 1",
                "locations": [{"line": 1, "column": 3}],
                "path": ["error1"],
            })
        );
    }

    #[test]
    fn empty_fields_are_skipped() {
        let error = ServerError::new("boom", None);
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({"message": "boom"})
        );
    }

    #[test]
    fn unexpected_errors_keep_their_kind() {
        let error = Error::unexpected("index out of bounds");
        assert_eq!(error.kind, ErrorKind::Unexpected);
        assert_eq!(Error::new("nope").kind, ErrorKind::Query);
    }
}
