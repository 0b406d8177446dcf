use async_graphql_value::Variables;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::Data;

/// A GraphQL request: the document, the operation to run and its variables.
///
/// Deserializes from the standard HTTP request body shape.
#[derive(Deserialize)]
pub struct Request {
    pub query: String,
    #[serde(default, rename = "operationName")]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Variables,
    /// Request-scoped data made available to resolvers.
    #[serde(skip)]
    pub data: Data,
    /// The parent value handed to the root resolvers. `Null` by default.
    #[serde(skip)]
    pub root_value: serde_json::Value,
    /// Cancelling this token aborts the execution of the request.
    #[serde(skip)]
    pub aborted: CancellationToken,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            operation_name: None,
            variables: Variables::default(),
            data: Data::default(),
            root_value: serde_json::Value::Null,
            aborted: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn data<D: std::any::Any + Send + Sync>(mut self, data: D) -> Self {
        self.data.insert(data);
        self
    }

    #[must_use]
    pub fn root_value(mut self, value: serde_json::Value) -> Self {
        self.root_value = value;
        self
    }

    /// Tie the request to an externally owned cancellation token.
    #[must_use]
    pub fn abort_on(mut self, token: CancellationToken) -> Self {
        self.aborted = token;
        self
    }
}

impl<T: Into<String>> From<T> for Request {
    fn from(query: T) -> Self {
        Self::new(query)
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("query", &self.query)
            .field("operation_name", &self.operation_name)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}
