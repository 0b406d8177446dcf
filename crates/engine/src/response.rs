use std::collections::BTreeMap;

use async_graphql_value::ConstValue;
use serde::{Deserialize, Serialize};

use crate::ServerError;

/// The result of executing a request, in the standard response shape.
///
/// `data` is absent entirely when the request failed before execution
/// started (parse, validation or variable errors); it is `null` when
/// execution began but a non-nullable failure reached the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ConstValue>,
    /// Always serialized, empty or not.
    #[serde(default)]
    pub errors: Vec<ServerError>,
    /// Free-form entries the host ships alongside the data.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, ConstValue>,
}

impl Response {
    pub fn new(data: ConstValue) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn from_errors(errors: Vec<ServerError>) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ServerError>) -> Self {
        self.errors = errors;
        self
    }

    #[must_use]
    pub fn extension(mut self, name: impl Into<String>, value: ConstValue) -> Self {
        self.extensions.insert(name.into(), value);
        self
    }

    /// Whether execution produced no errors at all.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The response as a JSON value, the way it would go over the wire.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
