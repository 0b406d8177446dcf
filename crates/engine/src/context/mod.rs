//! Query and schema contexts.
//!
//! The two environments hold everything that outlives a single resolver
//! call: [`SchemaEnv`] is built once per schema, [`QueryEnv`] once per
//! request. The context structs borrow both and carry the position-specific
//! state (current type, current field, response path).

use std::{
    ops::Deref,
    sync::{Arc, Mutex},
};

use async_graphql_parser::{
    types::{Field, OperationDefinition, SelectionSet},
    Positioned,
};
use async_graphql_value::{ConstValue, Name, Variables};
use indexmap::IndexMap;
use query_path::QueryPath;
use tokio_util::sync::CancellationToken;

mod data;

pub use data::Data;

use crate::{
    collect::FragmentIndex,
    middleware::{DirectiveMiddleware, FieldMiddleware},
    registry::{MetaField, MetaType, Registry},
    Error, ErrorHandler, ExecutionOptions, ServerError, ServerResult,
};

pub struct SchemaEnvInner {
    pub registry: Registry,
    pub data: Data,
    pub middlewares: Vec<Box<dyn FieldMiddleware>>,
    pub directive_middlewares: std::collections::HashMap<String, Box<dyn DirectiveMiddleware>>,
    pub error_handler: Box<dyn ErrorHandler>,
    pub options: ExecutionOptions,
    /// The `__schema` projection, built once when the schema is finished.
    pub introspection: serde_json::Value,
}

/// The shared, immutable side of a schema.
#[derive(Clone)]
pub struct SchemaEnv(pub(crate) Arc<SchemaEnvInner>);

impl Deref for SchemaEnv {
    type Target = SchemaEnvInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct QueryEnvInner {
    pub operation: Positioned<OperationDefinition>,
    pub fragments: FragmentIndex,
    /// Variables after coercion against the operation's definitions.
    pub variables: Variables,
    pub errors: Mutex<Vec<ServerError>>,
    /// The parent value the root resolvers see.
    pub root_value: crate::registry::resolvers::ResolvedValue,
    /// Cancelled when the caller gives up on the request.
    pub request_aborted: CancellationToken,
    pub session_data: Arc<Data>,
}

/// The per-request environment, shared by every resolver of the request.
#[derive(Clone)]
pub struct QueryEnv(pub(crate) Arc<QueryEnvInner>);

impl Deref for QueryEnv {
    type Target = QueryEnvInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl QueryEnv {
    pub fn new(inner: QueryEnvInner) -> Self {
        Self(Arc::new(inner))
    }
}

/// Context for resolving a selection set against one composite type.
#[derive(Clone)]
pub struct ContextSelectionSet<'a> {
    pub schema_env: &'a SchemaEnv,
    pub query_env: &'a QueryEnv,
    pub path: QueryPath,
    /// The composite type the selections apply to.
    pub ty: &'a MetaType,
    /// All selection sets merged under this path. More than one when the
    /// same composite field was selected repeatedly.
    pub selection_sets: Vec<&'a Positioned<SelectionSet>>,
}

impl<'a> ContextSelectionSet<'a> {
    pub fn add_error(&self, error: ServerError) {
        add_error(self.schema_env, self.query_env, error);
    }

    pub fn check_aborted(&self) -> ServerResult<()> {
        check_aborted(self.query_env)
    }
}

/// Context for resolving one field.
pub struct ContextField<'a> {
    pub schema_env: &'a SchemaEnv,
    pub query_env: &'a QueryEnv,
    /// Response path of this field, aliases applied.
    pub path: QueryPath,
    pub parent_type: &'a MetaType,
    pub field: &'a MetaField,
    /// The primary field node in the document.
    pub item: &'a Positioned<Field>,
    /// Arguments after coercion against the field definition.
    pub arguments: IndexMap<Name, ConstValue>,
    /// State stashed by middleware for the resolver, scoped to this field.
    pub local_state: Mutex<Data>,
}

impl<'a> ContextField<'a> {
    pub fn response_key(&self) -> &'a str {
        self.item.node.response_key().node.as_str()
    }

    pub fn get_argument(&self, name: &str) -> Option<&ConstValue> {
        self.arguments.get(name)
    }

    /// Fetch host data of type `D`, request-scoped data first.
    pub fn data<D: std::any::Any + Send + Sync>(&self) -> Result<&D, Error> {
        self.data_opt::<D>().ok_or_else(|| {
            Error::unexpected(format!(
                "Data `{}` does not exist",
                std::any::type_name::<D>()
            ))
        })
    }

    pub fn data_opt<D: std::any::Any + Send + Sync>(&self) -> Option<&D> {
        self.query_env
            .session_data
            .get::<D>()
            .or_else(|| self.schema_env.data.get::<D>())
    }

    /// Stash a value for a later step of this field's chain.
    pub fn set_local_state<D: std::any::Any + Send + Sync>(&self, data: D) {
        self.local_state
            .lock()
            .expect("another thread panicked while holding local state")
            .insert(data);
    }

    pub fn get_local_state<D: std::any::Any + Send + Sync + Clone>(&self) -> Option<D> {
        self.local_state
            .lock()
            .expect("another thread panicked while holding local state")
            .get::<D>()
            .cloned()
    }

    pub fn remove_local_state<D: std::any::Any + Send + Sync>(&self) -> Option<D> {
        self.local_state
            .lock()
            .expect("another thread panicked while holding local state")
            .remove::<D>()
    }

    pub fn add_error(&self, error: ServerError) {
        add_error(self.schema_env, self.query_env, error);
    }

    pub fn check_aborted(&self) -> ServerResult<()> {
        check_aborted(self.query_env)
    }
}

fn add_error(schema_env: &SchemaEnv, query_env: &QueryEnv, error: ServerError) {
    let error = schema_env.error_handler.on_error(error);
    query_env
        .errors
        .lock()
        .expect("another thread panicked while recording an error")
        .push(error);
}

fn check_aborted(query_env: &QueryEnv) -> ServerResult<()> {
    if query_env.request_aborted.is_cancelled() {
        return Err(ServerError::new("Execution aborted", None));
    }
    Ok(())
}
