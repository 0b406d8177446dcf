//! A schema-first GraphQL execution engine.
//!
//! The host describes its schema as a [`Registry`] of types whose fields
//! carry [`registry::resolvers::Resolver`]s, builds a [`Schema`] from it,
//! and executes [`Request`]s against it. The engine owns everything between
//! the parsed document and the response: field collection with fragments
//! and `@skip`/`@include`, argument and variable coercion, the middleware
//! pipeline, parallel and serial scheduling, error isolation with null
//! propagation, introspection and subscriptions.
//!
//! ```ignore
//! let mut registry = Registry::new();
//! registry.insert_type(ObjectType::new(
//!     "Query",
//!     [MetaField::new("hello", "String!").with_resolver(Resolver::custom(|_ctx| {
//!         Box::pin(async { Ok(serde_json::json!("world")) })
//!     }))],
//! ));
//! let schema = Schema::build(registry).finish()?;
//! let response = schema.execute("{ hello }").await;
//! ```

mod arguments;
pub mod collect;
mod context;
mod error;
mod introspection;
mod middleware;
mod options;
pub mod registry;
mod request;
mod resolver_utils;
mod response;
mod schema;
mod strategy;
mod subscription;

pub use async_graphql_parser::{parse_query, Pos, Positioned};
pub use async_graphql_value::{ConstValue, Name, Value, Variables};
pub use query_path::{QueryPath, QueryPathSegment};

pub use context::{ContextField, ContextSelectionSet, Data, QueryEnv, QueryEnvInner, SchemaEnv, SchemaEnvInner};
pub use error::{
    DefaultErrorHandler, Error, ErrorHandler, ErrorKind, ErrorLocation, InputValueError, InputValueResult,
    SchemaError, ServerError, ServerResult,
};
pub use middleware::{DirectiveArguments, DirectiveMiddleware, FieldMiddleware, ResolveNext};
pub use options::{ExecutionOptions, ValidationMode};
pub use registry::Registry;
pub use request::Request;
pub use response::Response;
pub use schema::{Schema, SchemaBuilder};
pub use strategy::ExecutionStrategy;
