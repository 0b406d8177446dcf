//! Schema construction and request execution.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_graphql_parser::{
    parse_query,
    types::{DocumentOperations, OperationType, Type},
};
use async_graphql_value::ConstValue;
use futures_util::stream::BoxStream;
use query_path::QueryPath;
use tracing::Instrument;

use crate::{
    arguments::{coerce_input_value, coerce_variables},
    collect::FragmentIndex,
    context::{QueryEnvInner, SchemaEnvInner},
    introspection,
    middleware::{DirectiveMiddleware, FieldMiddleware},
    registry::{resolvers::ResolvedValue, MetaType, Registry},
    resolver_utils::resolve_container,
    ContextSelectionSet, Data, DefaultErrorHandler, ErrorHandler, ExecutionOptions, ExecutionStrategy, QueryEnv,
    Request, Response, SchemaEnv, SchemaError, ServerError,
};

/// An executable schema: the frozen registry plus everything registered on
/// the builder. Cheap to clone and share.
#[derive(Clone)]
pub struct Schema {
    pub(crate) env: SchemaEnv,
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("query_type", &self.env.registry.query_type)
            .finish_non_exhaustive()
    }
}

impl Schema {
    pub fn build(registry: Registry) -> SchemaBuilder {
        SchemaBuilder {
            registry,
            data: Data::default(),
            middlewares: Vec::new(),
            directive_middlewares: HashMap::new(),
            error_handler: Box::new(DefaultErrorHandler),
            options: ExecutionOptions::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.env.registry
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.env.options
    }

    /// Execute a query or mutation to completion.
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let request = request.into();
        match self.env.options.execution_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.execute_once(request)).await {
                Ok(response) => response,
                Err(_) => Response::from_errors(vec![ServerError::new("Execution timed out", None)]),
            },
            None => self.execute_once(request).await,
        }
    }

    /// Execute a subscription, yielding one response per event.
    ///
    /// Queries and mutations also work here and yield a single response.
    pub fn execute_stream(&self, request: impl Into<Request>) -> BoxStream<'static, Response> {
        crate::subscription::execute_stream(self.clone(), request.into())
    }

    async fn execute_once(&self, request: Request) -> Response {
        let (query_env, operation_type) = match self.prepare_request(request) {
            Ok(prepared) => prepared,
            Err(error) => return Response::from_errors(vec![error]),
        };

        if operation_type == OperationType::Subscription {
            return Response::from_errors(vec![ServerError::new(
                "Subscriptions must be executed with execute_stream",
                None,
            )]);
        }

        self.execute_prepared(query_env, operation_type).await
    }

    pub(crate) async fn execute_prepared(&self, query_env: QueryEnv, operation_type: OperationType) -> Response {
        let span = tracing::info_span!("graphql_execute", operation_type = %operation_type);
        async {
            let Some(root) = self.env.registry.root_type(operation_type) else {
                // prepare_request verified this already
                return Response::from_errors(vec![ServerError::new("Schema has no matching root type", None)]);
            };

            let ctx = ContextSelectionSet {
                schema_env: &self.env,
                query_env: &query_env,
                path: QueryPath::empty(),
                ty: root,
                selection_sets: vec![&query_env.operation.node.selection_set],
            };
            let serial = ExecutionStrategy::for_operation(operation_type, &self.env.options).is_serial();

            let data = match resolve_container(&ctx, &query_env.root_value, serial).await {
                Ok(value) => value,
                Err(error) => {
                    ctx.add_error(error);
                    ConstValue::Null
                }
            };
            let errors = query_env.take_errors();
            tracing::debug!(error_count = errors.len(), "request executed");
            Response::new(data).with_errors(errors)
        }
        .instrument(span)
        .await
    }

    pub(crate) fn prepare_request(&self, request: Request) -> Result<(QueryEnv, OperationType), ServerError> {
        let document = parse_query(&request.query)?;

        let operation = match document.operations {
            DocumentOperations::Single(operation) => operation,
            DocumentOperations::Multiple(mut operations) => match &request.operation_name {
                Some(name) => operations
                    .remove(name.as_str())
                    .ok_or_else(|| ServerError::new(format!("Unknown operation named \"{name}\""), None))?,
                None => {
                    let mut operations = operations.into_iter();
                    match (operations.next(), operations.next()) {
                        (Some((_, operation)), None) => operation,
                        _ => return Err(ServerError::new("Operation name required in request", None)),
                    }
                }
            },
        };
        let operation_type = operation.node.ty;

        if self.env.registry.root_type(operation_type).is_none() {
            let message = match operation_type {
                OperationType::Query => "Schema does not define a query root",
                OperationType::Mutation => "Schema is not configured for mutations",
                OperationType::Subscription => "Schema is not configured for subscriptions",
            };
            return Err(ServerError::new(message, None));
        }

        let fragments: FragmentIndex = document.fragments.into_iter().collect();
        fragments.check(self.env.options.validation_mode)?;

        let variables = coerce_variables(&self.env.registry, &operation.node, &request.variables)?;

        let query_env = QueryEnv::new(QueryEnvInner {
            operation,
            fragments,
            variables,
            errors: Mutex::new(Vec::new()),
            root_value: ResolvedValue::new(request.root_value),
            request_aborted: request.aborted,
            session_data: Arc::new(request.data),
        });
        Ok((query_env, operation_type))
    }
}

impl QueryEnv {
    pub(crate) fn take_errors(&self) -> Vec<ServerError> {
        std::mem::take(
            &mut *self
                .errors
                .lock()
                .expect("another thread panicked while recording an error"),
        )
    }
}

pub struct SchemaBuilder {
    registry: Registry,
    data: Data,
    middlewares: Vec<Box<dyn FieldMiddleware>>,
    directive_middlewares: HashMap<String, Box<dyn DirectiveMiddleware>>,
    error_handler: Box<dyn ErrorHandler>,
    options: ExecutionOptions,
}

impl SchemaBuilder {
    /// Make host data available to every resolver of the schema.
    #[must_use]
    pub fn data<D: std::any::Any + Send + Sync>(mut self, data: D) -> Self {
        self.data.insert(data);
        self
    }

    /// Append schema-wide middleware. Runs in registration order, before
    /// any directive middleware.
    #[must_use]
    pub fn use_middleware(mut self, middleware: impl FieldMiddleware) -> Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    /// Attach middleware to a directive name. The directive must be
    /// registered in the registry.
    #[must_use]
    pub fn directive_middleware(mut self, name: impl Into<String>, middleware: impl DirectiveMiddleware) -> Self {
        self.directive_middlewares.insert(name.into(), Box::new(middleware));
        self
    }

    #[must_use]
    pub fn error_handler(mut self, handler: impl ErrorHandler) -> Self {
        self.error_handler = Box::new(handler);
        self
    }

    #[must_use]
    pub fn options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn disable_introspection(mut self) -> Self {
        self.registry.disable_introspection = true;
        self
    }

    pub fn finish(self) -> Result<Schema, SchemaError> {
        let SchemaBuilder {
            mut registry,
            data,
            middlewares,
            directive_middlewares,
            error_handler,
            options,
        } = self;

        match registry.lookup_type(&registry.query_type) {
            Some(MetaType::Object(_)) => {}
            _ => return Err(SchemaError::UnknownType(registry.query_type.clone())),
        }
        for root in [&registry.mutation_type, &registry.subscription_type].into_iter().flatten() {
            if !matches!(registry.lookup_type(root), Some(MetaType::Object(_))) {
                return Err(SchemaError::UnknownType(root.clone()));
            }
        }

        for name in directive_middlewares.keys() {
            if !registry.directives.contains_key(name) {
                return Err(SchemaError::UnknownDirective(name.clone()));
            }
        }

        check_field_types(&registry)?;
        check_directive_invocations(&registry)?;

        let introspection = if registry.disable_introspection {
            serde_json::Value::Null
        } else {
            introspection::register_introspection_types(&mut registry);
            introspection::build_snapshot(&registry)
        };

        Ok(Schema {
            env: SchemaEnv(Arc::new(SchemaEnvInner {
                registry,
                data,
                middlewares,
                directive_middlewares,
                error_handler,
                options,
                introspection,
            })),
        })
    }
}

/// Every type a field or argument mentions must be registered.
fn check_field_types(registry: &Registry) -> Result<(), SchemaError> {
    for ty in registry.types.values() {
        let Some(fields) = ty.fields() else { continue };
        for field in fields.values() {
            let named = field.ty.named_type();
            if registry.lookup_type(named.as_str()).is_none() {
                return Err(SchemaError::UnknownType(named.as_str().to_string()));
            }
            for arg in field.args.values() {
                let named = arg.ty.named_type();
                if registry.lookup_type(named.as_str()).is_none() {
                    return Err(SchemaError::UnknownType(named.as_str().to_string()));
                }
            }
        }
    }
    Ok(())
}

/// Directives written on field definitions must exist and their literal
/// arguments must coerce against the declared argument types.
fn check_directive_invocations(registry: &Registry) -> Result<(), SchemaError> {
    for ty in registry.types.values() {
        let Some(fields) = ty.fields() else { continue };
        for field in fields.values() {
            for invocation in &field.directives {
                let Some(directive) = registry.directives.get(&invocation.name) else {
                    return Err(SchemaError::UnknownDirective(invocation.name.clone()));
                };
                for (arg_name, value) in &invocation.arguments {
                    let invalid = |message: String| SchemaError::InvalidDirectiveArgument {
                        directive: invocation.name.clone(),
                        argument: arg_name.as_str().to_string(),
                        message,
                    };
                    let Some(arg_def) = directive.args.get(arg_name.as_str()) else {
                        return Err(invalid("no such argument".to_string()));
                    };
                    let arg_type = Type::new(arg_def.ty.as_str())
                        .ok_or_else(|| invalid(format!("malformed type \"{}\"", arg_def.ty)))?;
                    coerce_input_value(registry, &arg_type, value.clone())
                        .map_err(|err| invalid(err.message().to_string()))?;
                }
            }
        }
    }
    Ok(())
}
