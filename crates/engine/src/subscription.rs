//! Subscription execution.
//!
//! A subscription selects exactly one root field whose resolver produces an
//! event stream. Each event is then executed like a one-field query: the
//! event value plays the parent object, the field's middleware chain runs,
//! and the selection set is shaped against the field's type. Every event
//! yields its own [`Response`] with its own errors.

use async_graphql_parser::types::OperationType;
use async_graphql_value::{ConstValue, Name};
use futures_util::{
    stream::{self, BoxStream},
    StreamExt,
};
use query_path::QueryPath;

use crate::{
    arguments::coerce_arguments,
    collect::{collect_fields, FieldSelection},
    registry::{
        resolvers::{ResolvedValue, Resolver, ResolverContext},
        MetaType,
    },
    resolver_utils::resolve_field,
    ContextField, Error, ErrorKind, QueryEnv, Request, Response, Schema, ServerError, ServerResult,
};

pub(crate) fn execute_stream(schema: Schema, request: Request) -> BoxStream<'static, Response> {
    Box::pin(stream::once(async move { create_stream(schema, request).await }).flatten())
}

async fn create_stream(schema: Schema, request: Request) -> BoxStream<'static, Response> {
    let (query_env, operation_type) = match schema.prepare_request(request) {
        Ok(prepared) => prepared,
        Err(error) => return once_response(Response::from_errors(vec![error])),
    };

    if operation_type != OperationType::Subscription {
        let response = schema.execute_prepared(query_env, operation_type).await;
        return once_response(response);
    }

    let events = match subscribe(&schema, &query_env).await {
        Ok(events) => events,
        Err(error) => return once_response(Response::from_errors(vec![error])),
    };

    let aborted = query_env.request_aborted.clone();
    events
        .take_until(aborted.cancelled_owned())
        .then(move |event| {
            let schema = schema.clone();
            let query_env = query_env.clone();
            async move { execute_event(&schema, &query_env, event).await }
        })
        .boxed()
}

fn once_response(response: Response) -> BoxStream<'static, Response> {
    Box::pin(stream::once(std::future::ready(response)))
}

/// Find the single subscribed field and ask its resolver for the event
/// stream.
async fn subscribe(
    schema: &Schema,
    query_env: &QueryEnv,
) -> Result<BoxStream<'static, Result<serde_json::Value, Error>>, ServerError> {
    let registry = &schema.env.registry;
    let Some(root) = registry.root_type(OperationType::Subscription) else {
        return Err(ServerError::new("Schema is not configured for subscriptions", None));
    };

    let (selection, visible) = single_subscription_field(schema, query_env, root)?;
    let field_name = selection.field_name();
    let primary = visible[0];

    let Some(field_def) = root.field_by_name(field_name) else {
        return Err(ServerError::new(
            format!("Cannot query field \"{field_name}\" on type \"{}\"", root.name()),
            Some(primary.pos),
        ));
    };
    let Resolver::Subscription(factory) = &field_def.resolver else {
        return Err(ServerError::new(
            format!("Field \"{field_name}\" is not backed by an event stream"),
            Some(primary.pos),
        ));
    };

    let path = QueryPath::empty().child(selection.response_key);
    let arguments = coerce_arguments(
        registry,
        &field_def.args,
        &primary.node.arguments,
        &query_env.variables,
        primary.pos,
    )
    .map_err(|err| err.with_path(path.clone()))?;

    let ctx_field = ContextField {
        schema_env: &schema.env,
        query_env,
        path: path.clone(),
        parent_type: root,
        field: field_def,
        item: primary,
        arguments,
        local_state: Default::default(),
    };
    let parent = query_env.root_value.clone();

    factory(ResolverContext {
        ctx: &ctx_field,
        parent: &parent,
    })
    .await
    .map_err(|error| {
        redact(schema, error)
            .into_server_error(primary.pos)
            .with_path(path)
    })
}

/// Execute one event as if the subscribed field were a query field
/// projecting the event value out of `{ "<field>": <event> }`.
async fn execute_event(schema: &Schema, query_env: &QueryEnv, event: Result<serde_json::Value, Error>) -> Response {
    let registry = &schema.env.registry;
    let Some(root) = registry.root_type(OperationType::Subscription) else {
        return Response::from_errors(vec![ServerError::new("Schema is not configured for subscriptions", None)]);
    };

    let (selection, visible, field_def) = match (|| {
        let (selection, visible) = single_subscription_field(schema, query_env, root)?;
        let Some(field_def) = root.field_by_name(selection.field_name()) else {
            return Err(ServerError::new(
                format!("Cannot query field \"{}\" on type \"{}\"", selection.field_name(), root.name()),
                Some(visible[0].pos),
            ));
        };
        Ok((selection, visible, field_def))
    })() {
        Ok(found) => found,
        Err(error) => return Response::from_errors(vec![error]),
    };

    let response_key = Name::new(selection.response_key);
    let path = QueryPath::empty().child(selection.response_key);

    let event = match event {
        Ok(event) => event,
        Err(error) => {
            return Response::from_errors(vec![redact(schema, error)
                .into_server_error(visible[0].pos)
                .with_path(path)]);
        }
    };

    // Swap the stream factory for plain property selection so the normal
    // field pipeline, middleware included, runs against the event.
    let mut event_field = field_def.clone();
    event_field.resolver = Resolver::Select;
    let mut event_root = serde_json::Map::new();
    event_root.insert(field_def.name.clone(), event);
    let parent = ResolvedValue::new(serde_json::Value::Object(event_root));

    let ctx = crate::ContextSelectionSet {
        schema_env: &schema.env,
        query_env,
        path: QueryPath::empty(),
        ty: root,
        selection_sets: vec![&query_env.operation.node.selection_set],
    };

    let data = match resolve_field(&ctx, root, &event_field, &visible, path, &parent).await {
        Ok(value) => {
            let mut object = indexmap::IndexMap::new();
            object.insert(response_key, value);
            ConstValue::Object(object)
        }
        Err(error) if event_field.ty.is_nullable() => {
            ctx.add_error(error);
            let mut object = indexmap::IndexMap::new();
            object.insert(response_key, ConstValue::Null);
            ConstValue::Object(object)
        }
        Err(error) => {
            ctx.add_error(error);
            ConstValue::Null
        }
    };

    let errors = query_env.take_errors();
    Response::new(data).with_errors(errors)
}

type SingleField<'a> = (
    FieldSelection<'a>,
    Vec<&'a async_graphql_parser::Positioned<async_graphql_parser::types::Field>>,
);

fn single_subscription_field<'a>(
    schema: &'a Schema,
    query_env: &'a QueryEnv,
    root: &'a MetaType,
) -> ServerResult<SingleField<'a>> {
    let selections = collect_fields(
        &schema.env.registry,
        &query_env.fragments,
        schema.env.options.validation_mode,
        root,
        &[&query_env.operation.node.selection_set],
    )?;

    let mut visible_selections = Vec::new();
    for selection in selections {
        let mut visible = Vec::new();
        for node in &selection.nodes {
            if node.visibility.is_visible(&query_env.variables)? {
                visible.push(node.field);
            }
        }
        if !visible.is_empty() {
            visible_selections.push((selection, visible));
        }
    }

    let mut visible_selections = visible_selections.into_iter();
    match (visible_selections.next(), visible_selections.next()) {
        (Some((selection, visible)), None) if selection.field_name() != "__typename" => Ok((selection, visible)),
        _ => Err(ServerError::new(
            "Subscriptions must select exactly one top-level field",
            Some(query_env.operation.pos),
        )),
    }
}

fn redact(schema: &Schema, error: Error) -> Error {
    match error.kind {
        ErrorKind::Unexpected if !schema.env.options.include_exception_details => {
            tracing::error!("unexpected subscription error: {}", error.message);
            Error {
                message: "Internal server error".to_string(),
                ..error
            }
        }
        _ => error,
    }
}
