use async_graphql_parser::{
    types::{BaseType, Field, Type},
    Positioned,
};
use async_graphql_value::{ConstValue, Name};
use async_recursion::async_recursion;
use query_path::QueryPath;

use crate::{
    arguments::coerce_arguments,
    middleware::{ChainStep, DirectiveArguments, ResolveNext},
    registry::{
        resolvers::ResolvedValue,
        scalars::PossibleScalar,
        MetaField, MetaType,
    },
    ContextField, ContextSelectionSet, Error, ErrorKind, ServerError, ServerResult,
};

/// Resolve one field: coerce its arguments, run the middleware chain and
/// the resolver, then shape the produced value against the field's declared
/// type. Merged duplicate selections share the resolver run; their
/// sub-selections are combined during shaping.
pub(crate) async fn resolve_field<'a>(
    ctx: &ContextSelectionSet<'a>,
    parent_type: &'a MetaType,
    field_def: &'a MetaField,
    nodes: &[&'a Positioned<Field>],
    path: QueryPath,
    parent: &ResolvedValue,
) -> ServerResult<ConstValue> {
    let registry = &ctx.schema_env.registry;
    let primary = nodes[0];

    let arguments = coerce_arguments(
        registry,
        &field_def.args,
        &primary.node.arguments,
        &ctx.query_env.variables,
        primary.pos,
    )
    .map_err(|err| err.with_path(path.clone()))?;

    let ctx_field = ContextField {
        schema_env: ctx.schema_env,
        query_env: ctx.query_env,
        path: path.clone(),
        parent_type,
        field: field_def,
        item: primary,
        arguments,
        local_state: Default::default(),
    };
    ctx_field.check_aborted()?;

    let mut steps = Vec::new();

    // Meta fields are engine-owned; schema-wide middleware never sees them.
    if !field_def.name.starts_with("__") {
        for middleware in &ctx.schema_env.middlewares {
            steps.push(ChainStep::Field(middleware.as_ref()));
        }
    }

    for invocation in &field_def.directives {
        if let Some(middleware) = ctx.schema_env.directive_middlewares.get(&invocation.name) {
            steps.push(ChainStep::Directive(
                middleware.as_ref(),
                DirectiveArguments {
                    name: invocation.name.clone(),
                    arguments: invocation
                        .arguments
                        .iter()
                        .map(|(name, value)| (Name::new(name), value.clone()))
                        .collect(),
                },
            ));
        }
    }

    for node in nodes {
        for directive in &node.node.directives {
            let name = directive.node.name.node.as_str();
            if name == "skip" || name == "include" {
                continue;
            }
            let Some(definition) = registry.directives.get(name) else {
                if ctx.schema_env.options.validation_mode.is_strict() {
                    return Err(ServerError::new(
                        format!("Unknown directive \"@{name}\""),
                        Some(directive.pos),
                    )
                    .with_path(path.clone()));
                }
                continue;
            };
            let arguments = coerce_arguments(
                registry,
                &definition.args,
                &directive.node.arguments,
                &ctx.query_env.variables,
                directive.pos,
            )
            .map_err(|err| err.with_path(path.clone()))?;

            if let Some(middleware) = ctx.schema_env.directive_middlewares.get(name) {
                steps.push(ChainStep::Directive(
                    middleware.as_ref(),
                    DirectiveArguments {
                        name: name.to_string(),
                        arguments,
                    },
                ));
            }
        }
    }

    let value = ResolveNext::new(&steps)
        .run(&ctx_field, parent)
        .await
        .map_err(|err| field_error(&ctx_field, err))?;

    let ty = Type::new(field_def.ty.as_str()).ok_or_else(|| {
        ServerError::new(
            format!("Schema declares a malformed type \"{}\"", field_def.ty),
            None,
        )
        .with_path(path.clone())
    })?;

    shape_output(&ctx_field, path, &ty, nodes, value).await
}

/// Convert a resolver error into its response form, redacting unexpected
/// errors unless the schema opted into exposing them.
fn field_error(ctx: &ContextField<'_>, error: Error) -> ServerError {
    let error = match error.kind {
        ErrorKind::Unexpected if !ctx.schema_env.options.include_exception_details => {
            tracing::error!(
                field = %ctx.field.name,
                parent = %ctx.parent_type.name(),
                "unexpected resolver error: {}",
                error.message,
            );
            Error {
                message: "Internal server error".to_string(),
                ..error
            }
        }
        _ => error,
    };
    error.into_server_error(ctx.item.pos).with_path(ctx.path.clone())
}

/// Shape a resolved value against a declared output type, recursing through
/// list wrappers and into sub-selections for composite types.
#[async_recursion]
pub(crate) async fn shape_output<'a>(
    ctx: &ContextField<'a>,
    path: QueryPath,
    ty: &Type,
    nodes: &[&'a Positioned<Field>],
    value: ResolvedValue,
) -> ServerResult<ConstValue> {
    if value.is_null() {
        if ty.nullable {
            return Ok(ConstValue::Null);
        }
        return Err(ServerError::new(
            format!(
                "Cannot return null for non-nullable field \"{}.{}\"",
                ctx.parent_type.name(),
                ctx.field.name,
            ),
            Some(ctx.item.pos),
        )
        .with_path(path));
    }

    match &ty.base {
        BaseType::List(inner) => super::list::resolve_list(ctx, path, inner, nodes, value).await,
        BaseType::Named(name) => {
            let registry = &ctx.schema_env.registry;
            let Some(field_type) = registry.lookup_type(name.as_str()) else {
                return Err(
                    ServerError::new(format!("Schema has no type named \"{name}\""), None).with_path(path),
                );
            };

            let sub_selections: Vec<_> = nodes
                .iter()
                .map(|node| &node.node.selection_set)
                .filter(|selection_set| !selection_set.node.items.is_empty())
                .collect();

            if field_type.is_composite() {
                if sub_selections.is_empty() {
                    return Err(ServerError::new(
                        format!(
                            "Field \"{}\" of type \"{}\" must have a selection of subfields",
                            ctx.field.name, ctx.field.ty,
                        ),
                        Some(ctx.item.pos),
                    )
                    .with_path(path));
                }
                let child_ctx = ContextSelectionSet {
                    schema_env: ctx.schema_env,
                    query_env: ctx.query_env,
                    path,
                    ty: field_type,
                    selection_sets: sub_selections,
                };
                let serial = ctx.schema_env.options.force_serial_execution;
                return super::resolve_container(&child_ctx, &value, serial).await;
            }

            if !sub_selections.is_empty() {
                return Err(ServerError::new(
                    format!(
                        "Field \"{}\" must not have a selection since type \"{name}\" has no subfields",
                        ctx.field.name,
                    ),
                    Some(ctx.item.pos),
                )
                .with_path(path));
            }

            shape_leaf(ctx, path, field_type, value)
        }
    }
}

fn shape_leaf(
    ctx: &ContextField<'_>,
    path: QueryPath,
    field_type: &MetaType,
    value: ResolvedValue,
) -> ServerResult<ConstValue> {
    match field_type {
        MetaType::Scalar(scalar) => PossibleScalar::to_value(&scalar.name, value.take())
            .map_err(|err| err.into_server_error(ctx.item.pos).with_path(path)),
        MetaType::Enum(enum_type) => {
            let member = match value.data_resolved() {
                serde_json::Value::String(member) => member.clone(),
                _ => {
                    return Err(ServerError::new(
                        format!("Expected a \"{}\" member, the resolver returned something else", enum_type.name),
                        Some(ctx.item.pos),
                    )
                    .with_path(path));
                }
            };
            if !enum_type.enum_values.contains_key(member.as_str()) {
                return Err(ServerError::new(
                    format!("Invalid member \"{member}\" for enum \"{}\"", enum_type.name),
                    Some(ctx.item.pos),
                )
                .with_path(path));
            }
            Ok(ConstValue::Enum(Name::new(member)))
        }
        _ => Err(ServerError::new(
            format!("Type \"{}\" cannot be returned from a field", field_type.name()),
            Some(ctx.item.pos),
        )
        .with_path(path)),
    }
}
