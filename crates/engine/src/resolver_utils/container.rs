use async_graphql_value::{ConstValue, Name};
use async_recursion::async_recursion;
use futures_util::future::{try_join_all, BoxFuture};
use indexmap::IndexMap;

use crate::{
    collect::collect_fields,
    registry::{
        resolvers::{ResolvedValue, Resolver},
        MetaField, MetaType,
    },
    ContextSelectionSet, ServerError, ServerResult,
};

/// Resolve the selection sets of `ctx` against `parent` and produce the
/// response object.
///
/// With `serial` set, top-level fields run one after the other; otherwise
/// siblings run concurrently, except fields whose definition opts into
/// serial execution, which are awaited alone between two concurrent
/// batches. Completion order never changes response order.
#[async_recursion]
pub(crate) async fn resolve_container(
    ctx: &ContextSelectionSet<'_>,
    parent: &ResolvedValue,
    serial: bool,
) -> ServerResult<ConstValue> {
    ctx.check_aborted()?;

    let registry = &ctx.schema_env.registry;
    let mode = ctx.schema_env.options.validation_mode;
    let ty = concrete_type(ctx, parent)?;

    let selections = collect_fields(registry, &ctx.query_env.fragments, mode, ty, &ctx.selection_sets)?;

    struct Task<'f> {
        serial: bool,
        future: BoxFuture<'f, ServerResult<(Name, ConstValue)>>,
    }

    let mut tasks = Vec::with_capacity(selections.len());
    for selection in selections {
        let mut visible = Vec::new();
        for node in &selection.nodes {
            if node.visibility.is_visible(&ctx.query_env.variables)? {
                visible.push(node.field);
            }
        }
        if visible.is_empty() {
            continue;
        }

        let response_key = Name::new(selection.response_key);

        if selection.field_name() == "__typename" {
            // No definition exists for `__typename`; run a synthetic one
            // through the normal pipeline so directive middleware applies.
            let path = ctx.path.child(selection.response_key);
            let type_name = ty.name().to_string();
            tasks.push(Task {
                serial: false,
                future: Box::pin(async move {
                    let field_def = typename_field(type_name);
                    let value = super::resolve_field(ctx, ty, &field_def, &visible, path, parent).await?;
                    Ok((response_key, value))
                }),
            });
            continue;
        }

        let field_name = selection.field_name();
        let Some(field_def) = ty.field_by_name(field_name) else {
            return Err(ServerError::new(
                format!("Cannot query field \"{field_name}\" on type \"{}\"", ty.name()),
                Some(selection.primary().pos),
            ));
        };

        let path = ctx.path.child(selection.response_key);
        let nullable = field_def.ty.is_nullable();
        tasks.push(Task {
            serial: field_def.serial,
            future: Box::pin(async move {
                match super::resolve_field(ctx, ty, field_def, &visible, path, parent).await {
                    Ok(value) => Ok((response_key, value)),
                    Err(error) if nullable => {
                        // Isolate the failure: record it and null the field.
                        ctx.add_error(error);
                        Ok((response_key, ConstValue::Null))
                    }
                    Err(error) => Err(error),
                }
            }),
        });
    }

    let mut object = IndexMap::new();
    if serial {
        for task in tasks {
            let (key, value) = task.future.await?;
            object.insert(key, value);
        }
    } else {
        let mut batch = Vec::new();
        for task in tasks {
            if task.serial {
                drain_batch(&mut batch, &mut object).await?;
                let (key, value) = task.future.await?;
                object.insert(key, value);
            } else {
                batch.push(task.future);
            }
        }
        drain_batch(&mut batch, &mut object).await?;
    }

    Ok(ConstValue::Object(object))
}

fn typename_field(type_name: String) -> MetaField {
    MetaField::new("__typename", "String!").with_resolver(Resolver::custom(move |_| {
        let type_name = type_name.clone();
        Box::pin(async move { Ok(serde_json::Value::String(type_name)) })
    }))
}

async fn drain_batch(
    batch: &mut Vec<BoxFuture<'_, ServerResult<(Name, ConstValue)>>>,
    object: &mut IndexMap<Name, ConstValue>,
) -> ServerResult<()> {
    if batch.is_empty() {
        return Ok(());
    }
    for (key, value) in try_join_all(batch.drain(..)).await? {
        object.insert(key, value);
    }
    Ok(())
}

/// For interface and union parents, pick the object type named by the
/// resolved value's `__typename` property.
fn concrete_type<'a>(ctx: &ContextSelectionSet<'a>, parent: &ResolvedValue) -> ServerResult<&'a MetaType> {
    if !matches!(ctx.ty, MetaType::Interface(_) | MetaType::Union(_)) {
        return Ok(ctx.ty);
    }

    let registry = &ctx.schema_env.registry;
    let abstract_name = ctx.ty.name();

    let Some(type_name) = parent.data_resolved().get("__typename").and_then(|v| v.as_str()) else {
        return Err(ServerError::new(
            format!("The value resolved for abstract type \"{abstract_name}\" carries no \"__typename\""),
            None,
        )
        .with_path(ctx.path.clone()));
    };

    let concrete = registry
        .lookup_type(type_name)
        .filter(|ty| matches!(ty, MetaType::Object(_)))
        .filter(|ty| registry.type_condition_matches(ty, abstract_name));
    concrete.ok_or_else(|| {
        ServerError::new(
            format!("\"{type_name}\" is not an object type within \"{abstract_name}\""),
            None,
        )
        .with_path(ctx.path.clone())
    })
}
