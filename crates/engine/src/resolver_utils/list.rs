use async_graphql_parser::{types::Field, types::Type, Positioned};
use async_graphql_value::ConstValue;
use futures_util::future::try_join_all;
use query_path::QueryPath;

use crate::{registry::resolvers::ResolvedValue, ContextField, ServerError, ServerResult};

/// Shape a list position: every item is shaped against the inner type
/// concurrently. A failing item only nulls its own slot when the inner type
/// is nullable; otherwise the failure is the whole list's.
pub(crate) async fn resolve_list<'a>(
    ctx: &ContextField<'a>,
    path: QueryPath,
    inner: &Type,
    nodes: &[&'a Positioned<Field>],
    value: ResolvedValue,
) -> ServerResult<ConstValue> {
    let Some(item_iter) = value.item_iter() else {
        return Err(ServerError::new(
            format!(
                "Resolver returned a non-list value for list field \"{}.{}\"",
                ctx.parent_type.name(),
                ctx.field.name,
            ),
            Some(ctx.item.pos),
        )
        .with_path(path));
    };
    let items: Vec<ResolvedValue> = item_iter.collect();

    let futures = items.into_iter().enumerate().map(|(index, item)| {
        let item_path = path.child(index);
        async move {
            match super::shape_output(ctx, item_path, inner, nodes, item).await {
                Ok(value) => Ok(value),
                Err(error) if inner.nullable => {
                    ctx.add_error(error);
                    Ok(ConstValue::Null)
                }
                Err(error) => Err(error),
            }
        }
    });

    Ok(ConstValue::List(try_join_all(futures).await?))
}
