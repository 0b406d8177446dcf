//! How field data is produced.
//!
//! Every field definition carries a [`Resolver`]. Resolving a field means
//! running the middleware chain and then the resolver at the end of it; the
//! resolver receives the parent object's [`ResolvedValue`] and produces the
//! value the output shaping step works on.

use std::sync::Arc;

use futures_util::{future::BoxFuture, stream::BoxStream};

mod resolved_value;

pub use resolved_value::ResolvedValue;

use crate::{ContextField, Error};

/// What a custom resolver gets to look at: the field context (arguments,
/// schema data, response path) and the parent object's value.
pub struct ResolverContext<'a> {
    pub ctx: &'a ContextField<'a>,
    pub parent: &'a ResolvedValue,
}

pub type ResolverFn = Arc<
    dyn for<'a> Fn(ResolverContext<'a>) -> BoxFuture<'a, Result<serde_json::Value, Error>> + Send + Sync,
>;

/// A factory for the event stream backing a subscription root field.
pub type SubscriptionFn = Arc<
    dyn for<'a> Fn(
            ResolverContext<'a>,
        ) -> BoxFuture<'a, Result<BoxStream<'static, Result<serde_json::Value, Error>>, Error>>
        + Send
        + Sync,
>;

#[derive(Clone, Default)]
pub enum Resolver {
    /// Project the property named after the field out of the parent object.
    /// Missing properties resolve to null.
    #[default]
    Select,
    /// Hand the parent value through unchanged.
    Parent,
    /// A host-provided asynchronous function.
    Custom(ResolverFn),
    /// Served from the schema's introspection snapshot.
    Introspection,
    /// Produces the event stream for a subscription root field.
    Subscription(SubscriptionFn),
}

impl Resolver {
    pub fn custom<F>(f: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> BoxFuture<'a, Result<serde_json::Value, Error>>
            + Send
            + Sync
            + 'static,
    {
        Resolver::Custom(Arc::new(f))
    }

    pub fn subscription<F>(f: F) -> Self
    where
        F: for<'a> Fn(
                ResolverContext<'a>,
            )
                -> BoxFuture<'a, Result<BoxStream<'static, Result<serde_json::Value, Error>>, Error>>
            + Send
            + Sync
            + 'static,
    {
        Resolver::Subscription(Arc::new(f))
    }

    pub fn is_subscription(&self) -> bool {
        matches!(self, Resolver::Subscription(_))
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolver::Select => f.write_str("Select"),
            Resolver::Parent => f.write_str("Parent"),
            Resolver::Custom(_) => f.write_str("Custom(..)"),
            Resolver::Introspection => f.write_str("Introspection"),
            Resolver::Subscription(_) => f.write_str("Subscription(..)"),
        }
    }
}

/// Runs the resolver at the end of the middleware chain.
pub(crate) async fn run_resolver(
    resolver: &Resolver,
    ctx: &ContextField<'_>,
    parent: &ResolvedValue,
) -> Result<ResolvedValue, Error> {
    match resolver {
        Resolver::Select => Ok(parent.get_field(&ctx.field.name).unwrap_or_default()),
        Resolver::Parent => Ok(parent.clone()),
        Resolver::Custom(resolver) => resolver(ResolverContext { ctx, parent })
            .await
            .map(ResolvedValue::new),
        Resolver::Introspection => crate::introspection::resolve(ctx).map(ResolvedValue::new),
        Resolver::Subscription(_) => Err(Error::new(
            "Subscription resolvers can only run at the subscription root",
        )),
    }
}
