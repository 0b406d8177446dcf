//! The resolver middleware pipeline.
//!
//! Every field resolution runs through a chain: schema-wide field
//! middleware first, then one directive middleware entry per matching
//! directive (field-definition directives before query-side ones), and the
//! field's own resolver at the end. Each element decides whether to call
//! [`ResolveNext`], short-circuit, or transform the result on the way out.
//!
//! Meta fields (`__typename`, `__schema`, `__type`) skip the schema-wide
//! middleware but still run directive middleware written in the query.

use async_graphql_value::{ConstValue, Name};
use async_trait::async_trait;
use indexmap::IndexMap;

use crate::{
    registry::resolvers::{run_resolver, ResolvedValue},
    ContextField, Error,
};

/// Schema-wide middleware, run for every non-meta field.
#[async_trait]
pub trait FieldMiddleware: Send + Sync + 'static {
    async fn resolve(
        &self,
        ctx: &ContextField<'_>,
        parent: &ResolvedValue,
        next: ResolveNext<'_>,
    ) -> Result<ResolvedValue, Error>;
}

/// Middleware bound to a directive name.
///
/// Runs once per occurrence of the directive on the field, with that
/// occurrence's coerced arguments.
#[async_trait]
pub trait DirectiveMiddleware: Send + Sync + 'static {
    async fn resolve(
        &self,
        ctx: &ContextField<'_>,
        directive: &DirectiveArguments,
        parent: &ResolvedValue,
        next: ResolveNext<'_>,
    ) -> Result<ResolvedValue, Error>;
}

/// One directive occurrence as seen by its middleware.
#[derive(Debug, Clone)]
pub struct DirectiveArguments {
    pub name: String,
    pub arguments: IndexMap<Name, ConstValue>,
}

impl DirectiveArguments {
    pub fn get(&self, name: &str) -> Option<&ConstValue> {
        self.arguments.get(name)
    }
}

pub(crate) enum ChainStep<'a> {
    Field(&'a dyn FieldMiddleware),
    Directive(&'a dyn DirectiveMiddleware, DirectiveArguments),
}

/// The remainder of the middleware chain. Calling [`run`](Self::run)
/// consumes it; not calling it short-circuits the field.
pub struct ResolveNext<'a> {
    steps: &'a [ChainStep<'a>],
}

impl<'a> ResolveNext<'a> {
    pub(crate) fn new(steps: &'a [ChainStep<'a>]) -> Self {
        Self { steps }
    }

    pub async fn run(self, ctx: &ContextField<'_>, parent: &ResolvedValue) -> Result<ResolvedValue, Error> {
        match self.steps.split_first() {
            Some((step, rest)) => {
                let next = ResolveNext { steps: rest };
                match step {
                    ChainStep::Field(middleware) => middleware.resolve(ctx, parent, next).await,
                    ChainStep::Directive(middleware, arguments) => {
                        middleware.resolve(ctx, arguments, parent, next).await
                    }
                }
            }
            None => run_resolver(&ctx.field.resolver, ctx, parent).await,
        }
    }
}
