use async_graphql_parser::{types::Directive, Pos, Positioned};
use async_graphql_value::{ConstValue, Value, Variables};

use crate::{ServerError, ServerResult};

/// Why a collected field may or may not end up in the response.
///
/// Built eagerly during field collection from `@skip`/`@include` directives
/// on the field and on every fragment on the path to it, but only evaluated
/// against the variables when the field is about to be resolved.
#[derive(Debug, Clone)]
pub enum VisibilityCondition<'a> {
    Visible,
    IncludeIf { value: &'a Value, pos: Pos },
    SkipIf { value: &'a Value, pos: Pos },
    All(Vec<VisibilityCondition<'a>>),
}

impl<'a> VisibilityCondition<'a> {
    /// The combined condition of the `@skip`/`@include` directives on one
    /// field, spread or inline fragment. Other directives are left for the
    /// middleware layer.
    pub fn of_directives(directives: &'a [Positioned<Directive>]) -> ServerResult<Self> {
        let mut conditions = Vec::new();
        for directive in directives {
            let condition = match directive.node.name.node.as_str() {
                "include" => {
                    let value = require_if_argument(&directive.node, directive.pos)?;
                    VisibilityCondition::IncludeIf {
                        value: &value.node,
                        pos: value.pos,
                    }
                }
                "skip" => {
                    let value = require_if_argument(&directive.node, directive.pos)?;
                    VisibilityCondition::SkipIf {
                        value: &value.node,
                        pos: value.pos,
                    }
                }
                _ => continue,
            };
            conditions.push(condition);
        }
        Ok(match conditions.len() {
            0 => VisibilityCondition::Visible,
            1 => conditions.pop().expect("len is 1"),
            _ => VisibilityCondition::All(conditions),
        })
    }

    /// Both conditions must hold.
    #[must_use]
    pub fn and(self, other: VisibilityCondition<'a>) -> VisibilityCondition<'a> {
        match (self, other) {
            (VisibilityCondition::Visible, other) => other,
            (condition, VisibilityCondition::Visible) => condition,
            (VisibilityCondition::All(mut conditions), VisibilityCondition::All(others)) => {
                conditions.extend(others);
                VisibilityCondition::All(conditions)
            }
            (VisibilityCondition::All(mut conditions), other) => {
                conditions.push(other);
                VisibilityCondition::All(conditions)
            }
            (condition, VisibilityCondition::All(mut others)) => {
                others.insert(0, condition);
                VisibilityCondition::All(others)
            }
            (condition, other) => VisibilityCondition::All(vec![condition, other]),
        }
    }

    /// Evaluate against the coerced variables of the request.
    pub fn is_visible(&self, variables: &Variables) -> ServerResult<bool> {
        match self {
            VisibilityCondition::Visible => Ok(true),
            VisibilityCondition::IncludeIf { value, pos } => resolve_bool(value, *pos, variables),
            VisibilityCondition::SkipIf { value, pos } => resolve_bool(value, *pos, variables).map(|skip| !skip),
            VisibilityCondition::All(conditions) => {
                for condition in conditions {
                    if !condition.is_visible(variables)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

fn require_if_argument(directive: &Directive, pos: Pos) -> ServerResult<&Positioned<Value>> {
    directive.get_argument("if").ok_or_else(|| {
        ServerError::new(
            format!("Directive @{} requires an \"if\" argument", directive.name.node),
            Some(pos),
        )
    })
}

fn resolve_bool(value: &Value, pos: Pos, variables: &Variables) -> ServerResult<bool> {
    match value {
        Value::Boolean(value) => Ok(*value),
        Value::Variable(name) => match variables.get(name.as_str()) {
            Some(ConstValue::Boolean(value)) => Ok(*value),
            _ => Err(invalid_if(pos)),
        },
        _ => Err(invalid_if(pos)),
    }
}

fn invalid_if(pos: Pos) -> ServerError {
    ServerError::new("Invalid value for argument \"if\", expected type \"Boolean!\"", Some(pos))
}
