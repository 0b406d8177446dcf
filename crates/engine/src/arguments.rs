//! Input coercion: request variables and field/directive arguments.
//!
//! Coercion recurses over the declared type. Nullability is enforced at
//! every level, list positions widen a single non-list value into a
//! one-element list, and input objects fill missing fields from their
//! declared defaults.

use async_graphql_parser::{
    types::{BaseType, OperationDefinition, Type},
    Pos, Positioned,
};
use async_graphql_value::{ConstValue, Name, Value, Variables};
use indexmap::IndexMap;

use crate::{
    registry::{scalars::PossibleScalar, MetaInputValue, MetaType, Registry},
    InputValueError, InputValueResult, ServerError, ServerResult,
};

/// Coerce the request variables against the operation's variable
/// definitions. Returns the complete, coerced variable set.
pub(crate) fn coerce_variables(
    registry: &Registry,
    operation: &OperationDefinition,
    variables: &Variables,
) -> ServerResult<Variables> {
    let mut coerced = Variables::default();

    for definition in &operation.variable_definitions {
        let name = &definition.node.name.node;
        let ty = &definition.node.var_type.node;

        let provided = variables.get(name.as_str()).cloned();
        let value = match provided {
            Some(value) => Some(value),
            None => definition.node.default_value.as_ref().map(|default| default.node.clone()),
        };

        let value = match value {
            Some(value) => value,
            None if ty.nullable => continue,
            None => {
                return Err(ServerError::new(
                    format!("Variable \"${name}\" of required type \"{ty}\" was not provided"),
                    Some(definition.pos),
                ));
            }
        };

        let value = coerce_input_value(registry, ty, value).map_err(|err| {
            ServerError::new(
                format!("Variable \"${name}\" got invalid value: {err}"),
                Some(definition.pos),
            )
        })?;
        coerced.insert(name.clone(), value);
    }

    Ok(coerced)
}

/// Coerce provided arguments against their definitions.
///
/// Used for field arguments and for directive arguments; `pos` locates the
/// field or directive for errors about missing required arguments.
pub(crate) fn coerce_arguments(
    registry: &Registry,
    definitions: &IndexMap<String, MetaInputValue>,
    provided: &[(Positioned<Name>, Positioned<Value>)],
    variables: &Variables,
    pos: Pos,
) -> ServerResult<IndexMap<Name, ConstValue>> {
    for (name, _) in provided {
        if !definitions.contains_key(name.node.as_str()) {
            return Err(ServerError::new(
                format!("Unknown argument \"{}\"", name.node),
                Some(name.pos),
            ));
        }
    }

    let mut coerced = IndexMap::new();
    for (name, definition) in definitions {
        let supplied = provided
            .iter()
            .find(|(arg_name, _)| arg_name.node.as_str() == name.as_str());

        let (value, value_pos) = match supplied {
            Some((_, value)) => {
                let resolved = value
                    .node
                    .clone()
                    .into_const_with(|variable| resolve_variable(variables, &variable))
                    .ok();
                match resolved {
                    Some(resolved) => (Some(resolved), value.pos),
                    // An unset variable counts as not providing the
                    // argument at all.
                    None => (None, value.pos),
                }
            }
            None => (None, pos),
        };

        let value = value.or_else(|| definition.default_value.clone());

        let ty = parse_input_type(&definition.ty)?;
        let value = match value {
            Some(value) => value,
            None if ty.nullable => continue,
            None => {
                return Err(ServerError::new(
                    format!("Argument \"{name}\" of required type \"{}\" was not provided", definition.ty),
                    Some(pos),
                ));
            }
        };

        let value = coerce_input_value(registry, &ty, value).map_err(|err| {
            ServerError::new(format!("Invalid value for argument \"{name}\": {err}"), Some(value_pos))
        })?;
        coerced.insert(Name::new(name), value);
    }

    Ok(coerced)
}

struct UnsetVariable;

fn resolve_variable(variables: &Variables, name: &Name) -> Result<ConstValue, UnsetVariable> {
    variables.get(name.as_str()).cloned().ok_or(UnsetVariable)
}

fn parse_input_type(ty: &crate::registry::InputValueType) -> ServerResult<Type> {
    Type::new(ty.as_str())
        .ok_or_else(|| ServerError::new(format!("Schema declares a malformed input type \"{ty}\""), None))
}

/// Coerce a single value against a declared input type.
pub(crate) fn coerce_input_value(registry: &Registry, ty: &Type, value: ConstValue) -> InputValueResult<ConstValue> {
    if let ConstValue::Null = value {
        return if ty.nullable {
            Ok(ConstValue::Null)
        } else {
            Err(InputValueError::custom(format!("Unexpected null for type \"{ty}\"")))
        };
    }

    match &ty.base {
        BaseType::Named(name) => coerce_named(registry, name.as_str(), value),
        BaseType::List(inner) => match value {
            ConstValue::List(items) => {
                let mut coerced = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    coerced.push(coerce_input_value(registry, inner, item).map_err(|err| err.at(index))?);
                }
                Ok(ConstValue::List(coerced))
            }
            // A single value in list position becomes a one-element list.
            other => Ok(ConstValue::List(vec![coerce_input_value(registry, inner, other)?])),
        },
    }
}

fn coerce_named(registry: &Registry, name: &str, value: ConstValue) -> InputValueResult<ConstValue> {
    match registry.lookup_type(name) {
        Some(MetaType::Scalar(_)) => {
            let parsed = PossibleScalar::parse(name, value)?;
            ConstValue::from_json(parsed).map_err(|err| InputValueError::custom(err.to_string()))
        }
        Some(MetaType::Enum(enum_type)) => {
            let member = match &value {
                ConstValue::Enum(member) => member.as_str(),
                ConstValue::String(member) => member.as_str(),
                _ => return Err(InputValueError::expected_type(name, &value)),
            };
            if enum_type.enum_values.contains_key(member) {
                Ok(ConstValue::Enum(Name::new(member)))
            } else {
                Err(InputValueError::ty_custom(name, format_args!("unknown member \"{member}\"")))
            }
        }
        Some(MetaType::InputObject(input_object)) => {
            let ConstValue::Object(mut fields) = value else {
                return Err(InputValueError::expected_type(name, &value));
            };

            for key in fields.keys() {
                if !input_object.input_fields.contains_key(key.as_str()) {
                    return Err(InputValueError::custom(format!(
                        "Unknown field \"{key}\" of type \"{name}\""
                    )));
                }
            }

            let mut coerced = IndexMap::new();
            for (field_name, input) in &input_object.input_fields {
                let value = fields
                    .swap_remove(field_name.as_str())
                    .or_else(|| input.default_value.clone());

                let ty = Type::new(input.ty.as_str())
                    .ok_or_else(|| InputValueError::custom(format!("malformed input type \"{}\"", input.ty)))?;
                let value = match value {
                    Some(value) => value,
                    None if ty.nullable => continue,
                    None => {
                        return Err(InputValueError::custom(format!(
                            "field \"{field_name}\" of required type \"{}\" was not provided",
                            input.ty
                        ))
                        .at(name));
                    }
                };

                let value = coerce_input_value(registry, &ty, value).map_err(|err| err.at(field_name))?;
                coerced.insert(Name::new(field_name), value);
            }
            Ok(ConstValue::Object(coerced))
        }
        Some(_) => Err(InputValueError::custom(format!("\"{name}\" is not an input type"))),
        None => Err(InputValueError::custom(format!("Unknown type \"{name}\""))),
    }
}
