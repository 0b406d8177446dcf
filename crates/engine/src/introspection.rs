//! Schema introspection.
//!
//! The whole `__schema` projection is built once when the schema is
//! finished and stored as a JSON snapshot; `__schema` and `__type` then
//! resolve by handing slices of that snapshot to the normal output shaping,
//! which walks it with the default property-selection resolver.
//!
//! Type references inside the snapshot (a field's type, union members) are
//! shallow: `kind`, `name` and the `ofType` chain. The full description of
//! a named type lives in its own entry under `__schema.types`.

use async_graphql_parser::types::{BaseType, DirectiveLocation, Type};
use async_graphql_value::ConstValue;
use serde_json::{json, Value};

use crate::{
    registry::{resolvers::Resolver, EnumType, MetaField, MetaInputValue, MetaType, ObjectType, Registry},
    ContextField, Error,
};

pub(crate) fn resolve(ctx: &ContextField<'_>) -> Result<Value, Error> {
    match ctx.field.name.as_str() {
        "__schema" => Ok(ctx.schema_env.introspection.clone()),
        "__type" => {
            let name = match ctx.get_argument("name") {
                Some(ConstValue::String(name)) => name.clone(),
                _ => return Err(Error::new("__type requires a \"name\" argument")),
            };
            let found = ctx
                .schema_env
                .introspection
                .get("types")
                .and_then(Value::as_array)
                .and_then(|types| types.iter().find(|ty| ty.get("name") == Some(&Value::String(name.clone()))));
            Ok(found.cloned().unwrap_or(Value::Null))
        }
        other => Err(Error::unexpected(format!(
            "No introspection data behind field \"{other}\""
        ))),
    }
}

/// Register the `__Schema` type family and hang `__schema`/`__type` off the
/// query root.
pub(crate) fn register_introspection_types(registry: &mut Registry) {
    registry.insert_type(EnumType::new(
        "__TypeKind",
        [
            "SCALAR",
            "OBJECT",
            "INTERFACE",
            "UNION",
            "ENUM",
            "INPUT_OBJECT",
            "LIST",
            "NON_NULL",
        ],
    ));
    registry.insert_type(EnumType::new(
        "__DirectiveLocation",
        [
            "QUERY",
            "MUTATION",
            "SUBSCRIPTION",
            "FIELD",
            "FRAGMENT_DEFINITION",
            "FRAGMENT_SPREAD",
            "INLINE_FRAGMENT",
            "VARIABLE_DEFINITION",
            "SCHEMA",
            "SCALAR",
            "OBJECT",
            "FIELD_DEFINITION",
            "ARGUMENT_DEFINITION",
            "INTERFACE",
            "UNION",
            "ENUM",
            "ENUM_VALUE",
            "INPUT_OBJECT",
            "INPUT_FIELD_DEFINITION",
        ],
    ));

    registry.insert_type(ObjectType::new(
        "__Schema",
        [
            MetaField::new("description", "String"),
            MetaField::new("types", "[__Type!]!"),
            MetaField::new("queryType", "__Type!"),
            MetaField::new("mutationType", "__Type"),
            MetaField::new("subscriptionType", "__Type"),
            MetaField::new("directives", "[__Directive!]!"),
        ],
    ));
    registry.insert_type(ObjectType::new(
        "__Type",
        [
            MetaField::new("kind", "__TypeKind!"),
            MetaField::new("name", "String"),
            MetaField::new("description", "String"),
            MetaField::new("fields", "[__Field!]").with_argument(
                MetaInputValue::new("includeDeprecated", "Boolean").with_default(ConstValue::Boolean(false)),
            ),
            MetaField::new("interfaces", "[__Type!]"),
            MetaField::new("possibleTypes", "[__Type!]"),
            MetaField::new("enumValues", "[__EnumValue!]").with_argument(
                MetaInputValue::new("includeDeprecated", "Boolean").with_default(ConstValue::Boolean(false)),
            ),
            MetaField::new("inputFields", "[__InputValue!]"),
            MetaField::new("ofType", "__Type"),
            MetaField::new("specifiedByURL", "String"),
        ],
    ));
    registry.insert_type(ObjectType::new(
        "__Field",
        [
            MetaField::new("name", "String!"),
            MetaField::new("description", "String"),
            MetaField::new("args", "[__InputValue!]!"),
            MetaField::new("type", "__Type!"),
            MetaField::new("isDeprecated", "Boolean!"),
            MetaField::new("deprecationReason", "String"),
        ],
    ));
    registry.insert_type(ObjectType::new(
        "__InputValue",
        [
            MetaField::new("name", "String!"),
            MetaField::new("description", "String"),
            MetaField::new("type", "__Type!"),
            MetaField::new("defaultValue", "String"),
        ],
    ));
    registry.insert_type(ObjectType::new(
        "__EnumValue",
        [
            MetaField::new("name", "String!"),
            MetaField::new("description", "String"),
            MetaField::new("isDeprecated", "Boolean!"),
            MetaField::new("deprecationReason", "String"),
        ],
    ));
    registry.insert_type(ObjectType::new(
        "__Directive",
        [
            MetaField::new("name", "String!"),
            MetaField::new("description", "String"),
            MetaField::new("locations", "[__DirectiveLocation!]!"),
            MetaField::new("args", "[__InputValue!]!"),
            MetaField::new("isRepeatable", "Boolean!"),
        ],
    ));

    let query_type = registry.query_type.clone();
    if let Some(MetaType::Object(query_root)) = registry.types.get_mut(&query_type) {
        let schema_field = MetaField::new("__schema", "__Schema!").with_resolver(Resolver::Introspection);
        let type_field = MetaField::new("__type", "__Type")
            .with_argument(MetaInputValue::new("name", "String!"))
            .with_resolver(Resolver::Introspection);
        query_root.fields.insert(schema_field.name.clone(), schema_field);
        query_root.fields.insert(type_field.name.clone(), type_field);
    }
}

/// Project the registry into the JSON served for `__schema`.
pub(crate) fn build_snapshot(registry: &Registry) -> Value {
    json!({
        "description": Value::Null,
        "types": registry.types.values().map(|ty| project_type(registry, ty)).collect::<Vec<_>>(),
        "queryType": shallow_named(registry, &registry.query_type),
        "mutationType": registry.mutation_type.as_deref().map(|name| shallow_named(registry, name)),
        "subscriptionType": registry.subscription_type.as_deref().map(|name| shallow_named(registry, name)),
        "directives": registry.directives.values().map(|directive| json!({
            "name": directive.name,
            "description": directive.description,
            "locations": directive.locations.iter().map(|location| location_name(*location)).collect::<Vec<_>>(),
            "args": directive.args.values().map(|arg| project_input_value(registry, arg.name.as_str(), arg)).collect::<Vec<_>>(),
            "isRepeatable": directive.is_repeatable,
        })).collect::<Vec<_>>(),
    })
}

fn project_type(registry: &Registry, ty: &MetaType) -> Value {
    let mut projected = json!({
        "kind": kind_name(ty),
        "name": ty.name(),
        "description": ty.description(),
        "fields": Value::Null,
        "interfaces": Value::Null,
        "possibleTypes": Value::Null,
        "enumValues": Value::Null,
        "inputFields": Value::Null,
        "ofType": Value::Null,
        "specifiedByURL": Value::Null,
    });

    match ty {
        MetaType::Scalar(scalar) => {
            projected["specifiedByURL"] = json!(scalar.specified_by_url);
        }
        MetaType::Object(object) => {
            projected["fields"] = project_fields(registry, ty);
            projected["interfaces"] = json!(object
                .implements
                .iter()
                .map(|name| shallow_named(registry, name))
                .collect::<Vec<_>>());
        }
        MetaType::Interface(interface) => {
            projected["fields"] = project_fields(registry, ty);
            projected["interfaces"] = json!([]);
            projected["possibleTypes"] = json!(interface
                .possible_types
                .iter()
                .map(|name| shallow_named(registry, name))
                .collect::<Vec<_>>());
        }
        MetaType::Union(union) => {
            projected["possibleTypes"] = json!(union
                .possible_types
                .iter()
                .map(|name| shallow_named(registry, name))
                .collect::<Vec<_>>());
        }
        MetaType::Enum(enum_type) => {
            projected["enumValues"] = json!(enum_type
                .enum_values
                .values()
                .map(|value| json!({
                    "name": value.name,
                    "description": value.description,
                    "isDeprecated": value.deprecation.is_deprecated(),
                    "deprecationReason": value.deprecation.reason(),
                }))
                .collect::<Vec<_>>());
        }
        MetaType::InputObject(input_object) => {
            projected["inputFields"] = json!(input_object
                .input_fields
                .values()
                .map(|input| project_input_value(registry, input.name.as_str(), input))
                .collect::<Vec<_>>());
        }
    }

    projected
}

fn project_fields(registry: &Registry, ty: &MetaType) -> Value {
    let fields = ty.fields().into_iter().flat_map(|fields| fields.values());
    json!(fields
        // Meta fields are reachable but never listed.
        .filter(|field| !field.name.starts_with("__"))
        .map(|field| json!({
            "name": field.name,
            "description": field.description,
            "args": field
                .args
                .values()
                .map(|arg| project_input_value(registry, arg.name.as_str(), arg))
                .collect::<Vec<_>>(),
            "type": type_ref(registry, field.ty.as_str()),
            "isDeprecated": field.deprecation.is_deprecated(),
            "deprecationReason": field.deprecation.reason(),
        }))
        .collect::<Vec<_>>())
}

fn project_input_value(registry: &Registry, name: &str, input: &MetaInputValue) -> Value {
    json!({
        "name": name,
        "description": input.description,
        "type": type_ref(registry, input.ty.as_str()),
        "defaultValue": input.default_value.as_ref().map(|value| value.to_string()),
    })
}

/// A shallow `__Type` reference: just enough to identify the type, with the
/// full entry available under `__schema.types`.
fn shallow_named(registry: &Registry, name: &str) -> Value {
    let kind = registry.lookup_type(name).map(kind_name).unwrap_or("SCALAR");
    json!({
        "kind": kind,
        "name": name,
        "ofType": Value::Null,
    })
}

fn type_ref(registry: &Registry, type_str: &str) -> Value {
    match Type::new(type_str) {
        Some(ty) => wrapped_type_ref(registry, &ty),
        None => Value::Null,
    }
}

fn wrapped_type_ref(registry: &Registry, ty: &Type) -> Value {
    let base = match &ty.base {
        BaseType::Named(name) => {
            let kind = registry
                .lookup_type(name.as_str())
                .map(kind_name)
                .unwrap_or("SCALAR");
            json!({"kind": kind, "name": name.as_str(), "ofType": Value::Null})
        }
        BaseType::List(inner) => json!({
            "kind": "LIST",
            "name": Value::Null,
            "ofType": wrapped_type_ref(registry, inner),
        }),
    };
    if ty.nullable {
        base
    } else {
        json!({"kind": "NON_NULL", "name": Value::Null, "ofType": base})
    }
}

fn kind_name(ty: &MetaType) -> &'static str {
    match ty {
        MetaType::Scalar(_) => "SCALAR",
        MetaType::Object(_) => "OBJECT",
        MetaType::Interface(_) => "INTERFACE",
        MetaType::Union(_) => "UNION",
        MetaType::Enum(_) => "ENUM",
        MetaType::InputObject(_) => "INPUT_OBJECT",
    }
}

fn location_name(location: DirectiveLocation) -> &'static str {
    match location {
        DirectiveLocation::Query => "QUERY",
        DirectiveLocation::Mutation => "MUTATION",
        DirectiveLocation::Subscription => "SUBSCRIPTION",
        DirectiveLocation::Field => "FIELD",
        DirectiveLocation::FragmentDefinition => "FRAGMENT_DEFINITION",
        DirectiveLocation::FragmentSpread => "FRAGMENT_SPREAD",
        DirectiveLocation::InlineFragment => "INLINE_FRAGMENT",
        DirectiveLocation::VariableDefinition => "VARIABLE_DEFINITION",
        DirectiveLocation::Schema => "SCHEMA",
        DirectiveLocation::Scalar => "SCALAR",
        DirectiveLocation::Object => "OBJECT",
        DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
        DirectiveLocation::ArgumentDefinition => "ARGUMENT_DEFINITION",
        DirectiveLocation::Interface => "INTERFACE",
        DirectiveLocation::Union => "UNION",
        DirectiveLocation::Enum => "ENUM",
        DirectiveLocation::EnumValue => "ENUM_VALUE",
        DirectiveLocation::InputObject => "INPUT_OBJECT",
        DirectiveLocation::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
    }
}
